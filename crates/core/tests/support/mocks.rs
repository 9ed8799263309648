//! Recording mocks for the forwarding ports

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hubbridge_core::{EventProducer, NotificationSubscriber};
use hubbridge_domain::{
    BridgeError, ForwardBatch, MessageIdentifier, NotificationMessage, Result as DomainResult,
};
use tokio::sync::mpsc::UnboundedSender;

/// Call observed by a mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Submit(Vec<u8>),
    Ack(String),
}

/// Shared call journal so subscriber and producer record into one sequence.
#[derive(Default)]
pub struct Journal {
    calls: Mutex<Vec<Call>>,
}

impl Journal {
    pub fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Ack(id) => Some(id),
                Call::Submit(_) => None,
            })
            .collect()
    }
}

/// Subscriber mock that records acknowledgements and closes.
pub struct MockSubscriber {
    journal: Arc<Journal>,
    fail_acks: bool,
    closes: AtomicUsize,
    registered: Mutex<Vec<String>>,
}

impl MockSubscriber {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self { journal, fail_acks: false, closes: AtomicUsize::new(0), registered: Mutex::new(Vec::new()) }
    }

    /// Every acknowledge call is recorded and then fails.
    pub fn failing_acks(mut self) -> Self {
        self.fail_acks = true;
        self
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSubscriber for MockSubscriber {
    async fn connect(&self) -> DomainResult<()> {
        Ok(())
    }

    fn register(&self, pattern: &str, _sender: UnboundedSender<NotificationMessage>) {
        self.registered.lock().unwrap().push(pattern.to_string());
    }

    async fn acknowledge(&self, identifier: &MessageIdentifier) -> DomainResult<()> {
        self.journal.push(Call::Ack(identifier.to_string()));
        if self.fail_acks {
            return Err(BridgeError::Acknowledge("socket closed".into()));
        }
        Ok(())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Producer mock answering submissions from a script; default is success.
pub struct MockProducer {
    journal: Arc<Journal>,
    outcomes: Mutex<VecDeque<DomainResult<()>>>,
    closes: AtomicUsize,
}

impl MockProducer {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self { journal, outcomes: Mutex::new(VecDeque::new()), closes: AtomicUsize::new(0) }
    }

    /// Queue the outcome of the next submission.
    pub fn then(self, outcome: DomainResult<()>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventProducer for MockProducer {
    async fn new_batch(&self) -> DomainResult<ForwardBatch> {
        Ok(ForwardBatch::new())
    }

    async fn submit(&self, batch: ForwardBatch) -> DomainResult<()> {
        assert_eq!(batch.len(), 1, "each submission carries exactly one message");
        let body = batch.events()[0].body.clone();
        self.journal.push(Call::Submit(body));
        self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
