//! Azure Event Hubs producer over the REST interface

pub mod connection_string;
pub mod producer;
pub mod sas;

pub use connection_string::EventHubConnection;
pub use producer::EventHubProducer;
pub use sas::SasSigner;
