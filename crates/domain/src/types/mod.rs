//! Domain data types

pub mod batch;
pub mod notification;
pub mod platform;
pub mod service_user;

pub use batch::{EventData, ForwardBatch};
pub use notification::{MessageIdentifier, NotificationMessage};
pub use platform::{NotificationTokenRequest, PlatformEvent, SourceRef, TenantOption};
pub use service_user::{ServiceUser, ServiceUserKey};
