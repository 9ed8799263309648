//! Service-user credentials
//!
//! The store keeps the latest known secret of every tenant service user and
//! replaces the whole set on refresh.

pub mod ports;
pub mod store;

pub use ports::ServiceUserSource;
pub use store::CredentialStore;
