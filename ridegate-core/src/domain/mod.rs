//! Domain layer shared by the request guards

pub mod errors;

pub use errors::{GuardError, StoreError};
