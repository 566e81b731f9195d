// Application layer: the ledger operations every interface goes through.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
