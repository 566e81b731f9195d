// Moving ledger data in and out of files.

pub mod export;

pub use export::*;
