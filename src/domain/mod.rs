mod account;
mod ledger;
mod money;
mod operation;

pub use account::*;
pub use ledger::*;
pub use money::*;
pub use operation::*;
