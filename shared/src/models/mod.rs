//! Domain models for the Pharmacy Inventory Platform

mod input;
mod master;
mod reference;
mod report;
mod transaction;

pub use input::*;
pub use master::*;
pub use reference::*;
pub use report::*;
pub use transaction::*;
