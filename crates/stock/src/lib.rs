//! `shopledger-stock` — inventory units and the stock lifecycle manager.

pub mod manager;
pub mod store;
pub mod unit;

pub use manager::{StockDraw, StockIntake, StockManager};
pub use store::StockStore;
pub use unit::{StockError, StockResult, StockUnit, UnitKind, UnitStatus};
