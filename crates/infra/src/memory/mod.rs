//! In-memory store implementations. Intended for tests/dev.

mod accounts;
mod documents;
mod stock;

pub use accounts::InMemoryAccountStore;
pub use documents::InMemoryDocumentDb;
pub use stock::InMemoryStockStore;
