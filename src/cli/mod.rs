pub mod categories;
pub mod rates;
pub mod setup;
pub mod stats;
pub mod transactions;
pub mod ui;
