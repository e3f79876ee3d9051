pub mod ballot;
pub mod ledger;
pub mod repository;
pub mod types;
