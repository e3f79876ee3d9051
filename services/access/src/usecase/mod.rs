pub mod ballot;
pub mod issuance;
pub mod ledger;
pub mod provision;
pub mod redemption;
pub mod results;
