pub mod csv_ledger;
pub mod delivery;
pub mod fs;
pub mod submissions;
