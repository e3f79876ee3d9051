pub mod access_code;
pub mod ballot;
pub mod health;
pub mod results;
