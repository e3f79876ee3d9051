mod helpers;
mod redemption_test;
