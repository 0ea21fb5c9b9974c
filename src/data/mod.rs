pub mod configuration;
pub mod dbconnector;
