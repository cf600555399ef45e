pub mod configuration;
pub mod db;
pub mod routes;
pub mod startup;
pub mod telemetry;
