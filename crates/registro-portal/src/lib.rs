pub mod catalog;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod matching;
pub mod records;
pub mod registration;
pub mod telemetry;
