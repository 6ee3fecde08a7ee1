pub mod csv_export;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod service;
pub mod timer;
