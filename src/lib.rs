pub mod db;
pub mod dto;
pub mod error;
pub mod models;
pub mod prom_metrics;
pub mod server;

pub use error::StoreError;
