pub mod analysis;
pub mod config;
pub mod contract;
pub mod errors;
pub mod models;
pub mod server;
pub mod state;
