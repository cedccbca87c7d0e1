pub mod config;
pub mod constants;
pub mod driver;
pub mod engine;
pub mod error;
pub mod highscore_store;
pub mod maze;
pub mod rng;
pub mod server_protocol;
pub mod types;
