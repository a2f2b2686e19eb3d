//! Library crate for port-scan-rs exposing reusable modules.
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod ports;
pub mod progress;
pub mod scanner;
pub mod services;
pub mod target;
pub mod types;
