//! Configuration loading and parsing
//!
//! Loads the TOML configuration file. Errors here are fatal at startup.

pub mod loader;

pub use loader::load_config;
