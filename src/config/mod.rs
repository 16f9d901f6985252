/// Database configuration and connection management
pub mod database;

/// Application settings from bursar.toml
pub mod settings;
