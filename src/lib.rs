/// CLI command implementations.
pub mod commands;
/// Layered configuration: defaults, file values, CLI arguments, and
/// per-project database overrides.
pub mod config;
/// Database layer: open, migrate, CRUD.
pub mod db;
/// Data types: entities and status enums.
pub mod models;
