//! Infrastructure layer: manager assignment, the worker connection, config.

pub mod assignment;
pub mod config;
pub mod network;
