//! Hacksteader - storage schema and steader management tool
//!
//! This library crate exposes the configuration layer for integration testing.

pub mod config;
