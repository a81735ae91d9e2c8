//! # hostbot-core
//!
//! Error handling, configuration, and credential resolution shared by the
//! hostbot relay and its Telegram client.

pub mod config;
pub mod error;
pub mod secrets;
