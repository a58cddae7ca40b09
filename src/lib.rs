//! WG License Bot Library
//!
//! A Telegram bot that issues, bans and unbans license keys kept in a JSON
//! document in a GitHub repository.
//!
//! This crate provides the core functionality for:
//! - Loading configuration from the environment
//! - Reading and conditionally updating the license document via the GitHub contents API
//! - Generating collision-free license keys
//! - Handling administrator commands received over Telegram

pub mod commands;
pub mod config;
pub mod github;
pub mod license;
pub mod telegram;
