//! Sentinel Bot Library
//!
//! A Telegram bot that watches an external account service for
//! security-related events.
//!
//! This crate provides the core functionality for:
//! - Collecting account credentials through a chat dialogue
//! - Authenticating against the account service
//! - Polling for security events on a background task
//! - Delivering alerts back through Telegram

pub mod account;
pub mod commands;
pub mod config;
pub mod dialogue;
pub mod monitor;
pub mod telegram;
