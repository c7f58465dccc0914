//! Login dialogue module.
//!
//! Drives the turn-based conversation that collects account credentials
//! and exchanges them for an authenticated session handle.

mod controller;
mod state;

pub use controller::LoginController;
pub use state::{LoginState, Session, SessionMap};
