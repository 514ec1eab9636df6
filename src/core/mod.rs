//! # Session Core
//!
//! The chat session controller: owned state, the action/update reducer,
//! the background request lifecycle, and configuration. Domain logic only —
//! no terminal types in here.

pub mod action;
pub mod config;
pub mod request;
pub mod state;
