//! HTTP Routes
//!
//! Route handlers organized by functionality.

pub mod clients;
pub mod health;
