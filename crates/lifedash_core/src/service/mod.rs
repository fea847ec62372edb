//! Core use-case services.
//!
//! # Responsibility
//! - Derived views over repository snapshots.
//! - The focus-session timer.
//! - Whole-dataset transfer.

pub mod focus_timer;
pub mod transfer;
pub mod views;
