//! # Stocktake Robot
//!
//! HTTP client for the robot control system (RCS): route submission and
//! the "continue to next bin" trigger.

mod client;

pub use client::{HttpRobotCommander, RobotClientConfig};

// Re-export the trait surface for convenience.
pub use stocktake_core::command::{CommandAck, CommandError, RobotCommander};
