//! Cohort command handlers.
//!
//! This module contains handlers for the generate, verify, and narrate commands.

pub mod generate;
pub mod narrate;
pub mod prompt;
pub mod verify;
