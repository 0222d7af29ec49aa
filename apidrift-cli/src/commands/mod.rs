//! Command implementations for the apidrift CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod check;
pub mod codes;
pub mod filter;
