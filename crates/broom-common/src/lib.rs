//! Common utilities for the broom HTML cleaner.
//!
//! This crate provides shared infrastructure used by the other components:
//! - **Warning System** - colored terminal output for advisory cleanup notices

pub mod warning;
