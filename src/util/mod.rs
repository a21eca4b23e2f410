//! Utility functions
//!
//! Various helper functions used throughout the engine.

pub mod unicode;
