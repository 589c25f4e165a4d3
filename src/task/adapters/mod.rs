//! Adapter implementations for task dispatch ports.

pub mod memory;
