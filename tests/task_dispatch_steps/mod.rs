//! Step definitions for task dispatch BDD scenarios.

pub mod then;
pub mod when;
