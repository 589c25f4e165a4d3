//! Unit tests for the task dispatch lifecycle.
