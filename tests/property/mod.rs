//! Property-based tests for determinism and merge guarantees

mod merge;
