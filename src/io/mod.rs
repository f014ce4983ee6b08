//! Table input and output.

/// Normalized table CSV export.
pub mod export;
/// Reference and measurement CSV loading.
pub mod load;
