//! Reference, measurement and normalized data types.

/// Raw IV-curve snapshots.
pub mod measurement;
/// Normalized MLFM rows and channel names.
pub mod normalized;
/// Datasheet reference values and module lookup.
pub mod reference;

pub use measurement::MeasurementRow;
pub use normalized::{Channel, NormalizedRow};
pub use reference::{ModuleSelector, ReferenceRecord, ReferenceTable};
