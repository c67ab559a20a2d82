//! Domain layer: pure aggregates and value helpers, no I/O.
pub mod aggregates;
pub mod value_objects;
