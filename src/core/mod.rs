//! Core data model and I/O: the measurement grid, file discovery, parsers,
//! and export writers.

pub mod discovery;
pub mod grid;
pub mod loaders;
pub mod writers;

pub use discovery::{DiscoveredFile, FileKind};
pub use grid::MeasurementGrid;
pub use loaders::{GridDecoder, RawGridDecoder};
