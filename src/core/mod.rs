/// Reader and writer contracts shared by every item source and sink.
pub mod item;

/// Conversion between rows of cells and caller-defined records.
pub mod resolver;
