/// This module provides the streaming CSV reader and writer.
pub mod csv;
