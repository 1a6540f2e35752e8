//! Outer surfaces: the boundary API and the file formats the CLI speaks.

pub mod api;
pub mod csv;
pub mod jsonl;
