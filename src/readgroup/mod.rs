//! Read group extraction from sequencing run identifiers.
//!
//! Settings are read from a configuration tree, so site or user layers can
//! replace the default Illumina run-id pattern.

pub mod parser;

pub use parser::{ReadGroup, ReadGroupParser, default_settings, normalize_date};
