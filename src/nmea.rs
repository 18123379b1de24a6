//! NMEA sentence stream handling: checksum validation, sentence decoding
//! into [`crate::NavFix`], and reassembly of the live serial byte stream
//! into complete lines.

mod assembler;
mod parser;

pub use assembler::LineAssembler;
pub use parser::{parse, validate, SentenceKind, SentenceOutcome};
