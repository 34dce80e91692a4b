// # Import Module
//
// Turns the raw bytes of a data export into `Memory` records:
//
// - **Parser**: Decodes the `"Saved Media"` envelope, all-or-nothing
//
// The library service calls into this module on every import. Parsing never
// touches library state; a failed parse leaves the previous list in place.

mod parser;

pub use parser::{parse_export, parse_export_file, ParseError};
