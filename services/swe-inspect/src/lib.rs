//! Library side of the `swe-inspect` tool.

pub mod documents;
pub mod dump;

pub use documents::{load_config, load_encoding, load_schema};
pub use dump::{transcode, DumpOptions, DumpSummary};
