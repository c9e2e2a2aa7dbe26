//! Dialogue database format module

mod io;
mod types;

pub use io::{parse_database, read_database, serialize_database, write_database};
pub use types::*;
