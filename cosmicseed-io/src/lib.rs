//! cosmicseed-io: Event input and seed output for cosmicseed.
//!
//! Event files are streams of JSON event records read through memmap2.
//! Seeds are written as JSON Lines or CSV.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{read_conditions, EventFileReader, MappedFileReader};
pub use writer::{OutputFormat, SeedFileWriter};
