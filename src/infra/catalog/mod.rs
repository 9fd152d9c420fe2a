//! Record sources backed by the catalog service or local exports.
//!
//! [`CatalogClient`] reads the live catalog over HTTP.
//! [`FileSource`] reads a JSON export or a CSV bulk-import file from disk.

mod client;
mod file;

pub use client::CatalogClient;
pub use file::FileSource;
