//! Parsing the GO master data
//!
//! Fetching the files is not part of this crate, the parsers expect
//! local, already downloaded data.

/// Module to parse `go-basic.obo` and similar OBO files
pub mod go_obo;
