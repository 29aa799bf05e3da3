// File I/O: CSV tables in and out, JSON records, run artifacts

pub mod artifacts;
pub mod csv;
pub mod error;
pub mod json;

pub use error::IoError;
