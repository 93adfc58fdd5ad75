//! Command-line driver for the codemorph variant generator.
//!
//! The driver module carries the actual generation loop so integration
//! tests can exercise it without spawning the binary.

pub mod driver;

pub use driver::{generate_from_file, generate_variants, write_variants, DriverOptions, Variant};
