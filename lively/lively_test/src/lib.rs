#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

pub extern crate float_cmp;

#[macro_use]
pub mod prelude;

pub mod approx_eq_testable;
pub mod fake_modules;

pub use prelude::*;

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("lively_test")
        .tempdir()
        .unwrap_or_else(|err| panic!("Failed to create temp dir: {}", err))
}
