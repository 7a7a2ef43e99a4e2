#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

#[macro_use]
extern crate lively_diagnostics;

pub mod env;
#[cfg(not(target_arch = "wasm32"))]
pub mod sleep;
pub mod time;
