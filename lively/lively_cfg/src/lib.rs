#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

#[macro_use]
extern crate lively_diagnostics;

mod config;
mod parsing;
mod value;

pub use config::Config;
pub use parsing::{Cfg_Entry, Cfg_Section};
pub use value::Cfg_Value;
