#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

//! The long-lived host: owns the platform, drives the frame loop and, in hot reload builds,
//! swaps the game module under the running game.

#[cfg(all(target_arch = "wasm32", not(feature = "static-game")))]
compile_error!("The web build has no dynamic loader: build it with `--no-default-features --features static-game`.");

#[cfg(not(any(feature = "hot-reload", feature = "static-game")))]
compile_error!("Enable either the `hot-reload` or the `static-game` feature.");

#[macro_use]
extern crate lively_diagnostics;

pub mod config;
pub mod error;
pub mod host;
pub mod module;
pub mod notice;
pub mod platform;
pub mod session;
pub mod snapshot;
pub mod variant;

#[cfg(feature = "hot-reload")]
pub mod game_api;
#[cfg(feature = "hot-reload")]
pub mod hotload;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::Runner_Config;
pub use error::Runner_Error;
pub use host::{Host, Reload_Hook, Step_Result};
pub use module::Module_Handle;
pub use notice::{Notice, Notice_Kind, Notice_Log};
pub use session::Game_Session;
pub use variant::Build_Variant;
