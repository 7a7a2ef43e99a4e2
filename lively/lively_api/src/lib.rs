#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]

//! The contract between the host runner and a game module.
//! Everything here is `repr(C)` and must stay layout-stable across a hot reload:
//! changing any of it means bumping GAME_API_VERSION.

pub mod descriptor;
pub mod entry_points;
pub mod frame;
pub mod state_block;

pub use descriptor::{Compatibility, State_Descriptor};
pub use entry_points::{Game_Api, GAME_API_VERSION};
pub use frame::{Draw_Command, Draw_Context, Draw_Kind, Draw_List, Frame_Input, Key};
pub use state_block::{Relocatable, State_Block};
