use crate::descriptor::State_Descriptor;
use crate::frame::{Draw_Context, Frame_Input};
use crate::state_block::State_Block;

/// Bump this whenever any signature below, or any repr(C) type they use, changes.
pub const GAME_API_VERSION: u32 = 1;

/// Exported symbol names (nul-terminated, as the dynamic loader wants them).
pub mod symbols {
    pub const API_VERSION: &[u8] = b"game_api_version\0";
    pub const INIT: &[u8] = b"game_init\0";
    pub const UPDATE: &[u8] = b"game_update\0";
    pub const DRAW: &[u8] = b"game_draw\0";
    pub const SHOULD_CLOSE: &[u8] = b"game_should_close\0";
    pub const SHUTDOWN: &[u8] = b"game_shutdown\0";
    pub const EXPORT_STATE_DESCRIPTOR: &[u8] = b"game_export_state_descriptor\0";

    // Optional
    pub const ON_UNLOAD: &[u8] = b"game_on_unload\0";
    pub const ON_RELOAD: &[u8] = b"game_on_reload\0";
    pub const FORCE_RELOAD: &[u8] = b"game_force_reload\0";
    pub const FORCE_RESTART: &[u8] = b"game_force_restart\0";
}

pub type Api_Version_Fn = unsafe extern "C" fn() -> u32;
/// Returns null on failure.
pub type Init_Fn = unsafe extern "C" fn() -> *mut State_Block;
pub type Update_Fn = unsafe extern "C" fn(*mut State_Block, *const Frame_Input, f32);
pub type Draw_Fn = unsafe extern "C" fn(*mut State_Block, *mut Draw_Context);
pub type Should_Close_Fn = unsafe extern "C" fn(*const State_Block) -> bool;
pub type Shutdown_Fn = unsafe extern "C" fn(*mut State_Block);
/// A null state asks for the descriptor the module was compiled with.
pub type Export_Descriptor_Fn = unsafe extern "C" fn(*const State_Block) -> State_Descriptor;
pub type Hook_Fn = unsafe extern "C" fn(*mut State_Block);
pub type Request_Fn = unsafe extern "C" fn(*const State_Block) -> bool;

/// The entry-point table. Plain function pointers: whoever holds a `Game_Api` taken from
/// a dynamic library must keep that library loaded for as long as the table is used.
#[derive(Copy, Clone)]
pub struct Game_Api {
    pub init: Init_Fn,
    pub update: Update_Fn,
    pub draw: Draw_Fn,
    pub should_close: Should_Close_Fn,
    pub shutdown: Shutdown_Fn,
    pub export_state_descriptor: Export_Descriptor_Fn,

    pub on_unload: Option<Hook_Fn>,
    pub on_reload: Option<Hook_Fn>,
    pub force_reload: Option<Request_Fn>,
    pub force_restart: Option<Request_Fn>,
}

impl Game_Api {
    /// The layout this module expects its state block to have.
    pub fn compiled_descriptor(&self) -> State_Descriptor {
        unsafe { (self.export_state_descriptor)(std::ptr::null()) }
    }
}

impl std::fmt::Debug for Game_Api {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Game_Api")
            .field("descriptor", &self.compiled_descriptor())
            .field("on_unload", &self.on_unload.is_some())
            .field("on_reload", &self.on_reload.is_some())
            .field("force_reload", &self.force_reload.is_some())
            .field("force_restart", &self.force_restart.is_some())
            .finish()
    }
}
