#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

#[macro_use]
extern crate lively_diagnostics;

pub mod render;
pub mod world;

use lively_api::state_block::{self, State_Block};
use lively_api::{Draw_Context, Frame_Input, Game_Api, State_Descriptor, GAME_API_VERSION};
use world::World;

/// Bump this whenever `World` changes layout: the host will then discard the old state
/// on reload instead of handing it to code that would misread it.
pub const LAYOUT_VERSION: u32 = 1;

const DEFAULT_SEED: u32 = 0x2545_f491;

#[no_mangle]
pub extern "C" fn game_api_version() -> u32 {
    GAME_API_VERSION
}

#[no_mangle]
pub extern "C" fn game_init() -> *mut State_Block {
    linfo!("Initializing game (layout version {})...", LAYOUT_VERSION);
    // Don't let a panic unwind into the host.
    let world = match std::panic::catch_unwind(|| World::new(DEFAULT_SEED)) {
        Ok(world) => world,
        Err(_) => {
            lerr!("game_init: panicked while creating the world.");
            return std::ptr::null_mut();
        }
    };
    match state_block::alloc_state_block(LAYOUT_VERSION, world) {
        Some(block) => block.as_ptr(),
        None => {
            lerr!("game_init: failed to allocate the state block.");
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn game_update(state: *mut State_Block, input: *const Frame_Input, dt: f32) {
    let world = match state_block::payload_mut::<World>(state) {
        Some(w) => w,
        None => fatal!("game_update: invalid state block!"),
    };
    let input = input.as_ref().copied().unwrap_or_default();
    world.update(&input, dt);
}

#[no_mangle]
pub unsafe extern "C" fn game_draw(state: *mut State_Block, ctx: *mut Draw_Context) {
    let world = match state_block::payload::<World>(state) {
        Some(w) => w,
        None => fatal!("game_draw: invalid state block!"),
    };
    if let Some(ctx) = ctx.as_mut() {
        render::draw_world(world, ctx);
    }
}

#[no_mangle]
pub unsafe extern "C" fn game_should_close(state: *const State_Block) -> bool {
    state_block::payload::<World>(state).map_or(true, |w| w.quit_requested != 0)
}

#[no_mangle]
pub unsafe extern "C" fn game_shutdown(state: *mut State_Block) {
    // The world holds no external resources: the host frees the block itself.
    if let Some(world) = state_block::payload::<World>(state) {
        lok!(
            "Game was shut down after {} frames (score: {}).",
            world.frame,
            world.score
        );
    }
}

#[no_mangle]
pub extern "C" fn game_export_state_descriptor(_state: *const State_Block) -> State_Descriptor {
    State_Descriptor::of::<World>(LAYOUT_VERSION)
}

#[no_mangle]
pub unsafe extern "C" fn game_on_unload(state: *mut State_Block) {
    if let Some(world) = state_block::payload::<World>(state) {
        ldebug!("Unloading game code at frame {}.", world.frame);
    }
}

#[no_mangle]
pub unsafe extern "C" fn game_on_reload(state: *mut State_Block) {
    if let Some(world) = state_block::payload::<World>(state) {
        linfo!(
            "Game code reloaded at frame {} (score: {}).",
            world.frame,
            world.score
        );
    }
}

#[no_mangle]
pub unsafe extern "C" fn game_force_reload(state: *const State_Block) -> bool {
    state_block::payload::<World>(state).map_or(false, |w| w.reload_requested != 0)
}

#[no_mangle]
pub unsafe extern "C" fn game_force_restart(state: *const State_Block) -> bool {
    state_block::payload::<World>(state).map_or(false, |w| w.restart_requested != 0)
}

/// Entry points for builds that link the game statically (release and web).
pub fn game_api() -> Game_Api {
    Game_Api {
        init: game_init,
        update: game_update,
        draw: game_draw,
        should_close: game_should_close,
        shutdown: game_shutdown,
        export_state_descriptor: game_export_state_descriptor,
        on_unload: Some(game_on_unload),
        on_reload: Some(game_on_reload),
        force_reload: Some(game_force_reload),
        force_restart: Some(game_force_restart),
    }
}
