//! In-process stand-ins for compiled game modules.
//!
//! Each module exposes the same entry points a real cdylib would, but its function
//! pointers come straight from this crate, so the host and the reload supervisor can be
//! exercised without a compiler. Call counters are thread-local: every test runs on its
//! own thread and drives the host from that thread only.

use lively_api::state_block::{self, Relocatable};
use lively_api::{Draw_Command, Draw_Context, Frame_Input, Game_Api, State_Block};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Call_Counts {
    pub inits: u32,
    pub updates: u32,
    pub draws: u32,
    pub shutdowns: u32,
    pub unloads: u32,
    pub reloads: u32,
}

/// 128 bytes, no padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Counter_State {
    pub ticks: u64,
    pub last_writer: u32,
    pub seed: u32,
    pub history: [u32; 28],
}
unsafe impl Relocatable for Counter_State {}

/// 256 bytes, no padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Wide_Counter_State {
    pub ticks: u64,
    pub last_writer: u32,
    pub seed: u32,
    pub history: [u32; 60],
}
unsafe impl Relocatable for Wide_Counter_State {}

pub trait Fake_State: Relocatable {
    fn fresh() -> Self;
    fn tick(&mut self, writer: u32);
    fn ticks(&self) -> u64;
}

macro_rules! impl_fake_state {
    ($state: ty) => {
        impl Fake_State for $state {
            fn fresh() -> Self {
                Self {
                    ticks: 0,
                    last_writer: 0,
                    seed: 0x5eed,
                    history: [0; std::mem::size_of::<$state>() / 4 - 4],
                }
            }

            fn tick(&mut self, writer: u32) {
                self.ticks += 1;
                self.last_writer = writer;
                let slot = (self.ticks as usize) % self.history.len();
                self.history[slot] = writer * 1000 + self.ticks as u32;
            }

            fn ticks(&self) -> u64 {
                self.ticks
            }
        }
    };
}

impl_fake_state!(Counter_State);
impl_fake_state!(Wide_Counter_State);

macro_rules! fake_module {
    ($name: ident, $state: ty, version = $version: expr, writer = $writer: expr, fail_init = $fail_init: expr) => {
        pub mod $name {
            use super::*;
            use std::cell::Cell;

            pub const LAYOUT_VERSION: u32 = $version;
            pub const WRITER: u32 = $writer;
            pub type State = $state;

            thread_local! {
                static CALLS: Cell<Call_Counts> = Cell::new(Call_Counts::default());
                static CLOSE_AT: Cell<u64> = Cell::new(u64::MAX);
                static RELOAD_REQUESTED: Cell<bool> = Cell::new(false);
                static RESTART_REQUESTED: Cell<bool> = Cell::new(false);
            }

            fn count(f: impl FnOnce(&mut Call_Counts)) {
                CALLS.with(|calls| {
                    let mut c = calls.get();
                    f(&mut c);
                    calls.set(c);
                });
            }

            pub fn calls() -> Call_Counts {
                CALLS.with(Cell::get)
            }

            pub fn reset() {
                CALLS.with(|c| c.set(Call_Counts::default()));
                CLOSE_AT.with(|c| c.set(u64::MAX));
                RELOAD_REQUESTED.with(|c| c.set(false));
                RESTART_REQUESTED.with(|c| c.set(false));
            }

            /// The module asks to close once its state has ticked `ticks` times.
            pub fn close_at(ticks: u64) {
                CLOSE_AT.with(|c| c.set(ticks));
            }

            pub fn request_reload() {
                RELOAD_REQUESTED.with(|c| c.set(true));
            }

            pub fn request_restart() {
                RESTART_REQUESTED.with(|c| c.set(true));
            }

            pub fn fresh_state() -> State {
                <State as Fake_State>::fresh()
            }

            unsafe extern "C" fn init() -> *mut State_Block {
                count(|c| c.inits += 1);
                if $fail_init {
                    return std::ptr::null_mut();
                }
                state_block::alloc_state_block(LAYOUT_VERSION, fresh_state())
                    .map_or(std::ptr::null_mut(), |b| b.as_ptr())
            }

            unsafe extern "C" fn update(state: *mut State_Block, _input: *const Frame_Input, _dt: f32) {
                count(|c| c.updates += 1);
                if let Some(state) = state_block::payload_mut::<State>(state) {
                    state.tick(WRITER);
                }
            }

            unsafe extern "C" fn draw(state: *mut State_Block, ctx: *mut Draw_Context) {
                count(|c| c.draws += 1);
                if let (Some(state), Some(ctx)) = (state_block::payload::<State>(state), ctx.as_mut()) {
                    ctx.push(Draw_Command::rect(state.ticks() as f32, 0., 1., 1., [255; 4]));
                }
            }

            unsafe extern "C" fn should_close(state: *const State_Block) -> bool {
                state_block::payload::<State>(state)
                    .map_or(false, |s| s.ticks() >= CLOSE_AT.with(Cell::get))
            }

            unsafe extern "C" fn shutdown(_state: *mut State_Block) {
                count(|c| c.shutdowns += 1);
            }

            unsafe extern "C" fn export_state_descriptor(_state: *const State_Block) -> lively_api::State_Descriptor {
                lively_api::State_Descriptor::of::<State>(LAYOUT_VERSION)
            }

            unsafe extern "C" fn on_unload(_state: *mut State_Block) {
                count(|c| c.unloads += 1);
            }

            unsafe extern "C" fn on_reload(_state: *mut State_Block) {
                count(|c| c.reloads += 1);
            }

            unsafe extern "C" fn force_reload(_state: *const State_Block) -> bool {
                RELOAD_REQUESTED.with(|c| c.replace(false))
            }

            unsafe extern "C" fn force_restart(_state: *const State_Block) -> bool {
                RESTART_REQUESTED.with(|c| c.replace(false))
            }

            pub fn api() -> Game_Api {
                Game_Api {
                    init,
                    update,
                    draw,
                    should_close,
                    shutdown,
                    export_state_descriptor,
                    on_unload: Some(on_unload),
                    on_reload: Some(on_reload),
                    force_reload: Some(force_reload),
                    force_restart: Some(force_restart),
                }
            }
        }
    };
}

// {version: 1, size: 128}
fake_module!(v1, Counter_State, version = 1, writer = 1, fail_init = false);
// Same layout as v1, different behavior
fake_module!(v1_patched, Counter_State, version = 1, writer = 2, fail_init = false);
// {version: 2, size: 256}
fake_module!(v2, Wide_Counter_State, version = 2, writer = 3, fail_init = false);
// Layout changed but init fails
fake_module!(v2_broken_init, Wide_Counter_State, version = 2, writer = 4, fail_init = true);

pub fn reset_all() {
    v1::reset();
    v1_patched::reset();
    v2::reset();
    v2_broken_init::reset();
}

/// Reads the payload of a block created by one of the fake modules.
///
/// # Safety
/// `block` must be a live block.
pub unsafe fn read_state<T: Fake_State>(block: *const State_Block) -> Option<T> {
    state_block::payload::<T>(block).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_layouts_have_the_advertised_sizes() {
        assert_eq!(v1::api().compiled_descriptor(), lively_api::State_Descriptor::new(1, 128));
        assert_eq!(v2::api().compiled_descriptor(), lively_api::State_Descriptor::new(2, 256));
    }

    #[test]
    fn fake_module_counts_calls() {
        reset_all();
        let api = v1::api();
        unsafe {
            let block = (api.init)();
            assert!(!block.is_null());
            (api.update)(block, std::ptr::null(), 0.016);
            (api.update)(block, std::ptr::null(), 0.016);
            assert_eq!(read_state::<Counter_State>(block).unwrap().ticks, 2);
            (api.shutdown)(block);
            state_block::free_state_block(block);
        }
        assert_eq!(
            v1::calls(),
            Call_Counts {
                inits: 1,
                updates: 2,
                shutdowns: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn broken_init_returns_null() {
        reset_all();
        unsafe {
            assert!((v2_broken_init::api().init)().is_null());
        }
    }
}
