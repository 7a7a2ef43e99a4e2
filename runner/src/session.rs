use super::error::Runner_Error;
use super::module::Module_Handle;
use super::snapshot::State_Snapshot;
use lively_api::state_block::{self, State_Block};
use lively_api::{Compatibility, Draw_Context, Frame_Input, State_Descriptor};

/// How a module swap went for the state.
#[derive(Debug)]
pub enum Swap_Outcome {
    /// The same block was handed to the new module.
    Preserved,
    /// The layouts differ: the old block was shut down and freed, the new module started
    /// from a fresh one.
    Reinitialized {
        from: State_Descriptor,
        to: State_Descriptor,
        snapshot: Option<State_Snapshot>,
    },
}

/// A failed swap gives back the module that could not be attached.
pub struct Swap_Failure {
    pub error: Runner_Error,
    pub rejected: Module_Handle,
}

/// The active module plus the state block it is running on.
/// Whatever way the session ends (`shutdown` or drop), the module's shutdown runs
/// exactly once on the current block, which is then freed.
pub struct Game_Session {
    state: *mut State_Block,
    module: Option<Module_Handle>,
}

impl Game_Session {
    pub fn new(module: Module_Handle) -> Result<Self, Runner_Error> {
        let state = unsafe { (module.api.init)() };
        if state.is_null() {
            lerr!("Game module (generation {}) failed to initialize.", module.generation);
            return Err(Runner_Error::Init_Failure);
        }
        check_fresh_block(state, &module);
        Ok(Game_Session {
            state,
            module: Some(module),
        })
    }

    /// # Panics
    /// Never after `new` succeeded: the module is only taken by the teardown.
    pub fn module(&self) -> &Module_Handle {
        match &self.module {
            Some(m) => m,
            None => fatal!("Game_Session used after teardown"),
        }
    }

    pub fn generation(&self) -> u32 {
        self.module().generation
    }

    /// The opaque block handle. Only valid until the next swap or restart.
    pub fn state_handle(&self) -> *const State_Block {
        self.state
    }

    pub fn state_descriptor(&self) -> Option<State_Descriptor> {
        unsafe { state_block::descriptor_of(self.state) }
    }

    pub fn state_bytes(&self) -> Option<&[u8]> {
        unsafe { state_block::payload_bytes(self.state) }
    }

    pub fn update(&mut self, input: &Frame_Input, dt: f32) {
        let api = self.module().api;
        unsafe { (api.update)(self.state, input, dt) };
    }

    pub fn draw(&mut self, ctx: &mut Draw_Context) {
        let api = self.module().api;
        unsafe { (api.draw)(self.state, ctx) };
    }

    pub fn should_close(&self) -> bool {
        unsafe { (self.module().api.should_close)(self.state) }
    }

    pub fn force_reload_requested(&self) -> bool {
        match self.module().api.force_reload {
            Some(f) => unsafe { f(self.state) },
            None => false,
        }
    }

    pub fn force_restart_requested(&self) -> bool {
        match self.module().api.force_restart {
            Some(f) => unsafe { f(self.state) },
            None => false,
        }
    }

    /// The descriptor the active module exports for the current block.
    pub fn exported_descriptor(&self) -> State_Descriptor {
        unsafe { (self.module().api.export_state_descriptor)(self.state) }
    }

    /// Attaches `incoming` to the running game.
    /// On failure nothing changed: the old module is still active on the old block.
    pub fn swap_module(
        &mut self,
        incoming: Module_Handle,
        capture_lost_state: bool,
    ) -> Result<Swap_Outcome, Swap_Failure> {
        let from = self.exported_descriptor();
        let to = incoming.descriptor;

        match from.compatibility_with(&to) {
            Compatibility::Compatible => {
                let outgoing = self.take_module();
                if let Some(on_unload) = outgoing.api.on_unload {
                    unsafe { on_unload(self.state) };
                }
                // Closes the old image.
                drop(outgoing);

                if let Some(on_reload) = incoming.api.on_reload {
                    unsafe { on_reload(self.state) };
                }
                self.module = Some(incoming);
                Ok(Swap_Outcome::Preserved)
            }
            Compatibility::Version_Changed { .. } | Compatibility::Size_Changed { .. } => {
                let fresh = unsafe { (incoming.api.init)() };
                if fresh.is_null() {
                    return Err(Swap_Failure {
                        error: Runner_Error::Init_Failure,
                        rejected: incoming,
                    });
                }
                check_fresh_block(fresh, &incoming);

                let snapshot = if capture_lost_state {
                    unsafe { State_Snapshot::capture(self.state, self.generation()) }
                } else {
                    None
                };

                let outgoing = self.take_module();
                unsafe {
                    (outgoing.api.shutdown)(self.state);
                    state_block::free_state_block(self.state);
                }
                drop(outgoing);

                self.state = fresh;
                self.module = Some(incoming);
                Ok(Swap_Outcome::Reinitialized { from, to, snapshot })
            }
        }
    }

    /// Starts the game over on the same module.
    /// If init fails the old state keeps running.
    pub fn restart(&mut self) -> Result<(), Runner_Error> {
        let api = self.module().api;
        let fresh = unsafe { (api.init)() };
        if fresh.is_null() {
            return Err(Runner_Error::Init_Failure);
        }
        unsafe {
            (api.shutdown)(self.state);
            state_block::free_state_block(self.state);
        }
        self.state = fresh;
        Ok(())
    }

    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn take_module(&mut self) -> Module_Handle {
        match self.module.take() {
            Some(m) => m,
            None => fatal!("Game_Session used after teardown"),
        }
    }

    fn teardown(&mut self) {
        if let Some(module) = self.module.take() {
            linfo!("Shutting down game module (generation {}).", module.generation);
            unsafe {
                (module.api.shutdown)(self.state);
                state_block::free_state_block(self.state);
            }
            self.state = std::ptr::null_mut();
            // The image is closed only after its shutdown ran.
            drop(module);
        }
    }
}

impl Drop for Game_Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn check_fresh_block(block: *const State_Block, module: &Module_Handle) {
    match unsafe { state_block::descriptor_of(block) } {
        Some(desc) if desc == module.descriptor => {}
        Some(desc) => lwarn!(
            "Module exports {} but its init produced a {} block.",
            module.descriptor,
            desc
        ),
        None => lwarn!("Module init returned a block without a valid header."),
    }
}
