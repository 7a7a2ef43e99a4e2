//! Per-frame data the host lends to the module. None of it may be retained past the
//! call it was passed to.

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Escape,
    /// Asks for a hot reload even if the artifact didn't change
    F5,
    /// Asks for a fresh game state
    F6,
}

impl Key {
    pub const ALL: [Key; 8] = [
        Key::Left,
        Key::Right,
        Key::Up,
        Key::Down,
        Key::Space,
        Key::Escape,
        Key::F5,
        Key::F6,
    ];

    #[inline]
    const fn mask(self) -> u64 {
        1 << (self as u32)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame_Input {
    pub frame: u64,
    /// Keys currently held, one bit per `Key`
    pub keys_down: u64,
    /// Keys that went down during this frame
    pub keys_pressed: u64,
    pub cursor: [f32; 2],
    pub window_size: [u32; 2],
    /// The platform asked to close (e.g. the window's close button)
    pub close_requested: bool,
}

impl Frame_Input {
    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.keys_down & key.mask() != 0
    }

    #[inline]
    pub fn was_pressed(&self, key: Key) -> bool {
        self.keys_pressed & key.mask() != 0
    }

    /// Updates the held state of `key`, marking it as pressed if it just went down.
    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            if !self.is_down(key) {
                self.keys_pressed |= key.mask();
            }
            self.keys_down |= key.mask();
        } else {
            self.keys_down &= !key.mask();
        }
    }

    /// Called by the host at the start of every frame.
    pub fn begin_frame(&mut self, frame: u64) {
        self.frame = frame;
        self.keys_pressed = 0;
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Draw_Kind {
    Clear,
    Rect,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Draw_Command {
    pub kind: Draw_Kind,
    /// x, y, width, height in pixels (ignored by Clear)
    pub rect: [f32; 4],
    pub color: [u8; 4],
}

impl Draw_Command {
    pub const fn clear(color: [u8; 4]) -> Self {
        Self {
            kind: Draw_Kind::Clear,
            rect: [0.; 4],
            color,
        }
    }

    pub const fn rect(x: f32, y: f32, w: f32, h: f32, color: [u8; 4]) -> Self {
        Self {
            kind: Draw_Kind::Rect,
            rect: [x, y, w, h],
            color,
        }
    }
}

/// Host-owned command buffer. The module appends to it during `draw`.
/// Modules must only add commands through `push`: raising `len` by hand exposes slots
/// this frame never wrote, which the host shows as blank commands.
#[repr(C)]
pub struct Draw_Context {
    pub commands: *mut Draw_Command,
    pub capacity: u32,
    pub len: u32,
}

impl Draw_Context {
    /// Returns false (dropping the command) when the buffer is full.
    pub fn push(&mut self, cmd: Draw_Command) -> bool {
        if self.commands.is_null() || self.len >= self.capacity {
            return false;
        }
        unsafe {
            self.commands.add(self.len as usize).write(cmd);
        }
        self.len += 1;
        true
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }
}

// Draws nothing.
const BLANK_COMMAND: Draw_Command = Draw_Command::rect(0., 0., 0., 0., [0; 4]);

/// Host side of `Draw_Context`: owns the storage the module writes into.
pub struct Draw_List {
    // Every slot is always initialized, so whatever `len` the module reports only ever
    // exposes valid commands.
    slots: Vec<Draw_Command>,
    len: usize,
}

impl Draw_List {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(u32::MAX as usize);
        Self {
            slots: vec![BLANK_COMMAND; capacity],
            len: 0,
        }
    }

    /// Clears the list and lends its storage out. Call `end` with the same context after
    /// the module is done writing.
    pub fn begin(&mut self) -> Draw_Context {
        for slot in &mut self.slots[..self.len] {
            *slot = BLANK_COMMAND;
        }
        self.len = 0;
        Draw_Context {
            commands: self.slots.as_mut_ptr(),
            capacity: self.slots.len() as u32,
            len: 0,
        }
    }

    pub fn end(&mut self, ctx: &Draw_Context) {
        self.len = (ctx.len as usize).min(self.slots.len());
    }

    pub fn commands(&self) -> &[Draw_Command] {
        &self.slots[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_is_edge_triggered() {
        let mut input = Frame_Input::default();
        input.begin_frame(1);
        input.set_key(Key::Space, true);
        assert!(input.was_pressed(Key::Space));
        assert!(input.is_down(Key::Space));

        input.begin_frame(2);
        input.set_key(Key::Space, true);
        assert!(!input.was_pressed(Key::Space));
        assert!(input.is_down(Key::Space));

        input.set_key(Key::Space, false);
        assert!(!input.is_down(Key::Space));
        assert!(!input.is_down(Key::Escape));
    }

    #[test]
    fn draw_list_collects_pushed_commands() {
        let mut list = Draw_List::with_capacity(2);
        let mut ctx = list.begin();
        assert!(ctx.push(Draw_Command::clear([0, 0, 0, 255])));
        assert!(ctx.push(Draw_Command::rect(1., 2., 3., 4., [255; 4])));
        assert!(!ctx.push(Draw_Command::rect(0., 0., 1., 1., [255; 4])));
        assert!(ctx.is_full());
        list.end(&ctx);

        assert_eq!(list.commands().len(), 2);
        assert_eq!(list.commands()[1].rect, [1., 2., 3., 4.]);

        let ctx = list.begin();
        list.end(&ctx);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn null_context_rejects_pushes() {
        let mut ctx = Draw_Context {
            commands: std::ptr::null_mut(),
            capacity: 10,
            len: 0,
        };
        assert!(!ctx.push(Draw_Command::clear([0; 4])));
    }

    #[test]
    fn unpushed_slots_read_as_blank() {
        let mut list = Draw_List::with_capacity(4);
        let mut ctx = list.begin();
        ctx.push(Draw_Command::clear([1, 2, 3, 255]));
        ctx.push(Draw_Command::rect(5., 5., 5., 5., [255; 4]));
        list.end(&ctx);

        // Next frame the module claims more commands than it pushed.
        let mut ctx = list.begin();
        ctx.push(Draw_Command::clear([9, 9, 9, 255]));
        ctx.len = 100;
        list.end(&ctx);

        let commands = list.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], Draw_Command::clear([9, 9, 9, 255]));
        assert!(commands[1..].iter().all(|cmd| *cmd == BLANK_COMMAND));
    }
}
