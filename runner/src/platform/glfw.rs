use super::Platform;
use crate::error::Runner_Error;
use crate::notice::Notice;
use glfw::Context;
use lively_api::{Draw_Command, Draw_Kind, Frame_Input, Key};
use std::sync::mpsc::Receiver;

pub struct Glfw_Platform {
    glfw: glfw::Glfw,
    window: glfw::Window,
    events: Receiver<(f64, glfw::WindowEvent)>,
    title: String,
    // Size of the framebuffer
    real_size: (u32, u32),
}

impl Glfw_Platform {
    pub fn new(title: &str, target_size: (u32, u32)) -> Result<Self, Runner_Error> {
        let mut glfw = glfw::init(Some(error_callback()))
            .map_err(|err| Runner_Error::Platform_Context_Failure(format!("{:?}", err)))?;
        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(
            glfw::OpenGlProfileHint::Core,
        ));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));

        let (mut window, events) = glfw
            .create_window(
                target_size.0,
                target_size.1,
                title,
                glfw::WindowMode::Windowed,
            )
            .ok_or_else(|| {
                Runner_Error::Platform_Context_Failure(String::from("failed to create GLFW window"))
            })?;

        window.make_current();
        window.set_key_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_close_polling(true);
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        gl::load_with(|s| window.get_proc_address(s) as *const _);

        let (w, h) = window.get_framebuffer_size();
        lok!("Created {}x{} GLFW window.", w, h);

        Ok(Glfw_Platform {
            glfw,
            window,
            events,
            title: String::from(title),
            real_size: (w.max(1) as u32, h.max(1) as u32),
        })
    }
}

// GLFW errors are only logged: a failed init or window creation is then reported
// through the return values and turns into Platform_Context_Failure.
fn error_callback() -> glfw::ErrorCallback<()> {
    glfw::Callback {
        f: log_glfw_error as fn(glfw::Error, String, &()),
        data: (),
    }
}

fn log_glfw_error(err: glfw::Error, description: String, _: &()) {
    lerr!("GLFW error {:?}: {}", err, description);
}

fn map_key(key: glfw::Key) -> Option<Key> {
    match key {
        glfw::Key::Left | glfw::Key::A => Some(Key::Left),
        glfw::Key::Right | glfw::Key::D => Some(Key::Right),
        glfw::Key::Up | glfw::Key::W => Some(Key::Up),
        glfw::Key::Down | glfw::Key::S => Some(Key::Down),
        glfw::Key::Space => Some(Key::Space),
        glfw::Key::Escape => Some(Key::Escape),
        glfw::Key::F5 => Some(Key::F5),
        glfw::Key::F6 => Some(Key::F6),
        _ => None,
    }
}

impl Platform for Glfw_Platform {
    fn poll_events(&mut self, input: &mut Frame_Input) {
        self.glfw.poll_events();
        for (_, evt) in glfw::flush_messages(&self.events) {
            match evt {
                glfw::WindowEvent::Key(key, _, action, _) => {
                    if let Some(key) = map_key(key) {
                        match action {
                            glfw::Action::Press => input.set_key(key, true),
                            glfw::Action::Release => input.set_key(key, false),
                            glfw::Action::Repeat => {}
                        }
                    }
                }
                glfw::WindowEvent::CursorPos(x, y) => input.cursor = [x as f32, y as f32],
                glfw::WindowEvent::FramebufferSize(w, h) => {
                    self.real_size = (w.max(1) as u32, h.max(1) as u32);
                    unsafe { gl::Viewport(0, 0, w, h) };
                }
                glfw::WindowEvent::Close => input.close_requested = true,
                _ => {}
            }
        }
        input.window_size = [self.real_size.0, self.real_size.1];
    }

    fn present(&mut self, commands: &[Draw_Command]) {
        let height = self.real_size.1 as i32;
        unsafe {
            for cmd in commands {
                let [r, g, b, a] = cmd.color;
                gl::ClearColor(
                    f32::from(r) / 255.,
                    f32::from(g) / 255.,
                    f32::from(b) / 255.,
                    f32::from(a) / 255.,
                );
                match cmd.kind {
                    Draw_Kind::Clear => {
                        gl::Disable(gl::SCISSOR_TEST);
                        gl::Clear(gl::COLOR_BUFFER_BIT);
                    }
                    Draw_Kind::Rect => {
                        // Solid rects are scissored clears: GL's origin is bottom-left.
                        let [x, y, w, h] = cmd.rect;
                        gl::Enable(gl::SCISSOR_TEST);
                        gl::Scissor(
                            x as i32,
                            height - (y + h) as i32,
                            w.max(0.) as i32,
                            h.max(0.) as i32,
                        );
                        gl::Clear(gl::COLOR_BUFFER_BIT);
                    }
                }
            }
            gl::Disable(gl::SCISSOR_TEST);
        }
        self.window.swap_buffers();
    }

    fn should_close(&self) -> bool {
        self.window.should_close()
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.window
            .set_title(&format!("{} - {}", self.title, notice));
    }
}
