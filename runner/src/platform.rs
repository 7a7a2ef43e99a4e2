#[cfg(all(feature = "win-glfw", not(target_arch = "wasm32")))]
pub mod glfw;
#[cfg(target_arch = "wasm32")]
pub mod web;

use super::notice::Notice;
use lively_api::{Draw_Command, Frame_Input, Key};

/// The host's window/graphics/input collaborator. The game module never sees it: it gets a
/// `Frame_Input` filled by `poll_events` and fills the commands that `present` draws.
pub trait Platform {
    fn poll_events(&mut self, input: &mut Frame_Input);
    fn present(&mut self, commands: &[Draw_Command]);
    /// The platform is going away regardless of what the game wants (e.g. the window was
    /// destroyed).
    fn should_close(&self) -> bool;
    fn show_notice(&mut self, notice: &Notice);
}

/// No window at all: used by tests and by the headless runner.
/// Key events can be scripted per frame.
#[derive(Default)]
pub struct Headless_Platform {
    pub window_size: (u32, u32),
    key_script: Vec<(u64, Key, bool)>,
    close_at: Option<u64>,
    cur_frame: u64,

    pub n_presented: u64,
    pub last_commands: Vec<Draw_Command>,
    pub shown_notices: Vec<String>,
}

impl Headless_Platform {
    pub fn new(window_size: (u32, u32)) -> Self {
        Headless_Platform {
            window_size,
            ..Default::default()
        }
    }

    /// `key` goes down at frame `frame` and up at the next one.
    pub fn tap_key_at(&mut self, frame: u64, key: Key) {
        self.key_script.push((frame, key, true));
        self.key_script.push((frame + 1, key, false));
    }

    /// Simulates the user closing the window at frame `frame`.
    pub fn request_close_at(&mut self, frame: u64) {
        self.close_at = Some(frame);
    }
}

impl Platform for Headless_Platform {
    fn poll_events(&mut self, input: &mut Frame_Input) {
        self.cur_frame = input.frame;
        input.window_size = [self.window_size.0, self.window_size.1];
        for &(frame, key, down) in &self.key_script {
            if frame == input.frame {
                input.set_key(key, down);
            }
        }
        input.close_requested = self.close_at.map_or(false, |f| input.frame >= f);
    }

    fn present(&mut self, commands: &[Draw_Command]) {
        self.n_presented += 1;
        self.last_commands.clear();
        self.last_commands.extend_from_slice(commands);
    }

    fn should_close(&self) -> bool {
        false
    }

    fn show_notice(&mut self, notice: &Notice) {
        self.shown_notices.push(notice.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_keys_are_edge_triggered() {
        let mut p = Headless_Platform::new((100, 50));
        p.tap_key_at(2, Key::F5);

        let mut input = Frame_Input::default();
        input.begin_frame(1);
        p.poll_events(&mut input);
        assert!(!input.is_down(Key::F5));
        assert_eq!(input.window_size, [100, 50]);

        input.begin_frame(2);
        p.poll_events(&mut input);
        assert!(input.was_pressed(Key::F5));

        input.begin_frame(3);
        p.poll_events(&mut input);
        assert!(!input.is_down(Key::F5));
        assert!(!input.was_pressed(Key::F5));
    }

    #[test]
    fn scripted_close() {
        let mut p = Headless_Platform::new((1, 1));
        p.request_close_at(2);
        let mut input = Frame_Input::default();
        input.begin_frame(1);
        p.poll_events(&mut input);
        assert!(!input.close_requested);
        input.begin_frame(2);
        p.poll_events(&mut input);
        assert!(input.close_requested);
    }

    #[test]
    fn present_keeps_last_frame() {
        let mut p = Headless_Platform::default();
        p.present(&[Draw_Command::clear([0; 4]), Draw_Command::rect(0., 0., 1., 1., [1; 4])]);
        p.present(&[Draw_Command::clear([0; 4])]);
        assert_eq!(p.n_presented, 2);
        assert_eq!(p.last_commands.len(), 1);
    }
}
