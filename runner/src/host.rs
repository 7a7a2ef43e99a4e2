use super::config::Runner_Config;
use super::error::Runner_Error;
use super::module::Module_Handle;
use super::notice::{Notice_Kind, Notice_Log};
use super::platform::Platform;
use super::session::Game_Session;
use lively_api::{Draw_List, Frame_Input};
use lively_core::time::Time;
use std::time::Duration;

/// Runs between two frames. In hot reload builds this is the reload supervisor; static
/// builds use `()`.
pub trait Reload_Hook {
    fn between_frames(&mut self, now: Duration, session: &mut Game_Session, notices: &mut Notice_Log);
}

impl Reload_Hook for () {
    fn between_frames(&mut self, _now: Duration, _session: &mut Game_Session, _notices: &mut Notice_Log) {}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step_Result {
    Continue,
    Quit,
}

pub struct Host<P: Platform, R: Reload_Hook = ()> {
    // Declared first: the game must shut down before the platform goes away.
    session: Game_Session,
    platform: P,
    reload: R,

    time: Time,
    input: Frame_Input,
    draw_list: Draw_List,
    notices: Notice_Log,
    cur_frame: u64,
    max_frames: Option<u64>,
    frame_time: Option<Duration>,
    sleep_granularity: Option<Duration>,
}

impl<P: Platform, R: Reload_Hook> Host<P, R> {
    /// Binds the module and asks it for its initial state.
    pub fn new(
        platform: P,
        module: Module_Handle,
        reload: R,
        config: &Runner_Config,
    ) -> Result<Self, Runner_Error> {
        linfo!("Starting game module with state {}", module.descriptor);
        let session = Game_Session::new(module)?;

        #[cfg(not(target_arch = "wasm32"))]
        let sleep_granularity = match lively_core::sleep::init_sleep() {
            Ok(granularity) => {
                ldebug!("Sleep granularity: {:?}", granularity);
                Some(granularity)
            }
            Err(err) => {
                lwarn!("Failed to initialize sleep: {}", err);
                None
            }
        };
        #[cfg(target_arch = "wasm32")]
        let sleep_granularity = None;

        Ok(Host {
            session,
            platform,
            reload,
            time: Time::with_max_dt(config.max_dt),
            input: Frame_Input::default(),
            draw_list: Draw_List::with_capacity(config.draw_capacity),
            notices: Notice_Log::default(),
            cur_frame: 0,
            max_frames: config.max_frames,
            frame_time: config.frame_time(),
            sleep_granularity,
        })
    }

    /// One frame: input, update, draw, close check, then whatever runs between frames.
    /// `now` is the time elapsed since the host started.
    pub fn step(&mut self, now: Duration) -> Step_Result {
        self.cur_frame += 1;
        self.notices.set_frame(self.cur_frame);
        self.input.begin_frame(self.cur_frame);
        self.platform.poll_events(&mut self.input);

        self.time.update(now);
        self.session.update(&self.input, self.time.dt_secs());

        let mut ctx = self.draw_list.begin();
        self.session.draw(&mut ctx);
        self.draw_list.end(&ctx);
        if ctx.is_full() {
            lwarn_once!("draw list full", "Draw list is full ({} commands): later commands are dropped.", ctx.capacity);
        }
        self.platform.present(self.draw_list.commands());

        if self.session.should_close() {
            linfo!("Game asked to close at frame {}.", self.cur_frame);
            return Step_Result::Quit;
        }
        if self.platform.should_close() {
            linfo!("Platform closed at frame {}.", self.cur_frame);
            return Step_Result::Quit;
        }
        if self.max_frames.map_or(false, |max| self.cur_frame >= max) {
            linfo!("Reached the frame limit ({}).", self.cur_frame);
            return Step_Result::Quit;
        }

        if self.session.force_restart_requested() {
            match self.session.restart() {
                Ok(()) => self
                    .notices
                    .push(Notice_Kind::Restarted, "Game restarted from a fresh state."),
                Err(err) => lerr!("Failed to restart the game: {}. Keeping the current state.", err),
            }
        }

        self.reload
            .between_frames(now, &mut self.session, &mut self.notices);

        for notice in self.notices.take_unshown() {
            self.platform.show_notice(&notice);
        }

        Step_Result::Continue
    }

    /// Runs frames until the game or the platform asks to stop, then shuts everything down.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run(mut self) {
        let t_start = std::time::Instant::now();
        loop {
            let t_before_work = std::time::Instant::now();
            if self.step(t_start.elapsed()) == Step_Result::Quit {
                break;
            }
            if let Some(frame_time) = self.frame_time {
                limit_framerate(t_before_work, frame_time, self.sleep_granularity, self.cur_frame);
            }
        }
        self.shutdown();
    }

    /// The game's shutdown runs once, then the platform is released.
    pub fn shutdown(self) {
        let Host {
            session, platform, ..
        } = self;
        session.shutdown();
        drop(platform);
        lok!("Host shut down.");
    }

    pub fn session(&self) -> &Game_Session {
        &self.session
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn reload_hook_mut(&mut self) -> &mut R {
        &mut self.reload
    }

    pub fn notices(&self) -> &Notice_Log {
        &self.notices
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn cur_frame(&self) -> u64 {
        self.cur_frame
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn limit_framerate(
    t_before_work: std::time::Instant,
    target_time_per_frame: Duration,
    sleep_granularity: Option<Duration>,
    cur_frame: u64,
) {
    let t_elapsed_for_work = t_before_work.elapsed();
    if t_elapsed_for_work < target_time_per_frame {
        if let Some(granularity) = sleep_granularity {
            lively_core::sleep::sleep_rest_of_frame(
                t_elapsed_for_work,
                target_time_per_frame,
                granularity,
            );
        }
        while t_before_work.elapsed() < target_time_per_frame {
            std::hint::spin_loop();
        }
    } else {
        lverbose!(
            "Frame budget exceeded! At frame {}: {} / {} ms",
            cur_frame,
            lively_core::time::to_ms_frac(&t_elapsed_for_work),
            lively_core::time::to_ms_frac(&target_time_per_frame)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Headless_Platform;
    use lively_api::Key;
    use lively_test::fake_modules::{self, read_state, v1, Fake_State};

    fn test_config() -> Runner_Config {
        Runner_Config {
            target_fps: 0,
            ..Default::default()
        }
    }

    fn host(config: &Runner_Config) -> Host<Headless_Platform> {
        fake_modules::reset_all();
        Host::new(
            Headless_Platform::new((320, 200)),
            Module_Handle::new_static(v1::api()),
            (),
            config,
        )
        .unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn runs_until_the_game_closes() {
        let mut h = host(&test_config());
        v1::close_at(5);
        let mut n_frames = 0;
        while h.step(ms(n_frames * 16)) == Step_Result::Continue {
            n_frames += 1;
            assert!(n_frames < 100);
        }
        assert_eq!(h.cur_frame(), 5);
        assert_eq!(v1::calls().updates, 5);
        assert_eq!(v1::calls().draws, 5);
        assert_eq!(h.platform().n_presented, 5);
        // The fake module draws one rect at x = ticks.
        assert_eq!(h.platform().last_commands[0].rect[0], 5.);

        h.shutdown();
        assert_eq!(v1::calls().shutdowns, 1);
    }

    #[test]
    fn frame_limit_stops_the_host() {
        let config = Runner_Config {
            max_frames: Some(3),
            ..test_config()
        };
        let h = host(&config);
        h.run();
        assert_eq!(v1::calls().updates, 3);
        assert_eq!(v1::calls().shutdowns, 1);
    }

    #[test]
    fn dropping_the_host_shuts_the_game_down() {
        {
            let mut h = host(&test_config());
            h.step(ms(0));
        }
        assert_eq!(v1::calls().shutdowns, 1);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut h = host(&test_config());
        h.step(ms(0));
        h.step(ms(5000));
        assert_eq!(h.time().real_dt(), ms(5000));
        assert_eq!(h.time().dt(), ms(100));
    }

    #[test]
    fn forced_restart_reinitializes_and_shows_a_notice() {
        let mut h = host(&test_config());
        for i in 0..4 {
            h.step(ms(i * 16));
        }
        v1::request_restart();
        h.step(ms(64));

        let state = unsafe { read_state::<v1::State>(h.session().state_handle()) }.unwrap();
        assert_eq!(state.ticks(), 0);
        assert_eq!(v1::calls().inits, 2);
        assert_eq!(v1::calls().shutdowns, 1);
        assert_eq!(h.notices().count(Notice_Kind::Restarted), 1);
        assert_eq!(h.platform().shown_notices.len(), 1);
        assert!(h.platform().shown_notices[0].starts_with("[RESTARTED]"));
    }

    #[test]
    fn input_reaches_the_platform_frame() {
        let mut h = host(&test_config());
        h.platform_mut().tap_key_at(2, Key::Space);
        h.step(ms(0));
        assert!(!h.input.is_down(Key::Space));
        h.step(ms(16));
        assert!(h.input.was_pressed(Key::Space));
        assert_eq!(h.input.window_size, [320, 200]);
    }

    #[cfg(feature = "static-game")]
    #[test]
    fn demo_game_runs_headless() {
        let config = Runner_Config {
            max_frames: Some(120),
            ..test_config()
        };
        let mut h = Host::new(
            Headless_Platform::new((640, 360)),
            Module_Handle::new_static(lively_game::game_api()),
            (),
            &config,
        )
        .unwrap();
        h.platform_mut().tap_key_at(60, Key::F6);
        let mut t = 0;
        while h.step(ms(t)) == Step_Result::Continue {
            t += 16;
        }
        assert_eq!(h.cur_frame(), 120);
        assert_eq!(h.notices().count(Notice_Kind::Restarted), 1);
        assert!(!h.platform().last_commands.is_empty());
        h.shutdown();
    }
}
