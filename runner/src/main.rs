#![warn(clippy::all)]
#![allow(non_camel_case_types)]

#[cfg(not(target_arch = "wasm32"))]
#[macro_use]
extern crate lively_diagnostics;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use lively_core::env::Env_Info;
    use lively_runner::config::{parse_cmdline_args, Runner_Config};
    use lively_runner::{Build_Variant, Host, Runner_Error};

    #[cfg(feature = "win-glfw")]
    fn create_platform(
        config: &Runner_Config,
    ) -> Result<lively_runner::platform::glfw::Glfw_Platform, Runner_Error> {
        lively_runner::platform::glfw::Glfw_Platform::new(&config.title, config.window_size)
    }

    #[cfg(not(feature = "win-glfw"))]
    fn create_platform(
        config: &Runner_Config,
    ) -> Result<lively_runner::platform::Headless_Platform, Runner_Error> {
        if config.max_frames.is_none() {
            lwarn!("Running headless without a frame limit: stop with Ctrl-C or let the game quit.");
        }
        Ok(lively_runner::platform::Headless_Platform::new(
            config.window_size,
        ))
    }

    #[cfg(feature = "static-game")]
    pub fn run(config: &Runner_Config) -> Result<(), Runner_Error> {
        let platform = create_platform(config)?;
        let module = lively_runner::Module_Handle::new_static(lively_game::game_api());
        Host::new(platform, module, (), config)?.run();
        Ok(())
    }

    #[cfg(all(feature = "hot-reload", not(feature = "static-game")))]
    pub fn run(config: &Runner_Config) -> Result<(), Runner_Error> {
        use lively_runner::hotload::file_watcher::Artifact_Watcher;
        use lively_runner::hotload::supervisor::Reload_Config;
        use lively_runner::hotload::{self, Dylib_Loader, Fs_Probe, Module_Loader, Reload_Supervisor};

        linfo!("Game artifact: {:?}", config.artifact);
        hotload::remove_stale_copies(&config.artifact);

        let mut loader = Dylib_Loader::new(config.artifact.clone());
        let module = loader.load(0)?;
        let probe = Fs_Probe::new(config.artifact.clone());
        let mut supervisor = Reload_Supervisor::new(loader, probe, Reload_Config::from(config));
        if config.use_fs_events {
            match Artifact_Watcher::start(&config.artifact) {
                Ok(watcher) => supervisor = supervisor.with_watcher(watcher),
                Err(err) => lwarn!("Not watching the artifact: {}. Falling back to polling.", err),
            }
        }

        let platform = create_platform(config)?;
        Host::new(platform, module, supervisor, config)?.run();
        Ok(())
    }

    pub fn main() -> i32 {
        lively_diagnostics::add_default_logger();
        linfo!("Lively runner ({})", Build_Variant::current());

        let args: Vec<String> = std::env::args().collect();
        let cmdline_args = parse_cmdline_args(args.iter());

        let result = Env_Info::gather()
            .map_err(Runner_Error::from)
            .and_then(|env| Runner_Config::load(&env, &cmdline_args))
            .and_then(|config| {
                lively_diagnostics::set_verbose(config.verbose);
                run(&config)
            });

        match result {
            Ok(()) => 0,
            Err(err) => {
                lerr!("{}", err);
                err.exit_code()
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    std::process::exit(native::main());
}

// The web build starts from the library's wasm_bindgen entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}
