use super::error::Runner_Error;
use super::variant;
use lively_cfg::Config;
use lively_core::env::Env_Info;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cmdline_Args {
    pub cfg_dir: Option<PathBuf>,
    pub artifact: Option<PathBuf>,
    pub max_frames: Option<u64>,
    pub quiescence_ms: Option<u64>,
    pub verbose: bool,
}

macro_rules! opt_with_arg {
    ($opt: expr, $args: ident, $target: expr, $conv_fn: expr) => {{
        if let Some(opt) = $args.next() {
            $target = $conv_fn(opt);
            linfo!("Cmdline {}: {:?}", $opt, $target);
        } else {
            lerr!("Expected an argument after {} flag.", $opt);
        }
    }};
}

pub fn parse_cmdline_args<'a>(mut args: impl Iterator<Item = &'a String>) -> Cmdline_Args {
    // Consume program name
    args.next();

    let mut cmdline_args = Cmdline_Args::default();

    while let Some(arg) = args.next() {
        match arg as &str {
            "--cfg" => opt_with_arg!("--cfg", args, cmdline_args.cfg_dir, |p: &String| Some(
                PathBuf::from(p)
            )),
            "--artifact" => opt_with_arg!(
                "--artifact",
                args,
                cmdline_args.artifact,
                |p: &String| Some(PathBuf::from(p))
            ),
            "--frames" => opt_with_arg!("--frames", args, cmdline_args.max_frames, |n: &String| n
                .parse::<u64>()
                .ok()),
            "--quiescence" => opt_with_arg!(
                "--quiescence",
                args,
                cmdline_args.quiescence_ms,
                |n: &String| n.parse::<u64>().ok()
            ),
            "-v" | "--verbose" => cmdline_args.verbose = true,
            _ => lwarn!("Unknown argument {}", arg),
        }
    }

    cmdline_args
}

#[derive(Clone, Debug, PartialEq)]
pub struct Runner_Config {
    pub title: String,
    pub window_size: (u32, u32),
    /// 0 means no frame limiter.
    pub target_fps: u32,
    pub max_dt: Duration,
    pub max_frames: Option<u64>,
    pub draw_capacity: usize,
    /// Enables `lverbose!` output (debug builds only).
    pub verbose: bool,

    pub artifact: PathBuf,
    pub quiescence: Duration,
    /// Zero probes the artifact every frame.
    pub poll_interval: Duration,
    pub use_fs_events: bool,
    pub dump_lost_state: bool,
    /// Where lost state snapshots are written.
    pub dump_dir: PathBuf,
}

impl Default for Runner_Config {
    fn default() -> Self {
        Runner_Config {
            title: String::from("Lively"),
            window_size: (960, 540),
            target_fps: 60,
            max_dt: Duration::from_millis(100),
            max_frames: None,
            draw_capacity: 1024,
            verbose: false,
            artifact: PathBuf::from(variant::default_artifact_name()),
            quiescence: Duration::from_millis(300),
            poll_interval: Duration::default(),
            use_fs_events: true,
            dump_lost_state: false,
            dump_dir: PathBuf::from("."),
        }
    }
}

impl Runner_Config {
    /// Reads every .cfg file in the cfg directory, then applies the command line on top.
    pub fn load(env: &Env_Info, args: &Cmdline_Args) -> Result<Runner_Config, Runner_Error> {
        let cfg_dir = match &args.cfg_dir {
            Some(dir) => dir.clone(),
            None => env.cfg_root.to_path_buf(),
        };
        let cfg = if cfg_dir.is_dir() {
            Config::new_from_dir(&cfg_dir).map_err(|err| {
                Runner_Error::Config(format!("failed to read cfg dir {:?}: {}", cfg_dir, err))
            })?
        } else if args.cfg_dir.is_some() {
            return Err(Runner_Error::Config(format!(
                "cfg dir {:?} does not exist",
                cfg_dir
            )));
        } else {
            lwarn!("No cfg dir at {:?}: using defaults.", cfg_dir);
            Config::new_from_sections(vec![])
        };

        let mut config = Self::from_cfg(&cfg, &env.exe_dir, &env.working_dir);
        config.apply_cmdline(args, &env.working_dir);
        config.validate()?;
        Ok(config)
    }

    pub fn from_cfg(cfg: &Config, exe_dir: &Path, working_dir: &Path) -> Runner_Config {
        let def = Runner_Config::default();
        let artifact = match cfg.read::<String>("hotload/artifact") {
            Some(path) if !path.is_empty() => working_dir.join(path),
            _ => exe_dir.join(&def.artifact),
        };

        Runner_Config {
            title: cfg.read_or("runner/title", def.title),
            window_size: (
                cfg.read_or("runner/window_width", def.window_size.0),
                cfg.read_or("runner/window_height", def.window_size.1),
            ),
            target_fps: cfg.read_or("runner/target_fps", def.target_fps),
            max_dt: read_ms(cfg, "runner/max_dt_ms").unwrap_or(def.max_dt),
            max_frames: cfg
                .read::<u64>("runner/max_frames")
                .filter(|&n| n > 0)
                .or(def.max_frames),
            draw_capacity: cfg
                .read::<u32>("runner/draw_capacity")
                .map_or(def.draw_capacity, |n| n as usize),
            verbose: cfg.read_or("runner/verbose", def.verbose),
            artifact,
            quiescence: read_ms(cfg, "hotload/quiescence_ms").unwrap_or(def.quiescence),
            poll_interval: read_ms(cfg, "hotload/poll_interval_ms").unwrap_or(def.poll_interval),
            use_fs_events: cfg.read_or("hotload/use_fs_events", def.use_fs_events),
            dump_lost_state: cfg.read_or("hotload/dump_lost_state", def.dump_lost_state),
            dump_dir: working_dir.to_path_buf(),
        }
    }

    pub fn apply_cmdline(&mut self, args: &Cmdline_Args, working_dir: &Path) {
        if let Some(artifact) = &args.artifact {
            self.artifact = working_dir.join(artifact);
        }
        if let Some(n) = args.max_frames {
            self.max_frames = Some(n).filter(|&n| n > 0);
        }
        if let Some(ms) = args.quiescence_ms {
            self.quiescence = Duration::from_millis(ms);
        }
        self.verbose |= args.verbose;
    }

    pub fn validate(&self) -> Result<(), Runner_Error> {
        if self.draw_capacity == 0 {
            return Err(Runner_Error::Config(String::from(
                "runner/draw_capacity must be greater than 0",
            )));
        }
        if self.window_size.0 == 0 || self.window_size.1 == 0 {
            return Err(Runner_Error::Config(format!(
                "invalid window size {:?}",
                self.window_size
            )));
        }
        Ok(())
    }

    /// None if the frame rate is uncapped.
    pub fn frame_time(&self) -> Option<Duration> {
        if self.target_fps == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1. / f64::from(self.target_fps)))
        }
    }
}

fn read_ms(cfg: &Config, path: &str) -> Option<Duration> {
    cfg.read::<u64>(path).map(Duration::from_millis)
}
