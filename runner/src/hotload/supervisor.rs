use super::artifact::{Artifact_Probe, Artifact_Stamp, Quiescence_Tracker};
use super::file_watcher::Artifact_Watcher;
use crate::config::Runner_Config;
use crate::error::Runner_Error;
use crate::host::Reload_Hook;
use crate::module::Module_Handle;
use crate::notice::{Notice_Kind, Notice_Log};
use crate::session::{Game_Session, Swap_Failure, Swap_Outcome};
use std::path::PathBuf;
use std::time::Duration;

pub trait Module_Loader {
    fn load(&mut self, generation: u32) -> Result<Module_Handle, Runner_Error>;
}

#[derive(Clone, Debug)]
pub struct Reload_Config {
    pub quiescence: Duration,
    pub poll_interval: Duration,
    pub dump_lost_state: bool,
    pub dump_dir: PathBuf,
}

impl From<&Runner_Config> for Reload_Config {
    fn from(cfg: &Runner_Config) -> Self {
        Reload_Config {
            quiescence: cfg.quiescence,
            poll_interval: cfg.poll_interval,
            dump_lost_state: cfg.dump_lost_state,
            dump_dir: cfg.dump_dir.clone(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reload_State {
    Stable,
    /// The artifact changed and is probably still being written.
    Compilation_Pending(Quiescence_Tracker),
    Swap_Pending {
        stamp: Option<Artifact_Stamp>,
        forced: bool,
    },
    /// A swap just happened. Lasts until the next poll.
    Swapped { generation: u32 },
    /// The artifact with this stamp could not be loaded: the previous module keeps running.
    Failed { stamp: Option<Artifact_Stamp> },
}

/// Watches the game artifact and swaps the running module when it changes.
/// Runs on the main thread between frames, so a swap never overlaps an update or draw.
pub struct Reload_Supervisor<L: Module_Loader, P: Artifact_Probe> {
    loader: L,
    probe: P,
    config: Reload_Config,
    state: Reload_State,
    /// Stamp of the artifact the running module was loaded from.
    loaded_stamp: Option<Artifact_Stamp>,
    last_probe: Option<Duration>,
    watcher: Option<Artifact_Watcher>,
    force_requested: bool,
    n_swaps: u32,
    n_failures: u32,
}

impl<L: Module_Loader, P: Artifact_Probe> Reload_Supervisor<L, P> {
    pub fn new(loader: L, probe: P, config: Reload_Config) -> Self {
        let loaded_stamp = probe.stamp();
        Reload_Supervisor {
            loader,
            probe,
            config,
            state: Reload_State::Stable,
            loaded_stamp,
            last_probe: None,
            watcher: None,
            force_requested: false,
            n_swaps: 0,
            n_failures: 0,
        }
    }

    pub fn with_watcher(mut self, watcher: Artifact_Watcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn state(&self) -> Reload_State {
        self.state
    }

    pub fn n_swaps(&self) -> u32 {
        self.n_swaps
    }

    pub fn n_failures(&self) -> u32 {
        self.n_failures
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Swaps at the next poll without waiting for the artifact to change.
    pub fn request_reload(&mut self) {
        self.force_requested = true;
    }

    pub fn poll(&mut self, now: Duration, session: &mut Game_Session, notices: &mut Notice_Log) {
        let forced = std::mem::take(&mut self.force_requested) | session.force_reload_requested();
        let fs_event = self.watcher.as_ref().map_or(false, Artifact_Watcher::take_changed);

        if let Reload_State::Swapped { .. } = self.state {
            self.state = Reload_State::Stable;
        }

        if forced {
            linfo!("Reload was forced.");
            self.state = Reload_State::Swap_Pending {
                stamp: self.probe.stamp(),
                forced: true,
            };
        }

        match self.state {
            Reload_State::Stable | Reload_State::Failed { .. } => {
                if self.should_probe(now, fs_event) {
                    self.last_probe = Some(now);
                    let stamp = self.probe.stamp();
                    if self.is_new_artifact(stamp) {
                        ldebug!("Game artifact changed: {:?}", stamp);
                        self.state =
                            Reload_State::Compilation_Pending(Quiescence_Tracker::new(stamp, now));
                    } else if stamp.is_some() && stamp == self.loaded_stamp {
                        self.state = Reload_State::Stable;
                    }
                }
            }
            Reload_State::Compilation_Pending(mut tracker) => {
                let stamp = self.probe.stamp();
                self.state = match tracker.observe(stamp, now, self.config.quiescence) {
                    Some(settled) if Some(settled) == self.loaded_stamp => Reload_State::Stable,
                    Some(settled) => Reload_State::Swap_Pending {
                        stamp: Some(settled),
                        forced: false,
                    },
                    None => Reload_State::Compilation_Pending(tracker),
                };
            }
            Reload_State::Swap_Pending { .. } | Reload_State::Swapped { .. } => {}
        }

        if let Reload_State::Swap_Pending { stamp, .. } = self.state {
            self.swap(stamp, session, notices);
        }
    }

    fn should_probe(&self, now: Duration, fs_event: bool) -> bool {
        fs_event
            || self.config.poll_interval == Duration::default()
            || self.last_probe.map_or(true, |last| {
                now.checked_sub(last).unwrap_or_default() >= self.config.poll_interval
            })
    }

    fn is_new_artifact(&self, stamp: Option<Artifact_Stamp>) -> bool {
        if stamp.is_none() || stamp == self.loaded_stamp {
            return false;
        }
        match self.state {
            // Don't retry the same broken artifact over and over.
            Reload_State::Failed { stamp: failed } => stamp != failed,
            _ => true,
        }
    }

    fn swap(
        &mut self,
        stamp: Option<Artifact_Stamp>,
        session: &mut Game_Session,
        notices: &mut Notice_Log,
    ) {
        let generation = session.generation() + 1;
        linfo!("Swapping in game module generation {}...", generation);

        let module = match self.loader.load(generation) {
            Ok(module) => module,
            Err(err) => return self.fail(stamp, &err, session, notices),
        };

        match session.swap_module(module, self.config.dump_lost_state) {
            Ok(Swap_Outcome::Preserved) => {
                notices.push(
                    Notice_Kind::Reloaded,
                    format!("Game module generation {} is running, state preserved.", generation),
                );
            }
            Ok(Swap_Outcome::Reinitialized { from, to, snapshot }) => {
                let mut message = Runner_Error::State_Incompatible { from, to }.to_string();
                if let Some(snapshot) = snapshot {
                    match snapshot.dump(&self.config.dump_dir) {
                        Ok(path) => message.push_str(&format!(" (old state dumped to {})", path.display())),
                        Err(err) => lwarn!("Failed to dump lost state: {}", err),
                    }
                }
                notices.push(Notice_Kind::State_Lost, message);
            }
            Err(Swap_Failure { error, rejected }) => {
                // Closes the new image: the old one was never touched.
                drop(rejected);
                return self.fail(stamp, &error, session, notices);
            }
        }

        self.loaded_stamp = stamp;
        self.state = Reload_State::Swapped { generation };
        self.n_swaps += 1;
    }

    fn fail(
        &mut self,
        stamp: Option<Artifact_Stamp>,
        err: &Runner_Error,
        session: &Game_Session,
        notices: &mut Notice_Log,
    ) {
        notices.push(
            Notice_Kind::Reload_Failed,
            format!(
                "{}. Still running generation {}.",
                err,
                session.generation()
            ),
        );
        self.state = Reload_State::Failed { stamp };
        self.n_failures += 1;
    }
}

impl<L: Module_Loader, P: Artifact_Probe> Reload_Hook for Reload_Supervisor<L, P> {
    fn between_frames(&mut self, now: Duration, session: &mut Game_Session, notices: &mut Notice_Log) {
        self.poll(now, session, notices);
    }
}
