use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// What we know about the artifact file without reading it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Artifact_Stamp {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

pub trait Artifact_Probe {
    /// None if the artifact doesn't exist (e.g. the compiler is rewriting it).
    fn stamp(&self) -> Option<Artifact_Stamp>;
}

/// Probes the artifact with a single stat.
pub struct Fs_Probe {
    pub path: PathBuf,
}

impl Fs_Probe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Fs_Probe { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Artifact_Probe for Fs_Probe {
    fn stamp(&self) -> Option<Artifact_Stamp> {
        let meta = std::fs::metadata(&self.path).ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(Artifact_Stamp {
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Tracks a changing artifact until it has been left alone for `quiescence`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quiescence_Tracker {
    pub stamp: Option<Artifact_Stamp>,
    pub since: Duration,
}

impl Quiescence_Tracker {
    pub fn new(stamp: Option<Artifact_Stamp>, now: Duration) -> Self {
        Quiescence_Tracker { stamp, since: now }
    }

    /// Feeds the latest observation. Returns the stamp once it stayed the same, and the
    /// file existed, for at least `quiescence`.
    pub fn observe(
        &mut self,
        stamp: Option<Artifact_Stamp>,
        now: Duration,
        quiescence: Duration,
    ) -> Option<Artifact_Stamp> {
        if stamp != self.stamp {
            self.stamp = stamp;
            self.since = now;
            return None;
        }
        let settled = now.checked_sub(self.since).unwrap_or_default() >= quiescence;
        if settled {
            self.stamp
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn stamp(size: u64) -> Option<Artifact_Stamp> {
        Some(Artifact_Stamp {
            size,
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(size)),
        })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn settles_after_quiescence() {
        let q = ms(300);
        let mut t = Quiescence_Tracker::new(stamp(10), ms(0));
        assert_eq!(t.observe(stamp(10), ms(100), q), None);
        assert_eq!(t.observe(stamp(10), ms(299), q), None);
        assert_eq!(t.observe(stamp(10), ms(300), q), stamp(10));
    }

    #[test]
    fn every_change_restarts_the_wait() {
        let q = ms(300);
        let mut t = Quiescence_Tracker::new(stamp(10), ms(0));
        assert_eq!(t.observe(stamp(20), ms(250), q), None);
        assert_eq!(t.observe(stamp(20), ms(500), q), None);
        assert_eq!(t.observe(stamp(20), ms(550), q), stamp(20));
    }

    #[test]
    fn missing_file_never_settles() {
        let q = ms(10);
        let mut t = Quiescence_Tracker::new(None, ms(0));
        assert_eq!(t.observe(None, ms(1000), q), None);
    }

    #[test]
    fn fs_probe_follows_the_file() {
        let dir = lively_test::temp_dir();
        let path = dir.path().join("liblively_game.so");
        let probe = Fs_Probe::new(&path);
        assert_eq!(probe.stamp(), None);

        fs::write(&path, b"1234").unwrap();
        let first = probe.stamp().unwrap();
        assert_eq!(first.size, 4);

        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"5678").unwrap();
        drop(file);
        let second = probe.stamp().unwrap();
        assert_eq!(second.size, 8);
        assert_ne!(first, second);

        // Directories are not artifacts.
        assert_eq!(Fs_Probe::new(dir.path()).stamp(), None);
    }
}
