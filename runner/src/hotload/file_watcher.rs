use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Watches the directory containing the artifact. The notification callback only raises
/// a flag: the supervisor still decides everything from its own probes.
pub struct Artifact_Watcher {
    // Watching stops when this is dropped.
    _watcher: RecommendedWatcher,
    changed: Arc<AtomicBool>,
}

fn event_touches(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

impl Artifact_Watcher {
    pub fn start(artifact: &Path) -> notify::Result<Self> {
        let file_name = artifact
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("artifact path has no file name"))?;
        let dir = match artifact.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };

        let changed = Arc::new(AtomicBool::new(false));
        let flag = changed.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_touches(&event, &file_name) {
                    flag.store(true, Ordering::Release);
                }
            }
            Err(err) => lerr_once!("file watcher", "Artifact watcher error: {}", err),
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        linfo!("Started watching {:?}", dir);

        Ok(Artifact_Watcher {
            _watcher: watcher,
            changed,
        })
    }

    /// Returns whether the artifact was touched since the last call.
    pub fn take_changed(&self) -> bool {
        self.changed.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::path::PathBuf;

    #[test]
    fn only_events_on_the_artifact_count() {
        let name = OsString::from("liblively_game.so");
        let on_artifact = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/target/debug/liblively_game.so"));
        let on_other = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/target/debug/liblively_game-hot-1-0.so"));
        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/target/debug/liblively_game.so"));

        assert!(event_touches(&on_artifact, &name));
        assert!(!event_touches(&on_other, &name));
        assert!(!event_touches(&access, &name));
    }
}
