pub mod artifact;
pub mod file_watcher;
pub mod supervisor;

pub use artifact::{Artifact_Probe, Artifact_Stamp, Fs_Probe};
pub use supervisor::{Module_Loader, Reload_State, Reload_Supervisor};

use super::error::Runner_Error;
use super::game_api::game_load;
use super::module::{Module_Handle, Module_Image};
use libloading as ll;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Marks the unique copies we load, so stale ones can be recognized.
const UNIQUE_COPY_TAG: &str = "-hot-";

/// A dynamic library loaded from a private copy of the artifact. The compiler can then
/// overwrite the artifact while the copy stays mapped.
/// Dropping this closes the library and deletes the copy.
pub struct Loaded_Library {
    lib: Option<ll::Library>,
    unique_path: PathBuf,
}

impl Loaded_Library {
    pub fn library(&self) -> Option<&ll::Library> {
        self.lib.as_ref()
    }

    pub fn unique_path(&self) -> &Path {
        &self.unique_path
    }
}

impl Drop for Loaded_Library {
    fn drop(&mut self) {
        if let Some(lib) = self.lib.take() {
            if let Err(err) = lib.close() {
                lwarn!("Failed to close lib {:?}: {}", self.unique_path, err);
            }
        }
        if let Err(err) = std::fs::remove_file(&self.unique_path) {
            lwarn!("Failed to remove old lib {:?}: {}", self.unique_path, err);
        } else {
            lverbose!("Removed old lib {}", self.unique_path.display());
        }
    }
}

fn split_file_name(lib_path: &Path) -> (String, String) {
    let stem = lib_path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("game")
        .to_string();
    let ext = lib_path
        .extension()
        .and_then(OsStr::to_str)
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    (stem, ext)
}

/// `<dir>/<stem>-hot-<pid>-<attempt><ext>`
pub fn unique_lib_path(lib_path: &Path, attempt: u32) -> PathBuf {
    let (stem, ext) = split_file_name(lib_path);
    let name = format!(
        "{}{}{}-{}{}",
        stem,
        UNIQUE_COPY_TAG,
        std::process::id(),
        attempt,
        ext
    );
    lib_path.with_file_name(name)
}

/// Removes copies left behind by a previous run that didn't exit cleanly.
/// Returns how many were removed.
pub fn remove_stale_copies(lib_path: &Path) -> usize {
    let (stem, ext) = split_file_name(lib_path);
    let prefix = format!("{}{}", stem, UNIQUE_COPY_TAG);
    let dir = match lib_path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            lverbose!("Not cleaning stale libs in {:?}: {}", dir, err);
            return 0;
        }
    };

    let mut n_removed = 0;
    for path in entries.filter_map(Result::ok).map(|e| e.path()) {
        let is_stale = path
            .file_name()
            .and_then(OsStr::to_str)
            .map_or(false, |name| name.starts_with(&prefix) && name.ends_with(&ext));
        if is_stale {
            match std::fs::remove_file(&path) {
                Ok(()) => n_removed += 1,
                Err(err) => lwarn!("Failed to remove stale lib {:?}: {}", path, err),
            }
        }
    }
    if n_removed > 0 {
        linfo!("Removed {} stale lib copies from {:?}", n_removed, dir);
    }
    n_removed
}

/// Copies the artifact to a unique path and opens the copy.
/// `attempt` must never repeat within a process: some loaders hand back an image that is
/// still resident when asked for a path they've already seen.
pub fn lib_load(lib_path: &Path, attempt: u32) -> Result<Loaded_Library, Runner_Error> {
    let unique_path = unique_lib_path(lib_path, attempt);
    std::fs::copy(lib_path, &unique_path)
        .map_err(|err| Runner_Error::load_failure(lib_path, format!("failed to copy: {}", err)))?;

    linfo!("Loading lib {:?}", unique_path);
    match unsafe { ll::Library::new(&unique_path) } {
        Ok(lib) => Ok(Loaded_Library {
            lib: Some(lib),
            unique_path,
        }),
        Err(err) => {
            let _ = std::fs::remove_file(&unique_path);
            Err(Runner_Error::load_failure(lib_path, err))
        }
    }
}

/// Loads the game module from the artifact produced by the compiler.
pub struct Dylib_Loader {
    pub artifact: PathBuf,
    // Failed attempts reuse their generation, so copies are numbered by attempt.
    n_attempts: u32,
}

impl Dylib_Loader {
    pub fn new(artifact: PathBuf) -> Self {
        Dylib_Loader {
            artifact,
            n_attempts: 0,
        }
    }

    pub fn n_attempts(&self) -> u32 {
        self.n_attempts
    }
}

impl Module_Loader for Dylib_Loader {
    fn load(&mut self, generation: u32) -> Result<Module_Handle, Runner_Error> {
        let attempt = self.n_attempts;
        self.n_attempts = self.n_attempts.wrapping_add(1);
        let loaded = lib_load(&self.artifact, attempt)?;
        let api = match loaded.library() {
            Some(lib) => unsafe { game_load(lib, &self.artifact)? },
            None => return Err(Runner_Error::load_failure(&self.artifact, "library closed")),
        };
        let module = Module_Handle::new(api, Module_Image::Dynamic(loaded), generation);
        linfo!(
            "Loaded game module generation {} with state {}",
            generation,
            module.descriptor
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Game_Session, Swap_Outcome};
    use crate::variant;
    use lively_api::Frame_Input;
    use std::fs;

    /// Copies the game module built by this workspace into `dir`.
    /// Returns None if the game library hasn't been built for this profile.
    fn built_game_module(dir: &Path) -> Option<PathBuf> {
        let target_dir = std::env::var_os("CARGO_TARGET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("target"));
        let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
        let built = target_dir.join(profile).join(variant::default_artifact_name());
        if !built.is_file() {
            lwarn!("{:?} was not built: skipping.", built);
            return None;
        }
        let artifact = dir.join(variant::default_artifact_name());
        fs::copy(&built, &artifact).unwrap();
        Some(artifact)
    }

    fn copy_name(module: &Module_Handle) -> String {
        match module.image() {
            Module_Image::Dynamic(lib) => lib
                .unique_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            Module_Image::Static => panic!("module is not dynamic"),
        }
    }

    #[test]
    fn unique_paths_differ_per_attempt() {
        let lib = Path::new("/tmp/x/liblively_game.so");
        let a = unique_lib_path(lib, 1);
        let b = unique_lib_path(lib, 2);
        assert_ne!(a, b);
        assert_eq!(a.parent(), lib.parent());
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("liblively_game-hot-"));
        assert!(name.ends_with("-1.so"));
    }

    #[test]
    fn stale_copies_are_removed() {
        let dir = lively_test::temp_dir();
        let lib = dir.path().join("liblively_game.so");
        fs::write(&lib, b"artifact").unwrap();
        fs::write(dir.path().join("liblively_game-hot-1234-0.so"), b"old").unwrap();
        fs::write(dir.path().join("liblively_game-hot-1234-3.so"), b"old").unwrap();
        fs::write(dir.path().join("other-hot-1-0.so"), b"keep").unwrap();

        assert_eq!(remove_stale_copies(&lib), 2);
        assert!(lib.exists());
        assert!(dir.path().join("other-hot-1-0.so").exists());
        assert_eq!(remove_stale_copies(&lib), 0);
    }

    #[test]
    fn corrupt_artifact_fails_to_load() {
        let dir = lively_test::temp_dir();
        let lib = dir.path().join("liblively_game.so");
        fs::write(&lib, b"definitely not a shared object").unwrap();

        let mut loader = Dylib_Loader::new(lib.clone());
        for _ in 0..2 {
            match loader.load(1) {
                Err(Runner_Error::Module_Load_Failure { path, .. }) => assert_eq!(path, lib),
                Err(err) => panic!("unexpected error {}", err),
                Ok(module) => panic!("loaded garbage: {:?}", module),
            }
        }
        // Both copies were cleaned up.
        assert_eq!(loader.n_attempts(), 2);
        assert!(!unique_lib_path(&lib, 0).exists());
        assert!(!unique_lib_path(&lib, 1).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let dir = lively_test::temp_dir();
        let mut loader = Dylib_Loader::new(dir.path().join("nope.so"));
        assert!(matches!(
            loader.load(0),
            Err(Runner_Error::Module_Load_Failure { .. })
        ));
    }

    #[test]
    fn real_module_swap_keeps_the_state() {
        let dir = lively_test::temp_dir();
        let artifact = match built_game_module(dir.path()) {
            Some(artifact) => artifact,
            None => return,
        };

        let mut loader = Dylib_Loader::new(artifact);
        let module = loader.load(0).unwrap();
        assert!(module.is_dynamic());
        let mut session = Game_Session::new(module).unwrap();

        let input = Frame_Input::default();
        for _ in 0..10 {
            session.update(&input, 0.016);
        }
        let handle = session.state_handle();
        let bytes = session.state_bytes().unwrap().to_vec();

        let incoming = loader.load(1).unwrap();
        let outcome = session.swap_module(incoming, false).ok().unwrap();
        assert!(matches!(outcome, Swap_Outcome::Preserved));
        assert_eq!(session.state_handle(), handle);
        assert_eq!(session.state_bytes().unwrap(), &bytes[..]);
        assert_eq!(session.generation(), 1);

        session.update(&input, 0.016);
        assert!(!session.should_close());
        session.shutdown();

        // Only the artifact is left once every image is closed.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn retry_after_a_failed_load_uses_a_new_copy() {
        let dir = lively_test::temp_dir();
        let artifact = match built_game_module(dir.path()) {
            Some(artifact) => artifact,
            None => return,
        };
        let good = fs::read(&artifact).unwrap();
        fs::write(&artifact, b"half written").unwrap();

        let mut loader = Dylib_Loader::new(artifact.clone());
        assert!(loader.load(1).is_err());

        fs::write(&artifact, good).unwrap();
        let module = loader.load(1).unwrap();
        assert_eq!(module.generation, 1);
        let name = copy_name(&module);
        assert!(name.ends_with(&format!("-1{}", split_file_name(&artifact).1)), "{}", name);
    }
}
