use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Env_Info {
    pub full_exe_path: Box<Path>,
    /// Directory containing the executable. Cargo puts the game module artifact here too.
    pub exe_dir: Box<Path>,
    pub working_dir: Box<Path>,
    pub cfg_root: Box<Path>,
}

impl Env_Info {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn gather() -> std::io::Result<Env_Info> {
        let full_exe_path = std::fs::canonicalize(std::env::current_exe()?)?;
        Ok(Self::from_exe_path(full_exe_path))
    }

    pub fn from_exe_path(full_exe_path: PathBuf) -> Env_Info {
        let exe_dir = full_exe_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let working_dir = find_working_dir(&exe_dir);
        let cfg_root = working_dir.join("cfg").into_boxed_path();

        Env_Info {
            full_exe_path: full_exe_path.into_boxed_path(),
            exe_dir: exe_dir.into_boxed_path(),
            working_dir: working_dir.into_boxed_path(),
            cfg_root,
        }
    }
}

/// If we're in a dev environment (i.e. running from target/<profile>), the working dir
/// is the repository root, so we don't have to copy cfg around.
fn find_working_dir(exe_dir: &Path) -> PathBuf {
    let mut working_dir = exe_dir.to_path_buf();
    let cur_dir = working_dir.as_path().file_name().and_then(OsStr::to_str);
    let parent_dir = working_dir
        .as_path()
        .parent()
        .and_then(Path::file_name)
        .and_then(OsStr::to_str);
    let grandparent_dir = working_dir
        .as_path()
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .and_then(OsStr::to_str);

    if matches!(cur_dir, Some("debug" | "release" | "profile"))
        && matches!(parent_dir, Some("target"))
    {
        working_dir.pop();
        working_dir.pop();
    } else if matches!(cur_dir, Some("deps"))
        && matches!(parent_dir, Some("debug" | "release" | "profile"))
        && matches!(grandparent_dir, Some("target"))
    {
        working_dir.pop();
        working_dir.pop();
        working_dir.pop();
    }
    lverbose!("Working dir resolved to {:?}", working_dir);

    working_dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_build_uses_repo_root() {
        let env = Env_Info::from_exe_path(PathBuf::from("/repo/target/debug/lively"));
        assert_eq!(&*env.exe_dir, Path::new("/repo/target/debug"));
        assert_eq!(&*env.working_dir, Path::new("/repo"));
        assert_eq!(&*env.cfg_root, Path::new("/repo/cfg"));
    }

    #[test]
    fn test_binary_in_deps_uses_repo_root() {
        let env = Env_Info::from_exe_path(PathBuf::from("/repo/target/release/deps/lively-abc"));
        assert_eq!(&*env.working_dir, Path::new("/repo"));
    }

    #[test]
    fn shipped_build_uses_exe_dir() {
        let env = Env_Info::from_exe_path(PathBuf::from("/opt/game/lively"));
        assert_eq!(&*env.working_dir, Path::new("/opt/game"));
        assert_eq!(&*env.cfg_root, Path::new("/opt/game/cfg"));
    }
}
