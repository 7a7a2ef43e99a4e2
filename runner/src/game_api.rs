use super::error::Runner_Error;
use libloading as ll;
use lively_api::entry_points::{self, symbols, Api_Version_Fn};
use lively_api::{Game_Api, GAME_API_VERSION};
use std::path::Path;

unsafe fn get_required<T: Copy>(
    lib: &ll::Library,
    name: &[u8],
    path: &Path,
) -> Result<T, Runner_Error> {
    lib.get::<T>(name).map(|sym| *sym).map_err(|err| {
        Runner_Error::load_failure(
            path,
            format!("missing entry point {}: {}", symbol_name(name), err),
        )
    })
}

unsafe fn get_optional<T: Copy>(lib: &ll::Library, name: &[u8]) -> Option<T> {
    match lib.get::<T>(name) {
        Ok(sym) => Some(*sym),
        Err(_) => {
            lverbose!("Optional entry point {} not found.", symbol_name(name));
            None
        }
    }
}

fn symbol_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name.strip_suffix(&[0]).unwrap_or(name)).into_owned()
}

/// Resolves the entry-point table of a loaded game library.
/// Fails if any required entry point is missing or if the library was built against a
/// different version of the api.
///
/// # Safety
/// The returned table is only valid as long as `lib` stays loaded.
pub unsafe fn game_load(lib: &ll::Library, path: &Path) -> Result<Game_Api, Runner_Error> {
    let api_version: Api_Version_Fn = get_required(lib, symbols::API_VERSION, path)?;
    let version = api_version();
    if version != GAME_API_VERSION {
        return Err(Runner_Error::load_failure(
            path,
            format!(
                "game api version mismatch (module: {}, host: {})",
                version, GAME_API_VERSION
            ),
        ));
    }

    Ok(Game_Api {
        init: get_required::<entry_points::Init_Fn>(lib, symbols::INIT, path)?,
        update: get_required::<entry_points::Update_Fn>(lib, symbols::UPDATE, path)?,
        draw: get_required::<entry_points::Draw_Fn>(lib, symbols::DRAW, path)?,
        should_close: get_required::<entry_points::Should_Close_Fn>(
            lib,
            symbols::SHOULD_CLOSE,
            path,
        )?,
        shutdown: get_required::<entry_points::Shutdown_Fn>(lib, symbols::SHUTDOWN, path)?,
        export_state_descriptor: get_required::<entry_points::Export_Descriptor_Fn>(
            lib,
            symbols::EXPORT_STATE_DESCRIPTOR,
            path,
        )?,
        on_unload: get_optional::<entry_points::Hook_Fn>(lib, symbols::ON_UNLOAD),
        on_reload: get_optional::<entry_points::Hook_Fn>(lib, symbols::ON_RELOAD),
        force_reload: get_optional::<entry_points::Request_Fn>(lib, symbols::FORCE_RELOAD),
        force_restart: get_optional::<entry_points::Request_Fn>(lib, symbols::FORCE_RESTART),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_names_are_printable() {
        assert_eq!(symbol_name(symbols::INIT), "game_init");
        assert_eq!(symbol_name(b"plain"), "plain");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn library_without_entry_points_is_rejected() {
        let path = Path::new("libc.so.6");
        let lib = unsafe { ll::Library::new(path) }.unwrap();
        match unsafe { game_load(&lib, path) } {
            Err(Runner_Error::Module_Load_Failure { path: failed, reason }) => {
                assert_eq!(failed, path);
                assert!(
                    reason.starts_with("missing entry point game_api_version"),
                    "{}",
                    reason
                );
            }
            Err(err) => panic!("unexpected error {}", err),
            Ok(_) => panic!("resolved a game api from libc"),
        }
    }
}
