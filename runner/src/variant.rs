use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Variant_Kind {
    /// Host plus a dynamically loaded game module.
    Hot_Reload,
    /// Single native binary with the game linked in.
    Release,
    /// Single wasm binary with the game linked in.
    Web,
}

/// The build variant this binary was compiled as. Fixed at build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Build_Variant {
    pub kind: Variant_Kind,
    pub debug: bool,
}

impl Build_Variant {
    pub const fn current() -> Self {
        Build_Variant {
            kind: Self::current_kind(),
            debug: cfg!(debug_assertions),
        }
    }

    const fn current_kind() -> Variant_Kind {
        if cfg!(target_arch = "wasm32") {
            Variant_Kind::Web
        } else if cfg!(feature = "static-game") {
            Variant_Kind::Release
        } else {
            Variant_Kind::Hot_Reload
        }
    }
}

impl fmt::Display for Build_Variant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.kind {
            Variant_Kind::Hot_Reload => "hot-reload",
            Variant_Kind::Release => "release",
            Variant_Kind::Web => "web",
        };
        if self.debug {
            write!(f, "{}-debug", name)
        } else {
            write!(f, "{}", name)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target_Os {
    Linux,
    Windows,
    Macos,
}

impl Target_Os {
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Target_Os::Windows
        } else if cfg!(target_os = "macos") {
            Target_Os::Macos
        } else {
            Target_Os::Linux
        }
    }
}

/// File name the linker gives to a dynamic library called `name`.
pub fn dylib_file_name(name: &str, os: Target_Os) -> String {
    match os {
        Target_Os::Linux => format!("lib{}.so", name),
        Target_Os::Windows => format!("{}.dll", name),
        Target_Os::Macos => format!("lib{}.dylib", name),
    }
}

pub const GAME_MODULE_NAME: &str = "lively_game";

pub fn default_artifact_name() -> String {
    dylib_file_name(GAME_MODULE_NAME, Target_Os::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names() {
        assert_eq!(dylib_file_name("lively_game", Target_Os::Linux), "liblively_game.so");
        assert_eq!(dylib_file_name("lively_game", Target_Os::Windows), "lively_game.dll");
        assert_eq!(dylib_file_name("lively_game", Target_Os::Macos), "liblively_game.dylib");
    }

    #[test]
    fn variant_display() {
        let v = Build_Variant {
            kind: Variant_Kind::Hot_Reload,
            debug: true,
        };
        assert_eq!(v.to_string(), "hot-reload-debug");
        let v = Build_Variant {
            kind: Variant_Kind::Web,
            debug: false,
        };
        assert_eq!(v.to_string(), "web");
    }

    #[test]
    fn current_variant_matches_build() {
        let v = Build_Variant::current();
        assert_eq!(v.debug, cfg!(debug_assertions));
        #[cfg(all(feature = "hot-reload", not(feature = "static-game")))]
        assert_eq!(v.kind, Variant_Kind::Hot_Reload);
    }
}
