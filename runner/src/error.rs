use lively_api::State_Descriptor;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Runner_Error {
    /// The artifact could not be opened or its entry points could not be resolved.
    #[error("failed to load game module {path:?}: {reason}")]
    Module_Load_Failure { path: PathBuf, reason: String },

    /// The incoming module expects a different state layout than the one in memory.
    #[error("game state {from} is incompatible with {to}: state was reset")]
    State_Incompatible {
        from: State_Descriptor,
        to: State_Descriptor,
    },

    #[error("game module failed to initialize its state")]
    Init_Failure,

    #[error("failed to create the platform context: {0}")]
    Platform_Context_Failure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Runner_Error {
    pub fn load_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Runner_Error::Module_Load_Failure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Process exit code for errors that abort startup.
    pub fn exit_code(&self) -> i32 {
        match self {
            Runner_Error::Init_Failure => 1,
            Runner_Error::Platform_Context_Failure(_) => 2,
            _ => 3,
        }
    }
}
