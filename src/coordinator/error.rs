use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("Enter a peer address (for example 192.168.0.101:9595)")]
    MissingAddress,

    #[error("Choose a file to send")]
    MissingFile,

    #[error("Choose a target peer")]
    MissingTarget,

    #[error("'{0}' is not a known peer (run 'peers' or connect first)")]
    UnknownTarget(String),

    #[error("{0}")]
    Transport(String),

    #[error("Invalid file offer: {0}")]
    InvalidOffer(String),

    #[error("Invalid progress update: {0}")]
    InvalidProgress(String),

    #[error("Coordinator stopped")]
    Stopped,
}

impl ControllerError {
    /// True for errors detected before any network call.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            ControllerError::MissingAddress
                | ControllerError::MissingFile
                | ControllerError::MissingTarget
                | ControllerError::UnknownTarget(_)
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerError::MissingAddress => "missing_address",
            ControllerError::MissingFile => "missing_file",
            ControllerError::MissingTarget => "missing_target",
            ControllerError::UnknownTarget(_) => "unknown_target",
            ControllerError::Transport(_) => "transport",
            ControllerError::InvalidOffer(_) => "invalid_offer",
            ControllerError::InvalidProgress(_) => "invalid_progress",
            ControllerError::Stopped => "stopped",
        }
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
