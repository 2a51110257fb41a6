use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequirementError {
    #[error("{0}")]
    Parse(String),
    #[error("Invalid marker: {0}")]
    InvalidMarker(String),
    #[error("Editable requirement is only supported for VCS link or local directory.")]
    Editable,
    #[error("The local path {} does not exist.", .0.display())]
    PathNotFound(PathBuf),
    #[error("The local path '{}' is not installable.", .0.display())]
    NotInstallable(PathBuf),
    #[error("invalid requirement record for {name:?}: {reason}")]
    InvalidRecord { name: String, reason: String },
    #[error("failed to read project metadata from {}: {reason}", .path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl RequirementError {
    /// Flattens a vocabulary-level error chain into a parse error.
    pub(crate) fn parse(err: eyre::Report) -> RequirementError {
        RequirementError::Parse(format!("{:#}", err))
    }

    pub(crate) fn marker(err: eyre::Report) -> RequirementError {
        RequirementError::InvalidMarker(format!("{:#}", err))
    }
}

/// Requested extras that none of the filtered requirements mention. This is a
/// warning, not a failure: filtering still returns everything that matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Extras not found: {}", .0.join(", "))]
pub struct ExtrasError(pub Vec<String>);
