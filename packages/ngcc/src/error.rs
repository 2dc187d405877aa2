//! Errors raised by entry-point discovery, dependency resolution and task execution.
//!
//! Missing or invalid dependencies are not errors; they are reported through
//! `SortedEntryPointsInfo::invalid_entry_points`.

use crate::ngtsc::file_system::AbsoluteFsPath;

#[derive(Debug, thiserror::Error)]
pub enum NgccError {
    #[error("There is no appropriate source code format in '{entry_point}' entry-point.")]
    NoSourceFormat { entry_point: AbsoluteFsPath },

    #[error("Could not find a suitable format for computing dependencies of entry-point: '{entry_point}'.")]
    NoDependencyHost { entry_point: AbsoluteFsPath },

    #[error(
        "Unable to process any formats for the following entry-points (tried {properties}): {}",
        entry_points.join(", ")
    )]
    UnprocessableEntryPoints {
        properties: String,
        entry_points: Vec<String>,
    },

    #[error("The target entry-point \"{path}\" could not be found.")]
    TargetNotFound { path: AbsoluteFsPath },

    #[error(
        "The target entry-point \"{path}\" has missing dependencies:\n{}",
        missing.iter().map(|m| format!(" - {}", m)).collect::<Vec<_>>().join("\n")
    )]
    TargetInvalid {
        path: AbsoluteFsPath,
        missing: Vec<String>,
    },

    #[error("Unable to access \"{path}\": {source}")]
    Io {
        path: AbsoluteFsPath,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse \"{path}\": {source}")]
    Json {
        path: AbsoluteFsPath,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid ngcc configuration in \"{path}\": {message}")]
    InvalidConfiguration { path: AbsoluteFsPath, message: String },

    #[error("Failed to compile entry-point {entry_point} ({format_property}) due to compilation errors:\n{message}")]
    TaskFailed {
        entry_point: String,
        format_property: String,
        message: String,
    },

    #[error("Invalid message received from worker #{worker_id}: {payload}")]
    WorkerMessage { worker_id: usize, payload: String },

    #[error("Worker #{worker_id} failed: {message}")]
    WorkerCrashed { worker_id: usize, message: String },

    #[error("There are no tasks that can be processed, but {remaining} task(s) remain. This may be caused by a dependency cycle.")]
    Deadlock { remaining: usize },
}

impl NgccError {
    pub fn io(path: &AbsoluteFsPath, source: std::io::Error) -> Self {
        NgccError::Io {
            path: path.clone(),
            source,
        }
    }

    pub fn json(path: &AbsoluteFsPath, source: serde_json::Error) -> Self {
        NgccError::Json {
            path: path.clone(),
            source,
        }
    }
}

pub type NgccResult<T> = Result<T, NgccError>;
