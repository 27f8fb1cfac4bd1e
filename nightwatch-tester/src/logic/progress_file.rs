use nightwatch_game::{ProgressState, ProgressStorage};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressFileError {
    #[error("progress file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("progress file {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Progress kept as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> ProgressFileError {
        ProgressFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> ProgressFileError {
        ProgressFileError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressStorage for FileProgressStore {
    type Error = ProgressFileError;

    fn load_progress(&self) -> Result<Option<ProgressState>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| self.json_error(err))
    }

    fn save_progress(&self, progress: &ProgressState) -> Result<(), Self::Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let json = serde_json::to_string_pretty(progress).map_err(|err| self.json_error(err))?;
        fs::write(&self.path, json).map_err(|err| self.io_error(err))
    }
}
