use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bootstrap_console_core::{SettingsError, SettingsStore};

/// One `<key>.json` file per settings key.
#[derive(Clone, Debug)]
pub struct FileSettingsStore {
    dir: PathBuf,
}

impl FileSettingsStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, SettingsError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SettingsError::Unavailable {
                message: format!("invalid settings key {key:?}"),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SettingsStore for FileSettingsStore {
    fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(SettingsError::Read {
                message: format!("{}: {error}", path.display()),
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|error| SettingsError::Write {
            message: format!("{}: {error}", self.dir.display()),
        })?;
        fs::write(&path, value).map_err(|error| SettingsError::Write {
            message: format!("{}: {error}", path.display()),
        })
    }
}
