use super::DataStore;
use crate::error::{CrmError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileStore {
    path: PathBuf,
    atomic: bool,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            atomic: true,
        }
    }

    /// When disabled, saves truncate and rewrite the data file in place.
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                CrmError::Store(format!("Not a file path: {}", self.path.display()))
            })?
            .to_string_lossy();
        Ok(self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, std::process::id())))
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(CrmError::Io)?;
            }
        }
        Ok(())
    }
}

impl DataStore for FileStore {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(CrmError::Io)?;
        Ok(Some(content))
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        self.ensure_parent()?;

        if !self.atomic {
            fs::write(&self.path, contents).map_err(CrmError::Io)?;
            return Ok(());
        }

        let tmp_file = self.tmp_path()?;
        if let Err(e) = fs::write(&tmp_file, contents) {
            let _ = fs::remove_file(&tmp_file);
            return Err(CrmError::Io(e));
        }
        if let Err(e) = fs::rename(&tmp_file, &self.path) {
            let _ = fs::remove_file(&tmp_file);
            return Err(CrmError::Io(e));
        }
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
