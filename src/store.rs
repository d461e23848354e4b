use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::SourceTag;
use crate::error::OceanError;

const DEFAULT_PROJECT_DIR: &str = "oceanDataPipeline";

/// On-disk layout of one pipeline project.
#[derive(Debug, Clone)]
pub struct Layout {
    base: Utf8PathBuf,
}

impl Layout {
    pub fn new() -> Result<Self, OceanError> {
        let cwd = std::env::current_dir().map_err(|err| OceanError::Filesystem(err.to_string()))?;
        let base = Utf8PathBuf::from_path_buf(cwd.join(DEFAULT_PROJECT_DIR))
            .map_err(|_| OceanError::Filesystem("invalid project path".to_string()))?;
        Ok(Self { base })
    }

    pub fn with_base(base: impl Into<Utf8PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.base.join("data")
    }

    pub fn raw_dir(&self) -> Utf8PathBuf {
        self.data_dir().join("raw")
    }

    pub fn processed_dir(&self) -> Utf8PathBuf {
        self.data_dir().join("processed")
    }

    pub fn source_dir(&self, source: SourceTag) -> Utf8PathBuf {
        self.processed_dir().join(source.as_str())
    }

    pub fn logs_dir(&self) -> Utf8PathBuf {
        self.base.join("logs")
    }

    pub fn config_dir(&self) -> Utf8PathBuf {
        self.base.join("config")
    }

    pub fn settings_path(&self) -> Utf8PathBuf {
        self.config_dir().join("settings.json")
    }

    pub fn dotenv_path(&self) -> Utf8PathBuf {
        self.base.join(".env")
    }

    pub fn ensure(&self) -> Result<(), OceanError> {
        let mut dirs = vec![
            self.raw_dir(),
            self.processed_dir(),
            self.logs_dir(),
            self.config_dir(),
        ];
        dirs.extend(SourceTag::ALL.iter().map(|source| self.source_dir(*source)));
        for dir in dirs {
            fs::create_dir_all(dir.as_std_path())
                .map_err(|err| OceanError::Filesystem(format!("create {dir}: {err}")))?;
        }
        Ok(())
    }
}

/// Writes `content` next to `path` and renames it into place.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), OceanError> {
    let parent = path
        .parent()
        .ok_or_else(|| OceanError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("ocean-sync-file")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| OceanError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = Layout::with_base("/srv/ocean");
        assert!(layout.raw_dir().ends_with("data/raw"));
        assert!(layout.source_dir(SourceTag::Argo).ends_with("data/processed/argo"));
        assert!(layout.settings_path().ends_with("config/settings.json"));
    }

    #[test]
    fn ensure_creates_every_directory() {
        let temp = tempfile::tempdir().unwrap();
        let base = Utf8PathBuf::from_path_buf(temp.path().join("project")).unwrap();
        let layout = Layout::with_base(base);
        layout.ensure().unwrap();
        for source in SourceTag::ALL {
            assert!(layout.source_dir(source).as_std_path().is_dir());
        }
        assert!(layout.logs_dir().as_std_path().is_dir());
    }
}
