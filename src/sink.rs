use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, StampError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait ArtifactSink {
    /// Returns the name the artifact was actually saved under.
    fn deliver(&mut self, artifact: Artifact) -> Result<String>;
}

/// Writes each artifact into a directory.
///
/// Files left by earlier runs are replaced, but two artifacts with the same
/// name in one run get `name (1).pdf`, `name (2).pdf`, ... like a browser's
/// download folder.
pub struct DirectorySink {
    dir: PathBuf,
    written: HashSet<String>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StampError::Deliver {
            name: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            written: HashSet::new(),
        })
    }

    fn unique_name(&self, file_name: &str) -> String {
        if !self.written.contains(file_name) {
            return file_name.to_string();
        }
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (1..)
            .map(|n| format!("{stem} ({n}){ext}"))
            .find(|candidate| !self.written.contains(candidate))
            .unwrap_or_else(|| file_name.to_string())
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, artifact: Artifact) -> Result<String> {
        let name = self.unique_name(&artifact.file_name);
        let out = self.dir.join(&name);
        fs::write(&out, &artifact.bytes).map_err(|source| StampError::Deliver {
            name: name.clone(),
            source,
        })?;
        info!(path = %out.display(), bytes = artifact.bytes.len(), "saved");
        self.written.insert(name.clone());
        Ok(name)
    }
}

/// Keeps artifacts in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, artifact: Artifact) -> Result<String> {
        let name = artifact.file_name.clone();
        self.artifacts.push(artifact);
        Ok(name)
    }
}
