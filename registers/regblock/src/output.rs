// Licensed under the Apache-2.0 license

//! Generated files and how they reach the disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::error::Result;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneratedFile {
    pub name: String,
    pub contents: String,
}

/// Everything one export produced, still in memory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GeneratedArtifacts {
    pub module_name: String,
    pub package_name: String,
    pub files: Vec<GeneratedFile>,
}

impl GeneratedArtifacts {
    pub fn push(&mut self, name: String, contents: String) {
        self.files.push(GeneratedFile { name, contents });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.contents.as_str())
    }

    /// Writes every file into `dir`.
    ///
    /// All files are staged as temporaries in `dir` before any of them is
    /// renamed into place, so a failure while staging leaves `dir` as it was.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut staged = vec![];
        for file in &self.files {
            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(file.contents.as_bytes())?;
            tmp.flush()?;
            staged.push((tmp, dir.join(&file.name)));
        }
        let mut written = vec![];
        for (tmp, dest) in staged {
            tmp.persist(&dest).map_err(|e| e.error)?;
            info!("wrote {}", dest.display());
            written.push(dest);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_all() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let mut artifacts = GeneratedArtifacts::default();
        artifacts.push("a.sv".into(), "module a;\nendmodule\n".into());
        artifacts.push("a.rpt".into(), String::new());
        let written = artifacts.write_all(&out).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(out.join("a.sv")).unwrap(),
            "module a;\nendmodule\n"
        );
        assert_eq!(fs::read_to_string(out.join("a.rpt")).unwrap(), "");
        // No temporaries left behind.
        assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
    }

    #[test]
    fn test_get() {
        let mut artifacts = GeneratedArtifacts::default();
        artifacts.push("x".into(), "1".into());
        assert_eq!(artifacts.get("x"), Some("1"));
        assert_eq!(artifacts.get("y"), None);
    }
}
