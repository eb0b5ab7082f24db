//! Session cookies kept between CLI invocations

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const COOKIE_FILE: &str = "cookies";

/// The backend cookies (session and CSRF) as a single `Cookie` header line
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(COOKIE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved header, if any
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let content = content.trim();
                Ok((!content.is_empty()).then(|| content.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        }
    }

    /// Persist the header; `None` removes the file
    pub fn save(&self, header: Option<&str>) -> Result<()> {
        let Some(header) = header else {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        writeln!(file, "{header}")?;
        Ok(())
    }
}
