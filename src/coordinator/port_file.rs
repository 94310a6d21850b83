//! Port file handshake.
//!
//! The coordinator writes its port as decimal text after binding and
//! removes the file on close. Clients read it to find the coordinator; a
//! leftover file from a crashed run is harmless because clients treat a
//! refused connection as "not running".

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::debug;

#[derive(Debug, Clone)]
pub struct PortFile {
    path: PathBuf,
}

impl PortFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded port, if the file exists and holds one.
    pub fn read(&self) -> Option<u16> {
        fs::read_to_string(&self.path).ok()?.trim().parse().ok()
    }

    /// Publish `port`, replacing any previous file.
    ///
    /// Written to a sibling and renamed so readers never see a partial port.
    pub fn write(&self, port: u16) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension(format!("{}.tmp", std::process::id()));
        fs::write(&tmp, port.to_string())?;
        fs::rename(&tmp, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    /// Best-effort removal; failures are ignored.
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            debug!("coordinator"; "could not remove {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_read_remove() {
        let tmp = TempDir::new().unwrap();
        let file = PortFile::new(tmp.path().join("df/coordinator.port"));
        assert_eq!(file.read(), None);

        file.write(41234).unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "41234");
        assert_eq!(file.read(), Some(41234));

        file.write(5000).unwrap();
        assert_eq!(file.read(), Some(5000));

        file.remove();
        assert!(!file.path().exists());
        file.remove();
    }

    #[test]
    fn test_read_garbage() {
        let tmp = TempDir::new().unwrap();
        let file = PortFile::new(tmp.path().join("coordinator.port"));
        fs::write(file.path(), "not a port").unwrap();
        assert_eq!(file.read(), None);
        fs::write(file.path(), "99999").unwrap();
        assert_eq!(file.read(), None);
        fs::write(file.path(), " 8080\n").unwrap();
        assert_eq!(file.read(), Some(8080));
    }
}
