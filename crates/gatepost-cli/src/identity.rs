//! The device identity file.
//!
//! One line of text, provisioned once per terminal and read at start-up.

use gatepost_core::DeviceIdentity;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Invalid(#[from] gatepost_core::Error),

    #[error("Identity file {0} already exists (use --force to replace it)")]
    AlreadyProvisioned(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> IdentityError + '_ {
    move |source| IdentityError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read the identity provisioned at `path`.
pub fn read_identity(path: impl AsRef<Path>) -> Result<DeviceIdentity, IdentityError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    Ok(DeviceIdentity::new(&content)?)
}

/// Write an identity to `path`.
///
/// Without `value` a random UUID is generated. An existing file is only
/// replaced when `force` is set.
pub fn provision_identity(
    path: impl AsRef<Path>,
    value: Option<&str>,
    force: bool,
) -> Result<DeviceIdentity, IdentityError> {
    let path = path.as_ref();

    if !force {
        match fs::metadata(path) {
            Ok(_) => return Err(IdentityError::AlreadyProvisioned(path.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(path)(e)),
        }
    }

    let identity = match value {
        Some(value) => DeviceIdentity::new(value)?,
        None => DeviceIdentity::new(&Uuid::new_v4().to_string())?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(path))?;
    }
    fs::write(path, format!("{identity}\n")).map_err(io_error(path))?;

    info!(path = %path.display(), device = %identity, "Device identity provisioned");
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_provision_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");

        let written = provision_identity(&path, Some("lobby-east"), false).unwrap();
        assert_eq!(written.as_str(), "lobby-east");
        assert_eq!(fs::read_to_string(&path).unwrap(), "lobby-east\n");
        assert_eq!(read_identity(&path).unwrap(), written);
    }

    #[test]
    fn test_generated_identity_is_uuid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("identity");

        let identity = provision_identity(&path, None, false).unwrap();
        assert!(Uuid::parse_str(identity.as_str()).is_ok());
        assert_eq!(read_identity(&path).unwrap(), identity);
    }

    #[test]
    fn test_existing_file_needs_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");
        provision_identity(&path, Some("first"), false).unwrap();

        assert!(matches!(
            provision_identity(&path, Some("second"), false),
            Err(IdentityError::AlreadyProvisioned(_))
        ));
        assert_eq!(read_identity(&path).unwrap().as_str(), "first");

        provision_identity(&path, Some("second"), true).unwrap();
        assert_eq!(read_identity(&path).unwrap().as_str(), "second");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_identity(dir.path().join("absent")),
            Err(IdentityError::Io { .. })
        ));
    }

    #[test]
    fn test_blank_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");
        fs::write(&path, "  \n").unwrap();

        assert!(matches!(read_identity(&path), Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn test_invalid_value_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("identity");

        assert!(provision_identity(&path, Some(""), false).is_err());
        assert!(!path.exists());
    }
}
