//! Secret container files: notes ("AMSN") and system state ("AMSS").
//!
//! Every write draws a fresh salt and nonce, so rewriting a file with the
//! same content produces different bytes. Files are replaced through a
//! sibling temporary file and a rename, so a failed write never leaves a
//! truncated container behind.

use std::{
    fs,
    path::{Path, PathBuf},
};

use amsel_crypto::{ContainerError, ContainerFormat, open_container_as, seal_container};
use amsel_proto::SystemPayload;

use crate::{
    env::Environment,
    error::{ClientError, unreadable},
    session::Session,
    storage::LogStore,
};

impl<E: Environment, S: LogStore> Session<E, S> {
    /// Seal `text` into a notes container at `path`.
    pub fn save_note(&self, path: impl AsRef<Path>, text: &str) -> Result<(), ClientError> {
        let bytes = self.seal_file(ContainerFormat::Notes, text.as_bytes())?;
        write_replacing(path.as_ref(), &bytes)
    }

    /// Open the notes container at `path`.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Unreadable` if it is not an intact notes container for this key
    /// - `InvalidPayload` if the payload is not UTF-8
    pub fn load_note(&self, path: impl AsRef<Path>) -> Result<String, ClientError> {
        let payload = self.open_file(ContainerFormat::Notes, &fs::read(path.as_ref())?)?;
        String::from_utf8(payload)
            .map_err(|_| ClientError::InvalidPayload("note is not UTF-8".into()))
    }

    /// Seal `payload` into a system container at `path`.
    pub fn create_system_container(
        &self,
        path: impl AsRef<Path>,
        payload: &SystemPayload,
    ) -> Result<(), ClientError> {
        let bytes = self.seal_file(ContainerFormat::System, &payload.encode()?)?;
        write_replacing(path.as_ref(), &bytes)
    }

    /// Open the system container at `path`.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `Unreadable` if it is not an intact system container for this key
    /// - `Protocol` if the payload is not a flat JSON string map
    pub fn load_system_container(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<SystemPayload, ClientError> {
        let payload = self.open_file(ContainerFormat::System, &fs::read(path.as_ref())?)?;
        Ok(SystemPayload::decode(&payload)?)
    }

    /// Seal `payload` as a container of `format` without touching the disk.
    pub fn seal_file(
        &self,
        format: ContainerFormat,
        payload: &[u8],
    ) -> Result<Vec<u8>, ClientError> {
        self.with_unlocked(|unlocked| {
            let salt = self.env.random_array()?;
            let nonce = self.env.random_array()?;
            Ok(seal_container(format, payload, &unlocked.master, salt, nonce))
        })
    }

    /// Open container bytes that must be of `format`.
    pub fn open_file(&self, format: ContainerFormat, bytes: &[u8]) -> Result<Vec<u8>, ClientError> {
        self.with_unlocked(|unlocked| {
            open_container_as(format, bytes, &unlocked.master).map_err(|e| match e {
                ContainerError::FileTooShort { .. } => {
                    tracing::debug!(error = %e, "container truncated");
                    ClientError::Unreadable
                },
                _ => unreadable("container", &e),
            })
        })
    }
}

fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), ClientError> {
    let tmp = temp_sibling(path);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), len = bytes.len(), "wrote container");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
