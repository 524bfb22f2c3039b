//! Ephemeral on-disk buffers for handing secret plaintext to an external editor.
//!
//! A [`ScratchFile`] is created with exclusive-create semantics and owner-only
//! permissions, and is overwritten with random bytes and removed when it is
//! released. Release happens either explicitly or from `Drop`, so every exit
//! path of a workflow (including unwinding) erases the plaintext.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};
use crate::signals;

const NAME_PREFIX: &str = "kv-secret-";
const NAME_SUFFIX: &str = ".tmp";
const NAME_ENTROPY_BYTES: usize = 16;
const CREATE_ATTEMPTS: usize = 3;
const ERASE_CHUNK: usize = 64 * 1024;

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    size_at_creation: u64,
    released: bool,
}

impl ScratchFile {
    /// Materialize `content` into a new owner-only file inside `dir`.
    pub fn create(dir: &Path, content: &str) -> Result<Self> {
        Self::create_with(dir, content, random_name)
    }

    pub(crate) fn create_with(
        dir: &Path,
        content: &str,
        mut next_name: impl FnMut() -> Result<String>,
    ) -> Result<Self> {
        signals::install();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let path = dir.join(next_name()?);
            match create_exclusive(&path) {
                Ok(file) => {
                    signals::track(&path);
                    return Self::fill(file, path, content);
                }
                Err(err)
                    if err.kind() == io::ErrorKind::AlreadyExists && attempt < CREATE_ATTEMPTS =>
                {
                    tracing::debug!(
                        path = %path.display(),
                        attempt,
                        "scratch name collision, drawing a new name"
                    );
                }
                Err(err) => return Err(Error::io("create scratch file", path, err)),
            }
        }
    }

    fn fill(mut file: File, path: PathBuf, content: &str) -> Result<Self> {
        let written = file
            .write_all(content.as_bytes())
            .and_then(|()| file.sync_all());
        drop(file);

        if let Err(err) = written {
            // Whatever made it to disk is still plaintext.
            if let Err(cleanup) = signals::release_with(&path, || shred(&path)) {
                report_release_failure(&path, &cleanup);
                fs::remove_file(&path).ok();
            }
            return Err(Error::io("write scratch file", path, err));
        }

        tracing::debug!(path = %path.display(), bytes = content.len(), "scratch file created");
        Ok(Self {
            path,
            size_at_creation: content.len() as u64,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_at_creation(&self) -> u64 {
        self.size_at_creation
    }

    pub fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|err| Error::io("read edited file", &self.path, err))
    }

    /// Overwrite the file with random bytes, flush it to disk and remove it.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        signals::release_with(&self.path, || shred(&self.path))
    }

    /// Like [`ScratchFile::release`], but reports a failure as a warning instead of returning it.
    pub fn release_or_warn(self) {
        let path = self.path.clone();
        if let Err(err) = self.release() {
            report_release_failure(&path, &err);
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = signals::release_with(&self.path, || shred(&self.path)) {
            report_release_failure(&self.path, &err);
        }
    }
}

fn create_exclusive(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

fn random_name() -> Result<String> {
    let mut bytes = [0u8; NAME_ENTROPY_BYTES];
    OsRng.try_fill_bytes(&mut bytes).map_err(Error::Entropy)?;
    Ok(format!("{NAME_PREFIX}{}{NAME_SUFFIX}", hex::encode(bytes)))
}

pub(crate) fn shred(path: &Path) -> Result<()> {
    let erased = erase(path)?;
    fs::remove_file(path).map_err(|err| Error::io("remove scratch file", path, err))?;
    tracing::debug!(path = %path.display(), bytes = erased, "scratch file erased and removed");
    Ok(())
}

/// Overwrite the file's current length with random bytes. Returns the number of bytes written.
fn erase(path: &Path) -> Result<u64> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|err| Error::io("open scratch file for erasure", path, err))?;
    let len = file
        .metadata()
        .map_err(|err| Error::io("stat scratch file", path, err))?
        .len();

    file.seek(SeekFrom::Start(0))
        .map_err(|err| Error::io("seek scratch file", path, err))?;

    let mut buf = vec![0u8; ERASE_CHUNK.min(len as usize)];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(buf.len() as u64) as usize;
        OsRng.try_fill_bytes(&mut buf[..n]).map_err(Error::Entropy)?;
        file.write_all(&buf[..n])
            .map_err(|err| Error::io("overwrite scratch file", path, err))?;
        remaining -= n as u64;
    }

    file.sync_all()
        .map_err(|err| Error::io("sync scratch file", path, err))?;
    Ok(len)
}

pub fn report_release_failure(path: &Path, err: &Error) {
    tracing::warn!(path = %path.display(), error = %err, "failed to erase scratch file");
    eprintln!("{}", release_warning(path, err));
}

fn release_warning(path: &Path, err: &Error) -> String {
    format!(
        "Warning: failed to securely delete temp file {}: {err} (residual plaintext may remain)",
        path.display()
    )
}
