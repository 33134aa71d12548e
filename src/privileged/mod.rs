//! Privileged save protocol for preference files.
//!
//! Preference files usually belong to another user (the app that owns
//! them), so replacing one safely takes more than a write: the new content
//! must land atomically, the original owner and a fixed mode must be
//! restored, and the owning process must be told to drop its in-memory
//! copy. This module implements that sequence:
//!
//! 1. validate the payload through the codec (never touch the target with
//!    a payload that does not decode),
//! 2. stage the payload in a temp file next to the target,
//! 3. snapshot the target's owner/group,
//! 4. rename the staged file onto the target (the only atomic step),
//! 5. restore mode 0660 and the snapshotted owner,
//! 6. terminate the consuming process so it re-reads the file.
//!
//! The filesystem and process operations are behind the
//! [`PrivilegedFiles`] trait so tests can run the protocol without real
//! privileges. The public boundary is a boolean: either the save took
//! effect or it did not; details go to the log.

#[cfg(unix)]
pub mod native;

#[cfg(unix)]
pub use native::NativeFiles;

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::models::PreferenceFile;
use crate::{codec, Error, Result};

/// Mode applied to the target after the replace: owner and group may read
/// and write, everyone else gets nothing.
pub const SAVE_FILE_MODE: u32 = 0o660;

/// Grace period between SIGTERM and SIGKILL when terminating a consumer.
pub const TERMINATE_GRACE_MS: u64 = 400;

/// Owner and group of a file, as numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOwner {
    pub uid: u32,
    pub gid: u32,
}

impl FileOwner {
    /// The calling process's effective owner.
    ///
    /// Used when the target file does not exist yet and there is no owner
    /// to preserve.
    pub fn current() -> Self {
        #[cfg(unix)]
        {
            FileOwner {
                uid: nix::unistd::geteuid().as_raw(),
                gid: nix::unistd::getegid().as_raw(),
            }
        }
        #[cfg(not(unix))]
        {
            FileOwner { uid: 0, gid: 0 }
        }
    }
}

/// Elevated filesystem and process operations the save protocol needs.
///
/// The protocol only ever calls these five operations, in a fixed order.
/// Implementations are expected to make [`rename`](Self::rename) an atomic
/// replace, not a copy.
pub trait PrivilegedFiles {
    /// Owner and group of an existing file.
    fn stat(&self, path: &Path) -> io::Result<FileOwner>;

    /// Atomically move `src` onto `dst`, replacing it.
    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()>;

    /// Set the permission bits of a file.
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Set the owner and group of a file.
    fn set_owner(&self, path: &Path, owner: &FileOwner) -> io::Result<()>;

    /// Terminate every process with the given name. A name that matches no
    /// running process is not an error.
    fn terminate(&self, process: &str) -> io::Result<()>;
}

/// Save an in-memory store to `target`. See [`save_payload`].
pub fn save_store(
    service: &dyn PrivilegedFiles,
    file: &PreferenceFile,
    target: &Path,
    consumer: Option<&str>,
) -> bool {
    save_payload(service, &file.to_xml(), target, consumer)
}

/// Run the save protocol for a raw payload.
///
/// Returns `true` only after every step up to and including consumer
/// termination succeeded. On `false` the target is untouched if validation
/// or staging failed; a failure after the rename leaves the new content in
/// place with possibly unrestored metadata (the rename is the only atomic
/// step, there is no rollback).
pub fn save_payload(
    service: &dyn PrivilegedFiles,
    payload: &str,
    target: &Path,
    consumer: Option<&str>,
) -> bool {
    match try_save(service, payload, target, consumer) {
        Ok(()) => {
            log::info!("saved {}", target.display());
            true
        }
        Err(e) => {
            log::warn!("save of {} failed: {}", target.display(), e);
            false
        }
    }
}

fn try_save(
    service: &dyn PrivilegedFiles,
    payload: &str,
    target: &Path,
    consumer: Option<&str>,
) -> Result<()> {
    // Step 1: validate. The decoded map is discarded; only conformance
    // matters here.
    codec::decode(payload)?;

    // Step 2: stage next to the target so the rename stays on one
    // filesystem.
    let staging_dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(staging_dir)?;
    staged.write_all(payload.as_bytes())?;
    staged.flush()?;
    log::debug!("staged {} bytes in {}", payload.len(), staging_dir.display());

    // Step 3: snapshot the owner to restore. A missing target has no owner
    // to preserve; fall back to the calling process.
    let owner = match service.stat(target) {
        Ok(owner) => owner,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("{} does not exist yet, keeping caller ownership", target.display());
            FileOwner::current()
        }
        Err(e) => return Err(Error::Io(e)),
    };

    // Step 4: the atomic replace.
    let staged = staged.into_temp_path();
    service.rename(&staged, target)?;
    // The staged file now lives at the target path; nothing left to clean.
    let _ = staged.keep();

    // Step 5: restore metadata.
    service.set_permissions(target, SAVE_FILE_MODE)?;
    service.set_owner(target, &owner)?;

    // Step 6: invalidate the consumer.
    if let Some(process) = consumer {
        service.terminate(process)?;
    }
    Ok(())
}
