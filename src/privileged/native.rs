//! Native Unix implementation of the privileged file service.
//!
//! Runs the real syscalls: `stat` for the owner snapshot, `rename(2)` for
//! the atomic replace, `chmod`/`chown` for metadata restoration, and a
//! `/proc` scan plus signals for consumer termination. Replacing files
//! owned by other users requires running as root; editing your own files
//! works unprivileged.

use std::io;
use std::path::Path;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::{chown, Gid, Pid, Uid};

use super::{FileOwner, PrivilegedFiles, TERMINATE_GRACE_MS};

/// The real filesystem and process table.
#[derive(Debug, Default)]
pub struct NativeFiles;

impl NativeFiles {
    pub fn new() -> Self {
        Self
    }
}

impl PrivilegedFiles for NativeFiles {
    fn stat(&self, path: &Path) -> io::Result<FileOwner> {
        let st = nix::sys::stat::stat(path).map_err(io_error)?;
        Ok(FileOwner {
            uid: st.st_uid,
            gid: st.st_gid,
        })
    }

    fn rename(&self, src: &Path, dst: &Path) -> io::Result<()> {
        std::fs::rename(src, dst)
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }

    fn set_owner(&self, path: &Path, owner: &FileOwner) -> io::Result<()> {
        chown(
            path,
            Some(Uid::from_raw(owner.uid)),
            Some(Gid::from_raw(owner.gid)),
        )
        .map_err(io_error)
    }

    /// Terminate every process whose name matches.
    ///
    /// Sends SIGTERM first, waits a short grace period, then SIGKILL to
    /// anything still alive. A name that matches nothing is a no-op: the
    /// consumer may simply not be running, which is fine - it will read
    /// the new file on its next start.
    fn terminate(&self, process: &str) -> io::Result<()> {
        let pids = find_processes(process)?;
        if pids.is_empty() {
            log::debug!("no running process named '{}'", process);
            return Ok(());
        }

        for pid in &pids {
            log::debug!("sending SIGTERM to {} ({})", pid, process);
            // ESRCH means the process exited on its own; not a failure.
            match kill(*pid, Signal::SIGTERM) {
                Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => return Err(io_error(e)),
            }
        }

        std::thread::sleep(Duration::from_millis(TERMINATE_GRACE_MS));

        for pid in pids {
            // Signal 0 probes for existence.
            if kill(pid, None::<Signal>).is_ok() {
                log::debug!("grace period expired, sending SIGKILL to {}", pid);
                match kill(pid, Signal::SIGKILL) {
                    Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                    Err(e) => return Err(io_error(e)),
                }
            }
        }
        Ok(())
    }
}

fn io_error(errno: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}

/// Scan `/proc` for processes whose command name matches `name`.
///
/// Matches against `/proc/<pid>/comm` (truncated to 15 bytes by the
/// kernel, so a long name also matches its truncation) and against the
/// basename of the first `cmdline` argument. The calling process itself is
/// excluded.
fn find_processes(name: &str) -> io::Result<Vec<Pid>> {
    let own_pid = std::process::id() as i32;
    let mut pids = Vec::new();

    for entry in std::fs::read_dir("/proc")? {
        let entry = entry?;
        let pid: i32 = match entry.file_name().to_string_lossy().parse() {
            Ok(pid) => pid,
            Err(_) => continue,
        };
        if pid == own_pid {
            continue;
        }
        if process_matches(&entry.path(), name) {
            pids.push(Pid::from_raw(pid));
        }
    }
    Ok(pids)
}

fn process_matches(proc_dir: &Path, name: &str) -> bool {
    // comm holds at most 15 bytes of the name.
    if let Ok(comm) = std::fs::read_to_string(proc_dir.join("comm")) {
        let comm = comm.trim_end();
        if comm == name || (comm.len() == 15 && name.starts_with(comm)) {
            return true;
        }
    }

    if let Ok(cmdline) = std::fs::read(proc_dir.join("cmdline")) {
        if let Some(argv0) = cmdline.split(|b| *b == 0).next() {
            let argv0 = String::from_utf8_lossy(argv0);
            if Path::new(argv0.as_ref())
                .file_name()
                .map(|f| f.to_string_lossy() == name)
                .unwrap_or(false)
            {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_reports_owner_of_own_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let owner = NativeFiles::new().stat(file.path()).unwrap();
        assert_eq!(owner.uid, nix::unistd::geteuid().as_raw());
        assert_eq!(owner.gid, nix::unistd::getegid().as_raw());
    }

    #[test]
    fn test_stat_missing_file_is_not_found() {
        let err = NativeFiles::new()
            .stat(Path::new("/nonexistent/prefedit-stat-probe"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_rename_replaces_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("staged");
        let dst = dir.path().join("target");
        std::fs::write(&src, "new").unwrap();
        std::fs::write(&dst, "old").unwrap();

        NativeFiles::new().rename(&src, &dst).unwrap();
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "new");
        assert!(!src.exists());
    }

    #[test]
    fn test_set_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let file = tempfile::NamedTempFile::new().unwrap();
        NativeFiles::new()
            .set_permissions(file.path(), 0o660)
            .unwrap();
        let mode = file.path().metadata().unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o660);
    }

    #[test]
    fn test_set_owner_to_self_succeeds_unprivileged() {
        // chown to the current owner is permitted without privileges, which
        // is exactly what the protocol does for files the caller owns.
        let file = tempfile::NamedTempFile::new().unwrap();
        let me = FileOwner::current();
        NativeFiles::new().set_owner(file.path(), &me).unwrap();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_terminate_unknown_process_is_noop() {
        NativeFiles::new()
            .terminate("prefedit-no-such-process-name")
            .unwrap();
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_find_processes_excludes_self() {
        // Our own comm is the test binary's name; make sure a scan for it
        // never returns our own pid.
        let own = std::process::id() as i32;
        let comm = std::fs::read_to_string(format!("/proc/{}/comm", own)).unwrap();
        let pids = find_processes(comm.trim_end()).unwrap();
        assert!(pids.iter().all(|p| p.as_raw() != own));
    }
}
