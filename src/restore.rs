//! Restore-side object materialization and attribute restoration.
//!
//! Called once per restore packet by the job controller. Creating the
//! object and reapplying its attributes are separate calls; content
//! streaming for regular files happens outside this crate, between the two.

use crate::descriptor::{FileType, RestorePacket};
use crate::report::JobReporter;
use crate::utils::errors::{EngineError, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;

/// How the materialized object receives its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    /// Object created and truncated; the controller streams content into it.
    Extract,
    /// Object fully created here; no content follows.
    Created,
}

/// Create the file-system object described by `packet`.
///
/// Parent directories are created first, for every type. All variants are
/// idempotent: re-running with the same packet succeeds and leaves the file
/// system unchanged, except regular files which are re-truncated. An empty
/// output path is an immediate error; per-object creation failures are
/// surfaced as errors for the controller to count, never to abort on.
pub fn materialize(packet: &RestorePacket, reporter: &dyn JobReporter) -> Result<CreateStatus> {
    reporter.debug(100, &format!("materialize called for {}", packet.ofname));
    if packet.ofname.is_empty() {
        return Err(EngineError::InvalidPacket(
            "restore packet carries an empty output path".to_string(),
        ));
    }

    let stripped = packet.ofname.trim_end_matches('/');
    let target = Path::new(stripped);

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            reporter.debug(
                200,
                &format!("Directory {} does not exist, creating it now", parent.display()),
            );
            fs::create_dir_all(parent)?;
        }
    }

    match packet.file_type {
        FileType::Regular => {
            // create-and-truncate; content is streamed by the controller
            fs::File::create(target)?;
            Ok(CreateStatus::Extract)
        }
        FileType::Symlink => {
            if !is_symlink(target) {
                let source = link_source(packet)?;
                symlink(source, target)?;
            }
            Ok(CreateStatus::Created)
        }
        FileType::Hardlink => {
            let source = link_source(packet)?;
            // silent no-op when the link source vanished
            if !target.exists() && Path::new(source).exists() {
                fs::hard_link(source, target)?;
            }
            Ok(CreateStatus::Created)
        }
        FileType::DirEnd => {
            if !target.exists() {
                fs::create_dir_all(target)?;
            }
            Ok(CreateStatus::Created)
        }
        FileType::Fifo => {
            if !target.exists() {
                if let Err(e) = mkfifo_0600(target) {
                    reporter.error(&format!("Could not create fifo {}: \"{e}\"", packet.ofname));
                }
            }
            Ok(CreateStatus::Created)
        }
    }
}

/// Reapply ownership, permission bits and timestamps from the packet's
/// stat data.
///
/// Skipped entirely for link objects: setting attributes on a link is
/// unreliable across platforms. Every step is best-effort; a failure is
/// reported as a warning and the remaining steps still run.
pub fn restore_attributes(packet: &RestorePacket, reporter: &dyn JobReporter) {
    if matches!(packet.file_type, FileType::Symlink | FileType::Hardlink) {
        return;
    }

    let path = Path::new(packet.ofname.trim_end_matches('/'));
    let statp = &packet.statp;
    reporter.debug(
        150,
        &format!("Set file attributes {} with stat {statp:?}", packet.ofname),
    );

    if let Err(e) = chown(path, statp.uid, statp.gid) {
        reporter.warning(&format!(
            "Could not set owner for file {}: \"{e}\"",
            packet.ofname
        ));
    }
    if let Err(e) = chmod(path, statp.mode) {
        reporter.warning(&format!(
            "Could not set permissions for file {}: \"{e}\"",
            packet.ofname
        ));
    }
    let atime = FileTime::from_unix_time(statp.atime, 0);
    let mtime = FileTime::from_unix_time(statp.mtime, 0);
    if let Err(e) = filetime::set_file_times(path, atime, mtime) {
        reporter.warning(&format!(
            "Could not set times for file {}: \"{e}\"",
            packet.ofname
        ));
    }
}

fn link_source(packet: &RestorePacket) -> Result<&str> {
    packet.olname.as_deref().ok_or_else(|| {
        EngineError::InvalidPacket(format!(
            "restore packet for {} carries no link source",
            packet.ofname
        ))
    })
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(unix)]
fn symlink(source: &str, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(not(unix))]
fn symlink(_source: &str, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlink restore requires a unix target",
    ))
}

#[cfg(unix)]
fn mkfifo_0600(path: &Path) -> std::io::Result<()> {
    use nix::sys::stat::Mode;
    nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR)
        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
}

#[cfg(not(unix))]
fn mkfifo_0600(_path: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "fifo restore requires a unix target",
    ))
}

#[cfg(unix)]
fn chown(path: &Path, uid: u32, gid: u32) -> std::io::Result<()> {
    use nix::unistd::{Gid, Uid};
    nix::unistd::chown(path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid)))
        .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
}

#[cfg(not(unix))]
fn chown(_path: &Path, _uid: u32, _gid: u32) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn chmod(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn chmod(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
