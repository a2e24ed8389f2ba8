//! Backup and restore descriptors ("save packets" / "restore packets").
//!
//! One save packet describes one file-system object at the backup boundary:
//! its raw path, its type tag, an optional link target and the stat data
//! copied verbatim. The restore packet is the mirror image, supplied
//! wholesale by the job controller. Both serialize with serde; the JSON
//! encoding is what crosses the plugin boundary.

use crate::report::JobReporter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Object type tag exchanged at the backup/restore boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Regular,
    Symlink,
    /// Restored as a hard link to an earlier-restored object; never
    /// produced by the backup side.
    Hardlink,
    DirEnd,
    Fifo,
}

/// Stat data copied verbatim from the file system, no transformation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatRecord {
    pub mode: u32,
    pub ino: u64,
    pub dev: u64,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
}

impl StatRecord {
    #[cfg(unix)]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            mode: metadata.mode(),
            ino: metadata.ino(),
            dev: metadata.dev(),
            nlink: metadata.nlink(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            atime: metadata.atime(),
            mtime: metadata.mtime(),
            ctime: metadata.ctime(),
        }
    }

    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::time::UNIX_EPOCH;

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self {
            size: metadata.len(),
            mtime,
            ..Self::default()
        }
    }
}

/// Per-candidate backup descriptor handed to the job controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePacket {
    pub fname: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub statp: StatRecord,
}

/// Per-object restore descriptor supplied by the job controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorePacket {
    pub ofname: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub olname: Option<String>,
    pub statp: StatRecord,
}

/// Classification hook: turns one candidate path into a save packet.
///
/// Drivers backing virtual objects substitute their own implementation;
/// [`StatClassifier`] is the file-system default.
pub trait Classifier {
    /// Build the packet, or `None` when the object is skipped (unsupported
    /// type, or vanished between enumeration and this call).
    fn classify(&self, path: &str, reporter: &dyn JobReporter) -> Option<SavePacket>;
}

/// Default classifier backed by lstat/stat.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatClassifier;

impl Classifier for StatClassifier {
    fn classify(&self, path: &str, reporter: &dyn JobReporter) -> Option<SavePacket> {
        build_save_packet(path, reporter)
    }
}

/// Classify `path` and build its save packet.
///
/// Symbolic links are detected on the slash-stripped name (a directory
/// marker that is itself a symlink still carries a trailing slash) and
/// described with their own lstat data, never the target's. Precedence:
/// symlink, regular file, directory, FIFO; sockets, devices and anything
/// else yield `None` with a warning. An object whose metadata can no longer
/// be fetched also yields `None`, after an error diagnostic.
pub fn build_save_packet(path: &str, reporter: &dyn JobReporter) -> Option<SavePacket> {
    let stripped = path.trim_end_matches('/');
    let probe = Path::new(stripped);

    let link_metadata = match probe.symlink_metadata() {
        Ok(metadata) => metadata,
        Err(e) => {
            reporter.error(&format!("Could not get stat-info for file {path}: \"{e}\""));
            return None;
        }
    };
    let is_symlink = link_metadata.file_type().is_symlink();

    let metadata = if is_symlink {
        link_metadata
    } else {
        match fs::metadata(Path::new(path)) {
            Ok(metadata) => metadata,
            Err(e) => {
                reporter.error(&format!("Could not get stat-info for file {path}: \"{e}\""));
                return None;
            }
        }
    };

    let (file_type, link) = if is_symlink {
        reporter.debug(150, "file type is: symlink");
        let target = fs::read_link(probe)
            .ok()
            .map(|t| t.to_string_lossy().into_owned());
        (FileType::Symlink, target)
    } else if metadata.is_file() {
        reporter.debug(150, "file type is: regular");
        (FileType::Regular, None)
    } else if metadata.is_dir() {
        reporter.debug(150, &format!("file {path} type is: dir-end"));
        (FileType::DirEnd, Some(path.to_string()))
    } else if is_fifo(&metadata) {
        reporter.debug(150, "file type is: fifo");
        (FileType::Fifo, None)
    } else {
        reporter.warning(&format!("File {path} of unknown type"));
        return None;
    };

    Some(SavePacket {
        fname: path.to_string(),
        file_type,
        link,
        statp: StatRecord::from_metadata(&metadata),
    })
}

#[cfg(unix)]
fn is_fifo(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    metadata.file_type().is_fifo()
}

#[cfg(not(unix))]
fn is_fifo(_metadata: &fs::Metadata) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;
    use tempfile::TempDir;

    #[test]
    fn test_regular_file() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("report.txt");
        fs::write(&file, b"twelve bytes")?;

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&file.display().to_string(), &reporter).unwrap();

        assert_eq!(packet.file_type, FileType::Regular);
        assert_eq!(packet.fname, file.display().to_string());
        assert!(packet.link.is_none());
        assert_eq!(packet.statp.size, 12);
        assert!(packet.statp.mtime > 0);
        Ok(())
    }

    #[test]
    fn test_directory_marker() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let marker = format!("{}/", temp_dir.path().display());

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&marker, &reporter).unwrap();

        assert_eq!(packet.file_type, FileType::DirEnd);
        // the link mirrors the marker path, slash preserved
        assert_eq!(packet.link.as_deref(), Some(marker.as_str()));
        assert_eq!(packet.fname, marker);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_uses_lstat_and_records_target() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("target.txt");
        fs::write(&target, b"target content here")?;
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link)?;

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&link.display().to_string(), &reporter).unwrap();

        assert_eq!(packet.file_type, FileType::Symlink);
        assert_eq!(packet.link.as_deref(), Some(target.to_str().unwrap()));
        // lstat of the link itself, not the 19-byte target
        assert_ne!(packet.statp.size, 19);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_directory_marker_is_a_symlink() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let real = temp_dir.path().join("real");
        fs::create_dir(&real)?;
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link)?;

        let reporter = RecordingReporter::new();
        let marker = format!("{}/", link.display());
        let packet = build_save_packet(&marker, &reporter).unwrap();

        assert_eq!(packet.file_type, FileType::Symlink);
        assert_eq!(packet.fname, marker);
        assert_eq!(packet.link.as_deref(), Some(real.to_str().unwrap()));
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_fifo() -> std::io::Result<()> {
        use nix::sys::stat::Mode;

        let temp_dir = TempDir::new()?;
        let fifo = temp_dir.path().join("pipe");
        nix::unistd::mkfifo(&fifo, Mode::S_IRUSR | Mode::S_IWUSR).unwrap();

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&fifo.display().to_string(), &reporter).unwrap();

        assert_eq!(packet.file_type, FileType::Fifo);
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_socket_is_skipped_with_warning() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let socket = temp_dir.path().join("agent.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&socket)?;

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&socket.display().to_string(), &reporter);

        assert!(packet.is_none());
        assert!(reporter.contains("unknown type"));
        Ok(())
    }

    #[test]
    fn test_vanished_object_is_skipped_with_error() {
        let reporter = RecordingReporter::new();
        let packet = build_save_packet("/nonexistent/gone.txt", &reporter);
        assert!(packet.is_none());
        assert!(reporter.contains("Could not get stat-info"));
    }

    #[test]
    fn test_packet_json_shape() -> std::io::Result<()> {
        let temp_dir = TempDir::new()?;
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, b"x")?;

        let reporter = RecordingReporter::new();
        let packet = build_save_packet(&file.display().to_string(), &reporter).unwrap();
        let json = serde_json::to_string(&packet).unwrap();

        assert!(json.contains("\"type\":\"regular\""));
        // absent link target is omitted, not null
        assert!(!json.contains("\"link\""));
        Ok(())
    }
}
