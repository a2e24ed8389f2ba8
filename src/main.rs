//! Fileset Agent - Main entry point
//!
//! Reference driver for the enumeration and restore engine: scans a fileset
//! into a JSON-lines descriptor stream, or replays such a stream to
//! recreate the objects. Content streaming for regular files is left to the
//! surrounding backup tooling.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fileset_agent::backup::{BackupSession, NextObject};
use fileset_agent::config::JobOptions;
use fileset_agent::descriptor::RestorePacket;
use fileset_agent::report::TracingReporter;
use fileset_agent::{restore, utils};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate the fileset and print one descriptor per line
    Scan {
        /// Plain-text list of backup roots, one per line (overrides config)
        #[arg(long)]
        fileset: Option<PathBuf>,

        /// Regex that files must match to be included
        #[arg(long)]
        allow: Option<String>,

        /// Regex that excludes files
        #[arg(long)]
        deny: Option<String>,
    },
    /// Recreate objects from a JSON-lines descriptor stream
    Restore {
        /// Descriptor stream file (defaults to stdin)
        #[arg(long)]
        packets: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut options = if let Some(config_path) = &args.config {
        JobOptions::from_file(config_path)?
    } else {
        JobOptions::default()
    };

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| options.log_level.clone());
    utils::logger::init(&log_level)?;

    tracing::info!("Starting fileset-agent v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Scan {
            fileset,
            allow,
            deny,
        } => {
            if let Some(fileset) = fileset {
                options.fileset = fileset;
            }
            if allow.is_some() {
                options.allow = allow;
            }
            if deny.is_some() {
                options.deny = deny;
            }
            scan(&options)
        }
        Command::Restore { packets } => restore_stream(packets.as_deref()),
    }
}

/// Run one backup session and emit every save packet as a JSON line.
fn scan(options: &JobOptions) -> Result<()> {
    let reporter = TracingReporter;
    let mut session = BackupSession::start(options, &reporter)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    loop {
        match session.next_object() {
            NextObject::Packet(packet) => {
                serde_json::to_writer(&mut out, &packet)?;
                out.write_all(b"\n")?;
            }
            NextObject::Skip => continue,
            NextObject::Done => break,
        }
    }
    Ok(())
}

/// Replay a JSON-lines restore stream, continuing past per-object failures.
fn restore_stream(packets: Option<&Path>) -> Result<()> {
    let reporter = TracingReporter;
    let reader: Box<dyn BufRead> = match packets {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut restored = 0usize;
    let mut failures = 0usize;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let packet: RestorePacket = match serde_json::from_str(&line) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!("Could not parse restore packet: {}", e);
                failures += 1;
                continue;
            }
        };
        match restore::materialize(&packet, &reporter) {
            Ok(_) => {
                restore::restore_attributes(&packet, &reporter);
                restored += 1;
            }
            Err(e) => {
                tracing::warn!("Could not restore {}: {}", packet.ofname, e);
                failures += 1;
            }
        }
    }

    tracing::info!(
        "Restore finished: {} objects restored, {} failed",
        restored,
        failures
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileset_agent::descriptor::{FileType, StatRecord};
    use std::fs;
    use tempfile::TempDir;

    fn regular_packet(ofname: &Path) -> RestorePacket {
        RestorePacket {
            ofname: ofname.display().to_string(),
            file_type: FileType::Regular,
            olname: None,
            statp: StatRecord::default(),
        }
    }

    #[test]
    fn test_restore_stream_continues_past_bad_packet() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let first = temp_dir.path().join("first.txt");
        let second = temp_dir.path().join("second.txt");

        let good_first = serde_json::to_string(&regular_packet(&first))?;
        let good_second = serde_json::to_string(&regular_packet(&second))?;
        // a type tag this agent cannot restore
        let bad = serde_json::to_string(&regular_packet(&temp_dir.path().join("never.txt")))?
            .replace("\"regular\"", "\"socket\"");

        let stream = temp_dir.path().join("packets.jsonl");
        fs::write(&stream, format!("{good_first}\n{bad}\n{good_second}\n"))?;

        restore_stream(Some(stream.as_path()))?;

        // the bad line is counted and skipped, everything after it restores
        assert!(first.is_file());
        assert!(second.is_file());
        assert!(!temp_dir.path().join("never.txt").exists());
        Ok(())
    }
}
