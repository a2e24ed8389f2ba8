//! Pull-driven backup iteration over the candidate queue.
//!
//! The job controller owns the loop: it alternates `next_object` and
//! `has_more` until the queue is drained. All fatal conditions surface from
//! `start`; everything after that is per-object and non-fatal.

use crate::config::JobOptions;
use crate::descriptor::{Classifier, SavePacket, StatClassifier};
use crate::filter::FilterPolicy;
use crate::fs::enumerate::{enumerate, read_fileset};
use crate::report::JobReporter;
use crate::utils::errors::{EngineError, Result};

/// Outcome of one `next_object` call.
#[derive(Debug)]
pub enum NextObject {
    /// A candidate was classified; the controller streams its content next.
    Packet(SavePacket),
    /// The candidate was dropped (unsupported type, vanished object); there
    /// may still be more work.
    Skip,
    /// The queue is empty; the job is complete.
    Done,
}

/// Per-job backup state machine.
///
/// Owns the candidate queue exclusively. Candidates are consumed from the
/// tail, so the emission order is the reverse of discovery order; no
/// ordering is promised beyond "every accepted candidate exactly once".
pub struct BackupSession<'a> {
    queue: Vec<String>,
    classifier: Box<dyn Classifier + 'a>,
    reporter: &'a dyn JobReporter,
}

impl<'a> BackupSession<'a> {
    /// Start a backup job: read the fileset list, compile the filter and
    /// enumerate all candidates up front.
    ///
    /// Fatal outcomes: unreadable list file, malformed pattern, and an
    /// enumeration that yields no candidates at all.
    pub fn start(options: &JobOptions, reporter: &'a dyn JobReporter) -> Result<Self> {
        Self::with_classifier(options, reporter, StatClassifier)
    }

    /// Start a session with a custom classification hook.
    pub fn with_classifier(
        options: &JobOptions,
        reporter: &'a dyn JobReporter,
        classifier: impl Classifier + 'a,
    ) -> Result<Self> {
        reporter.debug(
            100,
            &format!(
                "Using {} to search for local files",
                options.fileset.display()
            ),
        );
        let roots = read_fileset(&options.fileset)?;
        let filter = FilterPolicy::new(options.allow.as_deref(), options.deny.as_deref())?;

        let mut queue = Vec::new();
        enumerate(&roots, &filter, reporter, &mut queue);
        reporter.debug(150, &format!("Filelist: {queue:?}"));

        if queue.is_empty() {
            reporter.error("No (allowed) files to backup found");
            return Err(EngineError::NoCandidates);
        }

        Ok(Self {
            queue,
            classifier: Box::new(classifier),
            reporter,
        })
    }

    /// Pop and classify the next candidate.
    pub fn next_object(&mut self) -> NextObject {
        let Some(candidate) = self.queue.pop() else {
            self.reporter.debug(100, "No files to backup");
            return NextObject::Done;
        };
        self.reporter.debug(100, &format!("file: {candidate}"));

        match self.classifier.classify(&candidate, self.reporter) {
            Some(packet) => NextObject::Packet(packet),
            None => NextObject::Skip,
        }
    }

    /// True while candidates remain queued.
    pub fn has_more(&self) -> bool {
        !self.queue.is_empty()
    }
}
