//! Include/exclude policy for discovered files.
//!
//! A policy is compiled once per job from the configured patterns and never
//! changes afterwards. Directory markers are never run through it; only
//! plain files are.

use crate::report::JobReporter;
use crate::Result;
use regex::Regex;

/// Compiled allow/deny policy.
///
/// An absent `allow` matches everything, an absent `deny` matches nothing.
/// A path is included iff it matches `allow` and does not match `deny`.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    allow: Option<Regex>,
    deny: Option<Regex>,
}

impl FilterPolicy {
    /// Compile a policy from optional pattern strings.
    ///
    /// A malformed pattern is fatal to the job.
    pub fn new(allow: Option<&str>, deny: Option<&str>) -> Result<Self> {
        Ok(Self {
            allow: allow.map(Regex::new).transpose()?,
            deny: deny.map(Regex::new).transpose()?,
        })
    }

    /// Check whether `path` is allowed. Matching is unanchored, like a
    /// search anywhere in the path.
    ///
    /// Rejections are reported through the diagnostic channel; they never
    /// abort the job.
    pub fn is_allowed(&self, path: &str, reporter: &dyn JobReporter) -> bool {
        let allowed = self.allow.as_ref().map_or(true, |re| re.is_match(path));
        let denied = self.deny.as_ref().is_some_and(|re| re.is_match(path));

        if !allowed || denied {
            reporter.debug(100, &format!("File {path} denied by configuration"));
            reporter.error(&format!("File {path} denied by configuration"));
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RecordingReporter;

    #[test]
    fn test_no_patterns_allows_everything() -> Result<()> {
        let policy = FilterPolicy::new(None, None)?;
        let reporter = RecordingReporter::new();
        assert!(policy.is_allowed("/data/report.txt", &reporter));
        assert!(policy.is_allowed("/var/log/messages", &reporter));
        Ok(())
    }

    #[test]
    fn test_allow_only() -> Result<()> {
        let policy = FilterPolicy::new(Some(r"\.txt$"), None)?;
        let reporter = RecordingReporter::new();
        assert!(policy.is_allowed("/data/report.txt", &reporter));
        assert!(!policy.is_allowed("/data/image.png", &reporter));
        Ok(())
    }

    #[test]
    fn test_deny_only() -> Result<()> {
        let policy = FilterPolicy::new(None, Some(r"\.log$"))?;
        let reporter = RecordingReporter::new();
        assert!(policy.is_allowed("/data/report.txt", &reporter));
        assert!(!policy.is_allowed("/data/secret.log", &reporter));
        Ok(())
    }

    #[test]
    fn test_allow_and_deny() -> Result<()> {
        let policy = FilterPolicy::new(Some("^/data/"), Some(r"\.log$"))?;
        let reporter = RecordingReporter::new();
        assert!(policy.is_allowed("/data/report.txt", &reporter));
        assert!(!policy.is_allowed("/data/secret.log", &reporter));
        assert!(!policy.is_allowed("/home/user/report.txt", &reporter));
        Ok(())
    }

    #[test]
    fn test_rejection_emits_diagnostic() -> Result<()> {
        let policy = FilterPolicy::new(None, Some("secret"))?;
        let reporter = RecordingReporter::new();
        assert!(!policy.is_allowed("/data/secret.log", &reporter));
        assert!(reporter.contains("denied by configuration"));
        Ok(())
    }

    #[test]
    fn test_malformed_pattern_is_fatal() {
        let result = FilterPolicy::new(Some("("), None);
        assert!(result.is_err());
    }
}
