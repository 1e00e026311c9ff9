//! # Case Log — append-only sink for high-risk assessments
//!
//! High and critical outcomes are forwarded here for operator review and
//! follow-up. The log keeps a bounded in-memory ring (newest kept) and can
//! mirror each entry to a JSONL file. Forwarding is best-effort: a sink fault
//! is recorded and logged, never surfaced to the analysis caller.

use parking_lot::RwLock;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// One logged high-risk case.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HighRiskCase {
    pub timestamp: i64,
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_content: String,
    pub risk_level: String,
    pub requires_immediate_attention: bool,
}

pub struct CaseLog {
    cases: RwLock<Vec<HighRiskCase>>,
    file_path: Option<PathBuf>,
    max_cases: usize,
    total_logged: AtomicU64,
    total_sink_failures: AtomicU64,
}

impl CaseLog {
    pub fn new(max_cases: usize) -> Self {
        Self {
            cases: RwLock::new(Vec::new()),
            file_path: None,
            max_cases,
            total_logged: AtomicU64::new(0),
            total_sink_failures: AtomicU64::new(0),
        }
    }

    /// Mirror every case to a JSONL file in addition to the in-memory ring.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "Case log file sink enabled");
        self.file_path = Some(path);
        self
    }

    /// Append a case. Never fails from the caller's perspective: file-sink
    /// errors are counted and logged at warn level.
    pub fn record(&self, case: HighRiskCase) {
        self.total_logged.fetch_add(1, Ordering::Relaxed);

        if let Some(ref path) = self.file_path {
            if let Err(e) = self.append_to_file(path, &case) {
                self.total_sink_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%e, path = %path.display(), "Case log file append failed");
            }
        }

        let mut cases = self.cases.write();
        if cases.len() >= self.max_cases {
            let drain = cases.len() - self.max_cases + 1;
            cases.drain(..drain);
        }
        cases.push(case);
    }

    fn append_to_file(&self, path: &PathBuf, case: &HighRiskCase) -> std::io::Result<()> {
        let line = serde_json::to_string(case)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", line)
    }

    /// The last `n` cases, newest first.
    pub fn recent(&self, n: usize) -> Vec<HighRiskCase> {
        let cases = self.cases.read();
        cases.iter().rev().take(n).cloned().collect()
    }

    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    pub fn total_sink_failures(&self) -> u64 {
        self.total_sink_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(level: &str) -> HighRiskCase {
        HighRiskCase {
            timestamp: 100,
            user_id: Some("u1".into()),
            conversation_id: None,
            message_content: "text".into(),
            risk_level: level.into(),
            requires_immediate_attention: level == "critical",
        }
    }

    #[test]
    fn test_ring_is_bounded() {
        let log = CaseLog::new(3);
        for _ in 0..10 {
            log.record(case("high"));
        }
        assert_eq!(log.recent(100).len(), 3);
        assert_eq!(log.total_logged(), 10);
    }

    #[test]
    fn test_recent_newest_first() {
        let log = CaseLog::new(10);
        log.record(case("high"));
        log.record(case("critical"));
        let recent = log.recent(2);
        assert!(recent[0].requires_immediate_attention);
        assert!(!recent[1].requires_immediate_attention);
    }

    #[test]
    fn test_file_sink_failure_is_swallowed() {
        let log = CaseLog::new(10).with_file("/nonexistent-dir/vigil-cases.jsonl");
        log.record(case("critical"));
        assert_eq!(log.total_logged(), 1);
        assert_eq!(log.total_sink_failures(), 1);
        assert_eq!(log.recent(1).len(), 1);
    }
}
