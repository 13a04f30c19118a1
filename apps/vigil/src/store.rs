//! Run-wide aggregate of findings.

use crate::models::{Confidence, Finding, Severity, STDIN_ID};
use crate::scan::ScanScope;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Append-only finding store, safe to share across worker threads.
#[derive(Debug, Default)]
pub struct FindingStore {
    findings: Mutex<Vec<Finding>>,
}

#[derive(Debug, Clone, Serialize)]
/// Filtered, read-only copy of the store.
pub struct ReportView {
    pub findings: Vec<Finding>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_confidence: BTreeMap<Confidence, usize>,
    pub files_with_findings: usize,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Finding>> {
        // A poisoned lock only means a writer panicked mid-push; the Vec is still valid.
        self.findings.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add(&self, finding: Finding) {
        self.lock().push(finding);
    }

    /// Append a batch atomically, keeping its internal order.
    pub fn extend(&self, findings: impl IntoIterator<Item = Finding>) {
        self.lock().extend(findings);
    }

    pub fn all_findings(&self) -> Vec<Finding> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stable sort by `(file, line, column)`; used after parallel runs.
    pub fn sort_by_location(&self) {
        self.lock()
            .sort_by(|a, b| (a.file(), a.line(), a.column()).cmp(&(b.file(), b.line(), b.column())));
    }

    /// Findings within `scope` at or above both thresholds.
    pub fn summarize(
        &self,
        scope: &ScanScope,
        min_severity: Severity,
        min_confidence: Confidence,
    ) -> ReportView {
        let in_scope: BTreeSet<String> = match scope {
            ScanScope::Stdin => std::iter::once(STDIN_ID.to_string()).collect(),
            ScanScope::Files(paths) => paths.iter().map(|p| crate::scan::file_id(p)).collect(),
        };
        let findings: Vec<Finding> = self
            .lock()
            .iter()
            .filter(|f| in_scope.contains(f.file()))
            .filter(|f| f.severity() >= min_severity && f.confidence() >= min_confidence)
            .cloned()
            .collect();
        let mut by_severity = BTreeMap::new();
        let mut by_confidence = BTreeMap::new();
        let mut files = BTreeSet::new();
        for f in &findings {
            *by_severity.entry(f.severity()).or_insert(0) += 1;
            *by_confidence.entry(f.confidence()).or_insert(0) += 1;
            files.insert(f.file());
        }
        let files_with_findings = files.len();
        ReportView {
            findings,
            by_severity,
            by_confidence,
            files_with_findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn finding(file: &str, line: usize, sev: Severity, conf: Confidence) -> Finding {
        Finding::new(file, line, 0, "T1", sev, conf, "m", "")
    }

    fn store() -> FindingStore {
        let s = FindingStore::new();
        s.add(finding("b.py", 2, Severity::High, Confidence::High));
        s.add(finding("a.py", 9, Severity::Low, Confidence::High));
        s.add(finding("a.py", 1, Severity::Medium, Confidence::Low));
        s.add(finding("other.py", 1, Severity::High, Confidence::High));
        s
    }

    #[test]
    fn test_summarize_filters_without_mutating() {
        let s = store();
        let scope = ScanScope::Files(vec![PathBuf::from("a.py"), PathBuf::from("b.py")]);
        let v1 = s.summarize(&scope, Severity::Medium, Confidence::Low);
        assert_eq!(v1.findings.len(), 2);
        assert_eq!(v1.by_severity.get(&Severity::High), Some(&1));
        assert_eq!(v1.files_with_findings, 2);
        let v2 = s.summarize(&scope, Severity::Medium, Confidence::Low);
        assert_eq!(v1.findings, v2.findings);
        assert_eq!(s.len(), 4);

        let strict = s.summarize(&scope, Severity::Low, Confidence::High);
        assert_eq!(strict.findings.len(), 2);
    }

    #[test]
    fn test_stdin_scope_only_sees_stdin() {
        let s = store();
        s.add(finding(STDIN_ID, 1, Severity::Low, Confidence::Low));
        let v = s.summarize(&ScanScope::Stdin, Severity::Low, Confidence::Low);
        assert_eq!(v.findings.len(), 1);
        assert_eq!(v.findings[0].file(), STDIN_ID);
    }

    #[test]
    fn test_sort_by_location() {
        let s = store();
        s.sort_by_location();
        let order: Vec<_> = s
            .all_findings()
            .iter()
            .map(|f| (f.file().to_string(), f.line()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.py".to_string(), 1),
                ("a.py".to_string(), 9),
                ("b.py".to_string(), 2),
                ("other.py".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_concurrent_adds() {
        let s = std::sync::Arc::new(FindingStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let s = s.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        s.add(finding(&format!("f{}.py", t), i, Severity::Low, Confidence::Low));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.len(), 100);
    }
}
