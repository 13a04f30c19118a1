//! Scan orchestration: turns a list of files (or stdin) into findings.
//!
//! Per-file failures (unreadable file, syntax error) are logged, recorded in
//! the metadata log and `RunSummary::failures`, and never stop the run. Only
//! configuration errors and cancellation surface as `ScanError`.
//!
//! Cancellation keeps what was committed before the signal: the partial
//! `RunSummary` travels inside `ScanError::Interrupted`. The file being
//! processed when the signal arrives contributes nothing.

use crate::cancel::CancellationToken;
use crate::checks::CheckRegistry;
use crate::error::{ConfigError, FileError, ScanError};
use crate::metadata::TreeMetadataLog;
use crate::models::{Finding, MetadataRecord, STDIN_ID};
use crate::parser::SourceParser;
use crate::progress::{NullProgress, ProgressEvent, ProgressSink, DEFAULT_BATCH};
use crate::store::FindingStore;
use crate::walker::{FaultedCheck, TreeWalker, WalkOutcome};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, debug_span, dispatcher, error, info, info_span, warn, Dispatch};

/// Files submitted for one run. An empty list means "read stdin".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanScope {
    Files(Vec<PathBuf>),
    Stdin,
}

impl From<Vec<PathBuf>> for ScanScope {
    fn from(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            ScanScope::Stdin
        } else {
            ScanScope::Files(paths)
        }
    }
}

impl ScanScope {
    pub fn is_stdin(&self) -> bool {
        matches!(self, ScanScope::Stdin)
    }

    /// Ids as they appear in findings and metadata records.
    pub fn file_ids(&self) -> Vec<String> {
        match self {
            ScanScope::Stdin => vec![STDIN_ID.to_string()],
            ScanScope::Files(paths) => paths.iter().map(|p| file_id(p)).collect(),
        }
    }
}

/// File id used throughout a run for `path`.
pub fn file_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Files between two progress markers.
    pub progress_batch: usize,
    /// Worker threads; 1 keeps the sequential baseline.
    pub jobs: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            progress_batch: DEFAULT_BATCH,
            jobs: 1,
        }
    }
}

impl ScanOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.progress_batch == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.jobs == 0 {
            return Err(ConfigError::InvalidJobs);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Io,
    Syntax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFaultRecord {
    pub file: String,
    pub check_id: String,
    pub message: String,
}

/// Result of a run. Counters only cover files whose processing completed.
#[derive(Debug)]
pub struct RunSummary {
    pub files_attempted: usize,
    pub parse_failures: usize,
    pub io_failures: usize,
    pub failures: Vec<FileFailure>,
    pub check_faults: Vec<CheckFaultRecord>,
    pub findings: Arc<FindingStore>,
    pub metadata: Arc<TreeMetadataLog>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            files_attempted: 0,
            parse_failures: 0,
            io_failures: 0,
            failures: Vec::new(),
            check_faults: Vec::new(),
            findings: Arc::new(FindingStore::new()),
            metadata: Arc::new(TreeMetadataLog::new()),
        }
    }

    /// No findings and every file was read and parsed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.findings.is_empty()
    }
}

enum FileOutcome {
    Scanned {
        record: MetadataRecord,
        findings: Vec<Finding>,
        faults: Vec<FaultedCheck>,
    },
    Failed {
        record: MetadataRecord,
        failure: FileFailure,
    },
    Interrupted,
    NotStarted,
}

pub struct ScanManager {
    registry: Arc<CheckRegistry>,
    parser: Arc<dyn SourceParser>,
    options: ScanOptions,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    dispatch: Dispatch,
}

impl ScanManager {
    /// Validates `options`; an invalid configuration fails before any file is touched.
    pub fn new(
        registry: CheckRegistry,
        parser: Arc<dyn SourceParser>,
        options: ScanOptions,
    ) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
            parser,
            options,
            progress: Arc::new(NullProgress),
            cancel: CancellationToken::new(),
            dispatch: dispatcher::get_default(|d| d.clone()),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Logging handle used for this manager's runs, on every worker thread.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn run(&self, scope: &ScanScope) -> Result<RunSummary, ScanError> {
        match scope {
            ScanScope::Stdin => self.run_reader(io::stdin().lock()),
            ScanScope::Files(paths) => dispatcher::with_default(&self.dispatch, || {
                let span = info_span!("scan", files = paths.len(), language = self.parser.language());
                let _enter = span.enter();
                if self.options.jobs > 1 {
                    self.run_parallel(paths)
                } else {
                    self.run_sequential(paths)
                }
            }),
        }
    }

    /// Scan exactly one anonymous unit read from `reader`. No progress events.
    pub fn run_reader<R: Read>(&self, mut reader: R) -> Result<RunSummary, ScanError> {
        dispatcher::with_default(&self.dispatch, || {
            let span = info_span!("scan", files = 1, language = self.parser.language());
            let _enter = span.enter();
            info!("no files provided, reading from stdin");
            let mut summary = RunSummary::new();
            if self.cancel.is_cancelled() {
                return Err(interrupted(summary));
            }
            let outcome = self.process(STDIN_ID, || {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map(|_| buf)
            });
            if !commit(&mut summary, outcome) {
                return Err(interrupted(summary));
            }
            Ok(summary)
        })
    }

    fn run_sequential(&self, paths: &[PathBuf]) -> Result<RunSummary, ScanError> {
        let total = paths.len();
        let batch = self.options.progress_batch;
        let mut summary = RunSummary::new();
        for (index, path) in paths.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(interrupted(summary));
            }
            if index % batch == 0 {
                self.progress.event(ProgressEvent::Batch { index, total });
            }
            let outcome = self.process(&file_id(path), || fs::read(path));
            if !commit(&mut summary, outcome) {
                return Err(interrupted(summary));
            }
        }
        self.progress.event(ProgressEvent::Finished {
            processed: summary.files_attempted,
        });
        Ok(summary)
    }

    /// Files run on a rayon pool; results are committed in input order so
    /// the store and log match a sequential run exactly.
    fn run_parallel(&self, paths: &[PathBuf]) -> Result<RunSummary, ScanError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "jobs".into(),
                value: e.to_string(),
            })?;
        let total = paths.len();
        let batch = self.options.progress_batch;
        let started = AtomicUsize::new(0);
        let outcomes: Vec<FileOutcome> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    dispatcher::with_default(&self.dispatch, || {
                        if self.cancel.is_cancelled() {
                            return FileOutcome::NotStarted;
                        }
                        let index = started.fetch_add(1, Ordering::SeqCst);
                        if index % batch == 0 {
                            self.progress.event(ProgressEvent::Batch { index, total });
                        }
                        self.process(&file_id(path), || fs::read(path))
                    })
                })
                .collect()
        });

        let mut summary = RunSummary::new();
        let mut complete = true;
        for outcome in outcomes {
            if !commit(&mut summary, outcome) {
                complete = false;
                break;
            }
        }
        if !complete || self.cancel.is_cancelled() {
            return Err(interrupted(summary));
        }
        self.progress.event(ProgressEvent::Finished {
            processed: summary.files_attempted,
        });
        Ok(summary)
    }

    /// Acquire, parse and walk one unit. Every resource is dropped on return.
    fn process(&self, id: &str, read: impl FnOnce() -> io::Result<Vec<u8>>) -> FileOutcome {
        let span = debug_span!("file", id);
        let _enter = span.enter();
        debug!("working on file");

        let read = read();
        if self.cancel.is_cancelled() {
            return FileOutcome::Interrupted;
        }
        let bytes = match read {
            Ok(b) => b,
            Err(source) => {
                let err = FileError::Io {
                    path: id.to_string(),
                    source,
                };
                error!("{}", err);
                return FileOutcome::Failed {
                    record: MetadataRecord::unreadable(id),
                    failure: FileFailure {
                        file: id.to_string(),
                        kind: FailureKind::Io,
                        message: err.to_string(),
                    },
                };
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        let tree = match self.parser.parse(&text) {
            Ok(t) => t,
            Err(_) if self.cancel.is_cancelled() => return FileOutcome::Interrupted,
            Err(source) => {
                let err = FileError::Syntax {
                    path: id.to_string(),
                    source,
                };
                error!("{}", err);
                return FileOutcome::Failed {
                    record: MetadataRecord::syntax_error(id, text.lines().count()),
                    failure: FileFailure {
                        file: id.to_string(),
                        kind: FailureKind::Syntax,
                        message: err.to_string(),
                    },
                };
            }
        };

        let mut findings = Vec::new();
        match TreeWalker::new(&self.registry, &self.cancel).walk(&tree, id, &mut findings) {
            WalkOutcome::Completed { faults } => {
                debug!(
                    nodes = tree.node_count(),
                    findings = findings.len(),
                    "file scanned"
                );
                FileOutcome::Scanned {
                    record: MetadataRecord::success(id, tree.node_count(), tree.line_count()),
                    findings,
                    faults,
                }
            }
            WalkOutcome::Interrupted => FileOutcome::Interrupted,
        }
    }
}

/// Fold one outcome into the summary; `false` when the file did not complete.
fn commit(summary: &mut RunSummary, outcome: FileOutcome) -> bool {
    match outcome {
        FileOutcome::Scanned {
            record,
            findings,
            faults,
        } => {
            summary.files_attempted += 1;
            summary
                .check_faults
                .extend(faults.into_iter().map(|f| CheckFaultRecord {
                    file: record.file.clone(),
                    check_id: f.check_id,
                    message: f.message,
                }));
            summary.findings.extend(findings);
            summary.metadata.record(record);
            true
        }
        FileOutcome::Failed { record, failure } => {
            summary.files_attempted += 1;
            match failure.kind {
                FailureKind::Io => summary.io_failures += 1,
                FailureKind::Syntax => summary.parse_failures += 1,
            }
            summary.metadata.record(record);
            summary.failures.push(failure);
            true
        }
        FileOutcome::Interrupted | FileOutcome::NotStarted => false,
    }
}

fn interrupted(summary: RunSummary) -> ScanError {
    warn!(
        files = summary.files_attempted,
        "scan interrupted, no further files will be processed"
    );
    ScanError::Interrupted(Box::new(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{Check, CheckContext, Visit};
    use crate::error::CheckFault;
    use crate::models::{Confidence, ParseOutcome, Severity};
    use crate::parser::ParseError;
    use crate::tree::{NodeRef, Point, Span, SyntaxTree, TreeBuilder};
    use std::sync::Mutex;

    /// One `word` node per non-empty line; a line `!` is a syntax error.
    struct LineParser;

    impl SourceParser for LineParser {
        fn language(&self) -> &str {
            "lines"
        }

        fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
            let mut b = TreeBuilder::new(text, "module");
            let mut offset = 0;
            for (i, line) in text.lines().enumerate() {
                if line.trim() == "!" {
                    return Err(ParseError::new("unexpected '!'", i + 1, 0));
                }
                if !line.trim().is_empty() {
                    b.add_node(
                        0,
                        "word",
                        None,
                        Span {
                            start_byte: offset,
                            end_byte: offset + line.len(),
                            start: Point::new(i + 1, 0),
                            end: Point::new(i + 1, line.len()),
                        },
                    );
                }
                offset += line.len() + 1;
            }
            Ok(b.build())
        }
    }

    /// Flags lines reading `flag`; cancels the token on `stop`.
    struct FlagWord {
        cancel: Option<CancellationToken>,
    }

    impl Check for FlagWord {
        fn id(&self) -> &str {
            "W001"
        }
        fn name(&self) -> &str {
            "flag_word"
        }
        fn interested_kinds(&self) -> &[&'static str] {
            &["word"]
        }
        fn visit(&self, node: NodeRef<'_>, ctx: &CheckContext<'_>) -> Result<Visit, CheckFault> {
            match node.text().trim() {
                "flag" => Ok(Visit::finding(ctx.finding(
                    node,
                    Severity::Medium,
                    Confidence::High,
                    "flagged word",
                ))),
                "stop" => {
                    if let Some(t) = &self.cancel {
                        t.cancel();
                    }
                    Ok(Visit::none())
                }
                _ => Ok(Visit::none()),
            }
        }
    }

    fn manager(cancel: Option<CancellationToken>, options: ScanOptions) -> ScanManager {
        let registry = CheckRegistry::builder()
            .with_check(FlagWord {
                cancel: cancel.clone(),
            })
            .unwrap()
            .build();
        let m = ScanManager::new(registry, Arc::new(LineParser), options).unwrap();
        match cancel {
            Some(t) => m.with_cancellation(t),
            None => m,
        }
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn test_mixed_scope_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.src", "x\nflag\n");
        let b = write(dir.path(), "b.src", "x\n!\n");
        let c = write(dir.path(), "c.src", "y\n");
        let missing = dir.path().join("missing.src");
        let scope = ScanScope::from(vec![a.clone(), b.clone(), missing.clone(), c]);

        let summary = manager(None, ScanOptions::default()).run(&scope).unwrap();
        assert_eq!(summary.files_attempted, 4);
        assert_eq!(summary.parse_failures, 1);
        assert_eq!(summary.io_failures, 1);
        assert_eq!(summary.metadata.len(), 4);
        assert_eq!(summary.metadata.count(ParseOutcome::SyntaxError), 1);
        assert_eq!(summary.metadata.count(ParseOutcome::Unreadable), 1);

        let findings = summary.findings.all_findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file(), file_id(&a));
        assert_eq!(findings[0].line(), 2);
        assert!(!summary.is_clean());
        let failed: Vec<_> = summary.failures.iter().map(|f| (f.file.clone(), f.kind)).collect();
        assert_eq!(
            failed,
            vec![(file_id(&b), FailureKind::Syntax), (file_id(&missing), FailureKind::Io)]
        );
    }

    #[test]
    fn test_stdin_reads_one_unit_without_progress() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let events = events.clone();
            move |e: ProgressEvent| events.lock().unwrap().push(e)
        };
        let m = manager(None, ScanOptions::default()).with_progress(Arc::new(sink));
        let summary = m.run_reader("flag\nflag\n".as_bytes()).unwrap();
        assert_eq!(summary.files_attempted, 1);
        assert_eq!(summary.metadata.len(), 1);
        assert_eq!(summary.metadata.all_records()[0].file, STDIN_ID);
        assert_eq!(summary.findings.len(), 2);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_progress_markers_every_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..120)
            .map(|i| {
                let body = if i % 7 == 0 { "!\n" } else { "x\n" };
                write(dir.path(), &format!("f{:03}.src", i), body)
            })
            .collect();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let events = events.clone();
            move |e: ProgressEvent| events.lock().unwrap().push(e)
        };
        let m = manager(None, ScanOptions::default()).with_progress(Arc::new(sink));
        m.run(&ScanScope::from(paths)).unwrap();
        let events = events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Batch { index: 0, total: 120 },
                ProgressEvent::Batch { index: 50, total: 120 },
                ProgressEvent::Batch { index: 100, total: 120 },
                ProgressEvent::Finished { processed: 120 },
            ]
        );
    }

    #[test]
    fn test_interrupt_stops_run_and_keeps_prior_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write(dir.path(), "0.src", "flag\n"),
            write(dir.path(), "1.src", "x\n"),
            write(dir.path(), "2.src", "stop\nflag\n"),
            write(dir.path(), "3.src", "flag\n"),
            write(dir.path(), "4.src", "flag\n"),
        ];
        let token = CancellationToken::new();
        let err = manager(Some(token.clone()), ScanOptions::default())
            .run(&ScanScope::from(paths.clone()))
            .unwrap_err();
        let partial = match err {
            ScanError::Interrupted(s) => s,
            other => panic!("expected interruption, got {:?}", other),
        };
        assert!(token.is_cancelled());
        assert_eq!(partial.metadata.len(), 2);
        assert_eq!(partial.files_attempted, 2);
        let files: Vec<_> = partial
            .findings
            .all_findings()
            .iter()
            .map(|f| f.file().to_string())
            .collect();
        assert_eq!(files, vec![file_id(&paths[0])]);
    }

    /// Cancels the token on its `cancel_on`-th call, then fails.
    struct CancellingParser {
        token: CancellationToken,
        cancel_on: usize,
        calls: AtomicUsize,
    }

    impl SourceParser for CancellingParser {
        fn language(&self) -> &str {
            "lines"
        }

        fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_on {
                self.token.cancel();
                return Err(ParseError::new("aborted", 1, 0));
            }
            LineParser.parse(text)
        }
    }

    #[test]
    fn test_interrupt_during_parse_leaves_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..5)
            .map(|i| write(dir.path(), &format!("{}.src", i), "x\n"))
            .collect();
        let token = CancellationToken::new();
        let parser = CancellingParser {
            token: token.clone(),
            cancel_on: 3,
            calls: AtomicUsize::new(0),
        };
        let m = ScanManager::new(CheckRegistry::new(), Arc::new(parser), ScanOptions::default())
            .unwrap()
            .with_cancellation(token);
        let err = m.run(&ScanScope::from(paths)).unwrap_err();
        let partial = match err {
            ScanError::Interrupted(s) => s,
            other => panic!("expected interruption, got {:?}", other),
        };
        assert_eq!(partial.metadata.len(), 2);
        assert_eq!(partial.parse_failures, 0);
        assert!(partial.failures.is_empty());
    }

    #[test]
    fn test_interrupt_while_reading_stdin() {
        let token = CancellationToken::new();
        let m = manager(Some(token.clone()), ScanOptions::default());
        struct CancelOnRead(CancellationToken);
        impl Read for CancelOnRead {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                self.0.cancel();
                Err(io::Error::new(io::ErrorKind::Other, "signal"))
            }
        }
        let err = m.run_reader(CancelOnRead(token)).unwrap_err();
        match err {
            ScanError::Interrupted(partial) => assert!(partial.metadata.is_empty()),
            other => panic!("expected interruption, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_options_fail_before_run() {
        let registry = CheckRegistry::new();
        let err = ScanManager::new(
            registry,
            Arc::new(LineParser),
            ScanOptions {
                progress_batch: 0,
                jobs: 1,
            },
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidBatchSize));
    }

    #[test]
    fn test_repeated_runs_are_identical_and_parallel_matches() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..30)
            .map(|i| {
                let body = match i % 3 {
                    0 => "flag\nx\nflag\n",
                    1 => "!\n",
                    _ => "x\n",
                };
                write(dir.path(), &format!("f{:02}.src", i), body)
            })
            .collect();
        let scope = ScanScope::from(paths);
        let seq = manager(None, ScanOptions::default());
        let first = seq.run(&scope).unwrap();
        let second = seq.run(&scope).unwrap();
        assert_eq!(first.findings.all_findings(), second.findings.all_findings());
        assert_eq!(first.findings.len(), 20);

        let par = manager(
            None,
            ScanOptions {
                progress_batch: 50,
                jobs: 4,
            },
        );
        let third = par.run(&scope).unwrap();
        assert_eq!(first.findings.all_findings(), third.findings.all_findings());
        assert_eq!(first.metadata.all_records(), third.metadata.all_records());
        assert_eq!(third.parse_failures, 10);
    }
}
