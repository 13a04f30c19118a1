//! Vigil CLI binary entry point.
//! Resolves configuration, runs the scan manager and prints results.

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};
use vigil::checks::builtin;
use vigil::cli::{Cli, Commands};
use vigil::config::{self, CliOverrides, Effective};
use vigil::logging::{self, LogOptions};
use vigil::output::{self, error_prefix, note_prefix};
use vigil::progress::{NullProgress, ProgressSink, StdoutProgress};
use vigil::{targets, CancellationToken, PythonParser, ScanError, ScanManager, ScanScope};

const EXIT_FINDINGS: u8 = 1;
const EXIT_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Checks {
            config,
            include,
            exclude,
        } => {
            let overrides = CliOverrides {
                config,
                include,
                exclude,
                ..Default::default()
            };
            let eff = match config::resolve_effective(&cwd, &overrides) {
                Ok(eff) => eff,
                Err(e) => return fail(&e.to_string()),
            };
            match builtin::registry(&eff.selection) {
                Ok(registry) => {
                    for d in registry.descriptors() {
                        println!(
                            "{}  {:<40} {}",
                            d.id,
                            d.check.name(),
                            d.check.description()
                        );
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e.to_string()),
            }
        }
        Commands::Scan {
            paths,
            config,
            output,
            level,
            confidence,
            lines,
            jobs,
            progress,
            include,
            exclude,
            metadata,
            quiet,
            debug,
        } => {
            let overrides = CliOverrides {
                config,
                output,
                level,
                confidence,
                lines,
                progress,
                jobs,
                debug,
                include,
                exclude,
            };
            let eff = match config::resolve_effective(&cwd, &overrides) {
                Ok(eff) => eff,
                Err(e) => return fail(&e.to_string()),
            };
            let dispatch = logging::init(LogOptions {
                debug: eff.debug,
                ansi: std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            });
            tracing::dispatcher::with_default(&dispatch, || {
                run_scan(&eff, &paths, metadata, quiet, &cwd, dispatch.clone())
            })
        }
    }
}

fn fail(message: &str) -> ExitCode {
    eprintln!("{} {}", error_prefix(), message);
    ExitCode::from(EXIT_FAILURE)
}

/// Interrupt handler decision: cancel the run, or end the process.
fn exit_now(token: &CancellationToken, exit_on_first: bool) -> bool {
    token.request_cancel() || exit_on_first
}

fn run_scan(
    eff: &Effective,
    paths: &[PathBuf],
    show_metadata: bool,
    quiet: bool,
    cwd: &std::path::Path,
    dispatch: tracing::Dispatch,
) -> ExitCode {
    if let Some(p) = eff.config_path.as_ref() {
        debug!(config = %p.display(), "using config file");
    }
    let scope = if paths.is_empty() {
        ScanScope::Stdin
    } else {
        let files = targets::expand_paths(paths, &eff.extensions);
        if files.is_empty() {
            eprintln!(
                "{} no files with extensions [{}] found",
                note_prefix(),
                eff.extensions.join(", ")
            );
            return ExitCode::SUCCESS;
        }
        ScanScope::Files(files)
    };

    let registry = match builtin::registry(&eff.selection) {
        Ok(r) => r,
        Err(e) => return fail(&e.to_string()),
    };

    // A blocking stdin read or a long parse never polls the token, so stdin
    // runs stop on the first signal and file runs on the second.
    let token = CancellationToken::new();
    {
        let token = token.clone();
        let exit_on_first = scope.is_stdin();
        if let Err(e) = ctrlc::set_handler(move || {
            if exit_now(&token, exit_on_first) {
                eprintln!("{} interrupted", error_prefix());
                std::process::exit(i32::from(EXIT_FAILURE));
            }
        }) {
            warn!("cannot install interrupt handler: {}", e);
        }
    }

    let progress: Arc<dyn ProgressSink> = if quiet || eff.output == "json" {
        Arc::new(NullProgress)
    } else {
        Arc::new(StdoutProgress::new())
    };

    let manager = match ScanManager::new(registry, Arc::new(PythonParser::new()), eff.scan_options()) {
        Ok(m) => m
            .with_progress(progress)
            .with_cancellation(token)
            .with_dispatch(dispatch),
        Err(e) => return fail(&e.to_string()),
    };

    let summary = match manager.run(&scope) {
        Ok(summary) => summary,
        Err(ScanError::Interrupted(partial)) => {
            eprintln!(
                "{} interrupted after {} file(s); partial results discarded",
                error_prefix(),
                partial.files_attempted
            );
            return ExitCode::from(EXIT_FAILURE);
        }
        Err(e) => return fail(&e.to_string()),
    };

    let view = summary.findings.summarize(&scope, eff.level, eff.confidence);
    output::print_report(&view, &summary, &eff.output, eff.lines, cwd);
    if show_metadata {
        output::print_metadata(&summary.metadata.all_records(), &eff.output, cwd);
    }
    if view.findings.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FINDINGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_signal_exits_file_runs() {
        let token = CancellationToken::new();
        assert!(!exit_now(&token, false));
        assert!(token.is_cancelled());
        assert!(exit_now(&token, false));
    }

    #[test]
    fn test_first_signal_exits_stdin_runs() {
        let token = CancellationToken::new();
        assert!(exit_now(&token, true));
        assert!(token.is_cancelled());
    }
}
