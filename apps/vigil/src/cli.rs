//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Vigil — security checks over Python syntax trees",
    long_about = "Vigil parses each source file, walks its syntax tree with a set of security checks, and reports findings.\n\nConfiguration precedence: CLI > vigil.toml > defaults.",
    after_help = "Examples:\n  vigil scan src/\n  vigil scan app.py lib/util.py --level medium\n  cat script.py | vigil scan\n  vigil scan src/ --output json --exclude B101\n  vigil checks",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current vigil version.")]
    Version,
    /// Scan files, directories or stdin
    #[command(
        about = "Run security checks",
        long_about = "Scan the given files (directories are searched for matching extensions). With no paths, one source is read from stdin. A file that cannot be read or parsed is reported and skipped; the rest of the scan continues.",
        after_help = "Examples:\n  vigil scan src/ --jobs 4\n  vigil scan a.py --metadata\n  vigil scan --lines 3 < script.py"
    )]
    Scan {
        #[arg(help = "Files or directories to scan (default: stdin)")]
        paths: Vec<PathBuf>,
        #[arg(long, help = "Path to config file (default: discovered vigil.toml|yaml)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Minimum severity reported: low|medium|high (default: low)")]
        level: Option<String>,
        #[arg(long, help = "Minimum confidence reported: low|medium|high (default: low)")]
        confidence: Option<String>,
        #[arg(long, help = "Lines of code shown per finding (default: 1)")]
        lines: Option<usize>,
        #[arg(long, help = "Worker threads (default: 1)")]
        jobs: Option<usize>,
        #[arg(long, help = "Files between progress markers (default: 50)")]
        progress: Option<usize>,
        #[arg(long, value_delimiter = ',', help = "Only run these check ids (comma separated)")]
        include: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "Skip these check ids (comma separated)")]
        exclude: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the per-file parse audit after the report")]
        metadata: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Do not print progress markers")]
        quiet: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Enable debug logging")]
        debug: bool,
    },
    /// List available checks
    #[command(
        about = "List checks",
        long_about = "List the checks that a scan with the current configuration would run."
    )]
    Checks {
        #[arg(long, help = "Path to config file (default: discovered vigil.toml|yaml)")]
        config: Option<PathBuf>,
        #[arg(long, value_delimiter = ',', help = "Only list these check ids")]
        include: Vec<String>,
        #[arg(long, value_delimiter = ',', help = "Hide these check ids")]
        exclude: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "vigil", "scan", "a.py", "src", "--level", "medium", "--exclude", "B101,B602", "--jobs",
            "2",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Scan {
                paths,
                level,
                exclude,
                jobs,
                metadata,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.py"), PathBuf::from("src")]);
                assert_eq!(level.as_deref(), Some("medium"));
                assert_eq!(exclude, vec!["B101", "B602"]);
                assert_eq!(jobs, Some(2));
                assert!(!metadata);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_scan_without_paths_means_stdin() {
        let cli = Cli::try_parse_from(["vigil", "scan"]).unwrap();
        assert!(matches!(cli.cmd, Commands::Scan { ref paths, .. } if paths.is_empty()));
    }
}
