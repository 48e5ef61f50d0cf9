//! CLI entrypoint for the fmi2cb conformance harness.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use fmi2cb_core::{Status, log_mode, status_label};
use fmi2cb_harness::structured_log::{ArtifactIndex, LogEmitter, LogEntry, LogLevel, Outcome};
use fmi2cb_harness::{FixtureArg, FixtureCase, FixtureSet, VerificationSummary, render_case, verify_case};

/// Conformance tooling for the FMI 2.0.2 callback bundle.
#[derive(Debug, Parser)]
#[command(name = "fmi2cb-harness")]
#[command(about = "Conformance harness for the fmi2cb logger line format")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the logger renderer against fixture files.
    Verify {
        /// Fixture JSON file, or a directory of them.
        #[arg(long)]
        fixture: PathBuf,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact index JSON output path.
        #[arg(long)]
        index: Option<PathBuf>,
        /// Run identifier embedded in trace ids.
        #[arg(long, default_value = "verify")]
        run_id: String,
    },
    /// Print the exact line the logger would emit for one call.
    Render {
        /// Raw fmi2Status value (out-of-range values render as Unknown).
        #[arg(long, allow_hyphen_values = true)]
        status: i32,
        #[arg(long)]
        category: String,
        #[arg(long)]
        instance: String,
        /// printf-style message format.
        #[arg(long)]
        format: String,
        /// Variadic argument as kind:value (int, uint, float, str, ptr, fill, null).
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<FixtureArg>,
    },
    /// Print the status label table.
    Labels,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            log,
            index,
            run_id,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let sets = FixtureSet::load_path(&fixture)?;

            let mut emitter = match &log {
                Some(path) => Some(LogEmitter::to_file(path, &run_id)?),
                None => None,
            };
            let mode = log_mode().as_str();

            let mut results = Vec::new();
            for (path, set) in &sets {
                if let Some(emitter) = emitter.as_mut() {
                    emitter.emit_entry(
                        LogEntry::new("", LogLevel::Info, "fixture_set_start")
                            .with_family(&set.family)
                            .with_mode(mode)
                            .with_artifacts(vec![path.display().to_string()]),
                    )?;
                }
                for case in &set.cases {
                    let started = Instant::now();
                    let result = verify_case(case);
                    let latency_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);

                    if let Some(emitter) = emitter.as_mut() {
                        let (level, outcome) = if result.passed {
                            (LogLevel::Info, Outcome::Pass)
                        } else {
                            (LogLevel::Error, Outcome::Fail)
                        };
                        let mut entry = LogEntry::new("", level, "fixture_case")
                            .with_family(&set.family)
                            .with_case(&case.name, case.status)
                            .with_outcome(outcome)
                            .with_latency_ns(latency_ns);
                        if !result.passed {
                            entry = entry.with_details(serde_json::to_value(&result)?);
                        }
                        emitter.emit_entry(entry)?;
                    }
                    results.push(result);
                }
            }

            let summary = VerificationSummary::from_results(results);
            for failure in summary.failures() {
                eprintln!("FAIL {}: {}", failure.case_name, failure.failures.join("; "));
            }
            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                summary.total, summary.passed, summary.failed
            );

            if let Some(mut emitter) = emitter {
                emitter.emit_entry(
                    LogEntry::new("", LogLevel::Info, "verify_complete").with_details(
                        serde_json::json!({
                            "total": summary.total,
                            "passed": summary.passed,
                            "failed": summary.failed,
                        }),
                    ),
                )?;
                emitter.flush()?;
            }

            if let Some(index_path) = index {
                let mut artifacts = ArtifactIndex::new(&run_id);
                for (path, _) in &sets {
                    artifacts.add_file(path, "fixture")?;
                }
                if let Some(log_path) = &log {
                    artifacts.add_file(log_path, "log")?;
                }
                std::fs::write(&index_path, artifacts.to_json()?)?;
                eprintln!("Wrote artifact index to {}", index_path.display());
            }

            if !summary.all_passed() {
                return Err("Conformance verification failed".into());
            }
        }
        Command::Render {
            status,
            category,
            instance,
            format,
            args,
        } => {
            let case = FixtureCase {
                name: String::from("cli"),
                status,
                category,
                instance,
                format,
                args,
                expected: None,
                expected_len: None,
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&render_case(&case))?;
            stdout.flush()?;
        }
        Command::Labels => {
            for status in Status::ALL {
                println!("{}\t{}", status.as_raw(), status.label());
            }
            let out_of_range = Status::Pending.as_raw() + 1;
            println!("{out_of_range}\t{}", status_label(out_of_range));
        }
    }

    Ok(())
}
