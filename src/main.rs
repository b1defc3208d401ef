use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use logmatch_matcher::{ContainSequence, SequenceReport, Stream, contain_sequence};

mod config;

use config::ExpectationFile;

/// logmatch - Check that structured logs contain an ordered sequence of entries
#[derive(Parser, Debug)]
#[command(name = "logmatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file to check (reads stdin when omitted or `-`)
    #[arg(value_name = "LOG")]
    log: Option<PathBuf>,

    /// TOML file listing the expected entries, in order
    #[arg(short, long, value_name = "FILE")]
    expect: PathBuf,

    /// Succeed only if the sequence is NOT present
    #[arg(long)]
    negate: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics go to stderr so stdout only carries the verdict
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(&args, std::io::stdin().lock(), &mut std::io::stdout().lock());
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }
    ExitCode::from(status(&result))
}

/// Exit status: 0 when the assertion held, 1 when it did not, 2 on usage errors
fn status(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

/// Returns whether the assertion held. The failure message goes to `out`.
fn run(args: &Args, stdin: impl Read, out: &mut impl Write) -> Result<bool> {
    let expectations = ExpectationFile::load(&args.expect)?;
    let patterns = expectations
        .to_patterns()
        .with_context(|| format!("in {}", args.expect.display()))?;
    tracing::debug!(patterns = patterns.len(), "loaded expectations");

    let matcher = contain_sequence(patterns);
    let report = evaluate(&matcher, args.log.as_deref(), stdin)?;

    let held = report.matched() != args.negate;
    if !held {
        let message = if args.negate {
            report.negated_failure_message()
        } else {
            report.failure_message()
        };
        write!(out, "{}", message).context("failed to write failure message")?;
    }

    Ok(held)
}

fn evaluate<'m>(
    matcher: &'m ContainSequence,
    log: Option<&Path>,
    stdin: impl Read,
) -> Result<SequenceReport<'m>> {
    match log {
        Some(path) if path != Path::new("-") => {
            // A file is read once up front and matched as a snapshot
            let mut bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            matcher
                .evaluate(&mut bytes)
                .with_context(|| format!("failed to match {}", path.display()))
        }
        _ => {
            let mut stdin = Stream::new(stdin);
            matcher
                .evaluate(&mut stdin)
                .context("failed to match stdin")
        }
    }
}
