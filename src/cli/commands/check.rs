use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::time::Instant;

use super::{load_settings, select_headers};
use crate::cli::Output;
use crate::compile::{CompileResult, FailureKind, ResultSet};
use crate::config::{BatchSize, Settings};
use crate::parallel::ProgressRegistry;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Headers to check, as named in an `#include` (default: everything in the include directories)
    #[arg(value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Compiler executable
    #[arg(long)]
    pub compiler: Option<String>,

    /// Include directory of the header set (repeatable, replaces includeDirs)
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<String>,

    /// Include directory of a dependency (repeatable, replaces importedIncludeDirs)
    #[arg(long = "imported-include-dir", value_name = "DIR")]
    pub imported_include_dirs: Vec<String>,

    /// Extra compiler argument (repeatable, replaces compilerArgs)
    #[arg(long = "compiler-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub compiler_args: Vec<String>,

    /// Concurrency limit: 0 = one thread per header, N = pool of N workers, auto = one per CPU
    #[arg(short = 'j', long)]
    pub batch_size: Option<BatchSize>,

    /// Per-header compiler deadline in seconds (0 = none)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Also check headers in subdirectories of the include directories
    #[arg(long)]
    pub recursive: bool,

    /// Show per-header progress bars
    #[arg(long, overrides_with = "no_progress")]
    pub progress: bool,

    /// Never show progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per header plus a summary
    Text,
    /// Machine-readable report
    Json,
}

/// Flags that override configuration values; unset ones are dropped before merging
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckOverrides {
    compiler: Option<String>,
    include_dirs: Vec<String>,
    imported_include_dirs: Vec<String>,
    compiler_args: Vec<String>,
    batch_size: Option<BatchSize>,
    timeout_secs: Option<u64>,
    recursive: Option<bool>,
    progress: Option<bool>,
}

impl From<&CheckArgs> for CheckOverrides {
    fn from(args: &CheckArgs) -> Self {
        let progress = match (args.progress, args.no_progress) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Self {
            compiler: args.compiler.clone(),
            include_dirs: args.include_dirs.clone(),
            imported_include_dirs: args.imported_include_dirs.clone(),
            compiler_args: args.compiler_args.clone(),
            batch_size: args.batch_size,
            timeout_secs: args.timeout,
            recursive: args.recursive.then_some(true),
            progress,
        }
    }
}

pub async fn execute(args: CheckArgs, config_path: Option<&str>, output: &Output) -> Result<()> {
    let started = Instant::now();
    let settings = load_settings(config_path, Some(CheckOverrides::from(&args)))?;
    let headers = select_headers(&args.headers, &settings)?;

    if headers.is_empty() {
        bail!(
            "No header files found in include directories: {}",
            settings.include_dirs.join(", ")
        );
    }

    let strategy = settings.strategy();
    let show_progress = args.format == OutputFormat::Text && wants_progress(&settings, output);

    // stdout carries only the report in JSON mode
    if args.format == OutputFormat::Text {
        output.info(&format!("Found {} header files to compile", headers.len()));
        output.verbose(&format!(
            "Compiler: {} | Strategy: {}",
            settings.compiler,
            strategy.describe()
        ));
    }

    let ctx = settings.compile_context();
    let results = tokio::task::spawn_blocking(move || -> Result<ResultSet> {
        let registry = show_progress.then(|| ProgressRegistry::new(&headers));
        let results = strategy.execute(&headers, &ctx, registry.as_ref());
        if let Some(registry) = &registry {
            registry.finish();
        }
        results
    })
    .await
    .context("Compilation engine stopped unexpectedly")??;

    let elapsed = started.elapsed();
    tracing::info!(
        headers = results.len(),
        failed = results.failed(),
        "check finished in {:.2}s",
        elapsed.as_secs_f64()
    );

    let failed = results.failed();
    match args.format {
        OutputFormat::Text => print_text(results, output),
        OutputFormat::Json => print_json(results)?,
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn wants_progress(settings: &Settings, output: &Output) -> bool {
    if output.is_quiet() {
        return false;
    }
    settings
        .progress
        .unwrap_or_else(|| atty::is(atty::Stream::Stderr))
}

fn print_text(results: ResultSet, output: &Output) {
    let passed = results.passed();
    let failed = results.failed();

    output.header("Compilation Results Summary:");
    for result in results.into_sorted() {
        let message = result.failure.as_ref().map(|e| e.to_string());
        output.header_result(&result.header, message.as_deref());
    }
    output.summary(passed, failed);
}

#[derive(Serialize)]
struct JsonReport {
    results: Vec<JsonResult>,
    passed: usize,
    failed: usize,
}

#[derive(Serialize)]
struct JsonResult {
    header: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<CompileResult> for JsonResult {
    fn from(result: CompileResult) -> Self {
        Self {
            success: result.is_success(),
            kind: result.kind(),
            message: result.failure.map(|e| e.to_string()),
            header: result.header,
        }
    }
}

fn build_report(results: ResultSet) -> JsonReport {
    let passed = results.passed();
    let failed = results.failed();
    JsonReport {
        results: results.into_sorted().into_iter().map(JsonResult::from).collect(),
        passed,
        failed,
    }
}

fn print_json(results: ResultSet) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&build_report(results))?);
    Ok(())
}
