use anyhow::Result;
use indicatif::ProgressBar;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

use super::include::IncludeFlags;
use super::probe::is_compiler_available;
use super::process::run_compiler;
use super::types::{CompileContext, CompileError, CompileResult, CompileTask};

/// Progress gained by each completed phase (four phases make 100)
pub const PHASE_STEP: u64 = 25;

/// Compile one header as a standalone translation unit.
///
/// Per-header failures are returned inside the [`CompileResult`]. The only `Err`
/// is an environment failure (the working directory cannot be resolved).
pub fn compile_one(header: &str, ctx: &CompileContext) -> Result<CompileResult> {
    let working_dir = ctx.resolve_working_dir()?;
    let flags = IncludeFlags::resolve(&working_dir, &ctx.include_dirs, &ctx.imported_include_dirs);
    let task = CompileTask {
        header,
        context: ctx,
    };
    Ok(compile_task(task, &flags, &working_dir, None))
}

/// Compile with include flags and working directory already resolved for the run.
///
/// `progress`, when given, belongs to this header alone and is advanced once per
/// phase: translation unit written, command built, compiler finished, object removed.
pub(crate) fn compile_task(
    task: CompileTask<'_>,
    flags: &IncludeFlags,
    working_dir: &Path,
    progress: Option<&ProgressBar>,
) -> CompileResult {
    match run_phases(task, flags, working_dir, progress) {
        Ok(()) => {
            if let Some(bar) = progress {
                bar.finish();
            }
            tracing::debug!(header = task.header, "compiled successfully");
            CompileResult::success(task.header)
        }
        Err(error) => {
            // Partial progress must not read as success
            if let Some(bar) = progress {
                bar.finish_and_clear();
            }
            tracing::debug!(header = task.header, kind = %error.kind(), "compilation did not pass");
            CompileResult::failed(task.header, error)
        }
    }
}

fn run_phases(
    task: CompileTask<'_>,
    flags: &IncludeFlags,
    working_dir: &Path,
    progress: Option<&ProgressBar>,
) -> Result<(), CompileError> {
    let ctx = task.context;
    if !is_compiler_available(&ctx.compiler) {
        return Err(CompileError::CompilerUnavailable(ctx.compiler.clone()));
    }

    if let Some(bar) = progress {
        bar.set_message(format!("Compiling {}", task.header));
    }

    // Removed on drop, so every early return below cleans it up
    let source = write_translation_unit(task.header).map_err(CompileError::TranslationUnit)?;
    advance(progress);

    let args = build_args(&source, flags, &ctx.compiler_args);
    advance(progress);

    let object = object_path_for(&source, working_dir);
    tracing::debug!(header = task.header, compiler = %ctx.compiler, ?args, "invoking compiler");

    let outcome = match run_compiler(&ctx.compiler, &args, working_dir, ctx.timeout) {
        Ok(run) if run.status.success() => Ok(()),
        Ok(run) => Err(CompileError::CompilationFailed {
            status: run.status.to_string(),
            output: run.output,
        }),
        Err(e) => Err(e),
    };
    if let Err(error) = outcome {
        discard_stray_object(&object);
        return Err(error);
    }
    advance(progress);

    std::fs::remove_file(&object).map_err(|source| CompileError::ArtifactCleanup {
        path: object.clone(),
        source,
    })?;
    advance(progress);

    if let Err(e) = source.close() {
        tracing::warn!(header = task.header, "failed to remove temporary translation unit: {e}");
    }
    Ok(())
}

/// Write `#include "<header>"` into a fresh, uniquely named `.cpp` file.
fn write_translation_unit(header: &str) -> std::io::Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("headertest_")
        .suffix(".cpp")
        .tempfile()?;
    writeln!(file, "#include \"{header}\"")?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// `-c <source> <own -I...> <imported -I...> <extra...>`
fn build_args(source: &Path, flags: &IncludeFlags, extra: &[String]) -> Vec<String> {
    let mut args = Vec::with_capacity(2 + flags.own.len() + flags.imported.len() + extra.len());
    args.push("-c".to_string());
    args.push(source.display().to_string());
    args.extend(flags.own.iter().cloned());
    args.extend(flags.imported.iter().cloned());
    args.extend(extra.iter().cloned());
    args
}

/// Object file a `-c` compilation of `source` leaves in `out_dir`.
pub fn object_path_for(source: &Path, out_dir: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    out_dir.join(stem).with_extension("o")
}

fn discard_stray_object(object: &Path) {
    match std::fs::remove_file(object) {
        Ok(()) => tracing::debug!("removed object left by failed compilation: {}", object.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("failed to remove {}: {e}", object.display()),
    }
}

fn advance(progress: Option<&ProgressBar>) {
    if let Some(bar) = progress {
        bar.inc(PHASE_STEP);
    }
}
