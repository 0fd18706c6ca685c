//! Integration tests for the headertest CLI and compilation engine

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use headertest::compile::{CompileContext, FailureKind, compile_one};
use headertest::parallel::{
    ExecutionStrategy, ProgressRegistry, compile_fanout, compile_workerpool,
    compile_workerpool_with_progress,
};

const MISSING_COMPILER: &str = "headertest-absent-compiler-42aa";

fn headertest() -> Command {
    Command::cargo_bin("headertest").unwrap()
}

/// Project layout: include/ with the given headers
fn project(headers: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let include = dir.path().join("include");
    fs::create_dir_all(&include).unwrap();
    for (name, body) in headers {
        let path = include.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
    dir
}

fn header_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("h{i}.hpp")).collect()
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    files.sort();
    files
}

#[cfg(unix)]
mod stub {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// A fake compiler: fails on any translation unit naming a "broken" header,
    /// otherwise leaves `<stem>.o` in its working directory like `cc -c` does.
    pub const COMPILER: &str = r#"#!/bin/sh
src="$2"
if grep -q broken "$src"; then
    echo "$src:1:10: error: unknown type name 'Missing'" >&2
    exit 1
fi
touch "$(basename "$src" .cpp).o"
exit 0
"#;

    /// Records how many copies of itself are running at once into `$HT_TRACE/samples`
    pub const COUNTING_COMPILER: &str = r#"#!/bin/sh
src="$2"
touch "$HT_TRACE/running.$$"
ls "$HT_TRACE" | grep -c '^running\.' >> "$HT_TRACE/samples"
sleep 0.2
rm -f "$HT_TRACE/running.$$"
touch "$(basename "$src" .cpp).o"
exit 0
"#;

    /// Never finishes on its own; forks like a driver running `cc1plus`
    pub const HANGING_COMPILER: &str = r#"#!/bin/sh
echo "still thinking"
sleep 30
exit 0
"#;

    /// Reports success without writing an object file
    pub const NO_OBJECT_COMPILER: &str = "#!/bin/sh\nexit 0\n";

    pub fn install(dir: &Path, name: &str, script: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    headertest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("standalone translation unit"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    headertest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("headertest"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    headertest()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_batch_size_rejected() {
    headertest()
        .args(["check", "--batch-size", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid batch size"));
}

#[test]
fn test_list_discovers_headers() {
    let dir = project(&[
        ("b.hpp", ""),
        ("a.h", ""),
        ("notes.txt", ""),
        ("detail/impl.hpp", ""),
    ]);

    headertest()
        .current_dir(dir.path())
        .args(["list", "-I", "include"])
        .assert()
        .success()
        .stdout("a.h\nb.hpp\n");

    headertest()
        .current_dir(dir.path())
        .args(["list", "-I", "include", "--recursive"])
        .assert()
        .success()
        .stdout("a.h\nb.hpp\ndetail/impl.hpp\n");
}

#[test]
fn test_check_without_headers_fails() {
    let dir = project(&[]);
    headertest()
        .current_dir(dir.path())
        .args(["check", "-I", "include", "--compiler", MISSING_COMPILER])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No header files found"));
}

#[test]
fn test_check_with_missing_compiler_reports_every_header() {
    let dir = project(&[("a.h", ""), ("b.h", "")]);
    headertest()
        .current_dir(dir.path())
        .args(["check", "--no-progress", "--compiler", MISSING_COMPILER, "-I", "include"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("a.h"))
        .stdout(predicate::str::contains("b.h"))
        .stdout(predicate::str::contains("Summary: 0 successful, 2 failed"));
}

#[test]
fn test_check_json_report() {
    let dir = project(&[("z.h", ""), ("a.h", "")]);
    let assert = headertest()
        .current_dir(dir.path())
        .args([
            "check",
            "--format",
            "json",
            "--compiler",
            MISSING_COMPILER,
            "-I",
            "include",
            "--batch-size",
            "1",
        ])
        .assert()
        .code(1);

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["passed"], 0);
    assert_eq!(report["failed"], 2);
    assert_eq!(report["results"][0]["header"], "a.h");
    assert_eq!(report["results"][1]["header"], "z.h");
    assert_eq!(report["results"][0]["kind"], "compiler-unavailable");
}

#[test]
fn test_config_show_merges_repo_file_and_env() {
    let dir = project(&[]);
    fs::write(
        dir.path().join("config.json"),
        r#"{"includeDirs": ["test/project/include"], "compiler": "clang++", "batchSize": 2}"#,
    )
    .unwrap();

    let assert = headertest()
        .current_dir(dir.path())
        .env("HEADERTEST_TIMEOUT_SECS", "45")
        .args(["config", "show"])
        .assert()
        .success();

    let config: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(config["compiler"], "clang++");
    assert_eq!(config["batchSize"], 2);
    assert_eq!(config["includeDirs"][0], "test/project/include");
    assert_eq!(config["timeoutSecs"], 45);
    // Untouched keys keep their defaults
    assert_eq!(config["recursive"], false);
}

#[test]
fn test_config_validate_flags_missing_compiler() {
    let dir = project(&[]);
    fs::write(
        dir.path().join("headertest.toml"),
        format!("compiler = \"{MISSING_COMPILER}\"\n"),
    )
    .unwrap();

    headertest()
        .current_dir(dir.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(MISSING_COMPILER));
}

#[test]
fn test_custom_config_must_exist() {
    headertest()
        .args(["--config", "/definitely/not/here.toml", "config", "show"])
        .assert()
        .failure();
}

#[test]
fn test_empty_header_list_is_empty_result() {
    let ctx = CompileContext::new(MISSING_COMPILER);
    assert!(compile_fanout(&[], &ctx).unwrap().is_empty());
    assert!(compile_workerpool(&[], &ctx, 4).unwrap().is_empty());
}

#[cfg(unix)]
mod with_stub_compiler {
    use super::*;

    fn stub_project(headers: &[(&str, &str)], script: &str) -> (TempDir, PathBuf) {
        let dir = project(headers);
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let compiler = stub::install(&bin, "fakecc", script);
        (dir, compiler)
    }

    fn context(dir: &TempDir, compiler: &Path) -> CompileContext {
        CompileContext::new(compiler.display().to_string())
            .with_include_dirs(vec!["include".into()])
            .with_working_dir(dir.path())
    }

    #[test]
    fn test_every_header_gets_exactly_one_result() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);
        let headers = header_names(9);

        for strategy in [
            ExecutionStrategy::FanOut,
            ExecutionStrategy::WorkerPool { workers: 1 },
            ExecutionStrategy::WorkerPool { workers: 3 },
            ExecutionStrategy::WorkerPool { workers: 20 },
        ] {
            let results = strategy.execute(&headers, &ctx, None).unwrap();
            assert_eq!(results.len(), headers.len(), "{}", strategy.describe());
            let mut seen = results.headers();
            seen.sort_unstable();
            let mut expected: Vec<&str> = headers.iter().map(String::as_str).collect();
            expected.sort_unstable();
            assert_eq!(seen, expected);
            assert_eq!(results.failed(), 0);
        }
    }

    #[test]
    fn test_objects_are_cleaned_up() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);
        let mut headers = header_names(4);
        headers.push("broken.hpp".into());

        let before = files_in(dir.path());
        let results = compile_workerpool(&headers, &ctx, 2).unwrap();
        assert_eq!(results.failed(), 1);
        assert_eq!(files_in(dir.path()), before);
    }

    #[test]
    fn test_diagnostics_are_preserved() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);

        let result = compile_one("broken.hpp", &ctx).unwrap();
        assert_eq!(result.kind(), Some(FailureKind::CompilationFailed));
        let error = result.failure.unwrap();
        assert!(error.diagnostics().unwrap().contains("unknown type name 'Missing'"));
        assert!(error.to_string().contains("compilation failed"));
    }

    #[test]
    fn test_strategies_and_runs_agree() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);
        let mut headers = header_names(5);
        headers.insert(2, "broken_one.hpp".into());

        let first = compile_fanout(&headers, &ctx).unwrap().verdicts();
        let second = compile_fanout(&headers, &ctx).unwrap().verdicts();
        let pooled = compile_workerpool(&headers, &ctx, 2).unwrap().verdicts();
        assert_eq!(first, second);
        assert_eq!(first, pooled);
        assert_eq!(first.get("broken_one.hpp"), Some(&Some(FailureKind::CompilationFailed)));
        assert_eq!(first.get("h0.hpp"), Some(&None));
    }

    #[test]
    fn test_worker_pool_bounds_concurrency() {
        let (dir, compiler) = stub_project(&[], stub::COUNTING_COMPILER);
        let trace = TempDir::new().unwrap();
        let ctx = context(&dir, &compiler);
        let headers = header_names(8);

        // The stub reads its trace directory from the environment
        let assert = headertest()
            .current_dir(dir.path())
            .env("HT_TRACE", trace.path())
            .args(["check", "--no-progress", "--batch-size", "2"])
            .args(["--compiler", &ctx.compiler, "-I", "include"])
            .args(&headers)
            .assert();
        assert.success();

        let samples = fs::read_to_string(trace.path().join("samples")).unwrap();
        let counts: Vec<usize> = samples.lines().map(|l| l.trim().parse().unwrap()).collect();
        assert_eq!(counts.len(), headers.len());
        assert!(counts.iter().all(|&c| (1..=2).contains(&c)), "{counts:?}");
    }

    #[test]
    fn test_timeout_kills_hung_compiler() {
        let (dir, compiler) = stub_project(&[], stub::HANGING_COMPILER);
        let ctx = context(&dir, &compiler).with_timeout(Some(std::time::Duration::from_millis(300)));

        let started = std::time::Instant::now();
        let result = compile_one("slow.hpp", &ctx).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(result.kind(), Some(FailureKind::TimedOut));
        assert!(result.failure.unwrap().diagnostics().unwrap().contains("still thinking"));
    }

    #[test]
    fn test_missing_object_is_cleanup_failure() {
        let (dir, compiler) = stub_project(&[], stub::NO_OBJECT_COMPILER);
        let ctx = context(&dir, &compiler);

        let result = compile_one("quiet.hpp", &ctx).unwrap();
        assert_eq!(result.kind(), Some(FailureKind::ArtifactCleanupFailed));
        assert!(result.failure.unwrap().to_string().contains("failed to delete object file"));
    }

    #[test]
    fn test_cleanup_failure_still_removes_translation_unit() {
        let (dir, compiler) = stub_project(&[("quiet.hpp", "")], stub::NO_OBJECT_COMPILER);
        let tmp = TempDir::new().unwrap();

        let assert = headertest()
            .current_dir(dir.path())
            .env("TMPDIR", tmp.path())
            .args(["check", "--format", "json", "-I", "include"])
            .args(["--compiler", &compiler.display().to_string()])
            .assert()
            .code(1);

        let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
        assert_eq!(report["results"][0]["kind"], "artifact-cleanup-failed");
        assert!(files_in(tmp.path()).is_empty());
    }

    #[test]
    fn test_progress_bars_complete_on_success() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);
        let headers = header_names(4);
        let registry = ProgressRegistry::hidden(&headers);

        let results = compile_workerpool_with_progress(&headers, &ctx, 2, &registry).unwrap();
        assert_eq!(results.failed(), 0);
        for index in 0..headers.len() {
            let bar = registry.handle(index).unwrap();
            assert_eq!(bar.position(), 100);
            assert!(bar.is_finished());
        }
    }

    #[test]
    fn test_repeated_header_compiled_per_occurrence() {
        let (dir, compiler) = stub_project(&[], stub::COMPILER);
        let ctx = context(&dir, &compiler);
        let headers = vec!["twice.hpp".to_string(), "twice.hpp".to_string()];
        let registry = ProgressRegistry::hidden(&headers);

        let results = compile_workerpool_with_progress(&headers, &ctx, 2, &registry).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(registry.handle(0).unwrap().position(), 100);
        assert_eq!(registry.handle(1).unwrap().position(), 100);
    }

    #[test]
    fn test_cli_leaves_no_temporary_files() {
        let (dir, compiler) = stub_project(&[("ok.hpp", ""), ("broken.hpp", "")], stub::COMPILER);
        let tmp = TempDir::new().unwrap();
        let before = files_in(dir.path());

        headertest()
            .current_dir(dir.path())
            .env("TMPDIR", tmp.path())
            .args(["check", "--no-progress", "-I", "include"])
            .args(["--compiler", &compiler.display().to_string()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("ok.hpp: compiled successfully"))
            .stdout(predicate::str::contains("unknown type name 'Missing'"))
            .stdout(predicate::str::contains("Summary: 1 successful, 1 failed"));

        assert!(files_in(tmp.path()).is_empty());
        assert_eq!(files_in(dir.path()), before);
    }

    #[test]
    fn test_cli_passes_when_all_compile() {
        let (dir, compiler) = stub_project(&[("a.hpp", ""), ("b.hpp", "")], stub::COMPILER);
        fs::write(
            dir.path().join("headertest.json"),
            format!(
                r#"{{"compiler": "{}", "includeDirs": ["include"], "batchSize": "auto"}}"#,
                compiler.display()
            ),
        )
        .unwrap();

        headertest()
            .current_dir(dir.path())
            .args(["check", "--no-progress"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Summary: 2 successful, 0 failed"));
    }
}

/// Exercises a real compiler when one is installed
#[test]
fn test_real_compiler_catches_missing_include() {
    if which::which("c++").is_err() {
        eprintln!("skipping: no c++ on PATH");
        return;
    }

    let dir = project(&[
        (
            "ok.h",
            "#pragma once\n#include <string>\ninline std::string greet() { return \"hi\"; }\n",
        ),
        (
            "broken.h",
            "#pragma once\ninline std::string shout() { return \"HI\"; }\n",
        ),
    ]);
    let ctx = CompileContext::new("c++")
        .with_include_dirs(vec!["include".into()])
        .with_working_dir(dir.path());
    let headers = vec!["ok.h".to_string(), "broken.h".to_string()];
    let before = files_in(dir.path());

    let results = compile_workerpool(&headers, &ctx, 2).unwrap();
    let verdicts = results.verdicts();
    assert_eq!(verdicts.get("ok.h"), Some(&None));
    assert_eq!(verdicts.get("broken.h"), Some(&Some(FailureKind::CompilationFailed)));

    let broken = results.get("broken.h").unwrap();
    assert_eq!(broken.kind(), Some(FailureKind::CompilationFailed));
    assert!(
        broken
            .failure
            .as_ref()
            .and_then(|e| e.diagnostics())
            .is_some_and(|d| d.contains("string"))
    );
    assert_eq!(files_in(dir.path()), before);
}
