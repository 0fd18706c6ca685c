//! Compiler subprocess execution with combined output capture

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::CompileError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exit status plus interleaved stdout/stderr of one compiler run
#[derive(Debug)]
pub struct CompilerOutput {
    pub status: ExitStatus,
    pub output: String,
}

/// Run `program args...` in `working_dir` and wait for it, optionally bounded by `timeout`.
///
/// Stdout and stderr are drained by two reader threads into one buffer, so the
/// transcript keeps the order in which the compiler wrote its chunks. A non-zero
/// exit is returned as `Ok`; callers decide what it means.
///
/// On unix the compiler leads its own process group. A compiler driver forks the
/// real compiler and assembler, which inherit the output pipes, so the deadline
/// kills the whole group rather than just the driver.
pub fn run_compiler(
    program: &str,
    args: &[String],
    working_dir: &Path,
    timeout: Option<Duration>,
) -> Result<CompilerOutput, CompileError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(CompileError::Launch)?;

    let transcript = Mutex::new(Vec::new());
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let waited = crossbeam::thread::scope(|s| {
        let sink = &transcript;
        if let Some(pipe) = stdout {
            s.spawn(move |_| drain(pipe, sink));
        }
        if let Some(pipe) = stderr {
            s.spawn(move |_| drain(pipe, sink));
        }
        wait(&mut child, timeout)
    })
    .map_err(|_| CompileError::Launch(std::io::Error::other("output reader thread panicked")))?;

    let buffer = transcript.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let output = String::from_utf8_lossy(&buffer).into_owned();

    match waited {
        Ok(Some(status)) => Ok(CompilerOutput { status, output }),
        Ok(None) => Err(CompileError::TimedOut {
            limit: timeout.unwrap_or_default(),
            output,
        }),
        Err(e) => Err(CompileError::Launch(e)),
    }
}

/// Wait for the child; `Ok(None)` means the deadline passed and the child was killed.
fn wait(child: &mut Child, timeout: Option<Duration>) -> std::io::Result<Option<ExitStatus>> {
    let Some(limit) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            // Reap after kill so the pipes close and the readers finish
            kill_process_group(child);
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and everything it spawned into its process group
#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // The group id equals the leader's pid, see `process_group(0)` above
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
        tracing::debug!("killpg({pgid}) failed, killing the compiler alone: {e}");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

fn drain<R: Read>(mut pipe: R, sink: &Mutex<Vec<u8>>) {
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let mut buffer = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                buffer.extend_from_slice(&chunk[..n]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}
