//! Process execution with captured or passthrough output.
//!
//! [`run`] captures stdout/stderr into memory and never touches the
//! terminal. [`run_passthrough`] forwards both streams live while the child
//! runs. Both honour a [`CancelToken`] and never report a failed launch as an
//! `Err`: the caller gets a synthetic non-zero exit code instead.

use crate::args;
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::tree::ProcessTree;
use crate::types::ProcessResult;
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Exit code reported when the process could not be started.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Exit code reported when the process was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -2;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// Options for captured runs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Working directory for the child (inherited when `None`)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the child
    pub env: Vec<(OsString, OsString)>,
}

/// Run a program and capture its output.
///
/// Returns `Err` only for cancellation or an I/O fault while waiting on a
/// child that did start. On cancellation the child's whole process tree is
/// killed and the readers are left behind rather than joined.
pub fn run(
    program: &Path,
    args: &[String],
    options: &RunOptions,
    cancel: &CancelToken,
) -> Result<ProcessResult> {
    let mut cmd = build_command(program, args);
    if let Some(dir) = &options.working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    ProcessTree::prepare(&mut cmd, true);

    log::debug!("running: {}", command_line(program, args));
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return Ok(launch_failure(program, &e, start.elapsed())),
    };

    let out_task = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe, "stdout")));
    let err_task = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe, "stderr")));
    let mut guard = ChildGuard::new(child, true);

    // Readers are only joined once the child exited on its own
    let status = wait_with_cancel(&mut guard, cancel)?;
    let stdout = collect(out_task);
    let stderr = collect(err_task);

    let elapsed = start.elapsed();
    log::debug!(
        "{} exited with {} after {:.2?}",
        program.display(),
        status,
        elapsed
    );

    Ok(ProcessResult {
        exit_code: exit_code(status),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        elapsed,
    })
}

/// Run a program with its output streamed to this process's stdout/stderr.
pub fn run_passthrough(program: &Path, args: &[String], cancel: &CancelToken) -> Result<i32> {
    let mut out = io::stdout();
    let mut err = io::stderr();
    run_passthrough_to(program, args, cancel, &mut out, &mut err)
}

/// Run a program, forwarding its stdout to `out` and stderr to `err` as it
/// is produced.
///
/// Each stream is copied by its own thread, so a slow sink on one stream
/// never blocks the other. Returns once the child has exited and both
/// streams are fully flushed, or promptly after cancellation even when a
/// process started by the child still holds the pipes open.
pub fn run_passthrough_to(
    program: &Path,
    args: &[String],
    cancel: &CancelToken,
    out: &mut (dyn Write + Send),
    err: &mut (dyn Write + Send),
) -> Result<i32> {
    let mut cmd = build_command(program, args);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    log::debug!("running (passthrough): {}", command_line(program, args));

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let _ = writeln!(err, "failed to start {}: {}", program.display(), e);
            let _ = err.flush();
            return Ok(LAUNCH_FAILURE_EXIT_CODE);
        }
    };

    let stdout = pump(child.stdout.take());
    let stderr = pump(child.stderr.take());
    let mut guard = ChildGuard::new(child, false);

    let (status, out_result, err_result) = thread::scope(|scope| {
        let out_task = scope.spawn(move || relay(&stdout, out, cancel));
        let err_task = scope.spawn(move || relay(&stderr, err, cancel));

        let status = wait_with_cancel(&mut guard, cancel);

        let out_result = out_task
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdout forwarder panicked")));
        let err_result = err_task
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr forwarder panicked")));
        (status, out_result, err_result)
    });

    let status = status?;
    if let Err(e) = out_result.and(err_result) {
        log::warn!("output forwarding for {} stopped early: {}", program.display(), e);
    }

    Ok(exit_code(status))
}

fn build_command(program: &Path, args: &[String]) -> Command {
    let mut cmd = Command::new(program);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        for arg in args {
            cmd.raw_arg(args::quote(arg));
        }
    }

    #[cfg(not(windows))]
    cmd.args(args);

    cmd
}

fn command_line(program: &Path, args: &[String]) -> String {
    args::render_command_line(&program.to_string_lossy(), args)
}

fn launch_failure(program: &Path, error: &io::Error, elapsed: Duration) -> ProcessResult {
    log::debug!("failed to start {}: {}", program.display(), error);
    ProcessResult {
        exit_code: LAUNCH_FAILURE_EXIT_CODE,
        stdout: String::new(),
        stderr: format!("failed to start {}: {}", program.display(), error),
        elapsed,
    }
}

/// Wait for the child, killing it if the token is cancelled first.
fn wait_with_cancel(guard: &mut ChildGuard, cancel: &CancelToken) -> Result<ExitStatus> {
    loop {
        if cancel.is_cancelled() {
            guard.kill();
            return Err(Error::Cancelled);
        }
        match guard.try_wait()? {
            Some(status) => return Ok(status),
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}

fn drain(mut pipe: impl Read, stream: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf) {
        log::warn!("reading child {stream} stopped after {} bytes: {e}", buf.len());
    }
    buf
}

fn collect(task: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    task.map(|t| t.join().unwrap_or_default()).unwrap_or_default()
}

type Chunk = io::Result<Vec<u8>>;

/// Read a pipe on a detached thread, sending chunks until EOF.
///
/// The channel disconnects once the pipe is exhausted or the receiver is gone.
fn pump(pipe: Option<impl Read + Send + 'static>) -> Receiver<Chunk> {
    let (tx, rx) = mpsc::channel();
    if let Some(pipe) = pipe {
        thread::spawn(move || read_chunks(pipe, &tx));
    }
    rx
}

fn read_chunks(mut pipe: impl Read, tx: &Sender<Chunk>) {
    let mut buf = [0u8; COPY_BUFFER_SIZE];
    loop {
        let chunk = match pipe.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };
        let failed = chunk.is_err();
        if tx.send(chunk).is_err() || failed {
            return;
        }
    }
}

/// Write received chunks to `sink` until the stream ends or the run is
/// cancelled.
fn relay(chunks: &Receiver<Chunk>, sink: &mut (dyn Write + Send), cancel: &CancelToken) -> io::Result<()> {
    while !cancel.is_cancelled() {
        match chunks.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => {
                sink.write_all(&chunk?)?;
                sink.flush()?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    sink.flush()
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNALLED_EXIT_CODE)
}

/// Owns a child process and reaps it on every exit path.
struct ChildGuard {
    child: Child,
    tree: ProcessTree,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child, own_group: bool) -> Self {
        let tree = ProcessTree::attach(&child, own_group);
        Self {
            child,
            tree,
            reaped: false,
        }
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        self.tree.kill(&mut self.child);
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> (PathBuf, Vec<String>) {
        (
            PathBuf::from("/bin/sh"),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[test]
    fn test_run_captures_output_and_exit_code() {
        let (program, args) = sh("echo out; echo err >&2; exit 3");
        let result = run(&program, &args, &RunOptions::default(), &CancelToken::new()).unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!result.succeeded());
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[test]
    fn test_run_uses_working_dir_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let (program, args) = sh("pwd; echo \"$PKGSYNC_TEST_VALUE\"");
        let options = RunOptions {
            working_dir: Some(dir.path().to_path_buf()),
            env: vec![("PKGSYNC_TEST_VALUE".into(), "hello".into())],
        };

        let result = run(&program, &args, &options, &CancelToken::new()).unwrap();
        let lines: Vec<&str> = result.stdout.lines().collect();

        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(lines[0]).canonicalize().unwrap(), expected);
        assert_eq!(lines[1], "hello");
        assert!(result.succeeded());
    }

    #[test]
    fn test_run_missing_binary_is_not_an_error() {
        let result = run(
            Path::new("/nonexistent/definitely-not-winget"),
            &[],
            &RunOptions::default(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("failed to start"));
    }

    #[test]
    fn test_run_large_output_does_not_deadlock() {
        let (program, args) = sh("i=0; while [ $i -lt 20000 ]; do echo line$i; echo err$i >&2; i=$((i+1)); done");
        let result = run(&program, &args, &RunOptions::default(), &CancelToken::new()).unwrap();

        assert!(result.succeeded());
        assert_eq!(result.stdout.lines().count(), 20000);
        assert_eq!(result.stderr.lines().count(), 20000);
    }

    #[test]
    fn test_passthrough_preserves_stream_order_and_exit_code() {
        let (program, args) = sh(
            "echo one; echo alpha >&2; echo two; echo beta >&2; echo three; echo gamma >&2; exit 7",
        );
        let mut out = Vec::new();
        let mut err = Vec::new();

        let code =
            run_passthrough_to(&program, &args, &CancelToken::new(), &mut out, &mut err).unwrap();

        assert_eq!(code, 7);
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\nthree\n");
        assert_eq!(String::from_utf8(err).unwrap(), "alpha\nbeta\ngamma\n");
    }

    #[test]
    fn test_passthrough_launch_failure_reports_to_err_sink() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = run_passthrough_to(
            Path::new("/nonexistent/definitely-not-winget"),
            &[],
            &CancelToken::new(),
            &mut out,
            &mut err,
        )
        .unwrap();

        assert_eq!(code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(out.is_empty());
        assert!(String::from_utf8(err).unwrap().contains("failed to start"));
    }

    #[test]
    fn test_cancellation_returns_promptly() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let start = Instant::now();
        let result = run(
            Path::new("sleep"),
            &["5".to_string()],
            &RunOptions::default(),
            &cancel,
        );
        canceller.join().unwrap();

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    fn cancel_after(delay: Duration) -> (CancelToken, thread::JoinHandle<()>) {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(delay);
            trigger.cancel();
        });
        (cancel, canceller)
    }

    #[test]
    fn test_cancellation_does_not_wait_for_grandchildren() {
        // sh forks sleep, which inherits both pipes
        let (program, args) = sh("sleep 4; echo done");
        let (cancel, canceller) = cancel_after(Duration::from_millis(100));

        let start = Instant::now();
        let result = run(&program, &args, &RunOptions::default(), &cancel);
        canceller.join().unwrap();

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    }

    #[test]
    fn test_passthrough_cancellation_does_not_wait_for_grandchildren() {
        let (program, args) = sh("echo started; sleep 4; echo done");
        let (cancel, canceller) = cancel_after(Duration::from_millis(200));
        let mut out = Vec::new();
        let mut err = Vec::new();

        let start = Instant::now();
        let result = run_passthrough_to(&program, &args, &cancel, &mut out, &mut err);
        canceller.join().unwrap();

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
        assert!(!String::from_utf8_lossy(&out).contains("done"));
    }

    #[test]
    fn test_drain_keeps_bytes_read_before_an_error() {
        struct Flaky {
            sent: bool,
        }

        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.sent {
                    return Err(io::Error::other("pipe broke"));
                }
                self.sent = true;
                buf[..7].copy_from_slice(b"partial");
                Ok(7)
            }
        }

        assert_eq!(drain(Flaky { sent: false }, "stdout"), b"partial");
    }

    #[test]
    fn test_already_cancelled_passthrough() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let result =
            run_passthrough_to(Path::new("sleep"), &["5".to_string()], &cancel, &mut out, &mut err);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
