//! Helpers for running child processes with timeouts and bounded output.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// Stdout followed by stderr, decoded lossily.
    pub fn combined_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        if self.stdout_truncated > 0 || self.stderr_truncated > 0 {
            text.push_str(&format!(
                "\n[output truncated: stdout {} bytes, stderr {} bytes]\n",
                self.stdout_truncated, self.stderr_truncated
            ));
        }
        text
    }
}

/// How long to keep draining pipes after the child is gone.
///
/// Descendants that escaped the kill can hold the pipes open indefinitely;
/// output captured within this window is kept and the rest is abandoned.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
/// On timeout the child is killed and reaped; `timed_out` is set on the result.
///
/// On unix the child leads its own process group, and the whole group is killed once the child
/// has exited or timed out, so background processes it started cannot stall the caller.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_capture = Arc::new(Mutex::new(Capture::default()));
    let stderr_capture = Arc::new(Mutex::new(Capture::default()));
    let (done_tx, done_rx) = mpsc::channel();
    spawn_reader(stdout, output_limit_bytes, &stdout_capture, done_tx.clone());
    spawn_reader(stderr, output_limit_bytes, &stderr_capture, done_tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            kill_process_group(&child);
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };
    kill_process_group(&child);

    let deadline = Instant::now() + OUTPUT_DRAIN_GRACE;
    for _ in 0..2 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if done_rx.recv_timeout(remaining).is_err() {
            warn!("output pipes still open after exit, keeping partial output");
            break;
        }
    }

    let (stdout, stdout_truncated) = take_capture(&stdout_capture);
    let (stderr, stderr_truncated) = take_capture(&stderr_capture);

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Kill every process in the child's group. The group may already be gone.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(child.id()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(%err, pid, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Run a command to completion with its stdout and stderr forwarded to our stderr.
///
/// Used for installer steps whose output is progress text for humans and must
/// never reach the stdout payload. No timeout: the step runs until it exits.
#[instrument(skip_all, fields(program = ?cmd.get_program()))]
pub fn run_command_forwarding(mut cmd: Command) -> Result<ExitStatus> {
    cmd.stdin(Stdio::null())
        .stdout(io::stderr())
        .stderr(io::stderr());

    debug!("spawning child process");
    let status = match cmd.status() {
        Ok(status) => status,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };
    debug!(exit_code = ?status.code(), "command finished");
    Ok(status)
}

/// Bytes kept from one stream, plus the count discarded past the limit.
#[derive(Debug, Default)]
struct Capture {
    buf: Vec<u8>,
    truncated: usize,
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: R,
    limit: usize,
    capture: &Arc<Mutex<Capture>>,
    done: mpsc::Sender<()>,
) {
    let capture = Arc::clone(capture);
    thread::spawn(move || {
        if let Err(err) = read_stream_limited(reader, limit, &capture) {
            let message = format!("{err:#}");
            warn!(err = %message, "output reader stopped");
        }
        let _ = done.send(());
    });
}

fn take_capture(capture: &Mutex<Capture>) -> (Vec<u8>, usize) {
    let mut capture = capture.lock().unwrap_or_else(PoisonError::into_inner);
    (std::mem::take(&mut capture.buf), capture.truncated)
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize, capture: &Mutex<Capture>) -> Result<()> {
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            return Ok(());
        }
        let mut capture = capture.lock().unwrap_or_else(PoisonError::into_inner);
        let remaining = limit.saturating_sub(capture.buf.len());
        let keep = n.min(remaining);
        capture.buf.extend_from_slice(&chunk[..keep]);
        capture.truncated += n - keep;
    }
}
