//! Blocking execution of one external program with an optional deadline.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use anyhow::{Context as _, anyhow};

use crate::foundation::error::{ReelError, ReelResult};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_TAIL_LINES: usize = 12;
const PIPE_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// True when `program` resolves to an executable on `PATH` (or is a path to one).
pub fn is_on_path(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Run `spec` to completion. Non-zero exit, spawn failure and timeout are errors carrying the
/// tail of the child's stderr.
pub fn run_process(spec: &ProcessSpec, timeout: Option<Duration>) -> ReelResult<()> {
    execute(spec, timeout, false).map(drop)
}

/// Like [`run_process`], but returns everything the child wrote to stdout.
pub fn run_process_output(spec: &ProcessSpec, timeout: Option<Duration>) -> ReelResult<Vec<u8>> {
    execute(spec, timeout, true)
}

fn execute(
    spec: &ProcessSpec,
    timeout: Option<Duration>,
    capture_stdout: bool,
) -> ReelResult<Vec<u8>> {
    let exe = which::which(&spec.program)
        .map_err(|e| anyhow!("executable '{}' not found: {e}", spec.program))?;

    let mut cmd = Command::new(&exe);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(if capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    for (k, v) in &spec.env {
        cmd.env(k, v);
    }
    // Own group, so a timeout can take down helpers the program spawned (npx -> node).
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }

    tracing::debug!(command = %spec.display(), "spawning");
    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn '{}'", spec.program))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for '{}'", spec.program))?
        {
            break status;
        }
        if let Some(limit) = timeout
            && started.elapsed() >= limit
        {
            kill_group(&mut child);
            let _ = child.wait();
            let tail = collect_tail(stderr.as_ref());
            return Err(anyhow!(
                "'{}' timed out after {:.1}s{}",
                spec.program,
                limit.as_secs_f64(),
                suffix(&tail)
            )
            .into());
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let tail = collect_tail(stderr.as_ref());
    if !status.success() {
        return Err(anyhow!("'{}' exited with {status}{}", spec.program, suffix(&tail)).into());
    }
    match stdout {
        Some(rx) => rx.recv_timeout(PIPE_GRACE).map_err(|_| {
            ReelError::from(anyhow!("'{}' exited but its stdout was held open", spec.program))
        }),
        None => Ok(Vec::new()),
    }
}

/// Read a pipe to EOF on a helper thread. The receiver gets the bytes once every writer is gone.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// A descendant that outlives the child keeps the pipe open; after the grace period the reader
/// is left behind and the tail is empty.
fn collect_tail(stderr: Option<&Receiver<Vec<u8>>>) -> String {
    stderr
        .and_then(|rx| rx.recv_timeout(PIPE_GRACE).ok())
        .map(|buf| stderr_tail(&String::from_utf8_lossy(&buf)))
        .unwrap_or_default()
}

fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Ok(pid) = i32::try_from(child.id())
            && let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL)
        {
            tracing::debug!(pid, error = %e, "killpg failed");
        }
    }
    let _ = child.kill();
}

fn suffix(tail: &str) -> String {
    if tail.is_empty() {
        String::new()
    } else {
        format!(": {tail}")
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
#[path = "../../tests/unit/stage/process.rs"]
mod tests;
