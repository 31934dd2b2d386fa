use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::foundation::error::{ThumbError, ThumbResult};

/// Turns an SVG file into a PNG file.
///
/// Implementations must either produce `png_path` or return an error; they never retry.
pub trait Rasterize {
    /// Rasterize `svg_path` into `png_path`.
    fn rasterize(&self, svg_path: &Path, png_path: &Path) -> ThumbResult<()>;
}

impl<R: Rasterize + ?Sized> Rasterize for &R {
    fn rasterize(&self, svg_path: &Path, png_path: &Path) -> ThumbResult<()> {
        (**self).rasterize(svg_path, png_path)
    }
}

/// Default upper bound for one rasterizer invocation.
pub const DEFAULT_RASTERIZER_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long stderr may stay open once the rasterizer has exited or been killed.
const STDERR_GRACE: Duration = Duration::from_millis(500);

/// Rasterizer backed by an external executable called as `<exe> <input.svg> -o <output.png>`.
///
/// The Inkscape command line is the reference; anything accepting the same arguments works.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalRasterizer {
    executable: PathBuf,
    timeout: Option<Duration>,
}

impl ExternalRasterizer {
    /// Use `executable` with [`DEFAULT_RASTERIZER_TIMEOUT`].
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: Some(DEFAULT_RASTERIZER_TIMEOUT),
        }
    }

    /// Replace the per-invocation timeout; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `<exe> --version` and return its first output line.
    pub fn probe(&self) -> ThumbResult<String> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(ThumbError::renderer(format!(
                "'{}' --version exited with status {}",
                self.executable.display(),
                output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_owned())
    }

    fn spawn_error(&self, e: std::io::Error) -> ThumbError {
        ThumbError::renderer(format!(
            "failed to spawn rasterizer '{}' (is it installed?): {e}",
            self.executable.display()
        ))
    }
}

impl Rasterize for ExternalRasterizer {
    fn rasterize(&self, svg_path: &Path, png_path: &Path) -> ThumbResult<()> {
        let mut child = Command::new(&self.executable)
            .arg(svg_path)
            .arg("-o")
            .arg(png_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stderr = child.stderr.take().ok_or_else(|| {
            ThumbError::renderer("failed to open rasterizer stderr (unexpected)")
        })?;
        let stderr_chunks = spawn_stderr_drain(stderr);

        let status = wait_with_timeout(&mut child, self.timeout)?;

        // A helper process that inherited the pipe can keep it open after the rasterizer exits.
        let (stderr_bytes, complete) =
            collect_stderr(&stderr_chunks, Instant::now() + STDERR_GRACE);
        if !complete {
            tracing::warn!(
                executable = %self.executable.display(),
                "rasterizer stderr still open after exit; not waiting for it"
            );
        }
        let stderr = String::from_utf8_lossy(&stderr_bytes);

        let Some(status) = status else {
            return Err(ThumbError::renderer(format!(
                "rasterizer '{}' timed out after {:?} and was killed{}",
                self.executable.display(),
                self.timeout.unwrap_or_default(),
                stderr_suffix(&stderr)
            )));
        };

        if !status.success() {
            return Err(ThumbError::renderer(format!(
                "rasterizer exited with status {}{}",
                status,
                stderr_suffix(&stderr)
            )));
        }

        if !png_path.exists() {
            return Err(ThumbError::renderer(format!(
                "rasterizer reported success but wrote no file at '{}'",
                png_path.display()
            )));
        }

        Ok(())
    }
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        text => format!(": {text}"),
    }
}

/// Read `stderr` on a detached thread, forwarding chunks as they arrive.
fn spawn_stderr_drain(mut stderr: ChildStderr) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match stderr.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });
    rx
}

/// Gather drained stderr until EOF or `deadline`. The flag is `false` when the deadline won.
pub(super) fn collect_stderr(chunks: &Receiver<Vec<u8>>, deadline: Instant) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match chunks.recv_timeout(remaining) {
            Ok(chunk) => out.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => return (out, true),
            Err(RecvTimeoutError::Timeout) => return (out, false),
        }
    }
}

/// The parts of a child process [`wait_with_timeout`] drives.
pub(super) trait ChildProcess {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>>;
    fn wait(&mut self) -> std::io::Result<ExitStatus>;
    fn kill(&mut self) -> std::io::Result<()>;
}

impl ChildProcess for Child {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        Child::wait(self)
    }

    fn kill(&mut self) -> std::io::Result<()> {
        Child::kill(self)
    }
}

/// Wait for `child`, killing it once `timeout` elapses. `Ok(None)` means it was killed.
///
/// The child is killed and reaped before a polling error is returned.
pub(super) fn wait_with_timeout(
    child: &mut impl ChildProcess,
    timeout: Option<Duration>,
) -> ThumbResult<Option<ExitStatus>> {
    let wait_error = |e: std::io::Error| {
        ThumbError::renderer(format!("failed to wait for rasterizer to finish: {e}"))
    };

    let Some(timeout) = timeout else {
        return child.wait().map(Some).map_err(wait_error);
    };

    let deadline = Instant::now() + timeout;
    loop {
        let status = match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(wait_error(e));
            }
        };
        if let Some(status) = status {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}
