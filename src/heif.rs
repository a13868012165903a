//! Out-of-process HEIF codec bridge.
//!
//! Neither direction of HEIF transcoding has a pure-Rust codec in this
//! crate's stack, so both go through an external tool, file-path in /
//! file-path out. The capability is a trait so the pipeline and the tests
//! never depend on the tools being installed; [`LibheifCli`] is the
//! production implementation, shelling out to libheif's `heif-dec` and
//! `heif-enc` with a per-invocation deadline.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A bridge invocation failed. The variants separate "the tool never
/// started", "the tool ran and failed", "the tool ran too long", and "the
/// I/O around the tool failed" so callers can tell a missing installation
/// from a bad input.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{tool} did not finish within {timeout:?}")]
    TimedOut { tool: String, timeout: Duration },
    #[error("IO error around codec bridge: {0}")]
    Io(#[from] std::io::Error),
}

/// External HEIF transcoding capability.
///
/// Both operations are synchronous and backed by files: the caller stages
/// the input on disk, the implementation writes the output path, the caller
/// reads it back. Temp-file lifecycle belongs to the caller.
pub trait HeifCodec: Sync {
    /// Convert a HEIF file to a JPEG file at the given quality (0–100).
    fn heif_to_jpeg(&self, input: &Path, output: &Path, quality: u8) -> Result<(), BridgeError>;

    /// Convert an image file (PNG or JPEG) to a HEIF file.
    fn image_to_heif(&self, input: &Path, output: &Path) -> Result<(), BridgeError>;
}

/// [`HeifCodec`] backed by libheif's command-line tools.
pub struct LibheifCli {
    decode_tool: String,
    encode_tool: String,
    timeout: Duration,
}

impl LibheifCli {
    pub fn new() -> Self {
        Self {
            decode_tool: "heif-dec".to_string(),
            encode_tool: "heif-enc".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the tool names, e.g. `heif-convert` on older libheif
    /// installations.
    pub fn with_tools(mut self, decode_tool: impl Into<String>, encode_tool: impl Into<String>) -> Self {
        self.decode_tool = decode_tool.into();
        self.encode_tool = encode_tool.into();
        self
    }

    /// Deadline applied to each tool invocation. A hung converter is killed
    /// and reported as [`BridgeError::TimedOut`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a command to completion under the configured deadline.
    fn run(&self, mut cmd: Command, tool: &str) -> Result<(), BridgeError> {
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

        // Drain stderr on its own thread while the child runs; a tool that
        // writes more than the pipe buffer must not block until the deadline
        let mut stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait()? {
                Some(status) if status.success() => return Ok(()),
                Some(status) => {
                    let stderr = stderr_reader
                        .take()
                        .and_then(|handle| handle.join().ok())
                        .unwrap_or_default();
                    return Err(BridgeError::Failed {
                        tool: tool.to_string(),
                        status,
                        stderr: stderr.trim().to_string(),
                    });
                }
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BridgeError::TimedOut {
                        tool: tool.to_string(),
                        timeout: self.timeout,
                    });
                }
                None => std::thread::sleep(Duration::from_millis(20)),
            }
        }
    }
}

impl Default for LibheifCli {
    fn default() -> Self {
        Self::new()
    }
}

impl HeifCodec for LibheifCli {
    fn heif_to_jpeg(&self, input: &Path, output: &Path, quality: u8) -> Result<(), BridgeError> {
        let mut cmd = Command::new(&self.decode_tool);
        cmd.arg("-q").arg(quality.to_string()).arg(input).arg(output);
        self.run(cmd, &self.decode_tool)
    }

    fn image_to_heif(&self, input: &Path, output: &Path) -> Result<(), BridgeError> {
        let mut cmd = Command::new(&self.encode_tool);
        cmd.arg(input).arg("-o").arg(output);
        self.run(cmd, &self.encode_tool)
    }
}
