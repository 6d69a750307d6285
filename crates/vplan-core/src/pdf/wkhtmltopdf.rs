//! HTML-to-PDF conversion via the `wkhtmltopdf` binary.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::PdfRenderer;

/// Renders HTML by piping it through `wkhtmltopdf - -`.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    /// Binary to invoke; a bare name resolves through PATH.
    binary: String,
    /// Wall-clock limit for one conversion.
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    /// The binary name used when none is configured.
    pub const DEFAULT_BINARY: &str = "wkhtmltopdf";

    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

impl Default for WkhtmltopdfRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BINARY, Duration::from_secs(30))
    }
}

#[async_trait]
impl PdfRenderer for WkhtmltopdfRenderer {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn render(&self, html: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn PDF renderer {:?}", self.binary))?;

        let mut stdin = child.stdin.take().context("renderer stdin not captured")?;
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let write_input = async {
            stdin.write_all(html.as_bytes()).await?;
            // Close stdin so the renderer sees end of input.
            stdin.shutdown().await?;
            drop(stdin);
            Ok::<_, std::io::Error>(())
        };

        // Read stdout/stderr concurrently with waiting for the process.
        // This avoids deadlocks if the child fills the pipe buffer.
        let read_stdout = async {
            let mut buf = Vec::new();
            if let Some(ref mut pipe) = stdout_pipe {
                pipe.read_to_end(&mut buf).await.ok();
            }
            buf
        };

        let read_stderr = async {
            let mut buf = Vec::new();
            if let Some(ref mut pipe) = stderr_pipe {
                pipe.read_to_end(&mut buf).await.ok();
            }
            String::from_utf8_lossy(&buf).into_owned()
        };

        let io = async {
            let (write_result, wait_result, stdout, stderr) =
                tokio::join!(write_input, child.wait(), read_stdout, read_stderr);
            (write_result, wait_result, stdout, stderr)
        };

        match tokio::time::timeout(self.timeout, io).await {
            Ok((write_result, Ok(status), stdout, stderr)) => {
                if !status.success() {
                    bail!(
                        "{} exited with {status}: {}",
                        self.binary,
                        stderr.trim()
                    );
                }
                write_result.context("failed to write HTML to renderer stdin")?;
                if stdout.is_empty() {
                    bail!("{} produced no output", self.binary);
                }
                Ok(stdout)
            }
            Ok((_, Err(e), _, _)) => {
                Err(e).with_context(|| format!("failed to wait on {:?}", self.binary))
            }
            Err(_) => {
                // Timeout: kill the child process.
                let _ = child.kill().await;
                bail!(
                    "{} timed out after {}s",
                    self.binary,
                    self.timeout.as_secs()
                )
            }
        }
    }
}
