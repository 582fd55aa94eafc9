//! Content-Length framing for the stdio transport.
//!
//! Each message is `Content-Length: N\r\n\r\n` followed by exactly N bytes
//! of UTF-8 JSON. Unknown header lines are skipped, so a shell may add
//! headers without breaking older cores.

use picoclaw_protocol::{CoreError, CoreResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

const CONTENT_LENGTH: &str = "content-length:";

pub struct FrameReader<R> {
    inner: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read one frame. `Ok(None)` means clean EOF at a frame boundary;
    /// EOF inside a frame is a transport error.
    pub async fn read_frame(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let mut content_length: Option<usize> = None;
        let mut consumed_any = false;

        loop {
            let mut line = String::new();
            let read = self
                .inner
                .read_line(&mut line)
                .await
                .map_err(|err| CoreError::Transport(format!("header read failed: {err}")))?;
            if read == 0 {
                if consumed_any {
                    return Err(CoreError::Transport(
                        "stream closed inside a frame header".to_owned(),
                    ));
                }
                return Ok(None);
            }
            consumed_any = true;

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                match content_length {
                    Some(length) => {
                        let mut payload = vec![0u8; length];
                        self.inner.read_exact(&mut payload).await.map_err(|err| {
                            CoreError::Transport(format!("frame body read failed: {err}"))
                        })?;
                        return Ok(Some(payload));
                    }
                    // blank line without a length header: keep scanning
                    None => continue,
                }
            }

            if let Some(value) = header_value(trimmed) {
                match value.parse::<usize>() {
                    Ok(length) => content_length = Some(length),
                    Err(_) => {
                        warn!(header = trimmed, "ignoring unparseable content-length");
                    }
                }
            }
        }
    }
}

fn header_value(line: &str) -> Option<&str> {
    let lowered = line.to_ascii_lowercase();
    if lowered.starts_with(CONTENT_LENGTH) {
        Some(line[CONTENT_LENGTH.len()..].trim())
    } else {
        None
    }
}

pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> CoreResult<()> {
        let header = format!("Content-Length: {}\r\n\r\n", payload.len());
        self.inner
            .write_all(header.as_bytes())
            .await
            .map_err(|err| CoreError::Transport(format!("frame header write failed: {err}")))?;
        self.inner
            .write_all(payload)
            .await
            .map_err(|err| CoreError::Transport(format!("frame body write failed: {err}")))?;
        self.inner
            .flush()
            .await
            .map_err(|err| CoreError::Transport(format!("frame flush failed: {err}")))?;
        Ok(())
    }
}
