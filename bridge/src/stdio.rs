//! Line-oriented JSON-RPC over stdin/stdout.
//!
//! Requests are handled one at a time in arrival order. Blank lines and
//! lines that are not JSON are skipped without a reply. Stdout carries
//! protocol traffic only; logs go to stderr.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use vox_core::Dispatcher;

use crate::Result;

/// Serve the dispatcher on the process's stdin/stdout until EOF.
pub async fn serve_stdio(dispatcher: &Dispatcher) -> Result<()> {
    info!(target: "stdio", "Serving MCP over stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_lines(dispatcher, stdin, stdout).await
}

/// Read requests from `reader`, write one response line per request to `writer`.
///
/// Returns when `reader` hits EOF. Undecodable lines, including invalid
/// UTF-8, are skipped. Only a read or write failure ends the loop early.
pub async fn run_lines<R, W>(dispatcher: &Dispatcher, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut handled = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        // invalid UTF-8 surfaces here as a decode error, not an io error
        let message: Value = match serde_json::from_slice(&buf) {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "stdio", error = %e, "Skipping unparsable line");
                continue;
            }
        };

        let response = dispatcher.handle_value(message).await;
        let mut out = serde_json::to_vec(&response).map_err(vox_core::VoxError::from)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;

        handled += 1;
        debug!(target: "stdio", id = %response.id, error = response.is_error(), "Wrote response");
    }

    info!(target: "stdio", handled, "Input closed");
    Ok(())
}
