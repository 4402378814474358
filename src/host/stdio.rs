//! Stdin/stdout JSON bridge for the host command router.
//!
//! Reads newline-delimited JSON [`CommandEnvelope`] messages, routes each one
//! through [`HostHandler`], and writes the [`ResponseEnvelope`] followed by
//! any state-change [`EventEnvelope`]s it caused, one JSON document per line.
//!
//! Stdout is reserved for the protocol; diagnostics go to stderr through
//! `tracing`.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::context::AppContext;
use crate::error::{Result, StateError};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::host::handler::HostHandler;

/// Run the bridge over the process stdin/stdout until EOF or `runtime.stop`.
pub async fn run_stdio_bridge(ctx: AppContext) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    run_bridge(HostHandler::new(ctx), reader, writer).await
}

/// Run the bridge over arbitrary line-oriented I/O.
pub async fn run_bridge<R, W>(mut handler: HostHandler, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| StateError::Channel(format!("failed to read command: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down host bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_json(&mut writer, &response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::RuntimeStop;
        tracing::debug!(
            request_id = %envelope.request_id,
            command = envelope.command.as_str(),
            "dispatching command"
        );

        let response = handler.handle(&envelope);
        write_json(&mut writer, &response).await?;
        for event in handler.drain_events() {
            write_json(&mut writer, &event).await?;
        }

        if is_stop && response.ok {
            tracing::info!("runtime.stop received; shutting down host bridge");
            break;
        }
    }

    Ok(())
}

/// Write one JSON document as a line and flush.
async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let json = serde_json::to_string(value)?;
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| StateError::Channel(format!("failed to write output: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| StateError::Channel(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| StateError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}
