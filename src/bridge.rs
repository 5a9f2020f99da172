//! JSON-lines hook bridge.
//!
//! Each stdin line is one [`OperatorEvent`]; each stdout line is one
//! [`OperatorOutput`]. Malformed input lines are logged and skipped so a bad
//! hook invocation never takes the unit down.

use gnb_events::{OperatorEvent, OperatorOutput};
use gnb_reconciler::EventSender;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] gnb_events::Error),
}

/// Feed events from `input` into the loop until EOF.
///
/// Returns the number of events queued. Stops early, without error, if the
/// loop is no longer accepting events.
///
/// # Errors
///
/// Returns `BridgeError::Io` if reading fails.
pub async fn read_events<R>(input: R, events: &EventSender) -> Result<usize, BridgeError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut queued = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match OperatorEvent::from_json_line(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed event line");
                continue;
            }
        };
        debug!(event = event.name(), "Event received");
        if events.send(event).await.is_err() {
            debug!("Loop stopped, no longer reading events");
            break;
        }
        queued += 1;
    }
    Ok(queued)
}

/// Write every output as one line until the outbox closes.
///
/// # Errors
///
/// Returns `BridgeError` if encoding or writing fails.
pub async fn write_outputs<W>(
    mut outputs: mpsc::UnboundedReceiver<OperatorOutput>,
    mut out: W,
) -> Result<usize, BridgeError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0usize;
    while let Some(output) = outputs.recv().await {
        let mut line = output.to_json_line()?;
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        written += 1;
    }
    Ok(written)
}
