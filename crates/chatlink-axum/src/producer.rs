//! Line-oriented producer feeding chat events into an emitter.
//!
//! Each non-empty line becomes a `new_message` event. A line of the form
//! `/channel NAME` switches the current channel instead; later messages are
//! tagged with it.

use std::io;

use chatlink_core::{ChatEvent, ChatEventEmitter};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const CHANNEL_COMMAND: &str = "/channel";

/// Forward lines from `reader` until EOF or cancellation.
///
/// Returns the number of events emitted.
pub async fn pump_lines<R>(
    reader: R,
    emitter: &dyn ChatEventEmitter,
    sender: &str,
    shutdown: &CancellationToken,
) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut channel: Option<String> = None;
    let mut emitted = 0;

    loop {
        let line = tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        let event = match line.strip_prefix(CHANNEL_COMMAND) {
            Some(rest) if rest.starts_with(' ') && !rest.trim().is_empty() => {
                let name = rest.trim().to_string();
                debug!(channel = %name, "Switching channel");
                channel = Some(name.clone());
                ChatEvent::channel_switched(name)
            }
            _ => ChatEvent::new_message(sender, line, channel.clone()),
        };
        emitter.emit(event);
        emitted += 1;
    }

    Ok(emitted)
}

/// Forward stdin lines to `emitter` in a background task.
pub fn spawn_stdin_producer(
    emitter: Box<dyn ChatEventEmitter>,
    sender: String,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        match pump_lines(stdin, emitter.as_ref(), &sender, &shutdown).await {
            Ok(count) => info!(count, "Stdin producer finished"),
            Err(e) => warn!("Stdin producer failed: {}", e),
        }
    })
}
