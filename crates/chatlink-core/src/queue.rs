//! Outbound event queue.
//!
//! Unbounded multi-producer / single-consumer FIFO. Producers get cloneable
//! [`EventSender`] handles; only the owning session holds the receiver.

use tokio::sync::mpsc;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::events::{ChatEvent, ServerEvent};
use crate::ports::ChatEventEmitter;

/// Item type stored in the queue.
pub type QueuedEvent = Box<dyn ServerEvent>;

pub(crate) type QueueReceiver = mpsc::UnboundedReceiver<QueuedEvent>;

/// Producer handle for one session's outbound queue.
///
/// Sending never blocks and never fails observably. Once the session loop
/// has finished, events are dropped with a trace log.
#[derive(Debug, Clone)]
pub struct EventSender {
    session_id: Uuid,
    tx: mpsc::UnboundedSender<QueuedEvent>,
}

impl EventSender {
    /// Enqueue an event.
    pub fn send<E: ServerEvent + 'static>(&self, event: E) {
        self.send_boxed(Box::new(event));
    }

    /// Enqueue an already boxed event.
    pub fn send_boxed(&self, event: QueuedEvent) {
        if self.tx.send(event).is_err() {
            trace!(session_id = %self.session_id, "Session closed, dropping event");
        }
    }

    /// Whether the consuming session has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }
}

impl ChatEventEmitter for EventSender {
    fn emit(&self, event: ChatEvent) {
        match event.to_frame() {
            Ok(frame) => self.send(frame),
            Err(e) => warn!(session_id = %self.session_id, "Failed to render chat event: {}", e),
        }
    }

    fn clone_box(&self) -> Box<dyn ChatEventEmitter> {
        Box::new(self.clone())
    }
}

/// Create the queue for a session.
pub(crate) fn outbound_queue(session_id: Uuid) -> (EventSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { session_id, tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DataEvent;

    #[test]
    fn test_fifo_order() {
        let (sender, mut rx) = outbound_queue(Uuid::new_v4());
        for i in 0..5 {
            sender.send(DataEvent::new(i.to_string()));
        }
        for i in 0..5 {
            let event = rx.try_recv().unwrap();
            assert_eq!(event.build(), DataEvent::new(i.to_string()).build());
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_after_close_is_silent() {
        let (sender, rx) = outbound_queue(Uuid::new_v4());
        drop(rx);
        assert!(sender.is_closed());
        sender.send(DataEvent::new("dropped"));
    }

    #[test]
    fn test_emit_chat_event() {
        let (sender, mut rx) = outbound_queue(Uuid::new_v4());
        sender.emit(ChatEvent::notice("hello"));
        let event = rx.try_recv().unwrap();
        let rendered = event.build();
        assert!(rendered.starts_with(b"event: notice\n"));
    }

    #[test]
    fn test_concurrent_producers() {
        let (sender, mut rx) = outbound_queue(Uuid::new_v4());
        let handles: Vec<_> = (0..8)
            .map(|p| {
                let sender = sender.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        sender.send(DataEvent::new(format!("{p}:{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut per_producer = vec![Vec::new(); 8];
        while let Ok(event) = rx.try_recv() {
            let frame = String::from_utf8(event.build().to_vec()).unwrap();
            let body = frame.trim_start_matches("data: ").trim_end();
            let (p, i) = body.split_once(':').unwrap();
            per_producer[p.parse::<usize>().unwrap()].push(i.parse::<u32>().unwrap());
        }
        for seen in per_producer {
            assert_eq!(seen, (0..100).collect::<Vec<_>>());
        }
    }
}
