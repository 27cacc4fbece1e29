use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use super::ServerEvent;
use crate::error::EventError;

/// Terminal sentinel written as the last chunk of every stream.
pub const CLOSE_FRAME: &[u8] = b"event: close\ndata: close\n\n";

/// Event name reserved for [`CLOSE_FRAME`].
pub const CLOSE_EVENT_NAME: &str = "close";

/// Generic data-bearing event.
///
/// The frame is rendered once at construction, so `build` is a reference
/// count bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEvent {
    id: Option<String>,
    name: Option<String>,
    data: String,
    frame: Bytes,
}

impl DataEvent {
    /// Unnamed event; clients receive it through `onmessage`.
    pub fn new(data: impl Into<String>) -> Self {
        Self::assemble(None, None, data.into())
    }

    /// Event with an explicit `event:` name.
    ///
    /// The name must be a non-empty single line other than
    /// [`CLOSE_EVENT_NAME`].
    pub fn named(name: impl Into<String>, data: impl Into<String>) -> Result<Self, EventError> {
        let name = name.into();
        if name.is_empty() || name == CLOSE_EVENT_NAME {
            return Err(EventError::InvalidField {
                field: "event name",
                value: name,
            });
        }
        check_single_line("event name", &name)?;
        Ok(Self::assemble(None, Some(name), data.into()))
    }

    /// Named event whose data line is the JSON encoding of `payload`.
    pub fn json<T: Serialize + ?Sized>(
        name: impl Into<String>,
        payload: &T,
    ) -> Result<Self, EventError> {
        let data = serde_json::to_string(payload)?;
        Self::named(name, data)
    }

    /// Attach an `id:` line so clients can track the last seen event.
    ///
    /// An empty id resets the client's last event id.
    pub fn with_id(self, id: impl Into<String>) -> Result<Self, EventError> {
        let id = id.into();
        check_single_line("event id", &id)?;
        Ok(Self::assemble(Some(id), self.name, self.data))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    fn assemble(id: Option<String>, name: Option<String>, data: String) -> Self {
        let frame = render(id.as_deref(), name.as_deref(), &data);
        Self {
            id,
            name,
            data,
            frame,
        }
    }
}

impl ServerEvent for DataEvent {
    fn build(&self) -> Bytes {
        self.frame.clone()
    }
}

/// Comment line, ignored by SSE clients. Used for keep-alive pings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEvent {
    frame: Bytes,
}

impl CommentEvent {
    pub fn new(text: impl AsRef<str>) -> Result<Self, EventError> {
        let text = text.as_ref();
        if text.contains(['\r', '\n']) {
            return Err(EventError::InvalidField {
                field: "comment",
                value: text.to_string(),
            });
        }
        let mut buf = BytesMut::with_capacity(text.len() + 4);
        buf.put_slice(b": ");
        buf.put_slice(text.as_bytes());
        buf.put_slice(b"\n\n");
        Ok(Self {
            frame: buf.freeze(),
        })
    }

    /// The keep-alive frame `: ping`.
    pub fn ping() -> Self {
        Self {
            frame: Bytes::from_static(b": ping\n\n"),
        }
    }
}

impl ServerEvent for CommentEvent {
    fn build(&self) -> Bytes {
        self.frame.clone()
    }
}

/// Terminal event.
///
/// A status-code or zero-length close is not observed reliably by every
/// browser, so the stream ends with an explicit sentinel instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseEvent;

impl ServerEvent for CloseEvent {
    fn build(&self) -> Bytes {
        Bytes::from_static(CLOSE_FRAME)
    }
}

fn check_single_line(field: &'static str, value: &str) -> Result<(), EventError> {
    if value.contains(['\r', '\n']) {
        return Err(EventError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn render(id: Option<&str>, name: Option<&str>, data: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(data.len() + 32);
    if let Some(id) = id {
        buf.put_slice(b"id: ");
        buf.put_slice(id.as_bytes());
        buf.put_u8(b'\n');
    }
    if let Some(name) = name {
        buf.put_slice(b"event: ");
        buf.put_slice(name.as_bytes());
        buf.put_u8(b'\n');
    }
    // CRLF, LF and lone CR all terminate a line on the client side.
    for line in data.split("\r\n").flat_map(|chunk| chunk.split(['\n', '\r'])) {
        buf.put_slice(b"data: ");
        buf.put_slice(line.as_bytes());
        buf.put_u8(b'\n');
    }
    buf.put_u8(b'\n');
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_event() {
        let event = DataEvent::new("hello");
        assert_eq!(&event.build()[..], b"data: hello\n\n");
        assert!(event.name().is_none());
    }

    #[test]
    fn test_named_event_with_id() {
        let event = DataEvent::named("greeting", "hi")
            .unwrap()
            .with_id("7")
            .unwrap();
        assert_eq!(&event.build()[..], b"id: 7\nevent: greeting\ndata: hi\n\n");
        assert_eq!(event.id(), Some("7"));
    }

    #[test]
    fn test_multiline_data_split_per_line() {
        let event = DataEvent::new("one\ntwo\r\nthree\rfour");
        assert_eq!(
            &event.build()[..],
            b"data: one\ndata: two\ndata: three\ndata: four\n\n"
        );
    }

    #[test]
    fn test_empty_data_still_has_data_line() {
        assert_eq!(&DataEvent::new("").build()[..], b"data: \n\n");
    }

    #[test]
    fn test_name_with_newline_rejected() {
        let err = DataEvent::named("bad\nname", "x").unwrap_err();
        assert!(matches!(
            err,
            EventError::InvalidField {
                field: "event name",
                ..
            }
        ));
        assert!(DataEvent::named("", "x").is_err());
        assert!(DataEvent::new("x").with_id("1\r").is_err());
    }

    #[test]
    fn test_close_name_reserved() {
        let err = DataEvent::named("close", "x").unwrap_err();
        assert!(matches!(
            err,
            EventError::InvalidField {
                field: "event name",
                ..
            }
        ));
        assert!(DataEvent::named(CLOSE_EVENT_NAME, "close").is_err());
        assert!(DataEvent::json("close", &serde_json::json!({})).is_err());
        assert!(DataEvent::named("closed", "x").is_ok());
    }

    #[test]
    fn test_empty_id_resets_last_event_id() {
        let event = DataEvent::new("x").with_id("").unwrap();
        assert_eq!(&event.build()[..], b"id: \ndata: x\n\n");
        assert_eq!(event.id(), Some(""));
    }

    #[test]
    fn test_json_event() {
        let event = DataEvent::json("count", &serde_json::json!({ "n": 3 })).unwrap();
        assert_eq!(&event.build()[..], b"event: count\ndata: {\"n\":3}\n\n");
    }

    #[test]
    fn test_build_is_idempotent() {
        let event = DataEvent::named("tick", "same").unwrap();
        assert_eq!(event.build(), event.build());
        assert_eq!(CloseEvent.build(), CloseEvent.build());
        let comment = CommentEvent::new("hello").unwrap();
        assert_eq!(comment.build(), comment.build());
    }

    #[test]
    fn test_close_frame_is_distinct() {
        let close = CloseEvent.build();
        assert_eq!(&close[..], CLOSE_FRAME);
        assert_ne!(close, DataEvent::new("close").build());
    }

    #[test]
    fn test_comment_frames() {
        assert_eq!(&CommentEvent::ping().build()[..], b": ping\n\n");
        assert_eq!(&CommentEvent::new("hb").unwrap().build()[..], b": hb\n\n");
        assert!(CommentEvent::new("a\nb").is_err());
    }
}
