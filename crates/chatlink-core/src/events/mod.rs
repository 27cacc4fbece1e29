//! Event model for the push stream.
//!
//! Every value pushed to a client implements [`ServerEvent`]: it renders
//! itself into the exact bytes of one chunk of the `text/event-stream` body.
//!
//! # Structure
//!
//! - `frame` - Wire-level events (data, comment, terminal close)
//! - `chat` - Typed chat payloads that convert into data events
//!
//! # Wire Format
//!
//! ```text
//! id: 42
//! event: new_message
//! data: {"type":"new_message","sender":"Ayla",...}
//!
//! ```
//!
//! The stream always ends with the close sentinel:
//!
//! ```text
//! event: close
//! data: close
//!
//! ```

mod chat;
mod frame;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

pub use chat::ChatEvent;
pub use frame::{CLOSE_EVENT_NAME, CLOSE_FRAME, CloseEvent, CommentEvent, DataEvent};

/// A self-rendering unit of data pushed to the client.
///
/// Implementations must be pure: rendering the same instance twice yields
/// byte-identical output and never fails. Validation belongs in the
/// constructor.
pub trait ServerEvent: Send + Sync + fmt::Debug {
    /// Render the event into one chunk body.
    fn build(&self) -> Bytes;
}

impl<E: ServerEvent + ?Sized> ServerEvent for Box<E> {
    fn build(&self) -> Bytes {
        (**self).build()
    }
}

impl<E: ServerEvent + ?Sized> ServerEvent for Arc<E> {
    fn build(&self) -> Bytes {
        (**self).build()
    }
}
