//! Live notifications for Reelcast transcoding jobs.
//!
//! [`EventSubscriber`] follows one job at a time over a [`BrokerTransport`]
//! (Server-Sent Events in production) and folds the job's status updates and
//! log lines into a [`SessionState`].

pub mod event;
pub mod sse;
pub mod state;
pub mod subscriber;
pub mod transport;

pub use event::{decode_event, topic_for, Decoded, NotificationEvent};
pub use state::{is_terminal_status, SessionState};
pub use subscriber::EventSubscriber;
pub use transport::{BrokerTransport, MessageStream, SseBrokerTransport};
