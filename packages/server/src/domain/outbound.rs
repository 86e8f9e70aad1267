//! Per-connection outbound delivery channel.
//!
//! Every connection owns exactly one writer task draining a bounded queue.
//! Broadcasters only ever enqueue with [`PusherChannel::push`], which never
//! waits: a full queue means the receiver is stalled and is reported as a
//! delivery failure instead of holding up the fan-out.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::{
    Notify,
    mpsc::{self, error::TrySendError},
};

use super::error::MessagePushError;

/// Sending half, cloned into the registry and into the session itself.
#[derive(Debug, Clone)]
pub struct PusherChannel {
    sender: mpsc::Sender<String>,
    closed: Arc<Notify>,
    shut: Arc<AtomicBool>,
}

/// Receiving half, owned by the connection's writer task.
#[derive(Debug)]
pub struct PusherReceiver {
    receiver: mpsc::Receiver<String>,
    closed: Arc<Notify>,
}

/// Create a bounded outbound channel holding at most `capacity` messages.
pub fn channel(capacity: usize) -> (PusherChannel, PusherReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let closed = Arc::new(Notify::new());
    (
        PusherChannel {
            sender,
            closed: closed.clone(),
            shut: Arc::new(AtomicBool::new(false)),
        },
        PusherReceiver { receiver, closed },
    )
}

impl PusherChannel {
    /// Enqueue `content` without waiting.
    pub fn push(&self, content: &str) -> Result<(), MessagePushError> {
        self.sender
            .try_send(content.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => MessagePushError::Stalled,
                TrySendError::Closed(_) => MessagePushError::Closed,
            })
    }

    /// Ask the writer task to stop and close the transport.
    pub fn close(&self) {
        self.shut.store(true, Ordering::Release);
        self.closed.notify_one();
    }

    /// True once [`close`](Self::close) was called on any clone, or the
    /// receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.shut.load(Ordering::Acquire) || self.sender.is_closed()
    }
}

impl PusherReceiver {
    /// Next queued message, or `None` once the channel was closed.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.closed.notified() => None,
            message = self.receiver.recv() => message,
        }
    }
}
