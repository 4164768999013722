//! Request/response over fire-and-forget mailboxes.
//!
//! A request message carries a [`ReplyPort`]; the handler answers through it
//! and the caller awaits the other end. Ports are wrapped for `Clone` because
//! acton messages are cloned on delivery; only the first answer is sent.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use acton_reactive::prelude::*;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::node::NodeRef;

/// Sending half of a single reply.
pub struct ReplyPort<T> {
    tx: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> ReplyPort<T> {
    /// Create a port and the receiver its answer arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let port = Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        (port, rx)
    }

    /// Deliver the answer. Later calls, and answers nobody waits for, are dropped.
    pub fn send(&self, value: T) {
        if let Ok(mut guard) = self.tx.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(value);
            }
        }
    }
}

impl<T> Clone for ReplyPort<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T> fmt::Debug for ReplyPort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyPort").field("tx", &"<mutex>").finish()
    }
}

/// Answer through an optional port; `None` means the request was a cast.
pub(crate) fn respond<T>(reply: &Option<ReplyPort<T>>, value: T) {
    if let Some(port) = reply {
        port.send(value);
    }
}

/// Send a request built around a fresh [`ReplyPort`] and block until it is
/// answered, the target stops, or `timeout` elapses.
pub(crate) async fn call<M, T>(
    node: &NodeRef,
    timeout: Option<Duration>,
    request: impl FnOnce(ReplyPort<T>) -> M,
) -> Result<T>
where
    M: fmt::Debug + Clone + Send + Sync + 'static,
    T: Send + 'static,
{
    let (port, rx) = ReplyPort::channel();
    let message = request(port);
    trace!(node = %node.id(), ?message, "call");
    node.handle().send(message).await;

    let answer = match timeout {
        Some(limit) => tokio::time::timeout(limit, rx)
            .await
            .map_err(|_| GraphError::Timeout(node.id()))?,
        None => rx.await,
    };
    answer.map_err(|_| GraphError::Unavailable(node.id()))
}

/// Fire-and-forget send.
pub(crate) async fn cast<M>(node: &NodeRef, message: M)
where
    M: fmt::Debug + Clone + Send + Sync + 'static,
{
    trace!(node = %node.id(), ?message, "cast");
    node.handle().send(message).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_first_answer_is_delivered() {
        let (port, rx) = ReplyPort::channel();
        let clone = port.clone();

        port.send(1);
        clone.send(2);

        assert_eq!(rx.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_port_closes_receiver() {
        let (port, rx) = ReplyPort::<u32>::channel();
        drop(port);
        assert!(rx.await.is_err());
    }
}
