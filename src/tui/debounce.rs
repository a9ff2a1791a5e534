//! Trailing-edge debounce for autocomplete requests.
//!
//! Each [`trigger`](Debouncer::trigger) aborts the pending timer and starts
//! a new one; only a timer that survives a full quiet period posts
//! [`Message::AutocompleteDue`] back onto the render loop's channel. The
//! loop then reads the *current* input state, so nothing is captured here.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::Message;

pub struct Debouncer {
    delay: Duration,
    tx: UnboundedSender<Message>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration, tx: UnboundedSender<Message>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    /// Restart the quiet period. Must be called from within a tokio runtime.
    pub fn trigger(&mut self) {
        self.cancel();
        let delay = self.delay;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::AutocompleteDue);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
