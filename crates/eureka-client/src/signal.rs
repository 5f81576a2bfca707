//! Cancellation signal for long-lived subscriptions
//!
//! A [`QuitHandle`] is held by whoever owns the subscription; the matching
//! [`QuitSignal`] travels with the producer. Quitting closes the underlying
//! channel, so it is idempotent and observed by every clone of the signal.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Create a linked quit handle and signal
pub fn quit_channel() -> (QuitHandle, QuitSignal) {
    let (tx, rx) = async_channel::bounded(1);
    (QuitHandle { tx }, QuitSignal { rx: Box::pin(rx) })
}

/// Owner side of a cancellation signal.
///
/// Dropping every clone of the handle has the same effect as [`QuitHandle::quit`].
#[derive(Debug, Clone)]
pub struct QuitHandle {
    tx: async_channel::Sender<()>,
}

impl QuitHandle {
    /// Fire the signal. Calling it again has no further effect.
    pub fn quit(&self) {
        self.tx.close();
    }

    /// Whether the signal has already fired
    pub fn is_quit(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Observer side of a cancellation signal
#[derive(Debug, Clone)]
pub struct QuitSignal {
    // Receiver holds a pinned listener, so it is boxed to keep the signal Unpin
    rx: Pin<Box<async_channel::Receiver<()>>>,
}

impl QuitSignal {
    /// Whether the signal has fired
    pub fn is_quit(&self) -> bool {
        self.rx.is_closed()
    }

    /// Wait until the signal fires
    pub async fn wait(&self) {
        while self.rx.recv().await.is_ok() {}
    }

    /// Poll for the signal without consuming it
    pub fn poll_quit(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        loop {
            match self.rx.as_mut().poll_next(cx) {
                Poll::Ready(None) => return Poll::Ready(()),
                Poll::Ready(Some(())) => continue,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
