//! Live application update stream

use crate::models::AppUpdate;
use crate::signal::QuitSignal;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cancellable sequence of [`AppUpdate`] values for one application.
///
/// The stream ends when the producer closes its side or when the quit
/// signal fires, whichever happens first. Once the signal has fired no
/// buffered element is delivered.
#[derive(Debug)]
pub struct UpdateStream {
    updates: Pin<Box<async_channel::Receiver<AppUpdate>>>,
    quit: QuitSignal,
}

impl UpdateStream {
    /// Wrap the receiving end of a producer channel
    pub fn new(updates: async_channel::Receiver<AppUpdate>, quit: QuitSignal) -> Self {
        Self {
            updates: Box::pin(updates),
            quit,
        }
    }

    /// Create a stream with an attached sender for producers
    pub fn channel(quit: QuitSignal) -> (async_channel::Sender<AppUpdate>, Self) {
        let (tx, rx) = async_channel::unbounded();
        (tx, Self::new(rx, quit))
    }

    /// Receive the next update, `None` once the stream has ended
    pub async fn recv(&mut self) -> Option<AppUpdate> {
        self.next().await
    }

    /// Whether the stream was cancelled by its quit signal
    pub fn is_cancelled(&self) -> bool {
        self.quit.is_quit()
    }
}

impl Stream for UpdateStream {
    type Item = AppUpdate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.quit.poll_quit(cx).is_ready() {
            // Tell the producer nobody is listening anymore
            this.updates.close();
            return Poll::Ready(None);
        }

        this.updates.as_mut().poll_next(cx)
    }
}
