//! Input reader task.
//!
//! Pulls raw bytes from an async source, runs them through the [`Decoder`]
//! and forwards the events to the render loop. The reader never touches
//! component state; it only publishes onto the loop's channel, so a slow
//! render never stalls input and vice versa.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::{Decoder, InputEvent};
use crate::tui::Message;

const READ_CHUNK: usize = 1024;

/// Spawn the read loop over `source`. The task ends when the source hits EOF,
/// fails, or the loop's receiver is dropped.
pub fn spawn<R>(source: R, esc_timeout: Duration, tx: UnboundedSender<Message>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(read_loop(source, esc_timeout, tx))
}

async fn read_loop<R>(mut source: R, esc_timeout: Duration, tx: UnboundedSender<Message>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = Decoder::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let read = if decoder.has_pending() {
            match tokio::time::timeout(esc_timeout, source.read(&mut buf)).await {
                Ok(read) => read,
                Err(_) => {
                    // Quiet period after a lone ESC or partial sequence.
                    if !publish(&tx, decoder.flush()) {
                        return;
                    }
                    continue;
                }
            }
        } else {
            source.read(&mut buf).await
        };

        match read {
            Ok(0) => {
                info!("Input source closed");
                publish(&tx, decoder.flush());
                let _ = tx.send(Message::InputClosed);
                return;
            }
            Ok(n) => {
                if !publish(&tx, decoder.feed(&buf[..n])) {
                    return;
                }
            }
            Err(e) => {
                warn!("Input read failed: {e}");
                let _ = tx.send(Message::InputClosed);
                return;
            }
        }
    }
}

/// Returns false once the loop has gone away.
fn publish(tx: &UnboundedSender<Message>, events: Vec<InputEvent>) -> bool {
    for event in events {
        if tx.send(Message::Input(event)).is_err() {
            debug!("Render loop gone, stopping reader");
            return false;
        }
    }
    true
}

/// Forward SIGWINCH as resize messages carrying the new size.
#[cfg(unix)]
pub fn spawn_resize_watcher(tx: UnboundedSender<Message>) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut winch = match signal(SignalKind::window_change()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Cannot watch terminal resizes: {e}");
            return None;
        }
    };
    Some(tokio::spawn(async move {
        while winch.recv().await.is_some() {
            match crossterm::terminal::size() {
                Ok((width, height)) => {
                    if tx.send(Message::Resize(width, height)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("Failed to query terminal size: {e}"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::input::Key;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc::unbounded_channel;

    fn key_of(message: Message) -> Option<Key> {
        match message {
            Message::Input(InputEvent::Key(k)) => Some(k.key),
            _ => None,
        }
    }

    #[tokio::test]
    async fn forwards_decoded_events_then_closes() {
        let (tx, mut rx) = unbounded_channel();
        let handle = spawn(&b"a\x1b[A"[..], Duration::from_millis(50), tx);

        assert_eq!(rx.recv().await.and_then(key_of), Some(Key::Char('a')));
        assert_eq!(rx.recv().await.and_then(key_of), Some(Key::Up));
        assert!(matches!(rx.recv().await, Some(Message::InputClosed)));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn lone_escape_flushes_after_timeout() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = unbounded_channel();
        let handle = spawn(reader, Duration::from_millis(10), tx);

        writer.write_all(b"\x1b").await.unwrap();
        assert_eq!(rx.recv().await.and_then(key_of), Some(Key::Esc));

        drop(writer);
        assert!(matches!(rx.recv().await, Some(Message::InputClosed)));
        handle.await.unwrap();
    }
}
