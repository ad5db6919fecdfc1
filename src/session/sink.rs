use super::{InputFrame, PlayerInputState};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// One write to the emulator core
#[derive(Debug, Clone, PartialEq)]
pub enum SinkUpdate {
    /// Full state of the local player (port 0), touch and physical pad merged
    Local(InputFrame),
    /// Button word of a remote player (ports 1-3)
    Remote { player: usize, buttons: u16 },
}

impl SinkUpdate {
    pub fn player(&self) -> usize {
        match self {
            SinkUpdate::Local(_) => 0,
            SinkUpdate::Remote { player, .. } => *player,
        }
    }

    pub fn state(&self) -> Option<&PlayerInputState> {
        match self {
            SinkUpdate::Local(frame) => Some(&frame.state),
            SinkUpdate::Remote { .. } => None,
        }
    }
}

/// Receiver of controller state. Pushes never block and have no result.
pub trait InputSink: Send {
    fn push(&mut self, update: SinkUpdate);
}

/// Forwards updates over a bounded channel; a full channel drops the update
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<SinkUpdate>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<SinkUpdate>) -> Self {
        Self { sender, dropped: 0 }
    }

    /// Creates a sink together with the receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SinkUpdate>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }

    /// Updates lost to a full or closed channel
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl InputSink for ChannelSink {
    fn push(&mut self, update: SinkUpdate) {
        match self.sender.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(update)) => {
                self.dropped += 1;
                debug!("Sink full, dropped update for player {}", update.player());
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped += 1;
                if self.dropped == 1 {
                    warn!("Sink receiver closed, updates are discarded");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (mut sink, mut receiver) = ChannelSink::channel(1);
        sink.push(SinkUpdate::Remote { player: 2, buttons: 0xFFFB });
        sink.push(SinkUpdate::Remote { player: 3, buttons: 0xFFFF });
        assert_eq!(sink.dropped(), 1);

        let first = receiver.recv().await;
        assert_eq!(first, Some(SinkUpdate::Remote { player: 2, buttons: 0xFFFB }));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_counts_drops() {
        let (mut sink, receiver) = ChannelSink::channel(4);
        drop(receiver);
        let frame = InputFrame::new(PlayerInputState::released(), false);
        sink.push(SinkUpdate::Local(frame));
        sink.push(SinkUpdate::Local(frame));
        assert_eq!(sink.dropped(), 2);
    }
}
