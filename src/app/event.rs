//! Surface notifications.
//!
//! Hosts report layout changes and structural mutations as [`SurfaceEvent`]s,
//! either by calling `Watermark::handle_event` directly or by sending them
//! through the channel returned from [`surface_channel`] so the host side
//! never needs a reference to the watermark.

use tokio::sync::mpsc;

use crate::core::sizing::Size;
use crate::core::tree::MutationRecord;

/// Something happened to the host surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The surface was laid out at a new size (layout pixels).
    Resized(Size),
    /// Children were added to / removed from the surface or its parent.
    Mutated(Vec<MutationRecord>),
}

/// Host-side sender.  Cheap to clone; every clone feeds the same receiver.
#[derive(Debug, Clone)]
pub struct SurfaceNotifier {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl SurfaceNotifier {
    /// Returns `false` once the receiving side has been dropped.
    pub fn notify(&self, event: SurfaceEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn resized(&self, width: f32, height: f32) -> bool {
        self.notify(SurfaceEvent::Resized(Size::new(width, height)))
    }

    pub fn mutated(&self, records: Vec<MutationRecord>) -> bool {
        if records.is_empty() {
            return true;
        }
        self.notify(SurfaceEvent::Mutated(records))
    }
}

/// Watermark-side receiver.
#[derive(Debug)]
pub struct SurfaceEvents {
    rx: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl SurfaceEvents {
    /// Next queued event, without waiting.
    pub fn try_next(&mut self) -> Option<SurfaceEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once every notifier is gone.
    pub async fn next(&mut self) -> Option<SurfaceEvent> {
        self.rx.recv().await
    }
}

pub fn surface_channel() -> (SurfaceNotifier, SurfaceEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SurfaceNotifier { tx }, SurfaceEvents { rx })
}
