//! # Drag Event Bus
//!
//! The engine publishes rendering-relevant changes instead of calling into
//! the view layer. Each subscriber gets its own unbounded channel; closed
//! receivers are pruned on the next publish.

use crate::collaborators::Preview;
use folio_common::Rect;
use folio_store::BlockId;
use indexmap::IndexMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// A drag session began
    Started {
        block_ids: Vec<BlockId>,
        preview: Preview,
    },

    /// The block under the pointer changed
    HoverChanged { target: Option<BlockId> },

    /// Drop indicator moved or was hidden
    Indicator { rect: Option<Rect> },

    /// The session returned to idle
    Ended { dropped: bool },
}

pub type SubscriptionId = u64;

#[derive(Debug, Default)]
pub struct EventBus {
    next_id: SubscriptionId,
    subscribers: IndexMap<SubscriptionId, UnboundedSender<DragEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> (SubscriptionId, UnboundedReceiver<DragEvent>) {
        let (tx, rx) = unbounded_channel();
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.shift_remove(&id).is_some()
    }

    pub fn publish(&mut self, event: DragEvent) {
        self.subscribers
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
