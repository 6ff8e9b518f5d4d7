// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use async_channel::{Receiver, Sender};

/// Caps the number of handoffs the match loop keeps in flight. Each permit
/// occupies one slot of a bounded channel and frees it again on drop.
#[derive(Debug, Clone)]
pub struct HandoffLimiter {
    slots: Sender<()>,
    release: Receiver<()>,
}

#[derive(Debug)]
pub struct HandoffPermit {
    release: Receiver<()>,
}

impl HandoffLimiter {
    pub fn new(limit: usize) -> Self {
        let (slots, release) = async_channel::bounded(limit.max(1));
        Self { slots, release }
    }

    /// Waits until a slot is free.
    pub async fn acquire(&self) -> HandoffPermit {
        // Both ends live in `self`, so the channel cannot be closed here.
        let _ = self.slots.send(()).await;
        self.permit()
    }

    pub fn try_acquire(&self) -> Option<HandoffPermit> {
        self.slots.try_send(()).ok().map(|_| self.permit())
    }

    pub fn in_flight(&self) -> usize {
        self.slots.len()
    }

    fn permit(&self) -> HandoffPermit {
        HandoffPermit {
            release: self.release.clone(),
        }
    }
}

impl Drop for HandoffPermit {
    fn drop(&mut self) {
        let _ = self.release.try_recv();
    }
}
