use std::collections::VecDeque;

use crate::session::PlayerId;

use super::types::TimedEvent;

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub due_ms: u64,
    pub sequence: u32,
    pub event: TimedEvent,
}

/// Timed events owned by the host tick loop, kept in due order.
#[derive(Debug, Default)]
pub struct Schedule {
    pending: VecDeque<ScheduledEvent>,
    next_sequence: u32,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, due_ms: u64, event: TimedEvent) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let index = self
            .pending
            .iter()
            .position(|e| e.due_ms > due_ms)
            .unwrap_or(self.pending.len());
        self.pending.insert(
            index,
            ScheduledEvent {
                due_ms,
                sequence,
                event,
            },
        );

        sequence
    }

    pub fn cancel(&mut self, sequence: u32) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.sequence != sequence);
        self.pending.len() != before
    }

    pub fn cancel_for(&mut self, player: PlayerId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| e.event.player() != player);
        before - self.pending.len()
    }

    pub fn pending_for(&self, player: PlayerId) -> Option<&ScheduledEvent> {
        self.pending.iter().find(|e| e.event.player() == player)
    }

    pub fn drain_due(&mut self, now_ms: u64) -> Vec<TimedEvent> {
        let mut due = Vec::new();
        while let Some(front) = self.pending.front() {
            if front.due_ms > now_ms {
                break;
            }
            if let Some(event) = self.pending.pop_front() {
                due.push(event.event);
            }
        }
        due
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
