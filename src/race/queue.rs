//! FIFO of clients waiting for an opponent, keyed by ticket.
//!
//! Holds at most one ticket per client. Pairs are always taken from the front.

use std::collections::VecDeque;
use uuid::Uuid;

use super::types::{ClientId, PlayerProfile, QueueEntry, TicketId};
use crate::config::matchmaking::PLAYERS_PER_MATCH;

#[derive(Debug, Default)]
pub struct TicketQueue {
    entries: VecDeque<QueueEntry>,
}

impl TicketQueue {
    pub fn new() -> Self {
        Self { entries: VecDeque::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the queued entry of a client, if any.
    pub fn find_client(&self, client_id: &str) -> Option<&QueueEntry> {
        self.entries.iter().find(|e| e.profile.client_id == client_id)
    }

    /// 1-based position of a ticket in the queue.
    pub fn position(&self, ticket: &TicketId) -> Option<usize> {
        self.entries.iter().position(|e| &e.ticket == ticket).map(|idx| idx + 1)
    }

    /// Append a new entry for a client that is not queued yet.
    /// Returns `None` if the client already holds a ticket.
    pub fn enqueue(&mut self, profile: PlayerProfile, now_ms: u64) -> Option<TicketId> {
        if self.find_client(&profile.client_id).is_some() {
            return None;
        }
        let ticket = Uuid::new_v4();
        self.entries.push_back(QueueEntry {
            ticket,
            profile,
            enqueued_at: now_ms,
        });
        Some(ticket)
    }

    /// Pop the two oldest entries, oldest first.
    pub fn pop_pair(&mut self) -> Option<(QueueEntry, QueueEntry)> {
        if self.entries.len() < PLAYERS_PER_MATCH {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some((first, second))
    }

    /// Remove a ticket only if it is still queued and belongs to `client_id`.
    pub fn remove(&mut self, ticket: &TicketId, client_id: &ClientId) -> Option<QueueEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| &e.ticket == ticket && &e.profile.client_id == client_id)?;
        self.entries.remove(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> PlayerProfile {
        PlayerProfile::new(id.to_string(), None, None, None)
    }

    #[test]
    fn test_one_ticket_per_client() {
        let mut queue = TicketQueue::new();
        assert!(queue.enqueue(profile("a"), 1).is_some());
        assert!(queue.enqueue(profile("a"), 2).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pop_pair_is_fifo() {
        let mut queue = TicketQueue::new();
        queue.enqueue(profile("a"), 1);
        assert!(queue.pop_pair().is_none());
        queue.enqueue(profile("b"), 2);
        queue.enqueue(profile("c"), 3);
        let (first, second) = queue.pop_pair().unwrap();
        assert_eq!(first.profile.client_id, "a");
        assert_eq!(second.profile.client_id, "b");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.find_client("c").map(|e| e.enqueued_at), Some(3));
    }

    #[test]
    fn test_remove_requires_owner() {
        let mut queue = TicketQueue::new();
        let ticket = queue.enqueue(profile("a"), 1).unwrap();
        assert!(queue.remove(&ticket, &"b".to_string()).is_none());
        assert_eq!(queue.position(&ticket), Some(1));
        assert!(queue.remove(&ticket, &"a".to_string()).is_some());
        assert!(queue.remove(&ticket, &"a".to_string()).is_none());
        assert!(queue.is_empty());
    }
}
