// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session connection registry (C3).
//!
//! Tracks connected transports tagged by `(UserId, Role)`. Reconnecting with
//! the same key replaces the prior transport in place rather than appending
//! a duplicate entry -- the same semantics as the teacher's
//! `ChannelMultiplexer::add_channel`/reconnect handling, generalized from a
//! named-channel registry to a role-tagged one.

use dashmap::DashMap;
use tokio::sync::mpsc;

use livequiz_core::{EngineError, Role, UserId};

/// A single registered connection: its outbound sender and role.
pub struct RegistryEntry {
    pub sender: mpsc::Sender<livequiz_core::wire::OutboundFrame>,
    pub role: Role,
}

/// Per-session registry of attached connections, keyed by `(user, role)`.
///
/// Grounded on `blufio_gateway::server::GatewayState`'s `DashMap<String,
/// mpsc::Sender<String>>` routing table, generalized to a typed payload and
/// a composite key that also carries the connection's role.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: DashMap<(UserId, Role), RegistryEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a transport for `(user, role)`. If an entry already exists
    /// for that key, its transport is replaced (reconnect). LEADER is
    /// singleton-per-session: a second distinct user attaching as LEADER is
    /// rejected.
    pub fn attach(
        &self,
        user: UserId,
        role: Role,
        sender: mpsc::Sender<livequiz_core::wire::OutboundFrame>,
    ) -> Result<(), EngineError> {
        if role == Role::Leader {
            let existing_other_leader = self
                .entries
                .iter()
                .any(|e| e.key().1 == Role::Leader && e.key().0 != user);
            if existing_other_leader {
                return Err(EngineError::Authorization(
                    "a leader connection already exists for this session".into(),
                ));
            }
        }
        self.entries.insert((user, role), RegistryEntry { sender, role });
        Ok(())
    }

    /// Removes the entry for `(user, role)`, if present.
    pub fn detach(&self, user: UserId, role: Role) {
        self.entries.remove(&(user, role));
    }

    pub fn is_attached(&self, user: UserId, role: Role) -> bool {
        self.entries.contains_key(&(user, role))
    }

    /// Count of connected entries with role PARTICIPANT.
    pub fn participant_count(&self) -> usize {
        self.entries.iter().filter(|e| e.key().1 == Role::Participant).count()
    }

    /// Returns whether a LEADER is currently attached.
    pub fn has_leader(&self) -> bool {
        self.entries.iter().any(|e| e.key().1 == Role::Leader)
    }

    /// Snapshot of all entries safe to iterate while sending -- avoids
    /// holding the map's internal shard locks across the broadcast's `.await`
    /// points, matching the teacher's `Arc<Vec<..>>` connected-channels
    /// snapshot in `ChannelMultiplexer::connect`.
    pub fn snapshot(
        &self,
    ) -> Vec<(UserId, Role, mpsc::Sender<livequiz_core::wire::OutboundFrame>)> {
        self.entries
            .iter()
            .map(|e| (e.key().0, e.key().1, e.value().sender.clone()))
            .collect()
    }

    /// Removes every entry. Returns the removed `(user, role)` pairs with
    /// PARTICIPANT role, so the caller can drop their Participant records via
    /// C1. Used only when the interactive is being deleted mid-run.
    pub fn detach_all(&self) -> Vec<(UserId, Role)> {
        let keys: Vec<(UserId, Role)> = self.entries.iter().map(|e| *e.key()).collect();
        self.entries.clear();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chan() -> mpsc::Sender<livequiz_core::wire::OutboundFrame> {
        mpsc::channel(4).0
    }

    #[test]
    fn attach_then_reconnect_replaces_transport() {
        let reg = ConnectionRegistry::new();
        reg.attach(UserId(1), Role::Participant, chan()).unwrap();
        assert_eq!(reg.participant_count(), 1);
        reg.attach(UserId(1), Role::Participant, chan()).unwrap();
        assert_eq!(reg.participant_count(), 1, "reconnect must not duplicate");
    }

    #[test]
    fn second_distinct_leader_is_rejected() {
        let reg = ConnectionRegistry::new();
        reg.attach(UserId(1), Role::Leader, chan()).unwrap();
        let result = reg.attach(UserId(2), Role::Leader, chan());
        assert!(result.is_err());
    }

    #[test]
    fn same_user_leader_reconnect_is_allowed() {
        let reg = ConnectionRegistry::new();
        reg.attach(UserId(1), Role::Leader, chan()).unwrap();
        assert!(reg.attach(UserId(1), Role::Leader, chan()).is_ok());
    }

    #[test]
    fn detach_all_returns_keys_and_clears() {
        let reg = ConnectionRegistry::new();
        reg.attach(UserId(1), Role::Participant, chan()).unwrap();
        reg.attach(UserId(2), Role::Leader, chan()).unwrap();
        let keys = reg.detach_all();
        assert_eq!(keys.len(), 2);
        assert_eq!(reg.participant_count(), 0);
        assert!(!reg.has_leader());
    }

    #[test]
    fn detach_removes_single_entry() {
        let reg = ConnectionRegistry::new();
        reg.attach(UserId(1), Role::Participant, chan()).unwrap();
        reg.detach(UserId(1), Role::Participant);
        assert!(!reg.is_attached(UserId(1), Role::Participant));
    }
}
