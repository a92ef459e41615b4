// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session Manager (C6): the concurrency-safe map from `InteractiveId` to a
//! running [`Session`], keyed exactly as spec.md §4.6 describes.
//!
//! Grounded on the teacher's `SqliteStorage` lazy-`OnceCell` construction
//! pattern for `get_or_create`, and on `ChannelMultiplexer`'s registry-of-
//! handles structure for the map itself, generalized to `DashMap` per
//! SPEC_FULL §4.6. `force_delete` and the Session's own END-triggered
//! self-removal both resolve to a `DashMap::remove` on the same key; the
//! map's internal per-shard locking is what spec.md §9's closing note
//! requires to be atomic -- whichever caller's `remove` observes the entry
//! wins, the other sees it already gone.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use livequiz_core::{EndReason, EngineError, InteractiveId, Role, StorageRepository};

use crate::session::{IdleConfig, Session};

/// A running Session plus the join handle for its tick-loop task.
pub struct SessionHandle {
    pub session: Arc<Session>,
    task: JoinHandle<EndReason>,
}

impl SessionHandle {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// Owns every running Session, keyed by interactive id.
pub struct SessionManager {
    sessions: DashMap<InteractiveId, SessionHandle>,
    storage: Arc<dyn StorageRepository>,
    idle_cfg: IdleConfig,
    tick_seconds: u64,
}

impl SessionManager {
    pub fn new(storage: Arc<dyn StorageRepository>, idle_cfg: IdleConfig, tick_seconds: u64) -> Arc<Self> {
        Arc::new(Self {
            sessions: DashMap::new(),
            storage,
            idle_cfg,
            tick_seconds,
        })
    }

    pub fn get(&self, id: InteractiveId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|h| h.session.clone())
    }

    /// Loads metadata and questions (once) and starts a new Session's tick
    /// loop if one isn't already running for `id`.
    pub async fn get_or_create(
        self: &Arc<Self>,
        id: InteractiveId,
    ) -> Result<Arc<Session>, EngineError> {
        if let Some(existing) = self.get(id) {
            return Ok(existing);
        }
        if self.storage.is_conducted(id).await? {
            return Err(EngineError::NotFound(format!(
                "interactive {id:?} has already been conducted"
            )));
        }
        let meta = self.storage.load_interactive_meta(id).await?;
        let questions = self.storage.load_questions(id).await?;
        let session = Session::new(meta, questions, self.storage.clone(), self.idle_cfg, self.tick_seconds);

        let manager = self.clone();
        let task_session = session.clone();
        let task = tokio::spawn(async move {
            let reason = task_session.run().await;
            manager.sessions.remove(&id);
            tracing::info!(interactive_id = ?id, ?reason, "session ended, removed from manager");
            reason
        });

        self.sessions.insert(id, SessionHandle { session: session.clone(), task });
        Ok(session)
    }

    /// Idempotent removal with no side effects beyond dropping the map
    /// entry; used when a Session has already driven itself to completion
    /// and the caller just wants the bookkeeping gone.
    pub fn remove(&self, id: InteractiveId) {
        self.sessions.remove(&id);
    }

    /// Admin-forced deletion: detaches every connection (dropping their
    /// Participant records), aborts the tick task, and removes the map
    /// entry -- all before the Session's own END self-removal can run,
    /// or a no-op if END already beat it to the `remove`.
    pub async fn force_delete(&self, id: InteractiveId) -> Result<(), EngineError> {
        let Some((_, handle)) = self.sessions.remove(&id) else {
            return Ok(());
        };
        handle.task.abort();
        for (user, role) in handle.session.registry.detach_all() {
            if role == Role::Participant {
                self.storage.drop_participant(id, user).await?;
            }
        }
        Ok(())
    }

    /// Snapshot of currently running interactive ids, for graceful shutdown.
    pub fn running_ids(&self) -> Vec<InteractiveId> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
