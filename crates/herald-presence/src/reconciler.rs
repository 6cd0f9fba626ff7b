//! The presence reconciler.
//!
//! On startup the process loads the durable guild set; when a shard
//! reports ready with its live guild list, the reconciler walks the ids of
//! that shard's partition and removes the ones the shard no longer sees,
//! emitting a synthetic removal event for each (the guild was left while
//! the process was offline).

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use herald_core::{shard_index, GuildId};
use herald_store::GuildSetStore;

use crate::error::Result;
use crate::events::PresenceEvent;

/// Outcome of one reconciliation pass over a single shard's partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Persisted ids belonging to the reconciled shard.
    pub checked: usize,
    /// Ids removed from the durable set during this pass.
    pub removed: Vec<GuildId>,
    /// Ids whose removal failed at the store and is deferred to the next
    /// cycle.
    pub deferred: Vec<GuildId>,
}

/// Compares the durable guild set against live shard membership.
pub struct Reconciler<S: GuildSetStore> {
    store: Arc<S>,
    events: mpsc::UnboundedSender<PresenceEvent>,
}

impl<S: GuildSetStore> Reconciler<S> {
    /// Create a reconciler over a durable guild set, returning the
    /// receiver for its presence events.
    pub fn new(store: Arc<S>) -> (Self, mpsc::UnboundedReceiver<PresenceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { store, events: tx }, rx)
    }

    /// Read the durable set at startup.
    ///
    /// A store failure here propagates to the caller; starting without the
    /// durable set would make every later reconciliation pass meaningless.
    pub async fn load(&self) -> Result<Vec<GuildId>> {
        let ids = self.store.list().await?;
        info!(count = ids.len(), "loaded connected guilds");
        Ok(ids)
    }

    /// Reconcile one shard's partition of the durable set against the
    /// guild list that shard reported at ready time.
    ///
    /// Only ids assigned to `shard` are inspected; other partitions are
    /// left for their own shards. A store failure while removing one id is
    /// logged and deferred to the next cycle, never fatal. Running the
    /// same pass twice removes nothing the second time and emits no
    /// duplicate events.
    pub async fn reconcile(
        &self,
        shard: u32,
        num_shards: u32,
        live: &HashSet<GuildId>,
    ) -> Result<ReconcileReport> {
        info!(shard, "checking joined guilds");

        let persisted = self.store.list().await?;
        let mut report = ReconcileReport::default();

        for id in persisted {
            if shard_index(id, num_shards)? != shard {
                continue;
            }
            report.checked += 1;

            if live.contains(&id) {
                continue;
            }

            // Left while offline: drop it from the durable set first so a
            // crash between remove and emit errs toward a lost event, not
            // a duplicate one.
            match self.store.remove(id).await {
                Ok(_) => {
                    info!(guild = %id, "removed from guild while offline");
                    self.emit(PresenceEvent::GuildRemoved(id));
                    report.removed.push(id);
                }
                Err(e) => {
                    warn!(guild = %id, error = %e, "deferring removal to next cycle");
                    report.deferred.push(id);
                }
            }
        }

        Ok(report)
    }

    /// Record a live guild-create notification.
    pub async fn add_guild(&self, id: GuildId) -> Result<()> {
        self.store.add(id).await?;
        Ok(())
    }

    /// Record a live guild-delete notification.
    ///
    /// Emits the same removal event as an offline departure so downstream
    /// cleanup does not care which way the guild left.
    pub async fn remove_guild(&self, id: GuildId) -> Result<()> {
        if self.store.remove(id).await? {
            self.emit(PresenceEvent::GuildRemoved(id));
        }
        Ok(())
    }

    fn emit(&self, event: PresenceEvent) {
        // The receiver being gone means nothing downstream wants events;
        // reconciliation itself must still make progress.
        if self.events.send(event).is_err() {
            warn!(?event, "presence event dropped, receiver closed");
        }
    }
}
