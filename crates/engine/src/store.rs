//! Adapter over the shared key-value graph.
//!
//! Every collection is a map from record key to a flat JSON node. Deleting a
//! record writes a tombstone (`None`) instead of dropping the key, so the
//! removal itself replicates. Each write carries a [`Version`]; stores merge
//! remote writes last-writer-wins on that version.
//!
//! Backends:
//!
//! - [`MemoryStore`]: in-process peer, see [`link`] to replicate two of them.
//! - [`SqliteStore`]: nodes persisted through `sea-orm`.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::ResultEngine;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

mod memory;
mod sqlite;

/// Buffered notifications per subscriber before it is considered lagging.
pub const EVENT_CHANNEL_CAP: usize = 1024;

/// Top level collections of the shared graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Collection {
    Members,
    Supplements,
    Counters,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Members,
        Collection::Supplements,
        Collection::Counters,
    ];

    /// Name of the collection node in the shared graph.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Collection::Members => "kv_fitness_members",
            Collection::Supplements => "kv_fitness_supplements",
            Collection::Counters => "kv_fitness_counters",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Collection> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Write version used for last-writer-wins merging.
///
/// Ordered by wall-clock time, ties broken by the writing peer id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub at: DateTime<Utc>,
    pub peer: Uuid,
}

impl Version {
    /// Version for a local write that must supersede `previous`, even when
    /// the local clock is behind it.
    ///
    /// Versions have microsecond precision so they survive persistence.
    #[must_use]
    pub fn next(previous: Option<&Version>, peer: Uuid) -> Version {
        let now = Utc::now().trunc_subsecs(6);
        let at = match previous {
            Some(prev) if prev.at >= now => prev.at + TimeDelta::microseconds(1),
            _ => now,
        };
        Version { at, peer }
    }
}

/// A change notification for one key: a full snapshot or a tombstone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub collection: Collection,
    pub key: String,
    pub value: Option<Value>,
    pub version: Version,
}

impl StoreEvent {
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// A peer of the shared graph.
#[async_trait]
pub trait GraphStore: Send + Sync + fmt::Debug {
    /// Id of this peer, stamped on local writes.
    fn peer(&self) -> Uuid;

    /// Write a full snapshot (`Some`) or a tombstone (`None`) under `key`.
    ///
    /// Subscribers, including this peer's own, are notified.
    async fn put(
        &self,
        collection: Collection,
        key: &str,
        value: Option<Value>,
    ) -> ResultEngine<StoreEvent>;

    /// Merge a write received from another peer. Returns `false` when the
    /// local node already carries the same or a newer version.
    async fn merge(&self, event: StoreEvent) -> ResultEngine<bool>;

    /// Current node of every key in `collection`, tombstones included.
    async fn snapshot(&self, collection: Collection) -> ResultEngine<Vec<StoreEvent>>;

    /// Subscribe to every accepted write, local or merged.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Replication between two peers. Dropping it stops the relays.
#[derive(Debug)]
pub struct Link {
    relays: Vec<JoinHandle<()>>,
}

impl Drop for Link {
    fn drop(&mut self) {
        for relay in &self.relays {
            relay.abort();
        }
    }
}

/// Connect two peers so they converge on the same graph.
///
/// Existing nodes are exchanged first, then every accepted write is relayed
/// to the other side. Relays echo back, and the echo is dropped by
/// [`GraphStore::merge`] because the version is not newer.
pub async fn link(a: Arc<dyn GraphStore>, b: Arc<dyn GraphStore>) -> ResultEngine<Link> {
    let from_a = a.subscribe();
    let from_b = b.subscribe();

    copy_all(a.as_ref(), b.as_ref()).await?;
    copy_all(b.as_ref(), a.as_ref()).await?;

    let relays = vec![
        tokio::spawn(relay(a.clone(), b.clone(), from_a)),
        tokio::spawn(relay(b, a, from_b)),
    ];
    Ok(Link { relays })
}

async fn copy_all(from: &dyn GraphStore, to: &dyn GraphStore) -> ResultEngine<()> {
    for collection in Collection::ALL {
        for event in from.snapshot(collection).await? {
            to.merge(event).await?;
        }
    }
    Ok(())
}

async fn relay(
    from: Arc<dyn GraphStore>,
    to: Arc<dyn GraphStore>,
    mut events: broadcast::Receiver<StoreEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(err) = to.merge(event).await {
                    tracing::warn!(peer = %to.peer(), "failed to merge relayed write: {err}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "relay lagged, resending full graph");
                if let Err(err) = copy_all(from.as_ref(), to.as_ref()).await {
                    tracing::warn!(peer = %to.peer(), "failed to resend graph: {err}");
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}
