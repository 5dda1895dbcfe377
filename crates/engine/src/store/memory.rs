use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::ResultEngine;

use super::{Collection, EVENT_CHANNEL_CAP, GraphStore, StoreEvent, Version};

#[derive(Clone, Debug)]
struct Node {
    value: Option<Value>,
    version: Version,
}

/// A graph peer living in process memory.
///
/// Nothing survives a restart; state is rebuilt from linked peers.
#[derive(Debug)]
pub struct MemoryStore {
    peer: Uuid,
    nodes: RwLock<HashMap<(Collection, String), Node>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_peer(Uuid::new_v4())
    }

    pub fn with_peer(peer: Uuid) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAP);
        Self {
            peer,
            nodes: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn notify(&self, event: &StoreEvent) {
        // No subscriber is not an error.
        let _ = self.events.send(event.clone());
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    fn peer(&self) -> Uuid {
        self.peer
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        value: Option<Value>,
    ) -> ResultEngine<StoreEvent> {
        let event = {
            let mut nodes = self.nodes.write().await;
            let slot = (collection, key.to_string());
            let version = Version::next(nodes.get(&slot).map(|node| &node.version), self.peer);
            nodes.insert(
                slot,
                Node {
                    value: value.clone(),
                    version,
                },
            );
            StoreEvent {
                collection,
                key: key.to_string(),
                value,
                version,
            }
        };
        self.notify(&event);
        Ok(event)
    }

    async fn merge(&self, event: StoreEvent) -> ResultEngine<bool> {
        {
            let mut nodes = self.nodes.write().await;
            let slot = (event.collection, event.key.clone());
            if let Some(current) = nodes.get(&slot)
                && current.version >= event.version
            {
                return Ok(false);
            }
            nodes.insert(
                slot,
                Node {
                    value: event.value.clone(),
                    version: event.version,
                },
            );
        }
        self.notify(&event);
        Ok(true)
    }

    async fn snapshot(&self, collection: Collection) -> ResultEngine<Vec<StoreEvent>> {
        let nodes = self.nodes.read().await;
        let mut events: Vec<StoreEvent> = nodes
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((c, key), node)| StoreEvent {
                collection: *c,
                key: key.clone(),
                value: node.value.clone(),
                version: node.version,
            })
            .collect();
        events.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(events)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_notifies_subscribers_and_tombstones_keep_key() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        store
            .put(Collection::Members, "KV0001", Some(json!({ "fullName": "A" })))
            .await
            .unwrap();
        store.put(Collection::Members, "KV0001", None).await.unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.key, "KV0001");
        assert!(!first.is_tombstone());
        let second = events.recv().await.unwrap();
        assert!(second.is_tombstone());
        assert!(second.version > first.version);

        let snapshot = store.snapshot(Collection::Members).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].is_tombstone());
        assert!(store.snapshot(Collection::Counters).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_keeps_newest_version() {
        let store = MemoryStore::new();
        let local = store
            .put(Collection::Counters, "memberIdCounter", Some(json!(3)))
            .await
            .unwrap();

        let stale = StoreEvent {
            value: Some(json!(2)),
            version: Version {
                at: local.version.at - TimeDelta::seconds(5),
                peer: Uuid::new_v4(),
            },
            ..local.clone()
        };
        assert!(!store.merge(stale).await.unwrap());
        assert!(!store.merge(local.clone()).await.unwrap());

        let newer = StoreEvent {
            value: Some(json!(4)),
            version: Version {
                at: Utc::now() + TimeDelta::seconds(5),
                peer: Uuid::new_v4(),
            },
            ..local
        };
        assert!(store.merge(newer).await.unwrap());
        let snapshot = store.snapshot(Collection::Counters).await.unwrap();
        assert_eq!(snapshot[0].value, Some(json!(4)));
    }
}
