use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use async_trait::async_trait;
use chrono::DateTime;
use sea_orm::{
    ActiveValue, DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use serde_json::Value;
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{EngineError, ResultEngine};

use super::{Collection, EVENT_CHANNEL_CAP, GraphStore, StoreEvent, Version};

mod graph_nodes {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "graph_nodes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub collection: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub node_key: String,
        /// JSON text of the node, `NULL` for a tombstone.
        pub value: Option<String>,
        /// Version timestamp in microseconds since the epoch.
        pub version_at: i64,
        pub version_peer: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// How far behind the newest announced version a poll rescans, in
/// microseconds. Covers writers whose transaction commits after a newer one.
const POLL_OVERLAP_MICROS: i64 = 60_000_000;

/// Node versions this handle has already broadcast.
#[derive(Debug, Default)]
struct Announced {
    versions: HashMap<(Collection, String), Version>,
    /// Highest `version_at` announced so far.
    watermark: i64,
}

impl Announced {
    /// Remember `event`; `false` when it was already announced.
    fn record(&mut self, event: &StoreEvent) -> bool {
        let slot = (event.collection, event.key.clone());
        if let Some(known) = self.versions.get(&slot)
            && *known >= event.version
        {
            return false;
        }
        self.watermark = self.watermark.max(event.version.at.timestamp_micros());
        self.versions.insert(slot, event.version);
        true
    }
}

/// A graph peer persisted in a SQL database (SQLite in practice).
///
/// The schema is created by the `migration` crate. Writes through this handle
/// are broadcast right away. Writes by other handles on the same database
/// (another process, the admin CLI) are picked up by [`poll_changes`], run
/// periodically by [`spawn_watch`].
///
/// [`poll_changes`]: SqliteStore::poll_changes
/// [`spawn_watch`]: SqliteStore::spawn_watch
#[derive(Debug)]
pub struct SqliteStore {
    peer: Uuid,
    database: DatabaseConnection,
    events: broadcast::Sender<StoreEvent>,
    // Serializes read-compare-write cycles and polls of this handle.
    announced: Mutex<Announced>,
}

impl SqliteStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self::with_peer(database, Uuid::new_v4())
    }

    pub fn with_peer(database: DatabaseConnection, peer: Uuid) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAP);
        Self {
            peer,
            database,
            events,
            announced: Mutex::new(Announced::default()),
        }
    }

    /// Broadcast nodes written through other handles since the last poll.
    ///
    /// Returns how many changes were announced. Undecodable rows are skipped.
    pub async fn poll_changes(&self) -> ResultEngine<usize> {
        let mut announced = self.announced.lock().await;
        let since = announced.watermark.saturating_sub(POLL_OVERLAP_MICROS);
        let models = graph_nodes::Entity::find()
            .filter(graph_nodes::Column::VersionAt.gte(since))
            .order_by_asc(graph_nodes::Column::VersionAt)
            .all(&self.database)
            .await?;

        let mut changes = 0;
        for model in models {
            let event = match model_event(model) {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!("skipping unreadable graph node: {err}");
                    continue;
                }
            };
            if announced.record(&event) {
                self.notify(&event);
                changes += 1;
            }
        }
        Ok(changes)
    }

    /// Poll for external writes every `every` until the store is dropped.
    pub fn spawn_watch(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                match store.poll_changes().await {
                    Ok(0) => {}
                    Ok(changes) => tracing::debug!(changes, "picked up external writes"),
                    Err(err) => tracing::warn!("polling graph nodes failed: {err}"),
                }
            }
        })
    }

    async fn current(
        db_tx: &DatabaseTransaction,
        collection: Collection,
        key: &str,
    ) -> ResultEngine<Option<graph_nodes::Model>> {
        Ok(
            graph_nodes::Entity::find_by_id((collection.name().to_string(), key.to_string()))
                .one(db_tx)
                .await?,
        )
    }

    async fn write(
        db_tx: &DatabaseTransaction,
        existing: Option<graph_nodes::Model>,
        event: &StoreEvent,
    ) -> ResultEngine<()> {
        let value = event.value.as_ref().map(serde_json::to_string).transpose()?;
        let active = graph_nodes::ActiveModel {
            collection: ActiveValue::Set(event.collection.name().to_string()),
            node_key: ActiveValue::Set(event.key.clone()),
            value: ActiveValue::Set(value),
            version_at: ActiveValue::Set(event.version.at.timestamp_micros()),
            version_peer: ActiveValue::Set(event.version.peer),
        };
        match existing {
            Some(_) => {
                active.update(db_tx).await?;
            }
            None => {
                active.insert(db_tx).await?;
            }
        }
        Ok(())
    }

    fn notify(&self, event: &StoreEvent) {
        let _ = self.events.send(event.clone());
    }
}

fn model_version(model: &graph_nodes::Model) -> ResultEngine<Version> {
    let at = DateTime::from_timestamp_micros(model.version_at).ok_or_else(|| {
        EngineError::InvalidRecord(format!("invalid version for node {}", model.node_key))
    })?;
    Ok(Version {
        at,
        peer: model.version_peer,
    })
}

fn model_event(model: graph_nodes::Model) -> ResultEngine<StoreEvent> {
    let collection = Collection::from_name(&model.collection).ok_or_else(|| {
        EngineError::InvalidRecord(format!("unknown collection {}", model.collection))
    })?;
    let version = model_version(&model)?;
    let value = model
        .value
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()?;
    Ok(StoreEvent {
        collection,
        key: model.node_key,
        value,
        version,
    })
}

#[async_trait]
impl GraphStore for SqliteStore {
    fn peer(&self) -> Uuid {
        self.peer
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        value: Option<Value>,
    ) -> ResultEngine<StoreEvent> {
        let mut announced = self.announced.lock().await;
        let db_tx = self.database.begin().await?;

        let existing = Self::current(&db_tx, collection, key).await?;
        let previous = existing.as_ref().map(model_version).transpose()?;
        let event = StoreEvent {
            collection,
            key: key.to_string(),
            value,
            version: Version::next(previous.as_ref(), self.peer),
        };
        Self::write(&db_tx, existing, &event).await?;
        db_tx.commit().await?;

        announced.record(&event);
        self.notify(&event);
        Ok(event)
    }

    async fn merge(&self, event: StoreEvent) -> ResultEngine<bool> {
        let mut announced = self.announced.lock().await;
        let db_tx = self.database.begin().await?;

        let existing = Self::current(&db_tx, event.collection, &event.key).await?;
        if let Some(model) = existing.as_ref()
            && model_version(model)? >= event.version
        {
            return Ok(false);
        }
        Self::write(&db_tx, existing, &event).await?;
        db_tx.commit().await?;

        announced.record(&event);
        self.notify(&event);
        Ok(true)
    }

    async fn snapshot(&self, collection: Collection) -> ResultEngine<Vec<StoreEvent>> {
        let models = graph_nodes::Entity::find()
            .filter(graph_nodes::Column::Collection.eq(collection.name()))
            .order_by_asc(graph_nodes::Column::VersionAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(model_event).collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
