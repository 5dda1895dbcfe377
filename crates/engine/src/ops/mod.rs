use std::{collections::HashMap, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::{
    EngineError, Member, ResultEngine, Supplement,
    reconcile::{CounterSlot, Records},
    store::{Collection, GraphStore, StoreEvent, Version},
    util::clean_node,
};

mod members;
mod queries;
mod supplements;
mod sync;

/// Local replica of the shared collections.
#[derive(Debug, Default)]
struct LocalState {
    members: Records<Member>,
    supplements: Records<Supplement>,
    member_counter: CounterSlot,
    supplement_counter: CounterSlot,
    versions: HashMap<(Collection, String), Version>,
}

/// The gym console: domain operations over a graph peer.
///
/// Writes go to the store and are applied to the local state right away; the
/// same events coming back through the store subscription are no-ops.
#[derive(Debug)]
pub struct Console {
    store: Arc<dyn GraphStore>,
    state: RwLock<LocalState>,
    // Serializes id minting of this console. Other peers can still collide.
    minting: Mutex<()>,
}

impl Console {
    /// Return a builder for `Console`. Help to build the struct.
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::default()
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Fire-and-forget write: failures are logged, never surfaced.
    async fn write(&self, collection: Collection, key: &str, value: Option<Value>) {
        match self.store.put(collection, key, value).await {
            Ok(event) => self.apply_event(&event).await,
            Err(err) => {
                tracing::warn!(%collection, key, "write to shared store failed: {err}");
            }
        }
    }
}

/// Decode a node into a record; `None` for tombstones.
fn decode<T: DeserializeOwned>(event: &StoreEvent) -> ResultEngine<Option<T>> {
    match &event.value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let cleaned = clean_node(value.clone(), &event.key)?;
            Ok(Some(serde_json::from_value(cleaned)?))
        }
    }
}

fn encode<T: serde::Serialize>(record: &T) -> ResultEngine<Value> {
    serde_json::to_value(record).map_err(EngineError::from)
}

/// The builder for `Console`
#[derive(Default)]
pub struct ConsoleBuilder {
    store: Option<Arc<dyn GraphStore>>,
}

impl ConsoleBuilder {
    /// Pass the required store
    pub fn store(mut self, store: Arc<dyn GraphStore>) -> ConsoleBuilder {
        self.store = Some(store);
        self
    }

    /// Construct `Console` and load the current graph.
    pub async fn build(self) -> ResultEngine<Console> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Store("missing store".to_string()))?;
        let console = Console {
            store,
            state: RwLock::new(LocalState::default()),
            minting: Mutex::new(()),
        };
        console.load().await?;
        Ok(console)
    }
}
