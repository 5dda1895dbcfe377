use std::sync::Arc;

use serde_json::{Value, json};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

use crate::{
    ResultEngine,
    ids::{COUNTER_START, Counter},
    reconcile::{Change, CounterAction},
    store::{Collection, StoreEvent},
};

use super::{Console, LocalState, decode};

impl Console {
    /// Rebuild the local state from a full snapshot of every collection.
    ///
    /// Counters missing from the graph are initialized to their start value.
    pub async fn load(&self) -> ResultEngine<()> {
        let mut missing = Counter::ALL.to_vec();
        for collection in Collection::ALL {
            for event in self.store.snapshot(collection).await? {
                if collection == Collection::Counters {
                    missing.retain(|counter| counter.key() != event.key);
                }
                self.apply_event(&event).await;
            }
        }
        for counter in missing {
            self.bootstrap_counter(counter).await;
        }

        let state = self.state.read().await;
        tracing::info!(
            members = state.members.len(),
            supplements = state.supplements.len(),
            "local state loaded"
        );
        Ok(())
    }

    /// Apply one change notification to the local state.
    ///
    /// Undecodable nodes are logged and skipped.
    pub async fn apply_event(&self, event: &StoreEvent) {
        let bootstrap = {
            let mut state = self.state.write().await;
            reconcile(&mut state, event)
        };
        if let Some(counter) = bootstrap {
            self.bootstrap_counter(counter).await;
        }
    }

    async fn bootstrap_counter(&self, counter: Counter) {
        tracing::debug!(counter = counter.key(), "initializing id counter");
        match self
            .store
            .put(Collection::Counters, counter.key(), Some(json!(COUNTER_START)))
            .await
        {
            Ok(event) => {
                let mut state = self.state.write().await;
                reconcile(&mut state, &event);
            }
            Err(err) => tracing::warn!(counter = counter.key(), "counter bootstrap failed: {err}"),
        }
    }

    /// Follow the store subscription in a background task.
    ///
    /// The subscription is opened before the initial resync so no write is
    /// missed in between. A lagging subscriber resyncs from a snapshot.
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let console = Arc::clone(self);
        let mut events = console.store.subscribe();
        tokio::spawn(async move {
            if let Err(err) = console.load().await {
                tracing::warn!("initial resync failed: {err}");
            }
            loop {
                match events.recv().await {
                    Ok(event) => console.apply_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "subscription lagged, resyncing");
                        if let Err(err) = console.load().await {
                            tracing::warn!("resync failed: {err}");
                        }
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("store subscription closed");
                        break;
                    }
                }
            }
        })
    }
}

/// Apply `event` to `state`; returns the counter to bootstrap, if any.
///
/// Events older than the last one applied for the same key are dropped, so a
/// late re-delivery of our own write cannot roll a counter back.
fn reconcile(state: &mut LocalState, event: &StoreEvent) -> Option<Counter> {
    let slot = (event.collection, event.key.clone());
    if let Some(seen) = state.versions.get(&slot)
        && *seen >= event.version
    {
        return None;
    }
    state.versions.insert(slot, event.version);

    let change = match event.collection {
        Collection::Members => match decode(event) {
            Ok(member) => state.members.apply(&event.key, member),
            Err(err) => {
                tracing::warn!(key = %event.key, "skipping undecodable member: {err}");
                return None;
            }
        },
        Collection::Supplements => match decode(event) {
            Ok(supplement) => state.supplements.apply(&event.key, supplement),
            Err(err) => {
                tracing::warn!(key = %event.key, "skipping undecodable supplement: {err}");
                return None;
            }
        },
        Collection::Counters => {
            let Some(counter) = Counter::from_key(&event.key) else {
                tracing::debug!(key = %event.key, "ignoring unknown counter");
                return None;
            };
            let counter_slot = match counter {
                Counter::Member => &mut state.member_counter,
                Counter::Supplement => &mut state.supplement_counter,
            };
            let value = event.value.as_ref().and_then(Value::as_i64);
            return match counter_slot.apply(value) {
                CounterAction::Adopted(next) => {
                    tracing::debug!(counter = counter.key(), next, "counter adopted");
                    None
                }
                CounterAction::Bootstrap => Some(counter),
            };
        }
    };

    if change != Change::Unchanged {
        tracing::debug!(collection = %event.collection, key = %event.key, ?change, "reconciled");
    }
    None
}
