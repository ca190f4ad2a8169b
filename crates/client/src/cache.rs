//! Per-session cache of remote resources.
//!
//! Each [`CacheKey`] owns one slot. A read either returns the fresh value,
//! joins the fetch already running for the key, or starts exactly one fetch
//! on its own task. Fetch results are published to every waiter through a
//! `watch` channel, so a caller that drops its future never strands the
//! others.
//!
//! Invalidation marks a slot stale and moves it to a new generation. A fetch
//! started for an older generation still answers its own waiters but never
//! writes the slot.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{ClientError, Result};

type Shared = Arc<dyn Any + Send + Sync>;
type Outcome = Result<Shared>;

/// Resource kinds the API serves. Invalidation works per family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Accounts,
    Transactions,
    Budgets,
    Goals,
    Categories,
    Dashboard,
    Reports,
    User,
}

impl ResourceFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Goals => "goals",
            Self::Categories => "categories",
            Self::Dashboard => "dashboard",
            Self::Reports => "reports",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A family plus the parameters that tell its variants apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub family: ResourceFamily,
    pub scope: Option<String>,
}

impl CacheKey {
    pub fn family(family: ResourceFamily) -> Self {
        Self {
            family,
            scope: None,
        }
    }

    pub fn scoped(family: ResourceFamily, scope: impl Into<String>) -> Self {
        Self {
            family,
            scope: Some(scope.into()),
        }
    }

    /// Scope taken from the JSON form of `params`. Parameters that serialize
    /// to an empty object map to the unscoped key.
    pub fn with_params<P: Serialize>(family: ResourceFamily, params: &P) -> Self {
        let scope = serde_json::to_string(params)
            .ok()
            .filter(|json| json != "{}" && json != "null");
        Self { family, scope }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}:{}", self.family, scope),
            None => write!(f, "{}", self.family),
        }
    }
}

/// Observable condition of one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Absent,
    Loading,
    Fresh,
    Stale,
}

struct InFlight {
    generation: u64,
    rx: watch::Receiver<Option<Outcome>>,
}

struct Slot {
    value: Option<Shared>,
    stale: bool,
    generation: u64,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<CacheKey, Slot>,
    // Generations are unique across the whole cache, so a slot recreated
    // after `clear` can never match a fetch from before it.
    epoch: u64,
}

impl Inner {
    fn next_generation(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

enum Plan {
    Hit(Shared),
    Join(watch::Receiver<Option<Outcome>>),
    Fetch {
        generation: u64,
        tx: watch::Sender<Option<Outcome>>,
        rx: watch::Receiver<Option<Outcome>>,
    },
}

#[derive(Clone, Default)]
pub struct Cache {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("slots", &self.lock().slots.len())
            .finish()
    }
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value for `key`, fetching it with `fetch` at most once
    /// no matter how many callers ask concurrently.
    ///
    /// `fetch` is only called when this caller starts the fetch. The returned
    /// future runs on a spawned task, so it must be `'static`.
    pub async fn read<T, F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let plan = self.plan(&key);
        let mut rx = match plan {
            Plan::Hit(value) => return downcast(&key, value),
            Plan::Join(rx) => {
                debug!("joining in-flight fetch for {key}");
                rx
            }
            Plan::Fetch { generation, tx, rx } => {
                debug!("fetching {key}");
                let request = fetch();
                let cache = self.clone();
                let task_key = key.clone();
                tokio::spawn(async move {
                    let outcome = request.await.map(|value| Arc::new(value) as Shared);
                    cache.complete(&task_key, generation, &outcome);
                    let _ = tx.send(Some(outcome));
                });
                rx
            }
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(published) => published.clone(),
            Err(_) => None,
        };
        match outcome {
            Some(Ok(value)) => downcast(&key, value),
            Some(Err(err)) => Err(err),
            None => Err(ClientError::Aborted),
        }
    }

    fn plan(&self, key: &CacheKey) -> Plan {
        let mut inner = self.lock();
        let fresh_generation = inner.next_generation();
        let slot = inner.slots.entry(key.clone()).or_insert_with(|| Slot {
            value: None,
            stale: false,
            generation: fresh_generation,
            in_flight: None,
        });

        if !slot.stale
            && let Some(value) = &slot.value
        {
            return Plan::Hit(Arc::clone(value));
        }

        if let Some(flight) = &slot.in_flight {
            // A sender that went away without publishing belongs to a task
            // that died; start over instead of waiting forever.
            if flight.rx.has_changed().is_ok() {
                return Plan::Join(flight.rx.clone());
            }
        }

        let (tx, rx) = watch::channel(None);
        slot.in_flight = Some(InFlight {
            generation: slot.generation,
            rx: rx.clone(),
        });
        Plan::Fetch {
            generation: slot.generation,
            tx,
            rx,
        }
    }

    fn complete(&self, key: &CacheKey, generation: u64, outcome: &Outcome) {
        let mut inner = self.lock();
        let Some(slot) = inner.slots.get_mut(key) else {
            debug!("dropping response for cleared key {key}");
            return;
        };

        if slot
            .in_flight
            .as_ref()
            .is_some_and(|flight| flight.generation == generation)
        {
            slot.in_flight = None;
        }

        if slot.generation != generation {
            debug!("ignoring stale response for {key}");
            return;
        }
        let forget = match outcome {
            Ok(value) => {
                slot.value = Some(Arc::clone(value));
                slot.stale = false;
                false
            }
            // A failed first fetch leaves nothing worth keeping.
            Err(_) => slot.value.is_none() && slot.in_flight.is_none(),
        };
        if forget {
            inner.slots.remove(key);
        }
    }

    /// Marks `key` stale. The next read refetches.
    pub fn invalidate(&self, key: &CacheKey) {
        let mut inner = self.lock();
        let generation = inner.next_generation();
        if let Some(slot) = inner.slots.get_mut(key) {
            debug!("invalidating {key}");
            slot.generation = generation;
            slot.stale = true;
            slot.in_flight = None;
        }
    }

    /// Marks every variant of `family` stale.
    pub fn invalidate_family(&self, family: ResourceFamily) {
        let mut inner = self.lock();
        let generation = inner.next_generation();
        let mut count = 0usize;
        for (key, slot) in inner.slots.iter_mut() {
            if key.family == family {
                slot.generation = generation;
                slot.stale = true;
                slot.in_flight = None;
                count += 1;
            }
        }
        debug!("invalidated {count} {family} entries");
    }

    /// Drops every entry. Fetches still running answer their own waiters
    /// and are then discarded.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.slots.clear();
        debug!("cache cleared");
    }

    pub fn state(&self, key: &CacheKey) -> SlotState {
        let inner = self.lock();
        let Some(slot) = inner.slots.get(key) else {
            return SlotState::Absent;
        };
        if slot.in_flight.is_some() {
            return SlotState::Loading;
        }
        match (&slot.value, slot.stale) {
            (None, _) => SlotState::Absent,
            (Some(_), true) => SlotState::Stale,
            (Some(_), false) => SlotState::Fresh,
        }
    }

    /// Last stored value for `key`, fresh or stale.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        let inner = self.lock();
        let value = inner.slots.get(key)?.value.as_ref()?;
        Arc::clone(value).downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| slot.value.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: Send + Sync + 'static>(key: &CacheKey, value: Shared) -> Result<Arc<T>> {
    value
        .downcast::<T>()
        .map_err(|_| ClientError::CacheType(key.to_string()))
}
