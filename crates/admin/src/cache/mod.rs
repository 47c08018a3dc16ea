//! In-process cache of API responses.
//!
//! # Architecture
//!
//! - Entries are keyed by resource identity ([`QueryKey`]) and backed by a
//!   `moka` future cache bounded by capacity and TTL
//! - An entry is fresh for `stale_time` after it was fetched and served as-is
//!   during that window. Afterwards, or once invalidated, the next read
//!   refetches. The default window is zero, so every page view revalidates
//!   with the caller's own token.
//! - Every key has a generation counter. Cancelling or invalidating a key bumps
//!   it, and a fetch only stores its result if the generation it started with
//!   is still current. Failed fetches are never stored.
//!
//! Each signed-in user gets their own [`QueryCache`] from [`UserCaches`];
//! it is dropped on logout and when the API rejects the user's token.

pub mod optimistic;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use moka::future::Cache;
use tracing::{debug, trace};

use tyhub_core::{CustomerId, OrderId, UserId};

use crate::api::{Customer, Order, Product};
use crate::config::CacheConfig;

/// Identity of a cached server response.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum QueryKey {
    Orders,
    Order(OrderId),
    Products,
    Customers,
    Customer(CustomerId),
}

/// The family a [`QueryKey`] belongs to, ignoring record ids.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum QueryKind {
    Orders,
    Order,
    Products,
    Customers,
    Customer,
}

impl QueryKey {
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::Orders => QueryKind::Orders,
            Self::Order(_) => QueryKind::Order,
            Self::Products => QueryKind::Products,
            Self::Customers => QueryKind::Customers,
            Self::Customer(_) => QueryKind::Customer,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum QueryData {
    Orders(Arc<Vec<Order>>),
    Order(Arc<Order>),
    Products(Arc<Vec<Product>>),
    Customers(Arc<Vec<Customer>>),
    Customer(Arc<Customer>),
}

/// Types that can be stored in the [`QueryCache`].
pub trait Cached: Sized + Send + Sync + 'static {
    fn into_data(value: Arc<Self>) -> QueryData;
    fn from_data(data: &QueryData) -> Option<Arc<Self>>;
}

macro_rules! impl_cached {
    ($ty:ty => $variant:ident) => {
        impl Cached for $ty {
            fn into_data(value: Arc<Self>) -> QueryData {
                QueryData::$variant(value)
            }

            fn from_data(data: &QueryData) -> Option<Arc<Self>> {
                match data {
                    QueryData::$variant(value) => Some(Arc::clone(value)),
                    _ => None,
                }
            }
        }
    };
}

impl_cached!(Vec<Order> => Orders);
impl_cached!(Order => Order);
impl_cached!(Vec<Product> => Products);
impl_cached!(Vec<Customer> => Customers);
impl_cached!(Customer => Customer);

#[derive(Debug, Clone)]
struct Entry {
    data: QueryData,
    stale: bool,
    fetched_at: Instant,
}

impl Entry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.stale && self.fetched_at.elapsed() < stale_time
    }
}

/// A saved copy of one cache slot, including "no entry".
#[derive(Debug, Clone)]
pub struct Snapshot(Option<Entry>);

impl Snapshot {
    /// Whether the slot was empty when captured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

/// Cache of API responses for one user.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<QueryCacheInner>,
}

struct QueryCacheInner {
    entries: Cache<QueryKey, Entry>,
    generations: Mutex<HashMap<QueryKey, u64>>,
    stale_time: Duration,
}

impl QueryCache {
    /// Create a cache with the configured bounds.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            inner: Arc::new(QueryCacheInner {
                entries,
                generations: Mutex::new(HashMap::new()),
                stale_time: config.stale_time,
            }),
        }
    }

    /// Serve a fresh entry for `key`, or run `fetcher` and remember its result.
    ///
    /// The result is stored only when `key` was not cancelled or invalidated
    /// while the fetch was in flight; the caller receives it either way.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error. Errors are not cached.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Arc<T>, E>
    where
        T: Cached,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(entry) = self.inner.entries.get(&key).await
            && entry.is_fresh(self.inner.stale_time)
            && let Some(value) = T::from_data(&entry.data)
        {
            trace!(?key, "Query cache hit");
            return Ok(value);
        }

        let started = self.generation(&key);
        let value = Arc::new(fetcher().await?);

        if self.generation(&key) == started {
            self.store(key, T::into_data(Arc::clone(&value)), false, Instant::now())
                .await;
        } else {
            debug!(?key, "Discarding result of cancelled fetch");
        }

        Ok(value)
    }

    /// Cached value for `key`, fresh or stale.
    pub async fn peek<T: Cached>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entry = self.inner.entries.get(key).await?;
        T::from_data(&entry.data)
    }

    /// Whether `key` holds a stale entry. `None` when there is no entry.
    pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.inner.entries.get(key).await.map(|entry| entry.stale)
    }

    /// Discard the results of any fetch for `key` that is still in flight.
    pub fn cancel(&self, key: &QueryKey) {
        let mut generations = self
            .inner
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *generations.entry(key.clone()).or_insert(0) += 1;
    }

    /// Capture the current state of `key`.
    pub async fn snapshot(&self, key: &QueryKey) -> Snapshot {
        Snapshot(self.inner.entries.get(key).await)
    }

    /// Put the state captured by [`snapshot`](Self::snapshot) back.
    pub async fn restore(&self, key: QueryKey, snapshot: Snapshot) {
        match snapshot.0 {
            Some(entry) => self.inner.entries.insert(key, entry).await,
            None => self.inner.entries.invalidate(&key).await,
        }
    }

    /// Store a fresh value for `key`.
    pub async fn set<T: Cached>(&self, key: QueryKey, value: T) {
        self.store(key, T::into_data(Arc::new(value)), false, Instant::now())
            .await;
    }

    /// Modify the cached value for `key` in place, keeping its age and staleness.
    ///
    /// Returns `false` (and changes nothing) when there is no entry of type `T`.
    pub async fn update<T, F>(&self, key: QueryKey, f: F) -> bool
    where
        T: Cached + Clone,
        F: FnOnce(&mut T),
    {
        let Some(entry) = self.inner.entries.get(&key).await else {
            return false;
        };
        let Some(current) = T::from_data(&entry.data) else {
            return false;
        };

        let mut value = T::clone(&current);
        f(&mut value);
        self.store(key, T::into_data(Arc::new(value)), entry.stale, entry.fetched_at)
            .await;
        true
    }

    /// Drop the entry for `key`.
    pub async fn remove(&self, key: &QueryKey) {
        self.cancel(key);
        self.inner.entries.invalidate(key).await;
    }

    /// Mark `key` stale so the next read refetches it.
    ///
    /// Also cancels in-flight fetches, which may carry pre-invalidation data.
    pub async fn invalidate(&self, key: &QueryKey) {
        self.cancel(key);
        if let Some(mut entry) = self.inner.entries.get(key).await {
            entry.stale = true;
            self.inner.entries.insert(key.clone(), entry).await;
        }
        debug!(?key, "Query invalidated");
    }

    /// Invalidate every entry of one kind (e.g. all `Order(_)` entries).
    pub async fn invalidate_prefix(&self, kind: QueryKind) {
        let keys: Vec<QueryKey> = self
            .inner
            .entries
            .iter()
            .filter(|(key, _)| key.kind() == kind)
            .map(|(key, _)| QueryKey::clone(&key))
            .collect();

        for key in &keys {
            self.invalidate(key).await;
        }
    }

    /// Forget everything.
    pub fn clear(&self) {
        {
            let mut generations = self
                .inner
                .generations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            for generation in generations.values_mut() {
                *generation += 1;
            }
        }
        self.inner.entries.invalidate_all();
        debug!("Query cache cleared");
    }

    fn generation(&self, key: &QueryKey) -> u64 {
        self.inner
            .generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    async fn store(&self, key: QueryKey, data: QueryData, stale: bool, fetched_at: Instant) {
        let entry = Entry {
            data,
            stale,
            fetched_at,
        };
        self.inner.entries.insert(key, entry).await;
    }
}

/// One [`QueryCache`] per signed-in user.
///
/// Data fetched with one admin's token is never served to another admin.
/// A user's cache is created on first use and lives until it is evicted or
/// sits unused for the entry TTL.
#[derive(Clone)]
pub struct UserCaches {
    caches: moka::sync::Cache<UserId, QueryCache>,
    config: CacheConfig,
}

impl UserCaches {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let caches = moka::sync::Cache::builder()
            .max_capacity(config.max_users)
            .time_to_idle(config.ttl)
            .build();
        Self { caches, config }
    }

    /// The cache of `user`, created empty if needed.
    #[must_use]
    pub fn for_user(&self, user: &UserId) -> QueryCache {
        let config = self.config;
        self.caches
            .get_with(user.clone(), move || QueryCache::new(config))
    }

    /// Drop everything cached for `user`.
    ///
    /// Fetches still in flight for that user are discarded on completion.
    pub fn evict(&self, user: &UserId) {
        if let Some(cache) = self.caches.remove(user) {
            cache.clear();
        }
        debug!(user_id = %user, "User query cache dropped");
    }
}
