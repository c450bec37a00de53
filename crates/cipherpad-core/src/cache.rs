//! Time-boxed secret cache.
//!
//! [`SecretCache`] holds at most one [`KeyMaterial`] together with an
//! absolute expiry deadline. The deadline is fixed when the key is stored;
//! reading the key does not extend it. One mutex guards the entry, the
//! expiry task handle, and a generation counter. The expiry task runs on
//! the tokio runtime and only clears the entry if no newer `set`/`clear`
//! has happened since it was armed.
//!
//! The cache is meant to be built once by the composition root and shared
//! as `Arc<SecretCache>` between every consumer in the process.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::crypto::KeyMaterial;
use crate::error::{CipherpadError, Result};

/// A user-selectable unlock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPreset {
    /// Short name accepted on the command line and stored in config.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    pub ttl: Duration,
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

const PRESETS: &[TtlPreset] = &[
    TtlPreset {
        name: "immediately",
        description: "Ask every time",
        ttl: Duration::ZERO,
    },
    TtlPreset {
        name: "1m",
        description: "1 minute",
        ttl: Duration::from_secs(MINUTE),
    },
    TtlPreset {
        name: "5m",
        description: "5 minutes",
        ttl: Duration::from_secs(5 * MINUTE),
    },
    TtlPreset {
        name: "1h",
        description: "1 hour",
        ttl: Duration::from_secs(HOUR),
    },
    TtlPreset {
        name: "6h",
        description: "6 hours",
        ttl: Duration::from_secs(6 * HOUR),
    },
    TtlPreset {
        name: "1d",
        description: "1 day",
        ttl: Duration::from_secs(DAY),
    },
    TtlPreset {
        name: "1w",
        description: "1 week",
        ttl: Duration::from_secs(7 * DAY),
    },
    TtlPreset {
        name: "never",
        description: "Never (10 years)",
        ttl: Duration::from_secs(10 * 365 * DAY),
    },
];

impl TtlPreset {
    /// All presets, shortest first.
    pub fn all() -> &'static [TtlPreset] {
        PRESETS
    }

    pub fn from_name(name: &str) -> Option<&'static TtlPreset> {
        let name = name.trim();
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// The longest preset that does not exceed `ttl`.
    ///
    /// Used when restoring a remembered timeout that may not match a preset
    /// exactly.
    pub fn snap(ttl: Duration) -> &'static TtlPreset {
        PRESETS
            .iter()
            .rev()
            .find(|p| p.ttl <= ttl)
            .unwrap_or(&PRESETS[0])
    }

    /// The shortest preset that lasts at least `ttl`, or the longest one.
    ///
    /// Used for durations typed by the user, who should never get a
    /// shorter window than they asked for.
    pub fn snap_up(ttl: Duration) -> &'static TtlPreset {
        PRESETS
            .iter()
            .find(|p| p.ttl >= ttl)
            .unwrap_or(&PRESETS[PRESETS.len() - 1])
    }
}

/// Observable state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    /// `expires_in` is `None` when the deadline is too far away to represent.
    Active { expires_in: Option<Duration> },
}

struct CachedSecret {
    key: KeyMaterial,
    expires_at: Option<Instant>,
}

impl CachedSecret {
    fn is_live(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now < deadline,
            None => true,
        }
    }
}

#[derive(Default)]
struct CacheState {
    entry: Option<CachedSecret>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl CacheState {
    /// Drop the entry and cancel any armed timer. Bumps the generation so a
    /// timer that already woke up cannot act on a newer entry.
    fn reset(&mut self) {
        self.entry = None;
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Process-wide holder of the unlocked key.
pub struct SecretCache {
    state: Mutex<CacheState>,
    runtime: Handle,
    this: Weak<SecretCache>,
}

impl SecretCache {
    /// Create a cache bound to the current tokio runtime.
    pub fn new() -> Result<Arc<Self>> {
        let handle = Handle::try_current()
            .map_err(|e| CipherpadError::Other(format!("No async runtime available: {}", e)))?;
        Ok(Self::with_runtime(handle))
    }

    /// Create a cache whose expiry timers run on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(CacheState::default()),
            runtime,
            this: this.clone(),
        })
    }

    /// Store `key` for `ttl`, replacing any previous entry and its timer.
    ///
    /// A zero `ttl` stores a key that is already expired.
    pub fn set(&self, key: KeyMaterial, ttl: Duration) {
        let mut state = self.lock();
        state.reset();

        let now = Instant::now();
        let expires_at = now.checked_add(ttl);
        let generation = state.generation;

        if let Some(deadline) = expires_at {
            let this = self.this.clone();
            state.timer = Some(self.runtime.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if let Some(cache) = this.upgrade() {
                    cache.expire(generation);
                }
            }));
        }

        tracing::debug!(
            label = %key.label(),
            ttl_ms = ttl.as_millis() as u64,
            "secret cache armed"
        );
        state.entry = Some(CachedSecret { key, expires_at });
    }

    /// The cached key, if one is stored and its deadline has not passed.
    pub fn get(&self) -> Option<KeyMaterial> {
        let mut state = self.lock();
        let now = Instant::now();
        match state.entry.as_ref() {
            Some(entry) if entry.is_live(now) => Some(entry.key.clone()),
            Some(_) => {
                tracing::debug!("secret cache expired on access");
                state.reset();
                None
            }
            None => None,
        }
    }

    /// Forget the key immediately and cancel the expiry timer.
    pub fn clear(&self) {
        let mut state = self.lock();
        if state.entry.is_some() {
            tracing::debug!("secret cache cleared");
        }
        state.reset();
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.lock();
        let now = Instant::now();
        match state.entry.as_ref() {
            Some(entry) if entry.is_live(now) => CacheStatus::Active {
                expires_in: entry.expires_at.map(|deadline| deadline - now),
            },
            _ => CacheStatus::Empty,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.status(), CacheStatus::Active { .. })
    }

    fn expire(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        tracing::debug!("secret cache expired");
        state.entry = None;
        state.timer = None;
        state.generation = state.generation.wrapping_add(1);
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A panic while holding the lock cannot leave a half-written entry
        // behind, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SecretCache {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.reset();
    }
}

impl std::fmt::Debug for SecretCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCache")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Label;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::from_bytes(Label::default(), vec![byte; 64])
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_key_before_deadline() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(), Some(key(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_expires_immediately() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::ZERO);

        assert_eq!(cache.get(), None);
        assert_eq!(cache.status(), CacheStatus::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_previous_key_and_timer() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::from_millis(100));
        cache.set(key(2), Duration::from_secs(10));

        // The first timer would have fired here; it must not clear key 2.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get(), Some(key(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_forgets_key() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::from_secs(60));
        cache.clear();

        assert_eq!(cache.get(), None);
        assert!(!cache.is_unlocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_clears_entry_without_access() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.lock().entry.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_never_expires() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::MAX);

        tokio::time::advance(Duration::from_secs(365 * DAY)).await;
        assert_eq!(cache.get(), Some(key(1)));
        assert_eq!(cache.status(), CacheStatus::Active { expires_in: None });
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_remaining_time() {
        let cache = SecretCache::new().unwrap();
        cache.set(key(1), Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(
            cache.status(),
            CacheStatus::Active {
                expires_in: Some(Duration::from_secs(40))
            }
        );
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(SecretCache::new().is_err());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(TtlPreset::from_name("1H").unwrap().ttl, Duration::from_secs(HOUR));
        assert!(TtlPreset::from_name("2h").is_none());
        assert_eq!(TtlPreset::all().len(), 8);
    }

    #[test]
    fn test_snap_picks_longest_preset_not_exceeding() {
        assert_eq!(TtlPreset::snap(Duration::ZERO).name, "immediately");
        assert_eq!(TtlPreset::snap(Duration::from_secs(59)).name, "immediately");
        assert_eq!(TtlPreset::snap(Duration::from_secs(MINUTE)).name, "1m");
        assert_eq!(TtlPreset::snap(Duration::from_secs(2 * HOUR)).name, "1h");
        assert_eq!(TtlPreset::snap(Duration::MAX).name, "never");
    }

    #[test]
    fn test_snap_up_picks_shortest_preset_covering() {
        assert_eq!(TtlPreset::snap_up(Duration::ZERO).name, "immediately");
        assert_eq!(TtlPreset::snap_up(Duration::from_secs(30)).name, "1m");
        assert_eq!(TtlPreset::snap_up(Duration::from_secs(MINUTE)).name, "1m");
        assert_eq!(TtlPreset::snap_up(Duration::from_secs(2 * HOUR)).name, "6h");
        assert_eq!(TtlPreset::snap_up(Duration::MAX).name, "never");
    }
}
