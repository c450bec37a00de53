//! Debounced persistence.
//!
//! [`NoteController`] sits between an editing surface and the blob store.
//! Every edit restarts a quiet-period timer; when the timer fires (or the
//! host asks for a flush) the latest content is encrypted with the cached
//! key and written out. The last edit always wins, identical content is
//! never written twice in a row, and only one write is in flight at a time.
//!
//! Nothing is written while the secret cache is empty. Edits made in that
//! state are held in memory and scheduled again once a key is unlocked.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use zeroize::Zeroizing;

use crate::cache::SecretCache;
use crate::crypto::{Engine, KeyMaterial};
use crate::error::{CipherpadError, Result};
use crate::storage::BlobStore;

/// Default delay between the last edit and the write it triggers.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(5);

const EVENT_CAPACITY: usize = 16;

/// Result of a persist attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// A new blob was written.
    Persisted,
    /// Content matches what was last written; nothing to do.
    Unchanged,
    /// No key is cached; the edit is held until unlock.
    Locked,
}

/// Outcomes of timer-driven persists, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEvent {
    Persisted,
    Locked,
    Failed(String),
}

struct EditState {
    latest: Zeroizing<String>,
    persisted: Option<Zeroizing<String>>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl EditState {
    fn is_saved(&self) -> bool {
        self.persisted.as_ref().map(|p| p.as_str()) == Some(self.latest.as_str())
    }

    /// Edits that still need writing. A controller that was never loaded or
    /// edited holds none.
    fn holds_edits(&self) -> bool {
        !self.is_saved() && (self.persisted.is_some() || !self.latest.is_empty())
    }

    fn cancel_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

struct Inner<S> {
    store: S,
    engine: Engine,
    cache: Arc<SecretCache>,
    quiet_period: Duration,
    runtime: Handle,
    state: Mutex<EditState>,
    write_lock: tokio::sync::Mutex<()>,
    busy: AtomicBool,
    events: broadcast::Sender<PersistEvent>,
}

/// Turns a stream of edits into a sparse stream of encrypted writes.
///
/// Cloning is cheap; all clones drive the same note.
pub struct NoteController<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for NoteController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: BlobStore + 'static> NoteController<S> {
    /// Create a controller on the current tokio runtime.
    pub fn new(
        store: S,
        engine: Engine,
        cache: Arc<SecretCache>,
        quiet_period: Duration,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| CipherpadError::Other(format!("No async runtime available: {}", e)))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                store,
                engine,
                cache,
                quiet_period,
                runtime,
                state: Mutex::new(EditState {
                    latest: Zeroizing::new(String::new()),
                    persisted: None,
                    pending: None,
                    generation: 0,
                }),
                write_lock: tokio::sync::Mutex::new(()),
                busy: AtomicBool::new(false),
                events,
            }),
        })
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn cache(&self) -> &Arc<SecretCache> {
        &self.inner.cache
    }

    /// Check `key` against the stored note and, if it opens it, cache it
    /// for `ttl`.
    ///
    /// With no stored note any key is accepted. Edits held while locked are
    /// scheduled again. On [`CipherpadError::AuthenticationFailure`] the
    /// cache is cleared.
    pub async fn unlock(&self, key: KeyMaterial, ttl: Duration) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let candidate = key.clone();
        let verified = tokio::task::spawn_blocking(move || -> Result<()> {
            if let Some(blob) = inner.store.get()? {
                inner.engine.decrypt(&blob, &candidate)?;
            }
            Ok(())
        })
        .await?;

        match verified {
            Ok(()) => {
                self.inner.cache.set(key, ttl);
                let mut state = self.inner.lock_state();
                if state.holds_edits() && state.pending.is_none() {
                    tracing::debug!("rescheduling edits held while locked");
                    self.inner.arm_timer(&mut state);
                }
                Ok(())
            }
            Err(err) => {
                if err.is_authentication_failure() {
                    self.inner.cache.clear();
                }
                Err(err)
            }
        }
    }

    /// Decrypt the stored note with the cached key.
    ///
    /// Returns `Ok(None)` when no key is cached. The loaded text becomes both
    /// the current and the last persisted content, replacing any unsaved
    /// edits. A wrong key clears the cache before the error is returned.
    pub async fn load(&self) -> Result<Option<Zeroizing<String>>> {
        let _write = self.inner.write_lock.lock().await;
        let Some(key) = self.inner.cache.get() else {
            return Ok(None);
        };

        let inner = Arc::clone(&self.inner);
        let loaded = tokio::task::spawn_blocking(move || -> Result<Zeroizing<String>> {
            match inner.store.get()? {
                Some(blob) => inner.engine.decrypt(&blob, &key),
                None => Ok(Zeroizing::new(String::new())),
            }
        })
        .await?;

        match loaded {
            Ok(content) => {
                let mut state = self.inner.lock_state();
                state.cancel_timer();
                state.latest = content.clone();
                state.persisted = Some(content.clone());
                Ok(Some(content))
            }
            Err(err) => {
                if err.is_authentication_failure() {
                    tracing::debug!("stored note rejected cached key");
                    self.inner.cache.clear();
                }
                Err(err)
            }
        }
    }

    /// Record new content and restart the quiet-period timer.
    pub fn edit(&self, content: impl Into<String>) {
        let mut state = self.inner.lock_state();
        state.latest = Zeroizing::new(content.into());
        state.cancel_timer();
        if state.is_saved() {
            return;
        }

        self.inner.arm_timer(&mut state);
    }

    /// Cancel any pending timer and persist the latest content now.
    pub async fn flush(&self) -> Result<PersistOutcome> {
        self.inner.lock_state().cancel_timer();
        self.inner.persist().await
    }

    /// The most recent content, saved or not.
    pub fn content(&self) -> Zeroizing<String> {
        self.inner.lock_state().latest.clone()
    }

    /// True while an encrypt-and-write is running.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// True if the latest content differs from what was last written.
    pub fn has_pending_changes(&self) -> bool {
        !self.inner.lock_state().is_saved()
    }

    /// Receive the outcomes of timer-driven persists.
    pub fn subscribe(&self) -> broadcast::Receiver<PersistEvent> {
        self.inner.events.subscribe()
    }
}

impl<S: BlobStore + 'static> Inner<S> {
    fn lock_state(&self) -> MutexGuard<'_, EditState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Detach the firing timer from the state if it is still the current
    /// one. Returns false if a newer edit or a flush superseded it.
    fn claim_timer(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.pending = None;
        true
    }

    /// Start a quiet-period timer for the current generation.
    fn arm_timer(self: &Arc<Self>, state: &mut EditState) {
        let generation = state.generation;
        let inner = Arc::clone(self);
        state.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(inner.quiet_period).await;
            if !inner.claim_timer(generation) {
                return;
            }
            let event = match inner.persist().await {
                Ok(PersistOutcome::Persisted) => Some(PersistEvent::Persisted),
                Ok(PersistOutcome::Locked) => Some(PersistEvent::Locked),
                Ok(PersistOutcome::Unchanged) => None,
                Err(err) => {
                    tracing::warn!(error = %err, "background persist failed");
                    Some(PersistEvent::Failed(err.to_string()))
                }
            };
            if let Some(event) = event {
                let _ = inner.events.send(event);
            }
        }));
    }

    async fn persist(self: &Arc<Self>) -> Result<PersistOutcome> {
        let _write = self.write_lock.lock().await;

        let content = {
            let state = self.lock_state();
            if state.is_saved() {
                return Ok(PersistOutcome::Unchanged);
            }
            state.latest.clone()
        };

        let Some(key) = self.cache.get() else {
            tracing::debug!("persist deferred: secret cache is empty");
            return Ok(PersistOutcome::Locked);
        };

        self.busy.store(true, Ordering::SeqCst);
        let inner = Arc::clone(self);
        let snapshot = content.clone();
        let written = tokio::task::spawn_blocking(move || -> Result<()> {
            let blob = inner.engine.encrypt(&snapshot, &key)?;
            inner.store.set(blob.as_bytes())
        })
        .await;
        self.busy.store(false, Ordering::SeqCst);
        written??;

        let mut state = self.lock_state();
        state.persisted = Some(content);
        tracing::debug!("note persisted");
        // An edit made during the write was compared against the old
        // persisted text and may have skipped its timer.
        if !state.is_saved() && state.pending.is_none() {
            tracing::debug!("content changed during write; rescheduling");
            self.arm_timer(&mut state);
        }
        Ok(PersistOutcome::Persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KdfParams, Label, SecretInput};
    use crate::storage::MemoryBlobStore;

    fn engine() -> Engine {
        Engine::new(KdfParams::new(8, 1, 1)).unwrap()
    }

    fn controller() -> NoteController<Arc<MemoryBlobStore>> {
        let cache = SecretCache::new().unwrap();
        NoteController::new(
            Arc::new(MemoryBlobStore::new()),
            engine(),
            cache,
            DEFAULT_QUIET_PERIOD,
        )
        .unwrap()
    }

    fn key(passphrase: &str) -> KeyMaterial {
        engine().derive(SecretInput::passphrase(passphrase)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_matching_persisted_arms_no_timer() {
        let note = controller();
        note.cache().set(key("alpha"), Duration::from_secs(3600));
        note.load().await.unwrap();

        note.edit("");
        assert!(note.inner.lock_state().pending.is_none());
        assert!(!note.has_pending_changes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_cancels_pending_write() {
        let note = controller();
        note.cache().set(key("alpha"), Duration::from_secs(3600));
        note.edit("saved");
        assert_eq!(note.flush().await.unwrap(), PersistOutcome::Persisted);

        note.edit("changed");
        note.edit("saved");
        tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;

        assert_eq!(note.store().write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_persists_latest_and_cancels_timer() {
        let note = controller();
        note.cache().set(key("alpha"), Duration::from_secs(3600));

        note.edit("draft");
        assert_eq!(note.flush().await.unwrap(), PersistOutcome::Persisted);
        assert!(note.inner.lock_state().pending.is_none());

        tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;
        assert_eq!(note.store().write_count(), 1);
        assert!(!note.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_without_stored_note_accepts_key() {
        let note = controller();
        note.unlock(key("alpha"), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(note.cache().get().map(|k| k.label().clone()), Some(Label::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_on_untouched_controller_arms_no_timer() {
        let note = controller();
        note.unlock(key("alpha"), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(note.inner.lock_state().pending.is_none());
        tokio::time::sleep(DEFAULT_QUIET_PERIOD * 2).await;
        assert_eq!(note.store().write_count(), 0);
    }
}
