//! The host document: display slots addressable by id, plus a readiness
//! event.
//!
//! A [`Document`] stands in for the page that hosts the greeting. Slots are
//! registered under a stable identifier and looked up by the updater on
//! every invocation. The readiness event fires once, after the host has
//! registered its slots; schedulers wait on it before the first update.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use greeting_types::{MutationKind, SlotMutation, SlotSnapshot, SlotStyle};
use tokio::sync::watch;
use tracing::{debug, info};

/// Errors that can occur when querying the document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No slot is registered under the requested id.
    #[error("display slot `{slot_id}` not found")]
    MissingElement {
        /// The id that was looked up.
        slot_id: String,
    },
}

/// A UI element that renders greeting text.
///
/// Implementations must apply mutations in the order they are received.
/// Concurrent callers resolve last-write-wins.
pub trait DisplaySlot: Send + Sync {
    /// Stable identifier the slot is registered under.
    fn id(&self) -> &str;

    /// Apply a style or text change.
    fn apply(&self, mutation: SlotMutation);

    /// Current state of the slot.
    fn snapshot(&self) -> SlotSnapshot;
}

/// Registry of display slots with a one-shot readiness signal.
pub struct Document {
    slots: RwLock<BTreeMap<String, Arc<dyn DisplaySlot>>>,
    ready: watch::Sender<bool>,
}

impl Document {
    /// Create an empty, not-yet-ready document.
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            slots: RwLock::new(BTreeMap::new()),
            ready,
        }
    }

    /// Register a slot under its own id.
    ///
    /// Returns the slot previously registered under that id, if any.
    pub fn register(&self, slot: Arc<dyn DisplaySlot>) -> Option<Arc<dyn DisplaySlot>> {
        let id = slot.id().to_owned();
        debug!(slot_id = %id, "Registering display slot");
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, slot)
    }

    /// Remove a slot, returning it if it was registered.
    pub fn remove(&self, slot_id: &str) -> Option<Arc<dyn DisplaySlot>> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(slot_id)
    }

    /// Look up a slot by id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::MissingElement`] if nothing is registered
    /// under `slot_id`.
    pub fn get_element_by_id(&self, slot_id: &str) -> Result<Arc<dyn DisplaySlot>, DocumentError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(slot_id)
            .cloned()
            .ok_or_else(|| DocumentError::MissingElement {
                slot_id: slot_id.to_owned(),
            })
    }

    /// Ids of all registered slots, in sorted order.
    pub fn slot_ids(&self) -> Vec<String> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Fire the readiness event. Later calls are no-ops.
    pub fn mark_ready(&self) {
        let fired = self.ready.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if fired {
            info!(slots = ?self.slot_ids(), "Document ready");
        }
    }

    /// Whether the readiness event has fired.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until the readiness event fires. Returns immediately if it
    /// already has.
    pub async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`, so this cannot observe a
        // closed channel.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("slots", &self.slot_ids())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// In-memory display slot that keeps every mutation it has received.
#[derive(Debug)]
pub struct MemorySlot {
    id: String,
    initial_style: SlotStyle,
    inner: Mutex<MemorySlotState>,
}

#[derive(Debug)]
struct MemorySlotState {
    snapshot: SlotSnapshot,
    history: Vec<SlotMutation>,
}

impl MemorySlot {
    /// Create an empty, visible slot.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_text(id, "")
    }

    /// Create a visible slot with some initial text already in place.
    pub fn with_text(id: impl Into<String>, text: &str) -> Self {
        let id = id.into();
        let mut snapshot = SlotSnapshot::new(id.clone());
        text.clone_into(&mut snapshot.text);
        Self {
            initial_style: snapshot.style,
            id,
            inner: Mutex::new(MemorySlotState {
                snapshot,
                history: Vec::new(),
            }),
        }
    }

    /// All mutations applied so far, oldest first.
    pub fn history(&self) -> Vec<SlotMutation> {
        self.lock().history.clone()
    }

    /// Opacity before any mutation, followed by the opacity after each
    /// mutation.
    pub fn opacity_trace(&self) -> Vec<u8> {
        let state = self.lock();
        let mut trace = Vec::with_capacity(state.history.len().saturating_add(1));
        trace.push(self.initial_style.opacity);
        trace.extend(state.history.iter().map(|mutation| match &mutation.kind {
            MutationKind::Hide { style } | MutationKind::Reveal { style, .. } => style.opacity,
        }));
        trace
    }

    fn lock(&self) -> MutexGuard<'_, MemorySlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySlot for MemorySlot {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, mutation: SlotMutation) {
        let mut state = self.lock();
        state.snapshot.apply(&mutation, Utc::now());
        state.history.push(mutation);
    }

    fn snapshot(&self) -> SlotSnapshot {
        self.lock().snapshot.clone()
    }
}
