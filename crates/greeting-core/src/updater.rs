//! The display updater: a two-phase fade that swaps the greeting text.
//!
//! Each invocation:
//!
//! 1. reads the hour once and picks the greeting,
//! 2. looks up the display slot (failing with a missing-element error if it
//!    is not registered, without touching anything),
//! 3. hides the slot immediately (opacity 0, shifted down),
//! 4. after the transition delay, swaps the text and shows the slot again.
//!
//! The hour from step 1 is used for the reveal even if the clock crosses a
//! bucket boundary while the delay elapses.

use std::sync::Arc;
use std::time::Duration;

use greeting_types::{GreetingBucket, SlotMutation, SlotStyle, TransitionId};
use tracing::{debug, warn};

use crate::clock::{Hour, HourSource};
use crate::config::WidgetConfig;
use crate::document::{Document, DocumentError};
use crate::scheduler::{self, SchedulerError, TaskExit, TaskHandle};
use crate::selector::GreetingTable;

/// Errors that can occur during an update.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The display slot is not registered in the document.
    #[error("greeting update failed: {source}")]
    MissingElement {
        /// The underlying lookup error.
        #[from]
        source: DocumentError,
    },

    /// The delayed reveal task did not complete.
    #[error("greeting reveal failed: {source}")]
    Scheduler {
        /// The underlying scheduler error.
        #[from]
        source: SchedulerError,
    },

    /// The reveal was cancelled before it was applied.
    #[error("greeting reveal for transition {transition} was cancelled")]
    Cancelled {
        /// Transition whose reveal never ran.
        transition: TransitionId,
    },
}

/// Timing and offset of the fade transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionSettings {
    /// Time between hiding the slot and revealing the new text.
    pub delay: Duration,
    /// Downward offset, in pixels, while hidden.
    pub hidden_offset_px: i32,
}

impl TransitionSettings {
    /// The stock 300 ms delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

    /// The stock 10 px offset.
    pub const DEFAULT_HIDDEN_OFFSET_PX: i32 = 10;
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            hidden_offset_px: Self::DEFAULT_HIDDEN_OFFSET_PX,
        }
    }
}

/// What one invocation decided to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionReport {
    /// Id shared by the hide and reveal mutations.
    pub transition: TransitionId,
    /// Slot that was updated.
    pub slot_id: String,
    /// Hour read at the start of the invocation.
    pub hour: Hour,
    /// Bucket selected for that hour.
    pub bucket: GreetingBucket,
    /// Text that the reveal writes.
    pub text: String,
}

/// A hidden slot waiting for its reveal.
#[derive(Debug)]
pub struct PendingReveal {
    report: TransitionReport,
    handle: TaskHandle,
}

impl PendingReveal {
    /// What the reveal will show.
    pub const fn report(&self) -> &TransitionReport {
        &self.report
    }

    /// Cancel the reveal. The slot stays hidden with its old text.
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Wait for the reveal to be applied.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Cancelled`] if the reveal was cancelled before
    /// it ran, or [`UpdateError::Scheduler`] if the reveal task failed.
    pub async fn wait(self) -> Result<TransitionReport, UpdateError> {
        match self.handle.join().await? {
            TaskExit::Completed => Ok(self.report),
            TaskExit::Cancelled => Err(UpdateError::Cancelled {
                transition: self.report.transition,
            }),
        }
    }

    /// Let the reveal run on its own and return the report.
    pub fn detach(self) -> TransitionReport {
        self.report
    }
}

/// Writes the time-appropriate greeting into a display slot.
///
/// Constructed once and shared (behind an [`Arc`]) with the scheduler.
pub struct GreetingUpdater {
    document: Arc<Document>,
    slot_id: String,
    clock: Arc<dyn HourSource>,
    greetings: GreetingTable,
    settings: TransitionSettings,
}

impl GreetingUpdater {
    /// Create an updater with the built-in greetings and stock timing.
    pub fn new(document: Arc<Document>, slot_id: impl Into<String>, clock: Arc<dyn HourSource>) -> Self {
        Self {
            document,
            slot_id: slot_id.into(),
            clock,
            greetings: GreetingTable::default(),
            settings: TransitionSettings::default(),
        }
    }

    /// Create an updater from the widget configuration.
    pub fn from_config(document: Arc<Document>, clock: Arc<dyn HourSource>, config: &WidgetConfig) -> Self {
        Self::new(document, config.widget.slot_id.clone(), clock)
            .with_greetings(config.greetings.clone())
            .with_settings(config.widget.transition())
    }

    /// Replace the greeting texts.
    #[must_use]
    pub fn with_greetings(mut self, greetings: GreetingTable) -> Self {
        self.greetings = greetings;
        self
    }

    /// Replace the transition timing.
    #[must_use]
    pub const fn with_settings(mut self, settings: TransitionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Id of the slot this updater writes to.
    pub fn slot_id(&self) -> &str {
        &self.slot_id
    }

    /// Hide the slot now and schedule the reveal.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MissingElement`] if the slot is not
    /// registered. No mutation is applied in that case.
    pub fn trigger(&self) -> Result<PendingReveal, UpdateError> {
        let hour = self.clock.current_hour();
        let (bucket, text) = self.greetings.select(hour);
        let slot = self.document.get_element_by_id(&self.slot_id).inspect_err(|e| {
            warn!(slot_id = %self.slot_id, error = %e, "Display slot lookup failed");
        })?;

        let transition = TransitionId::new();
        slot.apply(SlotMutation::hide(
            transition,
            SlotStyle::hidden(self.settings.hidden_offset_px),
        ));
        debug!(
            %transition,
            slot_id = %self.slot_id,
            hour = hour.get(),
            %bucket,
            "Greeting slot hidden"
        );

        let report = TransitionReport {
            transition,
            slot_id: self.slot_id.clone(),
            hour,
            bucket,
            text: text.to_owned(),
        };

        let reveal = SlotMutation::reveal(transition, report.text.clone(), SlotStyle::VISIBLE);
        let handle = scheduler::spawn_after("greeting-reveal", self.settings.delay, async move {
            slot.apply(reveal);
            debug!(%transition, "Greeting slot revealed");
        });

        Ok(PendingReveal { report, handle })
    }

    /// Run a full transition and wait for the reveal.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MissingElement`] if the slot is not
    /// registered, or [`UpdateError::Scheduler`] if the reveal task fails.
    pub async fn update(&self) -> Result<TransitionReport, UpdateError> {
        self.trigger()?.wait().await
    }
}

impl core::fmt::Debug for GreetingUpdater {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GreetingUpdater")
            .field("slot_id", &self.slot_id)
            .field("greetings", &self.greetings)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use greeting_types::MutationKind;

    use super::*;
    use crate::clock::FixedClock;
    use crate::document::{DisplaySlot, MemorySlot};
    use crate::selector::{AFTERNOON_GREETING, EVENING_GREETING, MORNING_GREETING};

    fn hour(value: u32) -> Hour {
        Hour::new(value).unwrap()
    }

    struct Fixture {
        slot: Arc<MemorySlot>,
        clock: Arc<FixedClock>,
        updater: GreetingUpdater,
    }

    fn fixture(at: u32) -> Fixture {
        let document = Arc::new(Document::new());
        let slot = Arc::new(MemorySlot::new("greeting"));
        document.register(Arc::clone(&slot) as Arc<dyn DisplaySlot>);
        document.mark_ready();
        let clock = Arc::new(FixedClock::new(hour(at)));
        let updater = GreetingUpdater::new(document, "greeting", Arc::clone(&clock) as Arc<dyn HourSource>);
        Fixture { slot, clock, updater }
    }

    #[tokio::test(start_paused = true)]
    async fn morning_update_fades_out_and_in() {
        let fx = fixture(9);
        let report = fx.updater.update().await.unwrap();

        assert_eq!(report.bucket, GreetingBucket::Morning);
        assert_eq!(report.hour.get(), 9);
        assert_eq!(fx.slot.opacity_trace(), vec![1, 0, 1]);
        let snap = fx.slot.snapshot();
        assert_eq!(snap.text, MORNING_GREETING);
        assert_eq!(snap.style, SlotStyle::VISIBLE);
        assert_eq!(snap.last_transition, Some(report.transition));
    }

    #[tokio::test(start_paused = true)]
    async fn afternoon_update_shows_afternoon_text() {
        let fx = fixture(15);
        fx.updater.update().await.unwrap();
        assert_eq!(fx.slot.snapshot().text, AFTERNOON_GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn evening_update_shows_evening_text() {
        let fx = fixture(20);
        fx.updater.update().await.unwrap();
        assert_eq!(fx.slot.snapshot().text, EVENING_GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_slot_fails_without_mutation() {
        let document = Arc::new(Document::new());
        let bystander = Arc::new(MemorySlot::new("other"));
        document.register(Arc::clone(&bystander) as Arc<dyn DisplaySlot>);
        let clock: Arc<dyn HourSource> = Arc::new(FixedClock::new(hour(9)));
        let updater = GreetingUpdater::new(document, "greeting", clock);

        let err = updater.update().await.unwrap_err();
        assert!(matches!(
            err,
            UpdateError::MissingElement {
                source: DocumentError::MissingElement { ref slot_id }
            } if slot_id == "greeting"
        ));
        assert!(bystander.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slot_is_hidden_during_the_delay() {
        let fx = fixture(9);
        let pending = fx.updater.trigger().unwrap();

        let snap = fx.slot.snapshot();
        assert_eq!(snap.style, SlotStyle::hidden(10));
        assert!(snap.text.is_empty());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(!fx.slot.snapshot().style.is_visible());

        let report = pending.wait().await.unwrap();
        assert_eq!(fx.slot.snapshot().text, report.text);
        assert!(fx.slot.snapshot().style.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_updates_with_same_hour_are_idempotent() {
        let fx = fixture(15);
        let first = fx.updater.update().await.unwrap();
        let after_first = fx.slot.snapshot().text;
        let second = fx.updater.update().await.unwrap();
        let after_second = fx.slot.snapshot().text;

        assert_eq!(after_first, after_second);
        assert_eq!(first.text, second.text);
        assert_ne!(first.transition, second.transition);
        assert_eq!(fx.slot.opacity_trace(), vec![1, 0, 1, 0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn hour_is_captured_once_per_invocation() {
        let fx = fixture(17);
        let pending = fx.updater.trigger().unwrap();
        fx.clock.set(hour(18));

        let report = pending.wait().await.unwrap();
        assert_eq!(report.bucket, GreetingBucket::Afternoon);
        assert_eq!(fx.slot.snapshot().text, AFTERNOON_GREETING);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reveal_leaves_slot_hidden() {
        let fx = fixture(9);
        let pending = fx.updater.trigger().unwrap();
        let transition = pending.report().transition;
        pending.cancel();
        let err = pending.wait().await.unwrap_err();
        assert!(matches!(err, UpdateError::Cancelled { transition: t } if t == transition));

        let snap = fx.slot.snapshot();
        assert!(!snap.style.is_visible());
        assert!(snap.text.is_empty());
        assert_eq!(fx.slot.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detached_reveal_still_applies() {
        let fx = fixture(20);
        let report = fx.updater.trigger().unwrap().detach();
        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(fx.slot.snapshot().text, report.text);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_greetings_and_timing_are_used() {
        let config = WidgetConfig::parse(
            "widget:\n  transition_delay_ms: 50\n  hidden_offset_px: 4\ngreetings:\n  evening: \"Night shift!\"\n",
        )
        .unwrap();
        let document = Arc::new(Document::new());
        let slot = Arc::new(MemorySlot::new("greeting"));
        document.register(Arc::clone(&slot) as Arc<dyn DisplaySlot>);
        let clock: Arc<dyn HourSource> = Arc::new(FixedClock::new(hour(22)));
        let updater = GreetingUpdater::from_config(document, clock, &config);

        let pending = updater.trigger().unwrap();
        assert_eq!(slot.snapshot().style, SlotStyle::hidden(4));
        tokio::time::sleep(Duration::from_millis(51)).await;
        assert_eq!(slot.snapshot().text, "Night shift!");
        pending.wait().await.unwrap();

        let kinds: Vec<bool> = slot
            .history()
            .iter()
            .map(|m| matches!(m.kind, MutationKind::Reveal { .. }))
            .collect();
        assert_eq!(kinds, vec![false, true]);
    }
}
