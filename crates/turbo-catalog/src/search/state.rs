//! Draft/applied filter state.
//!
//! Edits go to a draft; the draft is committed to the applied filters after
//! a quiet period with no further edits, or immediately via
//! [`FilterState::apply_now`]. Time is passed in by the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::{FilterStateConfig, RECOMMENDED_DEBOUNCE_MS};
use crate::search::FilterSet;

/// Where the draft is relative to the applied filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    /// Draft equals applied.
    Idle,
    /// Draft differs; the quiet window started at `since`.
    Pending { since: Instant },
    /// Applied filters changed; waiting for results of `generation`.
    Committing { generation: u64 },
}

/// Applied filters tagged with the commit that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSnapshot {
    pub generation: u64,
    pub filters: FilterSet,
}

/// Draft and applied filters for one storefront listing.
#[derive(Debug, Clone)]
pub struct FilterState {
    draft: FilterSet,
    applied: FilterSet,
    generation: u64,
    phase: CommitPhase,
    debounce: Duration,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(&FilterStateConfig::default())
    }
}

impl FilterState {
    pub fn new(config: &FilterStateConfig) -> Self {
        Self::with_debounce(config.debounce())
    }

    pub fn with_debounce(debounce: Duration) -> Self {
        let millis = debounce.as_millis() as u64;
        if !RECOMMENDED_DEBOUNCE_MS.contains(&millis) {
            warn!(debounce_ms = millis, "debounce window outside the recommended range");
        }
        Self {
            draft: FilterSet::default(),
            applied: FilterSet::default(),
            generation: 0,
            phase: CommitPhase::Idle,
            debounce,
        }
    }

    /// Start from filters that are already applied (e.g. parsed from a URL).
    pub fn with_applied(mut self, filters: FilterSet) -> Self {
        self.draft = filters.clone();
        self.applied = filters;
        self
    }

    pub fn draft(&self) -> &FilterSet {
        &self.draft
    }

    pub fn applied(&self) -> &FilterSet {
        &self.applied
    }

    pub fn phase(&self) -> CommitPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Mutate the draft and restart the quiet window.
    ///
    /// An edit that brings the draft back to the applied filters cancels a
    /// pending commit.
    pub fn edit(&mut self, now: Instant, f: impl FnOnce(&mut FilterSet)) {
        f(&mut self.draft);
        if self.draft != self.applied {
            self.phase = CommitPhase::Pending { since: now };
        } else if matches!(self.phase, CommitPhase::Pending { .. }) {
            self.phase = CommitPhase::Idle;
        }
    }

    /// Clear every draft constraint.
    pub fn reset(&mut self, now: Instant) {
        self.edit(now, |draft| *draft = FilterSet::default());
    }

    /// Throw the draft away and return to the applied filters.
    pub fn discard_draft(&mut self) {
        self.draft = self.applied.clone();
        if matches!(self.phase, CommitPhase::Pending { .. }) {
            self.phase = CommitPhase::Idle;
        }
    }

    /// When the pending draft will be committed, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            CommitPhase::Pending { since } => Some(since + self.debounce),
            _ => None,
        }
    }

    /// Commit the draft if the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<AppliedSnapshot> {
        match self.phase {
            CommitPhase::Pending { since } if now.saturating_duration_since(since) >= self.debounce => {
                Some(self.commit())
            }
            _ => None,
        }
    }

    /// Commit the draft without waiting. `None` when nothing changed.
    pub fn apply_now(&mut self) -> Option<AppliedSnapshot> {
        if self.draft == self.applied {
            return None;
        }
        Some(self.commit())
    }

    /// Report that results for `generation` arrived.
    ///
    /// Returns false for a superseded generation; its results should be
    /// dropped.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(generation, latest = self.generation, "dropping stale results");
            return false;
        }
        if self.phase == (CommitPhase::Committing { generation }) {
            self.phase = CommitPhase::Idle;
        }
        true
    }

    /// True while the draft is waiting out the quiet window.
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, CommitPhase::Pending { .. })
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.phase, CommitPhase::Committing { .. })
    }

    /// Pending or committing; drives a loading indicator.
    pub fn is_updating(&self) -> bool {
        self.phase != CommitPhase::Idle
    }

    fn commit(&mut self) -> AppliedSnapshot {
        self.applied = self.draft.clone();
        self.generation += 1;
        self.phase = CommitPhase::Committing {
            generation: self.generation,
        };
        debug!(generation = self.generation, "applied filters");
        AppliedSnapshot {
            generation: self.generation,
            filters: self.applied.clone(),
        }
    }
}

/// Last-applied-wins guard for concurrent facet responses.
///
/// Shared between the code that issues requests and the code that receives
/// responses; a response is accepted only if no newer generation has been
/// issued.
#[derive(Debug, Default)]
pub struct ResponseGate {
    latest: AtomicU64,
}

impl ResponseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `generation` was issued.
    pub fn advance_to(&self, generation: u64) {
        self.latest.fetch_max(generation, Ordering::AcqRel);
    }

    /// Issue a request for a snapshot, tagging the value that carries it.
    pub fn issue<T>(&self, snapshot: &AppliedSnapshot, value: T) -> Tagged<T> {
        self.advance_to(snapshot.generation);
        Tagged {
            generation: snapshot.generation,
            value,
        }
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    pub fn accept(&self, generation: u64) -> bool {
        generation >= self.latest()
    }

    /// Unwrap a response if it belongs to the latest generation.
    pub fn admit<T>(&self, tagged: Tagged<T>) -> Option<T> {
        if self.accept(tagged.generation) {
            Some(tagged.value)
        } else {
            None
        }
    }
}

/// A value tagged with the generation of the filters it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    pub generation: u64,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(generation: u64, value: T) -> Self {
        Self { generation, value }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged {
            generation: self.generation,
            value: f(self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_commit_after_quiet_window() {
        let start = Instant::now();
        let mut state = FilterState::default();
        state.edit(start, |f| {
            f.sizes.insert("M".into());
        });
        assert!(state.is_pending());
        assert_eq!(state.deadline(), Some(start + ms(800)));

        assert!(state.poll(start + ms(799)).is_none());
        let snapshot = state.poll(start + ms(800)).unwrap();
        assert_eq!(snapshot.generation, 1);
        assert!(snapshot.filters.sizes.contains("M"));
        assert!(state.is_committing());
        assert!(state.complete(1));
        assert_eq!(state.phase(), CommitPhase::Idle);
    }

    #[test]
    fn test_further_edits_restart_window() {
        let start = Instant::now();
        let mut state = FilterState::default();
        state.edit(start, |f| f.in_stock = true);
        state.edit(start + ms(500), |f| f.on_sale = true);
        assert!(state.poll(start + ms(900)).is_none());
        let snapshot = state.poll(start + ms(1300)).unwrap();
        assert!(snapshot.filters.in_stock && snapshot.filters.on_sale);
    }

    #[test]
    fn test_edit_back_to_applied_cancels() {
        let start = Instant::now();
        let mut state = FilterState::default();
        state.edit(start, |f| f.in_stock = true);
        state.edit(start + ms(100), |f| f.in_stock = false);
        assert_eq!(state.phase(), CommitPhase::Idle);
        assert!(state.poll(start + ms(2000)).is_none());
        assert!(state.apply_now().is_none());
    }

    #[test]
    fn test_apply_now_and_discard() {
        let start = Instant::now();
        let mut state = FilterState::default();
        state.edit(start, |f| f.on_sale = true);
        let snapshot = state.apply_now().unwrap();
        assert!(state.applied().on_sale);
        assert_eq!(snapshot.generation, state.generation());

        state.edit(start, |f| f.on_sale = false);
        state.discard_draft();
        assert!(state.draft().on_sale);
        assert!(!state.is_pending());
    }

    #[test]
    fn test_stale_completion_is_rejected() {
        let start = Instant::now();
        let mut state = FilterState::with_debounce(ms(750));
        state.edit(start, |f| f.in_stock = true);
        let first = state.apply_now().unwrap();
        state.edit(start, |f| f.on_sale = true);
        let second = state.apply_now().unwrap();
        assert!(!state.complete(first.generation));
        assert!(state.is_committing());
        assert!(state.complete(second.generation));
    }

    #[test]
    fn test_response_gate_last_applied_wins() {
        let gate = ResponseGate::new();
        let first = AppliedSnapshot {
            generation: 1,
            filters: FilterSet::new(),
        };
        let second = AppliedSnapshot {
            generation: 2,
            filters: FilterSet::new().in_stock_only(),
        };
        let slow = gate.issue(&first, "first");
        let fast = gate.issue(&second, "second");

        assert_eq!(gate.admit(fast), Some("second"));
        assert_eq!(gate.admit(slow), None);
        assert_eq!(gate.latest(), 2);
        gate.advance_to(1);
        assert_eq!(gate.latest(), 2);
    }
}
