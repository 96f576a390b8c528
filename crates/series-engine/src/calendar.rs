//! The calendar container: owns the collection and its history.
//!
//! [`Calendar`] is what a UI layer talks to. It exposes the callbacks a
//! view fires (`on_move`, `on_resize`, `on_save`, `on_delete`,
//! `on_change_complete`) and routes them through the editor, deleter and
//! history so that every completed user action records exactly one
//! snapshot.
//!
//! # Gestures
//!
//! Frames of a drag arrive with `is_temporary = true`. A standalone
//! occurrence follows the pointer live; a series member is left untouched
//! until the gesture ends, so the view never flashes a series-wide change
//! before the user picks a scope. The final frame (`is_temporary = false`)
//! either applies the change directly or parks it as a [`PendingChange`]
//! awaiting [`Calendar::resolve_pending`]. [`Calendar::on_change_complete`]
//! then records the snapshot.

use chrono::NaiveDateTime;

use crate::config::EngineConfig;
use crate::deleter::apply_delete;
use crate::drag::{ScopeChoice, TimeChange};
use crate::editor::{apply_edit, EditScope};
use crate::expander::expand_occurrence;
use crate::history::HistoryStack;
use crate::identity::{is_last_in_series, OccurrenceId};
use crate::occurrence::Occurrence;
use crate::slot::SlotRange;

/// A time change on a series member, waiting for the user to pick a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub change: TimeChange,
    /// Whether the occurrence is the last of its series. Callers use this to
    /// phrase the scope prompt.
    pub is_last_in_series: bool,
}

/// What a move or resize callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUpdate {
    /// The occurrence now has the new times.
    Applied,
    /// A series member mid-gesture: nothing changed yet.
    Deferred,
    /// A series member at gesture end: see [`Calendar::pending`].
    ScopeRequired,
    /// Unknown id, invalid range, or nothing to do.
    Ignored,
}

/// Owner of the event collection, the history cursor and gesture state.
#[derive(Debug, Clone)]
pub struct Calendar {
    config: EngineConfig,
    occurrences: Vec<Occurrence>,
    history: HistoryStack<Vec<Occurrence>>,
    pending: Option<PendingChange>,
    dirty: bool,
}

impl Calendar {
    /// An empty calendar.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_occurrences(config, Vec::new())
    }

    /// A calendar showing `occurrences`, recorded as the first snapshot.
    pub fn with_occurrences(config: EngineConfig, occurrences: Vec<Occurrence>) -> Self {
        let history = HistoryStack::with_limit(occurrences.clone(), config.history.limit);
        Self {
            config,
            occurrences,
            history,
            pending: None,
            dirty: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn get(&self, id: &OccurrenceId) -> Option<&Occurrence> {
        self.occurrences.iter().find(|o| o.id() == id)
    }

    pub fn contains(&self, id: &OccurrenceId) -> bool {
        self.get(id).is_some()
    }

    pub fn pending(&self) -> Option<&PendingChange> {
        self.pending.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether `id` is the last occurrence of its series.
    pub fn is_last_in_series(&self, id: &OccurrenceId) -> bool {
        self.get(id)
            .is_some_and(|o| is_last_in_series(&self.occurrences, o))
    }

    fn commit(&mut self, occurrences: Vec<Occurrence>) {
        self.occurrences = occurrences;
        self.history.push(self.occurrences.clone());
        self.dirty = false;
    }

    // ── creation ────────────────────────────────────────────────────────

    /// Add `occurrence`, expanding it first if it carries a repeating rule.
    pub fn add(&mut self, occurrence: Occurrence) {
        let added = expand_occurrence(&occurrence, &self.config.expansion);
        tracing::debug!(id = %occurrence.id(), count = added.len(), "adding occurrences");
        let mut next = self.occurrences.clone();
        next.extend(added);
        self.commit(next);
    }

    /// Create an untitled, non-recurring event covering `range`.
    ///
    /// Returns the new id, or `None` if the range is empty.
    pub fn create_in_slot(&mut self, range: SlotRange) -> Option<OccurrenceId> {
        let occurrence = Occurrence::new(OccurrenceId::generate(), range.start, range.end)
            .inspect_err(|e| tracing::debug!(error = %e, "ignoring empty slot range"))
            .ok()?;
        let id = occurrence.id().clone();
        self.add(occurrence);
        Some(id)
    }

    // ── gesture callbacks ───────────────────────────────────────────────

    /// Body drag frame for `id`.
    pub fn on_move(
        &mut self,
        id: &OccurrenceId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        is_temporary: bool,
        is_modified: bool,
    ) -> TimeUpdate {
        self.on_time_change(id, start, end, is_temporary, is_modified)
    }

    /// Handle drag frame for `id`.
    pub fn on_resize(
        &mut self,
        id: &OccurrenceId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        is_temporary: bool,
        is_modified: bool,
    ) -> TimeUpdate {
        self.on_time_change(id, start, end, is_temporary, is_modified)
    }

    fn on_time_change(
        &mut self,
        id: &OccurrenceId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        is_temporary: bool,
        is_modified: bool,
    ) -> TimeUpdate {
        if end <= start {
            tracing::trace!(id = %id, %start, %end, "ignoring empty time range");
            return TimeUpdate::Ignored;
        }
        let Some(index) = self.occurrences.iter().position(|o| o.id() == id) else {
            tracing::debug!(id = %id, "time change for unknown occurrence");
            return TimeUpdate::Ignored;
        };

        let occurrence = &mut self.occurrences[index];
        if occurrence.belongs_to_series() {
            if is_temporary {
                return TimeUpdate::Deferred;
            }
            if !is_modified || (occurrence.start(), occurrence.end()) == (start, end) {
                return TimeUpdate::Ignored;
            }
            let change = TimeChange {
                id: id.clone(),
                start,
                end,
            };
            let is_last = is_last_in_series(&self.occurrences, &self.occurrences[index]);
            self.pending = Some(PendingChange {
                change,
                is_last_in_series: is_last,
            });
            return TimeUpdate::ScopeRequired;
        }

        if occurrence.set_times(start, end).is_err() {
            return TimeUpdate::Ignored;
        }
        self.dirty = true;
        TimeUpdate::Applied
    }

    /// A gesture finished. Records a snapshot if it changed anything.
    ///
    /// Returns whether a snapshot was recorded.
    pub fn on_change_complete(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.history.push(self.occurrences.clone());
        self.dirty = false;
        tracing::debug!("gesture committed");
        true
    }

    /// Apply the user's scope choice to the pending change.
    ///
    /// `Cancel` (or an occurrence that vanished meanwhile) restores the
    /// collection to its last recorded snapshot. Returns whether anything was
    /// committed.
    pub fn resolve_pending(&mut self, choice: ScopeChoice) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        let change = pending.change;

        let edited = choice.scope().and_then(|scope| {
            let original = self.get(&change.id)?.clone();
            let edited = original.with_times(change.start, change.end).ok()?;
            Some((edited, scope))
        });
        let Some((edited, scope)) = edited else {
            tracing::debug!(id = %change.id, ?choice, "pending change discarded");
            self.occurrences = self.history.current().clone();
            self.dirty = false;
            return false;
        };

        let next = apply_edit(&self.occurrences, &edited, scope, &self.config.expansion);
        tracing::debug!(id = %change.id, ?scope, "pending change committed");
        self.commit(next);
        true
    }

    // ── panel callbacks ─────────────────────────────────────────────────

    /// Save an occurrence edited in the panel.
    ///
    /// An occurrence already in the collection is applied with `scope`; a new
    /// one is added (and expanded if it repeats). With `commit_and_close` the
    /// result is recorded as one history entry; otherwise the collection is
    /// updated live and the entry is recorded by a later committing save.
    pub fn on_save(&mut self, occurrence: Occurrence, scope: EditScope, commit_and_close: bool) {
        let next = if self.contains(occurrence.id()) {
            apply_edit(&self.occurrences, &occurrence, scope, &self.config.expansion)
        } else {
            let mut next = self.occurrences.clone();
            next.extend(expand_occurrence(&occurrence, &self.config.expansion));
            next
        };
        tracing::debug!(id = %occurrence.id(), ?scope, commit_and_close, "saved occurrence");
        if commit_and_close {
            self.commit(next);
        } else {
            self.occurrences = next;
            self.dirty = true;
        }
    }

    /// Delete `id` under `scope`. Returns whether anything was removed.
    pub fn on_delete(&mut self, id: &OccurrenceId, scope: EditScope) -> bool {
        let next = apply_delete(&self.occurrences, id, scope);
        if next.len() == self.occurrences.len() {
            return false;
        }
        self.commit(next);
        true
    }

    // ── history ─────────────────────────────────────────────────────────

    /// Restore the previous snapshot. Returns `false` at the oldest one.
    ///
    /// Uncommitted live changes count as one step: the first undo only
    /// discards them and returns to the latest snapshot.
    pub fn undo(&mut self) -> bool {
        if self.dirty {
            self.occurrences = self.history.current().clone();
            self.pending = None;
            self.dirty = false;
            tracing::debug!("discarded uncommitted changes");
            return true;
        }
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.occurrences = snapshot.clone();
        self.pending = None;
        self.dirty = false;
        true
    }

    /// Restore the next snapshot. Returns `false` at the newest one.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.occurrences = snapshot.clone();
        self.pending = None;
        self.dirty = false;
        true
    }

    /// Keep `selected` only if it still exists in the current collection.
    pub fn prune_selection(&self, selected: Option<OccurrenceId>) -> Option<OccurrenceId> {
        selected.filter(|id| self.contains(id))
    }
}
