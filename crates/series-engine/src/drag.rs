//! Pointer gestures on the week time grid.
//!
//! A [`DragResizeController`] turns pointer positions (pixels, relative to
//! the grid's top-left corner) into a preview of an occurrence's new
//! `(start, end)` and, on release, tells the caller how to commit it.
//!
//! Quantization is fixed by the grid geometry: vertical distance becomes a
//! whole number of hours with `round(dy / hour_height)`, horizontal position
//! becomes a day column with `floor(x / width * columns)`.
//!
//! At most one gesture is active. It is acquired by
//! [`DragResizeController::pointer_down`] and released by either
//! [`DragResizeController::pointer_up`] or [`DragResizeController::abort`];
//! every exit path goes through one of the two.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::editor::EditScope;
use crate::identity::OccurrenceId;
use crate::occurrence::Occurrence;

/// Largest hour shift a single frame can request.
const MAX_HOUR_DELTA: i64 = 48;

// ── TimeGrid ────────────────────────────────────────────────────────────────

/// Pixel geometry of a rendered time grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGrid {
    hour_height_px: f64,
    day_columns: u32,
    slot_minutes: u32,
    width_px: f64,
}

impl TimeGrid {
    /// A grid `width_px` wide using the row height and column count of `config`.
    pub fn new(config: &GridConfig, width_px: f64) -> Self {
        Self {
            hour_height_px: config.hour_height_px,
            day_columns: config.day_columns.max(1),
            slot_minutes: config.slot_minutes.max(1),
            width_px,
        }
    }

    pub fn hour_height_px(&self) -> f64 {
        self.hour_height_px
    }

    pub fn day_columns(&self) -> u32 {
        self.day_columns
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Whole hours covered by a vertical pointer delta, rounded to nearest
    /// and clamped to two days either way.
    pub fn hour_delta(&self, dy: f64) -> i64 {
        if self.hour_height_px <= 0.0 || !dy.is_finite() {
            return 0;
        }
        ((dy / self.hour_height_px).round() as i64).clamp(-MAX_HOUR_DELTA, MAX_HOUR_DELTA)
    }

    /// The day column under horizontal position `x`, or `None` outside the grid.
    pub fn day_column(&self, x: f64) -> Option<u32> {
        if self.width_px <= 0.0 || !x.is_finite() {
            return None;
        }
        let index = (x / self.width_px * f64::from(self.day_columns)).floor();
        if index < 0.0 || index >= f64::from(self.day_columns) {
            return None;
        }
        Some(index as u32)
    }

    /// The slot row under vertical position `y`, clamped to the day.
    pub fn slot_row(&self, y: f64) -> u32 {
        let slot_px = self.hour_height_px * f64::from(self.slot_minutes) / 60.0;
        let last = self.slots_per_day().saturating_sub(1);
        if slot_px <= 0.0 || !y.is_finite() || y <= 0.0 {
            return 0;
        }
        ((y / slot_px).floor() as u64).min(u64::from(last)) as u32
    }

    /// Number of whole slots in one day.
    pub fn slots_per_day(&self) -> u32 {
        (24 * 60 / self.slot_minutes).max(1)
    }
}

// ── Gesture types ───────────────────────────────────────────────────────────

/// What part of the occurrence the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    /// The body: start and end shift together.
    Move,
    /// The top handle: only start moves.
    ResizeTop,
    /// The bottom handle: only end moves.
    ResizeBottom,
}

/// Pointer position in pixels relative to the grid's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Proposed new times for an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeChange {
    pub id: OccurrenceId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// How a released gesture should be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The times never changed. Nothing to commit.
    Unchanged(OccurrenceId),
    /// Non-recurring occurrence: apply directly and record one history entry.
    Commit(TimeChange),
    /// Series member whose time changed: ask the user for a scope first.
    ChooseScope(TimeChange),
}

/// The user's answer to a scope prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeChoice {
    Single,
    AllFuture,
    Cancel,
}

impl ScopeChoice {
    /// The edit scope to apply, or `None` for `Cancel`.
    pub fn scope(self) -> Option<EditScope> {
        match self {
            ScopeChoice::Single => Some(EditScope::Single),
            ScopeChoice::AllFuture => Some(EditScope::AllFuture),
            ScopeChoice::Cancel => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Gesture {
    id: OccurrenceId,
    kind: GestureKind,
    in_series: bool,
    origin: PointerPosition,
    origin_column: Option<u32>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    day_delta: i64,
    preview: (NaiveDateTime, NaiveDateTime),
}

// ── DragResizeController ────────────────────────────────────────────────────

/// Tracks the single in-flight drag or resize gesture.
#[derive(Debug, Clone)]
pub struct DragResizeController {
    grid: TimeGrid,
    active: Option<Gesture>,
}

impl DragResizeController {
    pub fn new(grid: TimeGrid) -> Self {
        Self { grid, active: None }
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Whether a gesture currently holds the pointer.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the occurrence under the active gesture.
    pub fn active_id(&self) -> Option<&OccurrenceId> {
        self.active.as_ref().map(|g| &g.id)
    }

    /// Start a gesture on `occurrence`. A gesture still in flight is dropped.
    pub fn pointer_down(&mut self, occurrence: &Occurrence, kind: GestureKind, at: PointerPosition) {
        if let Some(stale) = self.active.take() {
            tracing::debug!(id = %stale.id, "dropping unfinished gesture");
        }
        let (start, end) = (occurrence.start(), occurrence.end());
        self.active = Some(Gesture {
            id: occurrence.id().clone(),
            kind,
            in_series: occurrence.belongs_to_series(),
            origin: at,
            origin_column: self.grid.day_column(at.x),
            start,
            end,
            day_delta: 0,
            preview: (start, end),
        });
        tracing::trace!(id = %occurrence.id(), ?kind, "gesture started");
    }

    /// Feed one pointer frame.
    ///
    /// Returns the new preview when the frame changed it. Frames that would
    /// break `start < end` or leave the day's hour range are dropped, and the
    /// last accepted preview stays in place.
    pub fn pointer_move(&mut self, at: PointerPosition) -> Option<TimeChange> {
        let grid = self.grid;
        let gesture = self.active.as_mut()?;

        let hours = grid.hour_delta(at.y - gesture.origin.y);
        if let (Some(origin), Some(column)) = (gesture.origin_column, grid.day_column(at.x)) {
            gesture.day_delta = i64::from(column) - i64::from(origin);
        }

        let Some(next) = frame(gesture, hours) else {
            tracing::trace!(id = %gesture.id, hours, "rejected gesture frame");
            return None;
        };
        if next == gesture.preview {
            return None;
        }
        gesture.preview = next;
        Some(TimeChange {
            id: gesture.id.clone(),
            start: next.0,
            end: next.1,
        })
    }

    /// Finish the gesture at `at` and release it.
    pub fn pointer_up(&mut self, at: PointerPosition) -> Option<GestureOutcome> {
        self.pointer_move(at);
        let gesture = self.active.take()?;
        let (start, end) = gesture.preview;
        let outcome = if (start, end) == (gesture.start, gesture.end) {
            GestureOutcome::Unchanged(gesture.id)
        } else {
            let change = TimeChange {
                id: gesture.id,
                start,
                end,
            };
            if gesture.in_series {
                GestureOutcome::ChooseScope(change)
            } else {
                GestureOutcome::Commit(change)
            }
        };
        tracing::debug!(?outcome, "gesture finished");
        Some(outcome)
    }

    /// Release the gesture without committing, e.g. when the view goes away.
    ///
    /// Returns the occurrence's original times so the caller can restore any
    /// live preview it applied.
    pub fn abort(&mut self) -> Option<TimeChange> {
        let gesture = self.active.take()?;
        tracing::debug!(id = %gesture.id, "gesture aborted");
        Some(TimeChange {
            id: gesture.id,
            start: gesture.start,
            end: gesture.end,
        })
    }
}

/// Candidate `(start, end)` for a frame `hours` away from the origin, or
/// `None` when the frame must be rejected.
fn frame(gesture: &Gesture, hours: i64) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let hour_shift = Duration::hours(hours);
    let day_shift = Duration::days(gesture.day_delta);
    match gesture.kind {
        GestureKind::Move => {
            let target = i64::from(gesture.start.hour()) + hours;
            let shift = if (0..24).contains(&target) {
                hour_shift + day_shift
            } else {
                day_shift
            };
            Some((
                gesture.start.checked_add_signed(shift)?,
                gesture.end.checked_add_signed(shift)?,
            ))
        }
        GestureKind::ResizeTop => {
            let target = i64::from(gesture.start.hour()) + hours;
            let start = gesture.start.checked_add_signed(hour_shift)?;
            ((0..24).contains(&target) && start < gesture.end).then_some((start, gesture.end))
        }
        GestureKind::ResizeBottom => {
            let target = i64::from(gesture.end.hour()) + hours;
            let end = gesture.end.checked_add_signed(hour_shift)?;
            ((1..=24).contains(&target) && end > gesture.start).then_some((gesture.start, end))
        }
    }
}
