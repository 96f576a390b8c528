//! Creating events by clicking empty grid slots.
//!
//! Two gestures create an event on an empty part of the grid:
//!
//! - a double-click (two presses inside `double_click_ms`) creates a
//!   one-slot event under the second press;
//! - press, drag, release selects every slot between the pressed row and the
//!   release row in the pressed day column.
//!
//! Timestamps are passed in explicitly (milliseconds from any fixed origin)
//! so the selector never reads a clock.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::drag::{PointerPosition, TimeGrid};

/// A half-open `[start, end)` span of whole slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// What a press on an empty slot resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPress {
    /// Second press inside the double-click window: create this range now.
    DoubleClick(SlotRange),
    /// First press: a drag selection may follow. The range is the pressed slot.
    Started(SlotRange),
    /// The press landed outside every day column.
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Selection {
    day: NaiveDate,
    origin_row: u32,
    current_row: u32,
    dragged: bool,
}

/// Turns presses on empty slots into ranges for new events.
#[derive(Debug, Clone)]
pub struct SlotSelector {
    grid: TimeGrid,
    first_day: NaiveDate,
    double_click_ms: u64,
    last_press_ms: Option<u64>,
    selection: Option<Selection>,
}

impl SlotSelector {
    /// A selector for a grid whose leftmost column shows `first_day`.
    pub fn new(grid: TimeGrid, first_day: NaiveDate, double_click_ms: u64) -> Self {
        Self {
            grid,
            first_day,
            double_click_ms,
            last_press_ms: None,
            selection: None,
        }
    }

    /// Handle a press at `at`, `now_ms` milliseconds after the origin.
    pub fn pointer_down(&mut self, at: PointerPosition, now_ms: u64) -> SlotPress {
        let Some(column) = self.grid.day_column(at.x) else {
            return SlotPress::Ignored;
        };
        let day = self.first_day + Duration::days(i64::from(column));
        let row = self.grid.slot_row(at.y);
        let range = self.range(day, row, row);

        let is_double = self
            .last_press_ms
            .is_some_and(|last| now_ms.saturating_sub(last) <= self.double_click_ms);
        if is_double {
            self.last_press_ms = None;
            self.selection = None;
            tracing::debug!(start = %range.start, "double-click on empty slot");
            return SlotPress::DoubleClick(range);
        }

        self.last_press_ms = Some(now_ms);
        self.selection = Some(Selection {
            day,
            origin_row: row,
            current_row: row,
            dragged: false,
        });
        SlotPress::Started(range)
    }

    /// Extend the selection to the row under `at`. Returns the selected range.
    pub fn pointer_move(&mut self, at: PointerPosition) -> Option<SlotRange> {
        let row = self.grid.slot_row(at.y);
        let selection = self.selection.as_mut()?;
        selection.current_row = row;
        selection.dragged = true;
        let (day, a, b) = (selection.day, selection.origin_row, row);
        Some(self.range(day, a.min(b), a.max(b)))
    }

    /// End the selection. Returns a range only if the pointer moved while held.
    pub fn pointer_up(&mut self) -> Option<SlotRange> {
        let selection = self.selection.take()?;
        if !selection.dragged {
            return None;
        }
        let (a, b) = (selection.origin_row, selection.current_row);
        let range = self.range(selection.day, a.min(b), a.max(b));
        tracing::debug!(start = %range.start, end = %range.end, "slot range selected");
        Some(range)
    }

    fn range(&self, day: NaiveDate, first_row: u32, last_row: u32) -> SlotRange {
        let minutes = i64::from(self.grid.slot_minutes());
        let midnight = day.and_time(NaiveTime::MIN);
        SlotRange {
            start: midnight + Duration::minutes(i64::from(first_row) * minutes),
            end: midnight + Duration::minutes(i64::from(last_row + 1) * minutes),
        }
    }
}
