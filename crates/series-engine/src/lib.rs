//! # series-engine
//!
//! Recurrence and event-mutation engine for an interactive week calendar.
//!
//! The engine expands recurrence rules into concrete occurrences, tracks
//! which occurrences form a series, splits a series when one occurrence or
//! "this and all future" occurrences are edited or deleted, quantizes
//! pointer drags on the time grid into hour/day changes, and keeps a linear
//! undo/redo history of the whole collection.
//!
//! Every operation works on plain in-memory records and returns new values.
//! Persistence, rendering and time zones belong to the caller.
//!
//! ## Modules
//!
//! - [`occurrence`]: The occurrence record and its recurrence fields
//! - [`identity`]: Composite occurrence ids and series membership
//! - [`expander`]: Anchor + rule + termination → concrete occurrences
//! - [`editor`]: Single / all-future edits with series splitting
//! - [`deleter`]: Single / all-future deletion
//! - [`drag`]: Pointer gestures on the time grid
//! - [`slot`]: Creating events from empty grid slots
//! - [`history`]: Snapshot undo/redo
//! - [`panel`]: Rule-builder draft, labels and occurrence estimates
//! - [`transition`]: Panel section expand/collapse state machine
//! - [`calendar`]: The container wiring all of the above to UI callbacks
//! - [`config`]: Grid geometry, expansion caps, history and timing settings
//! - [`error`]: Error types

pub mod calendar;
pub mod config;
pub mod deleter;
pub mod drag;
pub mod editor;
pub mod error;
pub mod expander;
pub mod history;
pub mod identity;
pub mod occurrence;
pub mod panel;
pub mod slot;
pub mod transition;

pub use calendar::{Calendar, PendingChange, TimeUpdate};
pub use config::{EngineConfig, ExpansionLimits, GridConfig, HistoryConfig, InteractionConfig};
pub use deleter::apply_delete;
pub use drag::{
    DragResizeController, GestureKind, GestureOutcome, PointerPosition, ScopeChoice, TimeChange,
    TimeGrid,
};
pub use editor::{apply_edit, EditScope};
pub use error::{EngineError, Result};
pub use expander::{expand, expand_occurrence, expand_seeded};
pub use history::HistoryStack;
pub use identity::{DayCode, IdSeed, OccurrenceId, SeriesPosition};
pub use occurrence::{
    CustomRepeatConfig, EndRepeatKind, Occurrence, RecurrenceRule, RepeatUnit, RepeatValue,
    Termination,
};
pub use panel::{RepeatPreset, RuleDraft};
pub use slot::{SlotPress, SlotRange, SlotSelector};
pub use transition::{SectionGroup, SectionPhase, SectionTransition};
