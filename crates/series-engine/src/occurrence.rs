//! The occurrence record and its recurrence-rule fields.
//!
//! [`Occurrence`] is the unit every engine operation consumes and returns.
//! Its `start`/`end` pair is validated on construction (and on
//! deserialization), so `end > start` holds for every value of the type.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::identity::{DayCode, OccurrenceId};

pub const DEFAULT_COLOR: &str = "#0f54bc";
pub const DEFAULT_COLOR1: &str = "#a8c1ff";

// ── Rule fields ─────────────────────────────────────────────────────────────

/// The `repeatValue` of an occurrence.
///
/// Strings the engine does not recognize are kept in [`RepeatValue::Unrecognized`]
/// so they round-trip unchanged; expansion treats them as a single emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RepeatValue {
    #[default]
    None,
    EveryDay,
    EveryWeek,
    EveryMonth,
    /// A generated `Custom: …` label; the rule itself is in [`CustomRepeatConfig`].
    Custom(String),
    Unrecognized(String),
}

impl RepeatValue {
    pub fn as_str(&self) -> &str {
        match self {
            RepeatValue::None => "None",
            RepeatValue::EveryDay => "Every Day",
            RepeatValue::EveryWeek => "Every Week",
            RepeatValue::EveryMonth => "Every Month",
            RepeatValue::Custom(s) | RepeatValue::Unrecognized(s) => s,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RepeatValue::None)
    }
}

impl From<String> for RepeatValue {
    fn from(s: String) -> Self {
        let is_custom = match s.trim() {
            "" | "None" => return RepeatValue::None,
            "Every Day" => return RepeatValue::EveryDay,
            "Every Week" => return RepeatValue::EveryWeek,
            "Every Month" => return RepeatValue::EveryMonth,
            t => t.starts_with("Custom"),
        };
        if is_custom {
            RepeatValue::Custom(s)
        } else {
            RepeatValue::Unrecognized(s)
        }
    }
}

impl From<&str> for RepeatValue {
    fn from(s: &str) -> Self {
        RepeatValue::from(s.to_string())
    }
}

impl From<RepeatValue> for String {
    fn from(value: RepeatValue) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RepeatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of a custom rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatUnit {
    Day,
    #[default]
    Week,
    Month,
}

impl RepeatUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
        }
    }
}

/// `customRepeatConfig`: every `frequency` units, on `days` when weekly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRepeatConfig {
    pub frequency: u32,
    pub unit: RepeatUnit,
    pub days: BTreeSet<DayCode>,
}

impl Default for CustomRepeatConfig {
    fn default() -> Self {
        Self {
            frequency: 1,
            unit: RepeatUnit::Week,
            days: BTreeSet::from([DayCode::Mon]),
        }
    }
}

impl CustomRepeatConfig {
    pub fn weekly(frequency: u32, days: impl IntoIterator<Item = DayCode>) -> Self {
        Self {
            frequency,
            unit: RepeatUnit::Week,
            days: days.into_iter().collect(),
        }
    }

    /// Frequency with zero treated as one.
    pub fn effective_frequency(&self) -> u32 {
        self.frequency.max(1)
    }
}

/// `endRepeatValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndRepeatKind {
    #[default]
    Never,
    After,
    #[serde(rename = "On Date")]
    OnDate,
}

/// The termination policy an expansion runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Never,
    /// Stop after this many occurrences (always ≥ 1).
    After(u32),
    /// Stop after the last occurrence on or before this date.
    OnDate(NaiveDate),
}

/// A recurrence rule: the repeat value plus its custom configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecurrenceRule {
    pub repeat: RepeatValue,
    pub custom: Option<CustomRepeatConfig>,
}

impl RecurrenceRule {
    pub fn simple(repeat: RepeatValue) -> Self {
        Self {
            repeat,
            custom: None,
        }
    }

    pub fn custom(label: impl Into<String>, config: CustomRepeatConfig) -> Self {
        Self {
            repeat: RepeatValue::Custom(label.into()),
            custom: Some(config),
        }
    }
}

// ── Occurrence ──────────────────────────────────────────────────────────────

/// One concrete calendar occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OccurrenceRecord", rename_all = "camelCase")]
pub struct Occurrence {
    id: OccurrenceId,
    start: NaiveDateTime,
    end: NaiveDateTime,
    pub title: String,
    pub notes: String,
    pub location: String,
    pub employees: String,
    pub color: String,
    pub color1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color2: Option<String>,
    pub is_recurring: bool,
    pub repeat_value: RepeatValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_repeat_config: Option<CustomRepeatConfig>,
    pub end_repeat_value: EndRepeatKind,
    pub end_repeat_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_repeat_date: Option<NaiveDate>,
}

impl Occurrence {
    /// A non-recurring occurrence with empty metadata.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimeRange`] unless `end > start`.
    pub fn new(id: OccurrenceId, start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        check_range(start, end)?;
        Ok(Self {
            id,
            start,
            end,
            title: String::new(),
            notes: String::new(),
            location: String::new(),
            employees: String::new(),
            color: DEFAULT_COLOR.to_string(),
            color1: DEFAULT_COLOR1.to_string(),
            color2: None,
            is_recurring: false,
            repeat_value: RepeatValue::None,
            custom_repeat_config: None,
            end_repeat_value: EndRepeatKind::Never,
            end_repeat_count: 1,
            end_repeat_date: None,
        })
    }

    pub fn id(&self) -> &OccurrenceId {
        &self.id
    }

    pub fn series_id(&self) -> &str {
        self.id.series_id()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Move the occurrence to a new time range.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimeRange`] unless `end > start`; the
    /// occurrence is left unchanged.
    pub fn set_times(&mut self, start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
        check_range(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Consuming form of [`Occurrence::set_times`].
    pub fn with_times(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        self.set_times(start, end)?;
        Ok(self)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Attach a recurrence rule and termination policy.
    pub fn with_rule(mut self, rule: RecurrenceRule, termination: Termination) -> Self {
        self.is_recurring = !rule.repeat.is_none();
        self.repeat_value = rule.repeat;
        self.custom_repeat_config = rule.custom;
        self.set_termination(termination);
        self
    }

    pub(crate) fn with_id(mut self, id: OccurrenceId) -> Self {
        self.id = id;
        self
    }

    /// Whether the occurrence is part of a series: flagged recurring, or its
    /// id carries a series suffix.
    pub fn belongs_to_series(&self) -> bool {
        self.is_recurring || self.id.has_series_suffix()
    }

    pub fn rule(&self) -> RecurrenceRule {
        RecurrenceRule {
            repeat: self.repeat_value.clone(),
            custom: self.custom_repeat_config.clone(),
        }
    }

    /// The termination policy encoded in the `endRepeat*` fields.
    ///
    /// `After` with a zero count is read as one; `On Date` without a date
    /// degrades to `Never`.
    pub fn termination(&self) -> Termination {
        match self.end_repeat_value {
            EndRepeatKind::Never => Termination::Never,
            EndRepeatKind::After => Termination::After(self.end_repeat_count.max(1)),
            EndRepeatKind::OnDate => match self.end_repeat_date {
                Some(date) => Termination::OnDate(date),
                None => {
                    tracing::warn!(id = %self.id, "'On Date' termination without a date, treating as Never");
                    Termination::Never
                }
            },
        }
    }

    pub fn set_termination(&mut self, termination: Termination) {
        match termination {
            Termination::Never => {
                self.end_repeat_value = EndRepeatKind::Never;
            }
            Termination::After(n) => {
                self.end_repeat_value = EndRepeatKind::After;
                self.end_repeat_count = n.max(1);
            }
            Termination::OnDate(date) => {
                self.end_repeat_value = EndRepeatKind::OnDate;
                self.end_repeat_date = Some(date);
            }
        }
    }
}

fn check_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
    if end <= start {
        return Err(EngineError::InvalidTimeRange { start, end });
    }
    Ok(())
}

/// Wire shape of an occurrence, with every optional field defaulted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OccurrenceRecord {
    id: OccurrenceId,
    start: NaiveDateTime,
    end: NaiveDateTime,
    #[serde(default)]
    title: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    employees: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    color1: Option<String>,
    #[serde(default)]
    color2: Option<String>,
    #[serde(default)]
    is_recurring: bool,
    #[serde(default)]
    repeat_value: RepeatValue,
    #[serde(default)]
    custom_repeat_config: Option<CustomRepeatConfig>,
    #[serde(default)]
    end_repeat_value: EndRepeatKind,
    #[serde(default)]
    end_repeat_count: Option<u32>,
    #[serde(default)]
    end_repeat_date: Option<NaiveDate>,
}

impl TryFrom<OccurrenceRecord> for Occurrence {
    type Error = EngineError;

    fn try_from(r: OccurrenceRecord) -> Result<Self> {
        let mut occurrence = Occurrence::new(r.id, r.start, r.end)?;
        occurrence.title = r.title;
        occurrence.notes = r.notes;
        occurrence.location = r.location;
        occurrence.employees = r.employees;
        if let Some(color) = r.color {
            occurrence.color = color;
        }
        if let Some(color1) = r.color1 {
            occurrence.color1 = color1;
        }
        occurrence.color2 = r.color2;
        occurrence.is_recurring = r.is_recurring;
        occurrence.repeat_value = r.repeat_value;
        occurrence.custom_repeat_config = r.custom_repeat_config;
        occurrence.end_repeat_value = r.end_repeat_value;
        occurrence.end_repeat_count = r.end_repeat_count.unwrap_or(1).max(1);
        occurrence.end_repeat_date = r.end_repeat_date;
        Ok(occurrence)
    }
}
