//! Series identity: which series an occurrence belongs to, and where.
//!
//! An [`OccurrenceId`] is a composite key (a series id plus a position
//! inside that series) rather than a string that has to be re-parsed every
//! time membership is checked. It still renders to (and parses from) the
//! flat textual form used at the storage boundary:
//!
//! | position | text |
//! |---|---|
//! | base (non-recurring, or the series root) | `abc` |
//! | sequence `n` of a simple rule | `abc-n` |
//! | week `w`, weekday `d` of a custom weekly rule | `abc-w-MON` |
//!
//! Ids that carry some other suffix after the first `-` are tolerated: the
//! prefix is still the series id and the suffix is kept verbatim.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::occurrence::Occurrence;

/// Separator between the series id and the position suffix.
pub const SEPARATOR: char = '-';

// ── DayCode ─────────────────────────────────────────────────────────────────

/// Weekday code used by custom weekly rules. Ordered Sunday → Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayCode {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayCode {
    /// All weekdays in display order (Sunday first).
    pub const ALL: [DayCode; 7] = [
        DayCode::Sun,
        DayCode::Mon,
        DayCode::Tue,
        DayCode::Wed,
        DayCode::Thu,
        DayCode::Fri,
        DayCode::Sat,
    ];

    /// Monday through Friday.
    pub const WORKWEEK: [DayCode; 5] = [
        DayCode::Mon,
        DayCode::Tue,
        DayCode::Wed,
        DayCode::Thu,
        DayCode::Fri,
    ];

    /// The three-letter uppercase code (`"MON"`).
    pub fn code(self) -> &'static str {
        match self {
            DayCode::Sun => "SUN",
            DayCode::Mon => "MON",
            DayCode::Tue => "TUE",
            DayCode::Wed => "WED",
            DayCode::Thu => "THU",
            DayCode::Fri => "FRI",
            DayCode::Sat => "SAT",
        }
    }

    /// The English day name (`"Monday"`).
    pub fn name(self) -> &'static str {
        match self {
            DayCode::Sun => "Sunday",
            DayCode::Mon => "Monday",
            DayCode::Tue => "Tuesday",
            DayCode::Wed => "Wednesday",
            DayCode::Thu => "Thursday",
            DayCode::Fri => "Friday",
            DayCode::Sat => "Saturday",
        }
    }

    /// Days after Sunday (Sunday = 0).
    pub fn days_from_sunday(self) -> u32 {
        self as u32
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, DayCode::Sat | DayCode::Sun)
    }
}

impl From<Weekday> for DayCode {
    fn from(weekday: Weekday) -> Self {
        DayCode::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl fmt::Display for DayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DayCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayCode::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::InvalidRule(format!("unknown weekday code '{}'", s)))
    }
}

// ── OccurrenceId ────────────────────────────────────────────────────────────

/// Position of an occurrence inside its series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesPosition {
    /// No suffix: a standalone event, or the root a series was expanded from.
    Base,
    /// The n-th emission of a simple (or day/month custom) rule.
    Sequence(u32),
    /// An emission of a custom weekly rule.
    Week { week: u32, day: DayCode },
    /// A suffix this engine did not produce, kept verbatim.
    Other(String),
}

/// Composite occurrence identifier: series id plus position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OccurrenceId {
    series_id: String,
    position: SeriesPosition,
}

impl OccurrenceId {
    /// A base id for a standalone event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOccurrenceId`] if the token is empty or
    /// contains the separator (it would be read back as a different series).
    pub fn new(token: impl Into<String>) -> Result<Self, EngineError> {
        let token = token.into();
        if token.is_empty() || token.contains(SEPARATOR) {
            return Err(EngineError::InvalidOccurrenceId(format!(
                "'{}': base ids must be non-empty and must not contain '{}'",
                token, SEPARATOR
            )));
        }
        Ok(Self {
            series_id: token,
            position: SeriesPosition::Base,
        })
    }

    /// A fresh, opaque base id.
    pub fn generate() -> Self {
        Self {
            series_id: uuid::Uuid::new_v4().simple().to_string(),
            position: SeriesPosition::Base,
        }
    }

    /// The id of sequence `n` in `series_id`.
    pub fn sequence(series_id: &str, n: u32) -> Self {
        Self {
            series_id: series_id.to_string(),
            position: SeriesPosition::Sequence(n),
        }
    }

    /// The id of the `day` emission of aligned week `week` in `series_id`.
    pub fn week(series_id: &str, week: u32, day: DayCode) -> Self {
        Self {
            series_id: series_id.to_string(),
            position: SeriesPosition::Week { week, day },
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn position(&self) -> &SeriesPosition {
        &self.position
    }

    /// Whether the id carries a series suffix (anything but [`SeriesPosition::Base`]).
    pub fn has_series_suffix(&self) -> bool {
        self.position != SeriesPosition::Base
    }

    pub fn sequence_index(&self) -> Option<u32> {
        match self.position {
            SeriesPosition::Sequence(n) => Some(n),
            _ => None,
        }
    }

    pub fn week_index(&self) -> Option<u32> {
        match self.position {
            SeriesPosition::Week { week, .. } => Some(week),
            _ => None,
        }
    }

    /// Whether both ids belong to the same series.
    pub fn same_series(&self, other: &OccurrenceId) -> bool {
        self.series_id == other.series_id
    }
}

impl fmt::Display for OccurrenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            SeriesPosition::Base => write!(f, "{}", self.series_id),
            SeriesPosition::Sequence(n) => write!(f, "{}{}{}", self.series_id, SEPARATOR, n),
            SeriesPosition::Week { week, day } => write!(
                f,
                "{}{}{}{}{}",
                self.series_id, SEPARATOR, week, SEPARATOR, day
            ),
            SeriesPosition::Other(rest) => write!(f, "{}{}{}", self.series_id, SEPARATOR, rest),
        }
    }
}

impl FromStr for OccurrenceId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((series, rest)) = s.split_once(SEPARATOR) else {
            return OccurrenceId::new(s);
        };
        if series.is_empty() {
            return Err(EngineError::InvalidOccurrenceId(format!(
                "'{}': missing series id",
                s
            )));
        }
        Ok(Self {
            series_id: series.to_string(),
            position: parse_position(rest),
        })
    }
}

impl TryFrom<String> for OccurrenceId {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OccurrenceId> for String {
    fn from(id: OccurrenceId) -> Self {
        id.to_string()
    }
}

fn parse_position(rest: &str) -> SeriesPosition {
    if let Some(n) = canonical_index(rest) {
        return SeriesPosition::Sequence(n);
    }
    if let Some((week, day)) = rest.split_once(SEPARATOR) {
        if let (Some(week), Some(day)) = (
            canonical_index(week),
            DayCode::ALL.into_iter().find(|d| d.code() == day),
        ) {
            return SeriesPosition::Week { week, day };
        }
    }
    SeriesPosition::Other(rest.to_string())
}

/// A position index written exactly as `Display` would write it back:
/// plain ASCII digits, no sign, no leading zero.
fn canonical_index(text: &str) -> Option<u32> {
    let digits = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !digits || (text.len() > 1 && text.starts_with('0')) {
        return None;
    }
    text.parse().ok()
}

/// The series id of a raw textual id: everything before the first separator.
pub fn series_id_of(raw: &str) -> &str {
    raw.split(SEPARATOR).next().unwrap_or(raw)
}

// ── Occurrence-level queries ────────────────────────────────────────────────

/// Whether two occurrences belong to the same series.
pub fn same_series(a: &Occurrence, b: &Occurrence) -> bool {
    a.id().same_series(b.id())
}

/// Whether `a` starts strictly before `b`.
pub fn starts_before(a: &Occurrence, b: &Occurrence) -> bool {
    a.start() < b.start()
}

/// Whether `occurrence` is in `series_id` and starts at or after `cutoff`.
pub fn is_future_sibling(occurrence: &Occurrence, series_id: &str, cutoff: NaiveDateTime) -> bool {
    occurrence.series_id() == series_id && occurrence.start() >= cutoff
}

/// Whether `occurrence` is the latest-ending member of its series in `collection`.
pub fn is_last_in_series(collection: &[Occurrence], occurrence: &Occurrence) -> bool {
    collection
        .iter()
        .filter(|o| same_series(o, occurrence))
        .max_by_key(|o| o.end())
        .is_some_and(|last| last.id() == occurrence.id())
}

// ── IdSeed ──────────────────────────────────────────────────────────────────

/// First position numbers handed out by an expansion.
///
/// A fresh series starts at zero. When a series is re-expanded after a split,
/// the seed starts after the highest position still held by retained
/// siblings so that ids stay unique inside the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdSeed {
    pub first_sequence: u32,
    pub first_week: u32,
}

impl IdSeed {
    /// A seed that does not collide with any of `siblings`.
    pub fn after<'a>(siblings: impl IntoIterator<Item = &'a OccurrenceId>) -> Self {
        siblings
            .into_iter()
            .fold(IdSeed::default(), |seed, id| match id.position() {
                SeriesPosition::Sequence(n) => IdSeed {
                    first_sequence: seed.first_sequence.max(n.saturating_add(1)),
                    ..seed
                },
                SeriesPosition::Week { week, .. } => IdSeed {
                    first_week: seed.first_week.max(week.saturating_add(1)),
                    ..seed
                },
                _ => seed,
            })
    }
}
