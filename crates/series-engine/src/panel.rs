//! Rule-builder state behind the event panel.
//!
//! A [`RuleDraft`] holds the recurrence fields while the user edits them and
//! derives everything the panel shows before committing: the custom rule's
//! weekday label, the `Custom: ...` repeat value, the end-repeat summary and
//! the estimated total number of occurrences.
//!
//! The draft does not pick an edit scope. The caller commits the draft with
//! [`RuleDraft::apply_to`] and hands the result to
//! [`apply_edit`](crate::editor::apply_edit) with the scope the user chose.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::config::ExpansionLimits;
use crate::error::{EngineError, Result};
use crate::expander::expand;
use crate::identity::DayCode;
use crate::occurrence::{
    CustomRepeatConfig, EndRepeatKind, Occurrence, RecurrenceRule, RepeatUnit, RepeatValue,
    Termination,
};

/// The repeat options offered by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatPreset {
    None,
    EveryDay,
    EveryWeek,
    EveryMonth,
    Custom,
}

/// Editable recurrence fields of one occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDraft {
    repeat: RepeatValue,
    custom: CustomRepeatConfig,
    end_kind: EndRepeatKind,
    end_count: u32,
    end_date: Option<NaiveDate>,
}

impl Default for RuleDraft {
    fn default() -> Self {
        Self {
            repeat: RepeatValue::None,
            custom: CustomRepeatConfig::default(),
            end_kind: EndRepeatKind::Never,
            end_count: 1,
            end_date: None,
        }
    }
}

impl RuleDraft {
    /// A draft seeded from an occurrence's current rule fields.
    pub fn from_occurrence(occurrence: &Occurrence) -> Self {
        Self {
            repeat: occurrence.repeat_value.clone(),
            custom: occurrence.custom_repeat_config.clone().unwrap_or_default(),
            end_kind: occurrence.end_repeat_value,
            end_count: occurrence.end_repeat_count.max(1),
            end_date: occurrence.end_repeat_date,
        }
    }

    pub fn repeat_value(&self) -> &RepeatValue {
        &self.repeat
    }

    pub fn custom_config(&self) -> &CustomRepeatConfig {
        &self.custom
    }

    pub fn end_kind(&self) -> EndRepeatKind {
        self.end_kind
    }

    pub fn end_count(&self) -> u32 {
        self.end_count
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    fn is_custom(&self) -> bool {
        matches!(self.repeat, RepeatValue::Custom(_))
    }

    // ── editing ─────────────────────────────────────────────────────────

    /// Pick one of the panel's repeat options.
    ///
    /// Choosing `None` also resets the end condition to `Never` with a count
    /// of one. Choosing `Custom` derives the repeat value from the current
    /// custom configuration.
    pub fn select_preset(&mut self, preset: RepeatPreset) {
        self.repeat = match preset {
            RepeatPreset::None => {
                self.end_kind = EndRepeatKind::Never;
                self.end_count = 1;
                self.end_date = None;
                RepeatValue::None
            }
            RepeatPreset::EveryDay => RepeatValue::EveryDay,
            RepeatPreset::EveryWeek => RepeatValue::EveryWeek,
            RepeatPreset::EveryMonth => RepeatValue::EveryMonth,
            RepeatPreset::Custom => RepeatValue::Custom(self.custom_repeat_value()),
        };
    }

    /// Set the custom frequency. Values below one are raised to one.
    pub fn set_frequency(&mut self, frequency: u32) {
        self.custom.frequency = frequency.max(1);
        self.refresh_custom();
    }

    pub fn set_unit(&mut self, unit: RepeatUnit) {
        self.custom.unit = unit;
        self.refresh_custom();
    }

    /// Select `day` if unselected, unselect it otherwise.
    pub fn toggle_day(&mut self, day: DayCode) {
        if !self.custom.days.remove(&day) {
            self.custom.days.insert(day);
        }
        self.refresh_custom();
    }

    pub fn set_days(&mut self, days: impl IntoIterator<Item = DayCode>) {
        self.custom.days = days.into_iter().collect();
        self.refresh_custom();
    }

    pub fn set_end_kind(&mut self, kind: EndRepeatKind) {
        self.end_kind = kind;
    }

    /// Set the `After` count. Zero is raised to one.
    pub fn set_end_count(&mut self, count: u32) {
        self.end_count = count.max(1);
    }

    pub fn set_end_date(&mut self, date: NaiveDate) {
        self.end_date = Some(date);
    }

    fn refresh_custom(&mut self) {
        if self.is_custom() {
            self.repeat = RepeatValue::Custom(self.custom_repeat_value());
        }
    }

    // ── derived text ────────────────────────────────────────────────────

    /// Weekday label of the custom weekly rule.
    ///
    /// `every day` for all seven days, `weekdays` for exactly Monday to
    /// Friday, otherwise full day names in Sunday-to-Saturday order.
    pub fn custom_label(&self) -> String {
        weekday_label(&self.custom.days)
    }

    /// The repeat value a custom rule is stored under, e.g.
    /// `Custom: Every 2 weeks on Monday, Wednesday`.
    pub fn custom_repeat_value(&self) -> String {
        let frequency = self.custom.effective_frequency();
        let plural = if frequency > 1 { "s" } else { "" };
        let mut value = format!("Custom: Every {} {}{}", frequency, self.custom.unit.as_str(), plural);
        if self.custom.unit == RepeatUnit::Week && !self.custom.days.is_empty() {
            value.push_str(" on ");
            value.push_str(&self.custom_label());
        }
        value
    }

    /// Summary of the end condition: `Never`, `On Date`, or `After N <unit>`.
    pub fn end_repeat_text(&self) -> String {
        match self.end_kind {
            EndRepeatKind::Never => "Never".to_string(),
            EndRepeatKind::OnDate => "On Date".to_string(),
            EndRepeatKind::After => {
                let unit = match (&self.repeat, self.custom.unit) {
                    (RepeatValue::Custom(_), RepeatUnit::Day) | (RepeatValue::EveryDay, _) => "days",
                    (RepeatValue::Custom(_), RepeatUnit::Week) | (RepeatValue::EveryWeek, _) => "weeks",
                    (RepeatValue::Custom(_), RepeatUnit::Month) | (RepeatValue::EveryMonth, _) => "months",
                    _ => "occurrences",
                };
                format!("After {} {}", self.end_count, unit)
            }
        }
    }

    /// Estimated number of occurrences the draft will produce.
    ///
    /// Daily and monthly rules produce the end count. Weekly rules produce
    /// `ceil(count * selected_days / frequency)`. A non-repeating draft is one
    /// occurrence.
    pub fn total_occurrences(&self) -> u32 {
        let count = u64::from(self.end_count);
        let estimate = match &self.repeat {
            RepeatValue::None => 1,
            RepeatValue::Custom(_) if self.custom.unit == RepeatUnit::Week => {
                let days = (self.custom.days.len() as u64).max(1);
                let frequency = u64::from(self.custom.effective_frequency());
                (count * days).div_ceil(frequency)
            }
            _ => count,
        };
        u32::try_from(estimate).unwrap_or(u32::MAX)
    }

    // ── committing ──────────────────────────────────────────────────────

    /// Check that the draft can be committed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRule`] when a custom weekly rule has no
    /// selected day, or `On Date` is chosen without a date.
    pub fn validate(&self) -> Result<()> {
        if self.is_custom() && self.custom.unit == RepeatUnit::Week && self.custom.days.is_empty() {
            return Err(EngineError::InvalidRule(
                "custom weekly rule needs at least one weekday".to_string(),
            ));
        }
        if !self.repeat.is_none() && self.end_kind == EndRepeatKind::OnDate && self.end_date.is_none() {
            return Err(EngineError::InvalidRule(
                "'On Date' end condition needs a date".to_string(),
            ));
        }
        Ok(())
    }

    pub fn can_save(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn rule(&self) -> RecurrenceRule {
        if self.is_custom() {
            RecurrenceRule::custom(self.custom_repeat_value(), self.custom.clone())
        } else {
            RecurrenceRule::simple(self.repeat.clone())
        }
    }

    /// The termination the draft describes. `On Date` without a date is `Never`.
    pub fn termination(&self) -> Termination {
        match (self.end_kind, self.end_date) {
            (EndRepeatKind::Never, _) | (EndRepeatKind::OnDate, None) => Termination::Never,
            (EndRepeatKind::After, _) => Termination::After(self.end_count),
            (EndRepeatKind::OnDate, Some(date)) => Termination::OnDate(date),
        }
    }

    /// The occurrences the draft would produce from `anchor`.
    pub fn preview(&self, anchor: &Occurrence, limits: &ExpansionLimits) -> Vec<Occurrence> {
        expand(anchor, &self.rule(), self.termination(), limits)
    }

    /// Write the draft into `occurrence`'s rule fields.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::InvalidRule`] under the same conditions as
    /// [`RuleDraft::validate`].
    pub fn apply_to(&self, occurrence: Occurrence) -> Result<Occurrence> {
        self.validate()?;
        let mut out = occurrence.with_rule(self.rule(), self.termination());
        if self.repeat.is_none() {
            out.custom_repeat_config = None;
        }
        out.end_repeat_count = self.end_count;
        if let Some(date) = self.end_date {
            out.end_repeat_date = Some(date);
        }
        Ok(out)
    }
}

fn weekday_label(days: &BTreeSet<DayCode>) -> String {
    if days.len() == DayCode::ALL.len() {
        return "every day".to_string();
    }
    let workweek_only = DayCode::WORKWEEK.iter().all(|d| days.contains(d))
        && !days.iter().any(|d| d.is_weekend());
    if workweek_only {
        return "weekdays".to_string();
    }
    days.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
}
