//! Recurrence expansion: anchor + rule + termination → concrete occurrences.
//!
//! Expansion is a pure function of its inputs. All arithmetic is local
//! wall-clock arithmetic on [`NaiveDateTime`]: a daily series stays at 09:00
//! regardless of any offset change in between.
//!
//! # Rules
//!
//! | repeat value | step |
//! |---|---|
//! | `Every Day` | 1 day |
//! | `Every Week` | 7 days |
//! | `Every Month` | 1 calendar month, clamped to the month's last day |
//! | `Custom` / unit `day` | `frequency` days |
//! | `Custom` / unit `month` | `frequency` months |
//! | `Custom` / unit `week` | selected weekdays of every `frequency`-th Sunday-aligned week |
//!
//! Day and week stepping is driven by an RRULE (`FREQ=DAILY` or
//! `FREQ=WEEKLY;WKST=SU;BYDAY=..`) evaluated in floating time. Month steps
//! clamp to the last day of short months, which RRULE does not do, so they
//! are computed with chrono.
//!
//! An unrecognized repeat value (or a custom label without a custom
//! configuration) emits the anchor once and stops. It does not fail.
//!
//! # Termination
//!
//! - `After(n)`: exactly `n` occurrences (subject to `max_occurrences`).
//! - `OnDate(d)`: every occurrence starting on or before the end of `d`.
//! - `Never`: simple rules stop one horizon (12 months by default) after
//!   the anchor; custom weekly rules stop after `custom_never_cap`
//!   occurrences or aligned weeks.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rrule::RRuleSet;

use crate::config::ExpansionLimits;
use crate::identity::{DayCode, IdSeed, OccurrenceId};
use crate::occurrence::{
    CustomRepeatConfig, Occurrence, RecurrenceRule, RepeatUnit, RepeatValue, Termination,
};

/// How consecutive occurrences are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(u32),
    Months(u32),
}

/// What an expansion will do with a given rule.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan<'a> {
    /// The rule does not repeat: the anchor is returned as-is.
    Unchanged,
    /// Emit the anchor once as a series member, then stop.
    Once,
    Stepped(Step),
    Weekly(&'a CustomRepeatConfig),
}

fn plan(rule: &RecurrenceRule) -> Plan<'_> {
    match (&rule.repeat, &rule.custom) {
        (RepeatValue::None, _) => Plan::Unchanged,
        (RepeatValue::EveryDay, _) => Plan::Stepped(Step::Days(1)),
        (RepeatValue::EveryWeek, _) => Plan::Stepped(Step::Days(7)),
        (RepeatValue::EveryMonth, _) => Plan::Stepped(Step::Months(1)),
        (RepeatValue::Custom(_), Some(config)) => match config.unit {
            RepeatUnit::Day => Plan::Stepped(Step::Days(config.effective_frequency())),
            RepeatUnit::Month => Plan::Stepped(Step::Months(config.effective_frequency())),
            RepeatUnit::Week => Plan::Weekly(config),
        },
        (RepeatValue::Custom(label), None) => {
            tracing::warn!(repeat = %label, "custom repeat value without a custom config, emitting once");
            Plan::Once
        }
        (RepeatValue::Unrecognized(label), _) => {
            tracing::warn!(repeat = %label, "unrecognized repeat value, emitting once");
            Plan::Once
        }
    }
}

/// Expand `anchor` under `rule` and `termination`, numbering from zero.
///
/// The anchor's duration is preserved on every occurrence. Every emitted
/// occurrence has `is_recurring = true` and carries `rule`/`termination` in
/// its own fields. When `rule` does not repeat, the anchor is returned
/// unchanged as the only element.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use series_engine::{expand, ExpansionLimits, Occurrence, OccurrenceId};
/// use series_engine::{RecurrenceRule, RepeatValue, Termination};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let anchor = Occurrence::new(OccurrenceId::new("standup").unwrap(), start, end).unwrap();
///
/// let series = expand(
///     &anchor,
///     &RecurrenceRule::simple(RepeatValue::EveryWeek),
///     Termination::After(3),
///     &ExpansionLimits::default(),
/// );
/// let ids: Vec<String> = series.iter().map(|o| o.id().to_string()).collect();
/// assert_eq!(ids, ["standup-0", "standup-1", "standup-2"]);
/// assert_eq!(series[2].start().to_string(), "2024-01-15 09:00:00");
/// ```
pub fn expand(
    anchor: &Occurrence,
    rule: &RecurrenceRule,
    termination: Termination,
    limits: &ExpansionLimits,
) -> Vec<Occurrence> {
    expand_seeded(anchor, rule, termination, IdSeed::default(), limits)
}

/// Expand `anchor` under its own rule and termination fields.
pub fn expand_occurrence(anchor: &Occurrence, limits: &ExpansionLimits) -> Vec<Occurrence> {
    expand(anchor, &anchor.rule(), anchor.termination(), limits)
}

/// Expand with position numbers starting at `seed`.
///
/// Used when a series is re-expanded after a split, so that new ids do not
/// collide with retained siblings. The series id is the anchor's series id.
pub fn expand_seeded(
    anchor: &Occurrence,
    rule: &RecurrenceRule,
    termination: Termination,
    seed: IdSeed,
    limits: &ExpansionLimits,
) -> Vec<Occurrence> {
    let template = template(anchor, rule, termination);

    let occurrences = match plan(rule) {
        Plan::Unchanged => return vec![anchor.clone()],
        Plan::Once => once(&template, seed),
        Plan::Stepped(step) => expand_stepped(&template, step, termination, seed, limits),
        Plan::Weekly(config) => expand_weekly(&template, config, termination, seed, limits),
    };

    tracing::debug!(
        anchor = %anchor.id(),
        repeat = %rule.repeat,
        count = occurrences.len(),
        "expanded series"
    );
    occurrences
}

/// The anchor with the rule applied; every emission is a copy of it.
fn template(anchor: &Occurrence, rule: &RecurrenceRule, termination: Termination) -> Occurrence {
    let mut template = anchor.clone();
    template.repeat_value = rule.repeat.clone();
    template.custom_repeat_config = rule.custom.clone();
    template.set_termination(termination);
    template.is_recurring = true;
    template
}

fn emit(template: &Occurrence, id: OccurrenceId, start: NaiveDateTime) -> Option<Occurrence> {
    let end = start.checked_add_signed(template.duration())?;
    template.clone().with_id(id).with_times(start, end).ok()
}

fn expand_stepped(
    template: &Occurrence,
    step: Step,
    termination: Termination,
    seed: IdSeed,
    limits: &ExpansionLimits,
) -> Vec<Occurrence> {
    let anchor_start = template.start();
    let (max, bound) = match termination {
        Termination::After(n) => (n.min(limits.max_occurrences), None),
        Termination::OnDate(date) => (limits.max_occurrences, Some(end_of_day(date))),
        Termination::Never => (
            limits.max_occurrences,
            Some(
                anchor_start
                    .checked_add_months(Months::new(limits.never_horizon_months))
                    .unwrap_or(NaiveDateTime::MAX),
            ),
        ),
    };
    if max == 0 || bound.is_some_and(|b| b < anchor_start) {
        return Vec::new();
    }

    let starts: Vec<NaiveDateTime> = match step {
        Step::Days(n) => {
            let rule = format!("FREQ=DAILY;INTERVAL={n}");
            match rule_dates(anchor_start, &rule, bound, max) {
                Some(dates) => dates
                    .into_iter()
                    .map(|date| date.and_time(anchor_start.time()))
                    .collect(),
                None => return once(template, seed),
            }
        }
        Step::Months(n) => month_starts(anchor_start, n, bound, max),
    };

    let mut out = Vec::new();
    for (k, start) in (0u32..).zip(starts).take(max as usize) {
        let Some(position) = seed.first_sequence.checked_add(k) else {
            tracing::warn!(series = %template.series_id(), "sequence positions exhausted, stopping");
            break;
        };
        let id = OccurrenceId::sequence(template.series_id(), position);
        match emit(template, id, start) {
            Some(occurrence) => out.push(occurrence),
            None => break,
        }
    }
    out
}

/// Month steps are computed from the origin rather than cumulatively so
/// clamping does not drift (Jan 31 → Feb 29 → Mar 31). RRULE would skip the
/// short months instead.
fn month_starts(
    origin: NaiveDateTime,
    months: u32,
    bound: Option<NaiveDateTime>,
    max: u32,
) -> Vec<NaiveDateTime> {
    (0..max)
        .map_while(|k| origin.checked_add_months(Months::new(months.checked_mul(k)?)))
        .take_while(|start| bound.map_or(true, |b| *start <= b))
        .collect()
}

fn expand_weekly(
    template: &Occurrence,
    config: &CustomRepeatConfig,
    termination: Termination,
    seed: IdSeed,
    limits: &ExpansionLimits,
) -> Vec<Occurrence> {
    if config.days.is_empty() {
        return Vec::new();
    }
    let frequency = config.effective_frequency();
    let anchor_date = template.start().date();
    let time_of_day = template.start().time();
    let first_week_start = sunday_of(anchor_date);

    let (max, week_limit, bound) = match termination {
        Termination::After(n) => (n.min(limits.max_occurrences), None, None),
        Termination::OnDate(date) => (limits.max_occurrences, None, Some(end_of_day(date))),
        Termination::Never => {
            let cap = limits.custom_never_cap.min(limits.max_occurrences);
            (cap, Some(cap.saturating_mul(frequency)), None)
        }
    };
    if max == 0 || bound.is_some_and(|b| b < template.start()) {
        return Vec::new();
    }

    let by_day: Vec<&str> = config.days.iter().map(|day| &day.code()[..2]).collect();
    let rule = format!(
        "FREQ=WEEKLY;INTERVAL={frequency};WKST=SU;BYDAY={}",
        by_day.join(",")
    );
    // One extra date in case DTSTART itself is not a selected day.
    let Some(dates) = rule_dates(template.start(), &rule, bound, max.saturating_add(1)) else {
        return once(template, seed);
    };

    let mut out: Vec<Occurrence> = Vec::new();
    for date in dates {
        let day = DayCode::from(date.weekday());
        if date < anchor_date || !config.days.contains(&day) {
            continue;
        }
        let week = u32::try_from((date - first_week_start).num_days() / 7).unwrap_or(u32::MAX);
        if week_limit.is_some_and(|limit| week >= limit) {
            break;
        }
        let Some(position) = seed.first_week.checked_add(week) else {
            tracing::warn!(series = %template.series_id(), "week positions exhausted, stopping");
            break;
        };
        let id = OccurrenceId::week(template.series_id(), position, day);
        if let Some(occurrence) = emit(template, id, date.and_time(time_of_day)) {
            out.push(occurrence);
        }
        if out.len() as u32 >= max {
            break;
        }
    }
    out
}

/// Dates produced by `rule` from `start`, up to `limit` of them and none
/// after `bound`. `None` when the rule is rejected.
fn rule_dates(
    start: NaiveDateTime,
    rule: &str,
    bound: Option<NaiveDateTime>,
    limit: u32,
) -> Option<Vec<NaiveDate>> {
    let source = format!("DTSTART:{}Z\nRRULE:{}", start.format("%Y%m%dT%H%M%S"), rule);
    let set: RRuleSet = match source.parse() {
        Ok(set) => set,
        Err(err) => {
            tracing::warn!(rule, error = %err, "recurrence rule rejected, emitting once");
            return None;
        }
    };

    let tz: rrule::Tz = Utc.into();
    let set = match bound.and_then(|b| b.checked_add_signed(Duration::seconds(1))) {
        Some(until) => set.before(until.and_utc().with_timezone(&tz)),
        None => set,
    };
    let result = set.all(u16::try_from(limit).unwrap_or(u16::MAX));
    Some(
        result
            .dates
            .iter()
            .map(|dt| dt.naive_utc())
            .take_while(|at| bound.map_or(true, |b| *at <= b))
            .map(|at| at.date())
            .collect(),
    )
}

/// The anchor emitted once as the first member of its series.
fn once(template: &Occurrence, seed: IdSeed) -> Vec<Occurrence> {
    emit(
        template,
        OccurrenceId::sequence(template.series_id(), seed.first_sequence),
        template.start(),
    )
    .into_iter()
    .collect()
}

/// The Sunday on or before `date`.
pub fn sunday_of(date: NaiveDate) -> NaiveDate {
    let back = DayCode::from(date.weekday()).days_from_sunday();
    date - Duration::days(i64::from(back))
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}
