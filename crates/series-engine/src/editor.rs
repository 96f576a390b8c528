//! Split-on-edit: apply an edited occurrence to a collection.
//!
//! An edit is either scoped to the single occurrence (`Single`) or to the
//! occurrence and every later member of its series (`AllFuture`). The
//! latter splits the series at the edit point: siblings before it are kept
//! exactly as they were, and everything from it onward is regenerated from
//! the edited occurrence and its (possibly new) rule.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::ExpansionLimits;
use crate::expander::expand_seeded;
use crate::identity::{IdSeed, OccurrenceId};
use crate::occurrence::Occurrence;

/// How far an edit or deletion reaches inside a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditScope {
    /// This occurrence only.
    Single,
    /// This occurrence and every later one in the same series.
    AllFuture,
}

/// Apply `edited` to `collection` under `scope`, returning the new collection.
///
/// - `Single` replaces the record whose id equals `edited`'s id and nothing
///   else. An unknown id leaves the collection unchanged.
/// - `AllFuture` removes `edited`'s own record and every same-series record
///   starting at or after `edited.start()`, then appends a fresh expansion
///   anchored at `edited`. Earlier siblings are untouched. New ids are
///   numbered after the highest position still held by those siblings.
///
/// A non-repeating `edited` is always applied as `Single`. If the fresh
/// expansion produces nothing (an `On Date` bound before the edit), the
/// edited record is written back in place so the edit is not lost.
pub fn apply_edit(
    collection: &[Occurrence],
    edited: &Occurrence,
    scope: EditScope,
    limits: &ExpansionLimits,
) -> Vec<Occurrence> {
    if scope == EditScope::Single || edited.repeat_value.is_none() {
        return replace_single(collection, edited);
    }

    let series_id = edited.series_id();
    let cutoff = edited.start();

    let (retained, removed): (Vec<&Occurrence>, Vec<&Occurrence>) =
        collection.iter().partition(|o| {
            o.series_id() != series_id || (o.start() < cutoff && o.id() != edited.id())
        });

    let taken: HashSet<&OccurrenceId> = retained
        .iter()
        .filter(|o| o.series_id() == series_id)
        .map(|o| o.id())
        .collect();
    let seed = IdSeed::after(taken.iter().copied());
    // a saturated seed can land on a retained position
    let future: Vec<Occurrence> =
        expand_seeded(edited, &edited.rule(), edited.termination(), seed, limits)
            .into_iter()
            .filter(|o| o.start() >= cutoff && !taken.contains(o.id()))
            .collect();

    tracing::debug!(
        series = %series_id,
        removed = removed.len(),
        generated = future.len(),
        "split series for future edit"
    );

    let mut out: Vec<Occurrence> = retained.into_iter().cloned().collect();
    if future.is_empty() {
        out.push(edited.clone());
    } else {
        out.extend(future);
    }
    out
}

fn replace_single(collection: &[Occurrence], edited: &Occurrence) -> Vec<Occurrence> {
    let mut found = false;
    let out = collection
        .iter()
        .map(|o| {
            if o.id() == edited.id() {
                found = true;
                edited.clone()
            } else {
                o.clone()
            }
        })
        .collect();
    if !found {
        tracing::debug!(id = %edited.id(), "edit target not in collection, ignoring");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::expand;
    use crate::identity::{DayCode, OccurrenceId};
    use crate::occurrence::{CustomRepeatConfig, RecurrenceRule, RepeatValue, Termination};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn limits() -> ExpansionLimits {
        ExpansionLimits::default()
    }

    fn daily_series(series: &str, n: u32) -> Vec<Occurrence> {
        let anchor = Occurrence::new(OccurrenceId::new(series).unwrap(), at(1, 9), at(1, 10))
            .unwrap()
            .with_title("standup");
        expand(
            &anchor,
            &RecurrenceRule::simple(RepeatValue::EveryDay),
            Termination::After(n),
            &limits(),
        )
    }

    fn find<'a>(collection: &'a [Occurrence], id: &str) -> Option<&'a Occurrence> {
        collection.iter().find(|o| o.id().to_string() == id)
    }

    // ── single scope ────────────────────────────────────────────────────

    #[test]
    fn test_single_changes_exactly_one() {
        let before = daily_series("s", 5);
        let edited = before[2].clone().with_title("retro");
        let after = apply_edit(&before, &edited, EditScope::Single, &limits());

        assert_eq!(after.len(), before.len());
        for (b, a) in before.iter().zip(&after) {
            if b.id() == edited.id() {
                assert_eq!(a.title, "retro");
                assert!(a.is_recurring);
            } else {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_single_unknown_id_is_noop() {
        let before = daily_series("s", 3);
        let stranger =
            Occurrence::new(OccurrenceId::new("x").unwrap(), at(1, 9), at(1, 10)).unwrap();
        let after = apply_edit(&before, &stranger, EditScope::Single, &limits());
        assert_eq!(after, before);
    }

    #[test]
    fn test_non_repeating_edit_ignores_all_future() {
        let mut before = daily_series("s", 3);
        let single = Occurrence::new(OccurrenceId::new("x").unwrap(), at(2, 9), at(2, 10)).unwrap();
        before.push(single.clone());
        let edited = single.with_title("moved");
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());
        assert_eq!(after.len(), 4);
        assert_eq!(find(&after, "x").unwrap().title, "moved");
    }

    // ── all-future scope ────────────────────────────────────────────────

    #[test]
    fn test_all_future_keeps_past_and_regenerates_future() {
        let mut before = daily_series("s", 5);
        let other = Occurrence::new(OccurrenceId::new("o").unwrap(), at(3, 12), at(3, 13)).unwrap();
        before.push(other.clone());

        let edited = before[2]
            .clone()
            .with_times(at(3, 14), at(3, 15))
            .unwrap()
            .with_title("moved");
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());

        // past siblings untouched
        assert_eq!(find(&after, "s-0"), Some(&before[0]));
        assert_eq!(find(&after, "s-1"), Some(&before[1]));
        // other series untouched
        assert_eq!(find(&after, "o"), Some(&other));

        let future: Vec<_> = after
            .iter()
            .filter(|o| o.series_id() == "s" && o.start() >= at(3, 14))
            .collect();
        // After(5) anchored at the edit: 5 fresh occurrences from Jan 3
        assert_eq!(future.len(), 5);
        assert_eq!(future[0].start(), at(3, 14));
        assert!(future.iter().all(|o| o.title == "moved"));
        // numbered after retained s-0, s-1
        assert_eq!(future[0].id().to_string(), "s-2");

        // old 09:00 occurrences from Jan 3 on are gone
        assert!(after.iter().all(|o| o.start() != at(3, 9)));
    }

    #[test]
    fn test_all_future_ids_stay_unique() {
        let before = daily_series("s", 6);
        let edited = before[3].clone().with_title("x");
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());
        let mut ids: Vec<String> = after.iter().map(|o| o.id().to_string()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_all_future_moved_later_does_not_duplicate_edited() {
        let before = daily_series("s", 4);
        // move s-1 (Jan 2) to Jan 2 18:00; s-1 itself must disappear
        let edited = before[1].clone().with_times(at(2, 18), at(2, 19)).unwrap();
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());
        assert!(after.iter().all(|o| o.start() != at(2, 9)));
        assert_eq!(find(&after, "s-0"), Some(&before[0]));
    }

    #[test]
    fn test_all_future_with_new_custom_rule() {
        let before = daily_series("s", 10);
        let mut edited = before[4].clone(); // Friday 2024-01-05
        edited.repeat_value = RepeatValue::from("Custom: Every 1 week on Monday");
        edited.custom_repeat_config = Some(CustomRepeatConfig::weekly(1, [DayCode::Mon]));
        edited.set_termination(Termination::After(2));

        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());
        let series: Vec<_> = after.iter().filter(|o| o.series_id() == "s").collect();
        // 4 retained dailies + 2 Mondays (Jan 8, Jan 15); the anchor's
        // Sunday-aligned week 0 holds no Monday on or after Jan 5
        assert_eq!(series.len(), 6);
        assert_eq!(series[4].id().to_string(), "s-1-MON");
        assert_eq!(series[4].start(), at(8, 9));
        assert_eq!(series[5].start(), at(15, 9));
    }

    #[test]
    fn test_first_rule_on_standalone_event() {
        let base = Occurrence::new(OccurrenceId::new("b").unwrap(), at(1, 9), at(1, 10)).unwrap();
        let edited = base
            .clone()
            .with_rule(RecurrenceRule::simple(RepeatValue::EveryWeek), Termination::After(3));
        let after = apply_edit(&[base], &edited, EditScope::AllFuture, &limits());
        let ids: Vec<String> = after.iter().map(|o| o.id().to_string()).collect();
        assert_eq!(ids, ["b-0", "b-1", "b-2"]);
    }

    #[test]
    fn test_empty_expansion_keeps_edit() {
        let before = daily_series("s", 3);
        let mut edited = before[2].clone().with_title("kept");
        edited.set_termination(Termination::OnDate(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()));
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());
        assert_eq!(after.len(), 3);
        assert_eq!(find(&after, "s-2").unwrap().title, "kept");
    }

    #[test]
    fn test_all_future_at_position_limit_does_not_overflow() {
        let first = Occurrence::new(
            OccurrenceId::sequence("s", u32::MAX),
            at(1, 9),
            at(1, 10),
        )
        .unwrap()
        .with_rule(RecurrenceRule::simple(RepeatValue::EveryDay), Termination::After(3));
        let second = first
            .clone()
            .with_id(OccurrenceId::sequence("s", 5))
            .with_times(at(2, 9), at(2, 10))
            .unwrap();
        let before = vec![first.clone(), second.clone()];

        let edited = second.with_title("late");
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits());

        assert_eq!(after.len(), 2);
        assert_eq!(after[0], first);
        assert_eq!(after[1].id().to_string(), "s-5");
        assert_eq!(after[1].title, "late");
    }
}
