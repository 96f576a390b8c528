//! Property tests for expansion, split-on-edit, deletion, history and drag
//! clamping.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use proptest::prelude::*;

use series_engine::{
    apply_delete, apply_edit, expand, CustomRepeatConfig, DayCode, DragResizeController,
    EditScope, ExpansionLimits, GestureKind, GridConfig, HistoryStack, Occurrence, OccurrenceId,
    PointerPosition, RecurrenceRule, RepeatValue, Termination, TimeGrid,
};

// ── strategies ──────────────────────────────────────────────────────────────

/// An anchor start between 2000 and 2040 at a whole hour before 22:00.
fn arb_start() -> impl Strategy<Value = NaiveDateTime> {
    (2000i32..2040, 1u32..=12, 1u32..=28, 0u32..22).prop_map(|(y, m, d, h)| {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    })
}

fn arb_anchor() -> impl Strategy<Value = Occurrence> {
    (arb_start(), 15i64..=240).prop_map(|(start, minutes)| {
        Occurrence::new(
            OccurrenceId::new("series").unwrap(),
            start,
            start + Duration::minutes(minutes),
        )
        .unwrap()
    })
}

fn daily(anchor: &Occurrence, n: u32) -> Vec<Occurrence> {
    expand(
        anchor,
        &RecurrenceRule::simple(RepeatValue::EveryDay),
        Termination::After(n),
        &ExpansionLimits::default(),
    )
}

// ── expansion ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_day_after_n_is_n_days_apart(anchor in arb_anchor(), n in 1u32..=120) {
        let series = daily(&anchor, n);
        prop_assert_eq!(series.len(), n as usize);
        prop_assert_eq!(series[0].start(), anchor.start());
        for pair in series.windows(2) {
            prop_assert_eq!(pair[1].start() - pair[0].start(), Duration::days(1));
        }
        for occurrence in &series {
            prop_assert_eq!(occurrence.duration(), anchor.duration());
            prop_assert!(occurrence.is_recurring);
        }
    }

    #[test]
    fn custom_mwf_after_six(anchor in arb_anchor()) {
        let rule = RecurrenceRule::custom(
            "Custom: Every 1 week on Monday, Wednesday, Friday",
            CustomRepeatConfig::weekly(1, [DayCode::Mon, DayCode::Wed, DayCode::Fri]),
        );
        let series = expand(&anchor, &rule, Termination::After(6), &ExpansionLimits::default());
        prop_assert_eq!(series.len(), 6);
        for occurrence in &series {
            let weekday = occurrence.start().weekday();
            prop_assert!(matches!(weekday, Weekday::Mon | Weekday::Wed | Weekday::Fri));
            prop_assert!(occurrence.start().date() >= anchor.start().date());
        }
        for pair in series.windows(2) {
            prop_assert!(pair[0].start() < pair[1].start());
        }
    }

    #[test]
    fn ids_are_unique_within_an_expansion(anchor in arb_anchor(), n in 1u32..=60) {
        let series = daily(&anchor, n);
        let mut ids: Vec<String> = series.iter().map(|o| o.id().to_string()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), series.len());
    }
}

// ── editing ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn single_edit_touches_one_record(
        anchor in arb_anchor(),
        n in 2u32..=30,
        pick in any::<prop::sample::Index>(),
        title in "[a-z]{1,12}",
    ) {
        let before = daily(&anchor, n);
        let target = pick.get(&before).clone();
        let edited = target.clone().with_title(title);
        let after = apply_edit(&before, &edited, EditScope::Single, &ExpansionLimits::default());

        prop_assert_eq!(after.len(), before.len());
        for (b, a) in before.iter().zip(&after) {
            if b.id() == target.id() {
                prop_assert_eq!(a, &edited);
            } else {
                prop_assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn all_future_edit_keeps_past_and_matches_expand(
        anchor in arb_anchor(),
        n in 2u32..=30,
        pick in any::<prop::sample::Index>(),
        shift_hours in -3i64..=3,
    ) {
        let limits = ExpansionLimits::default();
        let before = daily(&anchor, n);
        let target = pick.get(&before).clone();
        let start = target.start() + Duration::hours(shift_hours);
        let edited = target.clone().with_times(start, start + target.duration()).unwrap();
        let after = apply_edit(&before, &edited, EditScope::AllFuture, &limits);

        let cutoff = edited.start();
        let past_before: Vec<&Occurrence> = before
            .iter()
            .filter(|o| o.start() < cutoff && o.id() != edited.id())
            .collect();
        let past_after: Vec<&Occurrence> = after.iter().filter(|o| o.start() < cutoff).collect();
        prop_assert_eq!(past_after, past_before);

        let expected: Vec<NaiveDateTime> = expand(&edited, &edited.rule(), edited.termination(), &limits)
            .iter()
            .map(|o| o.start())
            .filter(|s| *s >= cutoff)
            .collect();
        let future: Vec<NaiveDateTime> = after
            .iter()
            .map(|o| o.start())
            .filter(|s| *s >= cutoff)
            .collect();
        prop_assert_eq!(future, expected);
    }

    #[test]
    fn all_future_delete_splits_at_target(
        anchor in arb_anchor(),
        n in 1u32..=30,
        pick in any::<prop::sample::Index>(),
    ) {
        let before = daily(&anchor, n);
        let target = pick.get(&before).clone();
        let after = apply_delete(&before, target.id(), EditScope::AllFuture);

        prop_assert!(after.iter().all(|o| o.start() < target.start()));
        let kept = before.iter().filter(|o| o.start() < target.start()).count();
        prop_assert_eq!(after.len(), kept);
    }
}

// ── history ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn undo_redo_round_trip(s0 in prop::collection::vec(any::<u32>(), 0..8),
                            s1 in prop::collection::vec(any::<u32>(), 0..8),
                            s2 in prop::collection::vec(any::<u32>(), 0..8)) {
        let mut history = HistoryStack::new(Vec::new());
        history.push(s0.clone());
        history.push(s1.clone());
        prop_assert_eq!(history.undo(), Some(&s0));
        prop_assert_eq!(history.redo(), Some(&s1));

        history.undo();
        history.push(s2.clone());
        prop_assert!(!history.can_redo());
        prop_assert_eq!(history.current(), &s2);
        prop_assert_eq!(history.undo(), Some(&s0));
    }
}

// ── drag ────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn top_resize_never_reaches_end(
        start_hour in 0u32..20,
        length in 1u32..4,
        dy in -1500.0f64..1500.0,
    ) {
        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let start = day.and_hms_opt(start_hour, 0, 0).unwrap();
        let end = start + Duration::hours(i64::from(length));
        let occurrence = Occurrence::new(OccurrenceId::new("e").unwrap(), start, end).unwrap();

        let mut controller = DragResizeController::new(TimeGrid::new(&GridConfig::default(), 700.0));
        let origin = PointerPosition::new(10.0, f64::from(start_hour) * 50.0);
        controller.pointer_down(&occurrence, GestureKind::ResizeTop, origin);
        let frame = controller.pointer_move(PointerPosition::new(10.0, origin.y + dy));

        let hours = (dy / 50.0).round() as i64;
        let target = i64::from(start_hour) + hours;
        if target >= i64::from(start_hour + length) || !(0..24).contains(&target) {
            prop_assert_eq!(&frame, &None);
        }
        if let Some(change) = frame {
            prop_assert!(change.start < change.end);
            prop_assert_eq!(change.end, end);
        }
    }
}
