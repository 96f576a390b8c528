//! Series-aware deletion.

use crate::editor::EditScope;
use crate::identity::{is_future_sibling, OccurrenceId};
use crate::occurrence::Occurrence;

/// Delete `id` from `collection` under `scope`, returning the new collection.
///
/// - `Single` removes exactly the record with that id.
/// - `AllFuture` removes every record of the target's series starting at or
///   after the target, keeping earlier siblings. A target that is not part
///   of a series is removed alone.
///
/// Deleting an id that is not in the collection is a no-op.
pub fn apply_delete(
    collection: &[Occurrence],
    id: &OccurrenceId,
    scope: EditScope,
) -> Vec<Occurrence> {
    let Some(target) = collection.iter().find(|o| o.id() == id) else {
        tracing::debug!(id = %id, "delete target not in collection, ignoring");
        return collection.to_vec();
    };

    let out: Vec<Occurrence> = match scope {
        EditScope::AllFuture if target.belongs_to_series() => {
            let series_id = target.series_id();
            let cutoff = target.start();
            collection
                .iter()
                .filter(|o| !is_future_sibling(o, series_id, cutoff))
                .cloned()
                .collect()
        }
        _ => collection.iter().filter(|o| o.id() != id).cloned().collect(),
    };

    tracing::debug!(
        id = %id,
        ?scope,
        removed = collection.len() - out.len(),
        "deleted occurrences"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpansionLimits;
    use crate::expander::expand;
    use crate::occurrence::{RecurrenceRule, RepeatValue, Termination};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn collection() -> Vec<Occurrence> {
        let anchor =
            Occurrence::new(OccurrenceId::new("s").unwrap(), at(1, 9), at(1, 10)).unwrap();
        let mut all = expand(
            &anchor,
            &RecurrenceRule::simple(RepeatValue::EveryDay),
            Termination::After(5),
            &ExpansionLimits::default(),
        );
        all.push(Occurrence::new(OccurrenceId::new("lone").unwrap(), at(4, 12), at(4, 13)).unwrap());
        all
    }

    fn ids(collection: &[Occurrence]) -> Vec<String> {
        collection.iter().map(|o| o.id().to_string()).collect()
    }

    #[test]
    fn test_single_removes_one() {
        let before = collection();
        let after = apply_delete(&before, &"s-2".parse().unwrap(), EditScope::Single);
        assert_eq!(ids(&after), ["s-0", "s-1", "s-3", "s-4", "lone"]);
    }

    #[test]
    fn test_all_future_removes_target_and_later() {
        let before = collection();
        let after = apply_delete(&before, &"s-2".parse().unwrap(), EditScope::AllFuture);
        assert_eq!(ids(&after), ["s-0", "s-1", "lone"]);
        assert_eq!(after[0], before[0]);
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn test_all_future_on_first_removes_whole_series() {
        let before = collection();
        let after = apply_delete(&before, &"s-0".parse().unwrap(), EditScope::AllFuture);
        assert_eq!(ids(&after), ["lone"]);
    }

    #[test]
    fn test_all_future_on_standalone_removes_only_it() {
        let before = collection();
        let after = apply_delete(&before, &"lone".parse().unwrap(), EditScope::AllFuture);
        assert_eq!(ids(&after), ["s-0", "s-1", "s-2", "s-3", "s-4"]);
    }

    #[test]
    fn test_missing_id_is_noop() {
        let before = collection();
        let after = apply_delete(&before, &"nope".parse().unwrap(), EditScope::AllFuture);
        assert_eq!(after, before);
    }

    #[test]
    fn test_single_does_not_match_padded_lookalike() {
        let before: Vec<Occurrence> = ["s-01", "s-1", "t-+3"]
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let day = 1 + i as u32;
                Occurrence::new(raw.parse().unwrap(), at(day, 9), at(day, 10)).unwrap()
            })
            .collect();
        let after = apply_delete(&before, &"s-1".parse().unwrap(), EditScope::Single);
        assert_eq!(ids(&after), ["s-01", "t-+3"]);
    }
}
