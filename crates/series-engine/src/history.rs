//! Linear snapshot history for undo/redo.
//!
//! Every completed user action pushes one full snapshot. Undo and redo move
//! a cursor over the snapshots; pushing after an undo discards the branch
//! that could have been redone.

/// Snapshot list plus cursor.
///
/// The stack is never empty: it is created with an initial snapshot, and the
/// cursor always points at the snapshot currently shown.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    snapshots: Vec<T>,
    cursor: usize,
    limit: usize,
}

impl<T> HistoryStack<T> {
    /// A history holding only `initial`, without a depth limit.
    pub fn new(initial: T) -> Self {
        Self::with_limit(initial, usize::MAX)
    }

    /// A history that keeps at most `limit` snapshots (minimum 1).
    pub fn with_limit(initial: T, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new snapshot after the cursor.
    ///
    /// Snapshots after the cursor (the redo branch) are discarded first.
    /// When the limit is exceeded the oldest snapshots are dropped.
    pub fn push(&mut self, snapshot: T) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.limit {
            let excess = self.snapshots.len() - self.limit;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
        tracing::trace!(cursor = self.cursor, len = self.snapshots.len(), "history push");
    }

    /// Step back one snapshot. Returns `None` (and does nothing) at the start.
    pub fn undo(&mut self) -> Option<&T> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        tracing::debug!(cursor = self.cursor, "undo");
        self.snapshots.get(self.cursor)
    }

    /// Step forward one snapshot. Returns `None` (and does nothing) at the end.
    pub fn redo(&mut self) -> Option<&T> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "redo");
        self.snapshots.get(self.cursor)
    }

    pub fn current(&self) -> &T {
        &self.snapshots[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_then_redo_restores() {
        let mut h = HistoryStack::new(vec![]);
        h.push(vec!["s0"]);
        h.push(vec!["s0", "s1"]);
        assert_eq!(h.undo(), Some(&vec!["s0"]));
        assert_eq!(h.redo(), Some(&vec!["s0", "s1"]));
        assert_eq!(h.current(), &vec!["s0", "s1"]);
    }

    #[test]
    fn test_push_after_undo_discards_redo_branch() {
        let mut h = HistoryStack::new(0);
        h.push(1);
        h.push(2);
        h.undo();
        h.push(3);
        assert!(!h.can_redo());
        assert_eq!(h.redo(), None);
        assert_eq!(h.current(), &3);
        assert_eq!(h.undo(), Some(&1));
        assert_eq!(h.undo(), Some(&0));
    }

    #[test]
    fn test_moving_past_either_end_is_noop() {
        let mut h = HistoryStack::new("a");
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.cursor(), 0);
        h.push("b");
        assert_eq!(h.redo(), None);
        assert_eq!(h.cursor(), 1);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut h = HistoryStack::with_limit(0, 3);
        for i in 1..=5 {
            h.push(i);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.current(), &5);
        assert_eq!(h.undo(), Some(&4));
        assert_eq!(h.undo(), Some(&3));
        assert_eq!(h.undo(), None);
    }

    #[test]
    fn test_can_undo_can_redo() {
        let mut h = HistoryStack::new(());
        assert!(!h.can_undo());
        h.push(());
        assert!(h.can_undo());
        h.undo();
        assert!(h.can_redo());
        assert!(!h.is_empty());
    }
}
