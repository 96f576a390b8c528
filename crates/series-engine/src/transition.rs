//! Expand/collapse state for the panel's sections.
//!
//! Each section runs a small state machine:
//!
//! ```text
//! Collapsed --toggle--> Expanding --tick(duration)--> Expanded
//! Expanded  --toggle--> Collapsing --tick(duration)--> Collapsed
//! ```
//!
//! Toggling mid-transition reverses it from the current point. Time only
//! advances through [`SectionTransition::tick`], so nothing here owns a timer.

/// Phase of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionPhase {
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

/// One animated section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTransition {
    phase: SectionPhase,
    elapsed_ms: u64,
    duration_ms: u64,
}

impl SectionTransition {
    pub fn collapsed(duration_ms: u64) -> Self {
        Self {
            phase: SectionPhase::Collapsed,
            elapsed_ms: 0,
            duration_ms,
        }
    }

    pub fn expanded(duration_ms: u64) -> Self {
        Self {
            phase: SectionPhase::Expanded,
            elapsed_ms: 0,
            duration_ms,
        }
    }

    pub fn phase(&self) -> SectionPhase {
        self.phase
    }

    /// Whether the section is open or opening.
    pub fn is_open(&self) -> bool {
        matches!(self.phase, SectionPhase::Expanded | SectionPhase::Expanding)
    }

    /// Whether a transition is still running.
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, SectionPhase::Expanding | SectionPhase::Collapsing)
    }

    /// How open the section is, from `0.0` (collapsed) to `1.0` (expanded).
    pub fn openness(&self) -> f64 {
        let fraction = if self.duration_ms == 0 {
            1.0
        } else {
            self.elapsed_ms as f64 / self.duration_ms as f64
        };
        match self.phase {
            SectionPhase::Collapsed => 0.0,
            SectionPhase::Expanded => 1.0,
            SectionPhase::Expanding => fraction,
            SectionPhase::Collapsing => 1.0 - fraction,
        }
    }

    /// Start opening a closed section or closing an open one.
    pub fn toggle(&mut self) {
        let (phase, elapsed) = match self.phase {
            SectionPhase::Collapsed => (SectionPhase::Expanding, 0),
            SectionPhase::Expanded => (SectionPhase::Collapsing, 0),
            SectionPhase::Expanding => (SectionPhase::Collapsing, self.remaining_ms()),
            SectionPhase::Collapsing => (SectionPhase::Expanding, self.remaining_ms()),
        };
        self.phase = phase;
        self.elapsed_ms = elapsed;
        self.settle();
    }

    /// Begin opening unless already open or opening.
    pub fn open(&mut self) {
        if !self.is_open() {
            self.toggle();
        }
    }

    /// Begin closing unless already closed or closing.
    pub fn close(&mut self) {
        if self.is_open() {
            self.toggle();
        }
    }

    /// Advance the running transition by `elapsed_ms`. Returns the new phase.
    pub fn tick(&mut self, elapsed_ms: u64) -> SectionPhase {
        if self.is_animating() {
            self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
            self.settle();
        }
        self.phase
    }

    fn remaining_ms(&self) -> u64 {
        self.duration_ms.saturating_sub(self.elapsed_ms)
    }

    fn settle(&mut self) {
        if self.elapsed_ms < self.duration_ms {
            return;
        }
        self.elapsed_ms = 0;
        self.phase = match self.phase {
            SectionPhase::Expanding => SectionPhase::Expanded,
            SectionPhase::Collapsing => SectionPhase::Collapsed,
            settled => settled,
        };
    }
}

/// Sections of which at most one is open.
///
/// Opening a section closes whichever other section was open.
#[derive(Debug, Clone)]
pub struct SectionGroup<K> {
    sections: Vec<(K, SectionTransition)>,
}

impl<K: PartialEq + Clone> SectionGroup<K> {
    /// A group of collapsed sections sharing one transition duration.
    pub fn new(keys: impl IntoIterator<Item = K>, duration_ms: u64) -> Self {
        Self {
            sections: keys
                .into_iter()
                .map(|k| (k, SectionTransition::collapsed(duration_ms)))
                .collect(),
        }
    }

    /// Toggle `key`, closing every other section when it opens.
    pub fn toggle(&mut self, key: &K) {
        let opening = self
            .get(key)
            .is_some_and(|section| !section.is_open());
        for (k, section) in &mut self.sections {
            if k == key {
                section.toggle();
            } else if opening {
                section.close();
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&SectionTransition> {
        self.sections.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    /// The section that is open or opening, if any.
    pub fn open_section(&self) -> Option<&K> {
        self.sections
            .iter()
            .find(|(_, s)| s.is_open())
            .map(|(k, _)| k)
    }

    pub fn tick(&mut self, elapsed_ms: u64) {
        for (_, section) in &mut self.sections {
            section.tick(elapsed_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_runs_to_completion() {
        let mut s = SectionTransition::collapsed(300);
        s.toggle();
        assert_eq!(s.phase(), SectionPhase::Expanding);
        assert_eq!(s.tick(100), SectionPhase::Expanding);
        assert!((s.openness() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.tick(200), SectionPhase::Expanded);
        assert_eq!(s.openness(), 1.0);
    }

    #[test]
    fn test_collapse_runs_to_completion() {
        let mut s = SectionTransition::expanded(300);
        s.toggle();
        assert_eq!(s.phase(), SectionPhase::Collapsing);
        assert_eq!(s.tick(500), SectionPhase::Collapsed);
        assert_eq!(s.openness(), 0.0);
    }

    #[test]
    fn test_toggle_mid_transition_reverses() {
        let mut s = SectionTransition::collapsed(300);
        s.toggle();
        s.tick(100);
        s.toggle();
        assert_eq!(s.phase(), SectionPhase::Collapsing);
        assert!((s.openness() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.tick(100), SectionPhase::Collapsed);
    }

    #[test]
    fn test_zero_duration_settles_immediately() {
        let mut s = SectionTransition::collapsed(0);
        s.toggle();
        assert_eq!(s.phase(), SectionPhase::Expanded);
    }

    #[test]
    fn test_tick_when_settled_is_noop() {
        let mut s = SectionTransition::collapsed(300);
        assert_eq!(s.tick(1000), SectionPhase::Collapsed);
    }

    #[test]
    fn test_group_keeps_one_open() {
        let mut g = SectionGroup::new(["details", "datetime"], 300);
        g.toggle(&"details");
        g.tick(300);
        assert_eq!(g.open_section(), Some(&"details"));

        g.toggle(&"datetime");
        assert_eq!(g.get(&"details").unwrap().phase(), SectionPhase::Collapsing);
        g.tick(300);
        assert_eq!(g.open_section(), Some(&"datetime"));
        assert_eq!(g.get(&"details").unwrap().phase(), SectionPhase::Collapsed);

        g.toggle(&"datetime");
        g.tick(300);
        assert_eq!(g.open_section(), None);
    }
}
