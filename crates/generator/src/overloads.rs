//! Default parameter set selection
//!
//! Candidates are folded through [`DefaultSetSelector`]; the set with the
//! fewest mandatory parameters wins, then the one with the fewest parameters,
//! then the one offered first.

/// Parameter counts of one parameter set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCandidate {
    pub name: String,
    pub mandatory: usize,
    pub total: usize,
}

impl SetCandidate {
    pub fn new(name: impl Into<String>, mandatory: usize, total: usize) -> Self {
        Self {
            name: name.into(),
            mandatory,
            total,
        }
    }

    fn beats(&self, other: &SetCandidate) -> bool {
        (self.mandatory, self.total) < (other.mandatory, other.total)
    }
}

/// Accumulator holding the best candidate seen so far
#[derive(Debug, Clone, Default)]
pub struct DefaultSetSelector {
    best: Option<SetCandidate>,
}

impl DefaultSetSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the accumulator after considering one more candidate
    pub fn offer(self, candidate: SetCandidate) -> Self {
        let best = match self.best {
            Some(best) if !candidate.beats(&best) => best,
            _ => candidate,
        };
        Self { best: Some(best) }
    }

    pub fn selected(&self) -> Option<&SetCandidate> {
        self.best.as_ref()
    }

    pub fn into_selected(self) -> Option<SetCandidate> {
        self.best
    }
}

/// Pick the default among candidates; `None` when there are none
pub fn select_default<I>(candidates: I) -> Option<SetCandidate>
where
    I: IntoIterator<Item = SetCandidate>,
{
    candidates
        .into_iter()
        .fold(DefaultSetSelector::new(), DefaultSetSelector::offer)
        .into_selected()
}
