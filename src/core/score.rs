use crate::core::provenance::{DataProcessingStep, Software};
use crate::registry::{Handle, Identified};

/// A named metric attached to results, with its orientation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScoreType {
    pub name: String,

    /// Whether larger values indicate better results
    pub higher_better: bool,

    /// Software that defines this score, if known
    pub software: Option<Handle<Software>>,
}

impl ScoreType {
    pub fn new(name: impl Into<String>, higher_better: bool) -> Self {
        Self {
            name: name.into(),
            higher_better,
            software: None,
        }
    }

    #[must_use]
    pub fn with_software(mut self, software: Handle<Software>) -> Self {
        self.software = Some(software);
        self
    }

    /// Compare two values under this score type's orientation
    #[must_use]
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        is_better_score(a, b, self.higher_better)
    }
}

impl Identified for ScoreType {
    type Key = (String, Option<Handle<Software>>);

    fn identity_key(&self) -> Self::Key {
        (self.name.clone(), self.software)
    }
}

/// Is `a` strictly better than `b`?
#[must_use]
pub fn is_better_score(a: f64, b: f64, higher_better: bool) -> bool {
    if higher_better {
        a > b
    } else {
        a < b
    }
}

/// Scores of one result, at most one value per score type
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreList {
    entries: Vec<(Handle<ScoreType>, f64)>,
}

impl ScoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a score type; a later value replaces an earlier one
    pub fn set(&mut self, score_type: Handle<ScoreType>, value: f64) {
        match self.entries.iter_mut().find(|(st, _)| *st == score_type) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((score_type, value)),
        }
    }

    #[must_use]
    pub fn get(&self, score_type: Handle<ScoreType>) -> Option<f64> {
        self.entries
            .iter()
            .find(|(st, _)| *st == score_type)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<ScoreType>, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Handle<ScoreType>, f64)> for ScoreList {
    fn from_iter<I: IntoIterator<Item = (Handle<ScoreType>, f64)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (score_type, value) in iter {
            list.set(score_type, value);
        }
        list
    }
}

/// Scores and provenance shared by every primary result
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoredProcessingResult {
    pub scores: ScoreList,

    /// Processing steps that produced or touched this result, in order
    pub processing_steps: Vec<Handle<DataProcessingStep>>,
}

impl ScoredProcessingResult {
    /// Record a processing step unless it is already listed
    pub fn add_processing_step(&mut self, step: Handle<DataProcessingStep>) {
        if !self.processing_steps.contains(&step) {
            self.processing_steps.push(step);
        }
    }
}

/// Access to the scored part of an entity
pub trait Scored {
    fn result(&self) -> &ScoredProcessingResult;

    fn result_mut(&mut self) -> &mut ScoredProcessingResult;

    fn score(&self, score_type: Handle<ScoreType>) -> Option<f64> {
        self.result().scores.get(score_type)
    }
}

/// Implements [`Scored`] for a struct with a `result` field
macro_rules! impl_scored {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::core::score::Scored for $ty {
                fn result(&self) -> &$crate::core::score::ScoredProcessingResult {
                    &self.result
                }

                fn result_mut(&mut self) -> &mut $crate::core::score::ScoredProcessingResult {
                    &mut self.result
                }
            }
        )+
    };
}

pub(crate) use impl_scored;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_is_better_score_orientation() {
        assert!(is_better_score(0.95, 0.9, true));
        assert!(!is_better_score(0.9, 0.95, true));
        assert!(is_better_score(0.8, 0.9, false));
        assert!(!is_better_score(0.9, 0.9, false));
    }

    #[test]
    fn test_score_list_last_write_wins() {
        let mut types = Registry::new();
        let (a, _) = types.insert_or_get(ScoreType::new("a", true));
        let (b, _) = types.insert_or_get(ScoreType::new("b", false));

        let mut scores = ScoreList::new();
        scores.set(a, 1.0);
        scores.set(b, 2.0);
        scores.set(a, 3.0);

        assert_eq!(scores.len(), 2);
        assert_eq!(scores.get(a), Some(3.0));
        assert_eq!(scores.get(b), Some(2.0));
    }

    #[test]
    fn test_processing_step_recorded_once() {
        let mut software = Registry::new();
        let (sw, _) = software.insert_or_get(Software::new("tool", "1"));
        let mut steps = Registry::new();
        let (step, _) = steps.insert_or_get(DataProcessingStep::new(sw));

        let mut result = ScoredProcessingResult::default();
        result.add_processing_step(step);
        result.add_processing_step(step);
        assert_eq!(result.processing_steps, vec![step]);
    }
}
