use std::collections::HashMap;

use crate::model::SequenceType;

/// Which sequence types have their alignment strand honored.
///
/// Strand is meaningful only for single-strand hybridization chemistry
/// (oligo and Affymetrix probes/targets). Other types, and sequences with
/// no declared type, ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandPolicy {
    table: HashMap<SequenceType, bool>,
    untyped: bool,
}

impl Default for StrandPolicy {
    fn default() -> Self {
        let table = [
            (SequenceType::Oligo, true),
            (SequenceType::AffyCollapsed, true),
            (SequenceType::AffyProbe, true),
            (SequenceType::AffyTarget, true),
            (SequenceType::Est, false),
            (SequenceType::Mrna, false),
            (SequenceType::Dna, false),
            (SequenceType::Other, false),
        ]
        .into_iter()
        .collect();
        Self {
            table,
            untyped: false,
        }
    }
}

impl StrandPolicy {
    /// A policy that never uses strand.
    pub fn ignore_all() -> Self {
        Self {
            table: HashMap::new(),
            untyped: false,
        }
    }

    /// Override the entry for one sequence type.
    pub fn with(mut self, sequence_type: SequenceType, uses_strand: bool) -> Self {
        self.table.insert(sequence_type, uses_strand);
        self
    }

    /// Whether hits of a sequence of this type should be matched by strand.
    pub fn uses_strand(&self, sequence_type: Option<SequenceType>) -> bool {
        match sequence_type {
            Some(t) => self.table.get(&t).copied().unwrap_or(false),
            None => self.untyped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(SequenceType::Oligo), true)]
    #[case(Some(SequenceType::AffyCollapsed), true)]
    #[case(Some(SequenceType::AffyProbe), true)]
    #[case(Some(SequenceType::AffyTarget), true)]
    #[case(Some(SequenceType::Est), false)]
    #[case(Some(SequenceType::Mrna), false)]
    #[case(Some(SequenceType::Dna), false)]
    #[case(None, false)]
    fn test_default_table(#[case] sequence_type: Option<SequenceType>, #[case] expected: bool) {
        assert_eq!(StrandPolicy::default().uses_strand(sequence_type), expected);
    }

    #[test]
    fn test_override() {
        let policy = StrandPolicy::default().with(SequenceType::Est, true);
        assert!(policy.uses_strand(Some(SequenceType::Est)));
        assert!(!StrandPolicy::ignore_all().uses_strand(Some(SequenceType::Oligo)));
    }
}
