//! Offline graph validation of a catalog.
//!
//! Runs before content is published, never on the request path. Errors make a
//! catalog unpublishable; warnings point at content a writer probably did not
//! intend but which the engine tolerates.
//!
//! Only active fragments take part: inactive ones are invisible to the engine,
//! so their choices are never offered and they cannot be reached.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use diana_core::model::{ChoiceId, ClueId, FragmentId};
use serde::Serialize;
use thiserror::Error;

use super::catalog::{Catalog, FragmentEntry};

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("fragment at position {position} has a blank id")]
    BlankFragmentId { position: usize },

    #[error("fragment {fragment_id} has a choice with a blank id at position {position}")]
    BlankChoiceId {
        fragment_id: FragmentId,
        position: usize,
    },

    #[error("fragment id {fragment_id} is used more than once")]
    DuplicateFragment { fragment_id: FragmentId },

    #[error("choice id {choice_id} is used more than once in fragment {fragment_id}")]
    DuplicateChoice {
        fragment_id: FragmentId,
        choice_id: ChoiceId,
    },

    #[error(
        "choice {choice_id} on fragment {fragment_id} points to {next_fragment_id}, which is missing or inactive"
    )]
    DanglingNext {
        fragment_id: FragmentId,
        choice_id: ChoiceId,
        next_fragment_id: FragmentId,
    },

    #[error("fragment {fragment_id} cannot be reached from the entry fragment")]
    Unreachable { fragment_id: FragmentId },

    #[error("fragment {fragment_id} requires clue {clue} but no choice unlocks it")]
    UnobtainableClue {
        fragment_id: FragmentId,
        clue: ClueId,
    },

    #[error("catalog has no active fragments")]
    EmptyCatalog,
}

/// Findings for one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Defects that block publishing.
    pub errors: Vec<ValidationIssue>,
    /// Suspicious content that does not block publishing.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns `true` if the catalog may be published.
    #[must_use]
    pub fn is_publishable(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every error message joined into one line.
    #[must_use]
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Checks a catalog's fragment graph.
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_identifiers(catalog, &mut report);

    let active: Vec<&FragmentEntry> = catalog.fragments.iter().filter(|f| f.active).collect();
    if active.is_empty() {
        report.warnings.push(ValidationIssue::EmptyCatalog);
        return report;
    }

    let active_ids: HashSet<&FragmentId> = active.iter().map(|f| &f.id).collect();
    for fragment in &active {
        for choice in &fragment.choices {
            if let Some(next) = &choice.next {
                if !active_ids.contains(next) {
                    report.errors.push(ValidationIssue::DanglingNext {
                        fragment_id: fragment.id.clone(),
                        choice_id: choice.id.clone(),
                        next_fragment_id: next.clone(),
                    });
                }
            }
        }
    }

    check_reachability(&active, &mut report);
    check_clues(&active, &mut report);
    report
}

fn check_identifiers(catalog: &Catalog, report: &mut ValidationReport) {
    let mut seen_fragments = HashSet::new();
    for (position, fragment) in catalog.fragments.iter().enumerate() {
        if fragment.id.is_blank() {
            report
                .errors
                .push(ValidationIssue::BlankFragmentId { position });
        } else if !seen_fragments.insert(&fragment.id) {
            report.errors.push(ValidationIssue::DuplicateFragment {
                fragment_id: fragment.id.clone(),
            });
        }

        let mut seen_choices = HashSet::new();
        for (position, choice) in fragment.choices.iter().enumerate() {
            if choice.id.is_blank() {
                report.errors.push(ValidationIssue::BlankChoiceId {
                    fragment_id: fragment.id.clone(),
                    position,
                });
            } else if !seen_choices.insert(&choice.id) {
                report.errors.push(ValidationIssue::DuplicateChoice {
                    fragment_id: fragment.id.clone(),
                    choice_id: choice.id.clone(),
                });
            }
        }
    }
}

/// Breadth-first walk from the entry fragment (the first active one).
fn check_reachability(active: &[&FragmentEntry], report: &mut ValidationReport) {
    let by_id: HashMap<&FragmentId, &FragmentEntry> = active.iter().map(|f| (&f.id, *f)).collect();
    let mut reached: HashSet<&FragmentId> = HashSet::new();
    let mut queue = VecDeque::new();
    reached.insert(&active[0].id);
    queue.push_back(active[0]);

    while let Some(fragment) = queue.pop_front() {
        for next in fragment.choices.iter().filter_map(|c| c.next.as_ref()) {
            if let Some(target) = by_id.get(next) {
                if reached.insert(&target.id) {
                    queue.push_back(target);
                }
            }
        }
    }

    let mut reported = HashSet::new();
    for fragment in active {
        if !reached.contains(&fragment.id) && reported.insert(&fragment.id) {
            report.warnings.push(ValidationIssue::Unreachable {
                fragment_id: fragment.id.clone(),
            });
        }
    }
}

fn check_clues(active: &[&FragmentEntry], report: &mut ValidationReport) {
    let obtainable: BTreeSet<&ClueId> = active
        .iter()
        .flat_map(|f| f.choices.iter())
        .flat_map(|c| c.unlocks.iter())
        .collect();

    for fragment in active {
        for clue in &fragment.required_clues {
            if !obtainable.contains(clue) {
                report.warnings.push(ValidationIssue::UnobtainableClue {
                    fragment_id: fragment.id.clone(),
                    clue: clue.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(yaml: &str) -> Catalog {
        Catalog::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_well_formed_catalog_has_no_findings() {
        // Arrange
        let catalog = catalog(
            r"
fragments:
  - id: f1
    title: Start
    choices:
      - { id: go, text: Go, next: f2, unlocks: [clue_a] }
  - id: f2
    title: Gate
    choices:
      - { id: in, text: In, next: f3 }
  - id: f3
    title: Vault
    required_clues: [clue_a]
",
        );

        // Act
        let report = validate_catalog(&catalog);

        // Assert
        assert!(report.is_publishable());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_dangling_and_inactive_targets_are_errors() {
        // Arrange
        let catalog = catalog(
            r"
fragments:
  - id: f1
    title: Start
    choices:
      - { id: lost, text: Lost, next: ghost }
      - { id: hidden, text: Hidden, next: f2 }
  - id: f2
    title: Retired
    active: false
",
        );

        // Act
        let report = validate_catalog(&catalog);

        // Assert
        assert!(!report.is_publishable());
        assert_eq!(
            report.errors,
            vec![
                ValidationIssue::DanglingNext {
                    fragment_id: FragmentId::from("f1"),
                    choice_id: ChoiceId::from("lost"),
                    next_fragment_id: FragmentId::from("ghost"),
                },
                ValidationIssue::DanglingNext {
                    fragment_id: FragmentId::from("f1"),
                    choice_id: ChoiceId::from("hidden"),
                    next_fragment_id: FragmentId::from("f2"),
                },
            ]
        );
    }

    #[test]
    fn test_duplicates_and_blank_ids_are_errors() {
        let catalog = catalog(
            r#"
fragments:
  - id: f1
    title: Start
    choices:
      - { id: go, text: Go }
      - { id: go, text: Go again }
      - { id: " ", text: Nameless }
  - id: f1
    title: Copy
  - id: ""
    title: Nameless
"#,
        );

        let report = validate_catalog(&catalog);

        assert!(report.errors.contains(&ValidationIssue::DuplicateChoice {
            fragment_id: FragmentId::from("f1"),
            choice_id: ChoiceId::from("go"),
        }));
        assert!(report.errors.contains(&ValidationIssue::BlankChoiceId {
            fragment_id: FragmentId::from("f1"),
            position: 2,
        }));
        assert!(report.errors.contains(&ValidationIssue::DuplicateFragment {
            fragment_id: FragmentId::from("f1"),
        }));
        assert!(
            report
                .errors
                .contains(&ValidationIssue::BlankFragmentId { position: 2 })
        );
    }

    #[test]
    fn test_unreachable_fragment_and_unobtainable_clue_are_warnings() {
        // Arrange
        let catalog = catalog(
            r"
fragments:
  - id: f1
    title: Start
    choices:
      - { id: end, text: End }
  - id: island
    title: Island
    required_clues: [nowhere_key]
",
        );

        // Act
        let report = validate_catalog(&catalog);

        // Assert
        assert!(report.is_publishable());
        assert_eq!(
            report.warnings,
            vec![
                ValidationIssue::Unreachable {
                    fragment_id: FragmentId::from("island"),
                },
                ValidationIssue::UnobtainableClue {
                    fragment_id: FragmentId::from("island"),
                    clue: ClueId::from("nowhere_key"),
                },
            ]
        );
    }

    #[test]
    fn test_catalog_without_active_fragments_is_warned() {
        let catalog = catalog("fragments:\n  - { id: f1, title: Off, active: false }\n");

        let report = validate_catalog(&catalog);

        assert!(report.is_publishable());
        assert_eq!(report.warnings, vec![ValidationIssue::EmptyCatalog]);
    }

    #[test]
    fn test_error_summary_joins_messages() {
        let report = ValidationReport {
            errors: vec![
                ValidationIssue::BlankFragmentId { position: 0 },
                ValidationIssue::DuplicateFragment {
                    fragment_id: FragmentId::from("f1"),
                },
            ],
            warnings: Vec::new(),
        };

        assert_eq!(
            report.error_summary(),
            "fragment at position 0 has a blank id; fragment id f1 is used more than once"
        );
    }
}
