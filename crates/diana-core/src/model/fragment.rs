//! Fragments and the choices they offer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChoiceId, ClueId, FragmentId};

/// Classification carried over from authored content. The engine does not
/// branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Main story text.
    #[default]
    Story,
    /// A decision point.
    Decision,
    /// Informational aside.
    Info,
}

impl FragmentKind {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Decision => "decision",
            Self::Info => "info",
        }
    }

    /// Parses the storage representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "story" => Some(Self::Story),
            "decision" => Some(Self::Decision),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

/// A selectable option within a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable identifier assigned at authoring time.
    pub id: ChoiceId,
    /// Text shown to the user.
    pub text: String,
    /// Points requested from the rewards collaborator (may be zero).
    pub reward: i64,
    /// Fragment reached by this choice; `None` ends the branch.
    pub next_fragment_id: Option<FragmentId>,
    /// Clues unlocked by selecting this choice.
    pub unlocks: Vec<ClueId>,
}

/// How a caller refers to a choice: by stable id, or by rendering position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceRef {
    /// Zero-based position in the fragment's choice list.
    Index(usize),
    /// Stable choice identifier.
    Id(ChoiceId),
}

impl fmt::Display for ChoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Id(id) => write!(f, "'{id}'"),
        }
    }
}

/// A unit of narrative content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique identifier.
    pub id: FragmentId,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Authored classification.
    pub kind: FragmentKind,
    /// Choices, in rendering order.
    pub choices: Vec<Choice>,
    /// Clues a user must hold to reach this fragment.
    pub required_clues: Vec<ClueId>,
    /// Inactive fragments are invisible to the engine.
    pub is_active: bool,
    /// Creation time; the earliest active fragment is the entry point.
    pub created_at: DateTime<Utc>,
}

impl Fragment {
    /// Resolves a choice reference to its position and definition.
    #[must_use]
    pub fn choice(&self, choice: &ChoiceRef) -> Option<(usize, &Choice)> {
        match choice {
            ChoiceRef::Index(index) => self.choices.get(*index).map(|c| (*index, c)),
            ChoiceRef::Id(id) => self.choices.iter().enumerate().find(|(_, c)| &c.id == id),
        }
    }

    /// Returns `true` if reaching this fragment needs no clues.
    #[must_use]
    pub fn is_ungated(&self) -> bool {
        self.required_clues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn two_choice_fragment() -> Fragment {
        let choice = |id: &str| Choice {
            id: ChoiceId::from(id),
            text: id.to_uppercase(),
            reward: 0,
            next_fragment_id: None,
            unlocks: Vec::new(),
        };
        Fragment {
            id: FragmentId::from("f1"),
            title: "Lobby".to_owned(),
            content: "Diana waits.".to_owned(),
            kind: FragmentKind::Decision,
            choices: vec![choice("enter"), choice("leave")],
            required_clues: Vec::new(),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_choice_resolves_by_index_and_by_id() {
        let fragment = two_choice_fragment();

        let (by_index, _) = fragment.choice(&ChoiceRef::Index(1)).unwrap();
        let (by_id, choice) = fragment
            .choice(&ChoiceRef::Id(ChoiceId::from("leave")))
            .unwrap();

        assert_eq!(by_index, 1);
        assert_eq!(by_id, 1);
        assert_eq!(choice.text, "LEAVE");
    }

    #[test]
    fn test_choice_out_of_range_or_unknown_is_none() {
        let fragment = two_choice_fragment();

        assert!(fragment.choice(&ChoiceRef::Index(2)).is_none());
        assert!(
            fragment
                .choice(&ChoiceRef::Id(ChoiceId::from("dance")))
                .is_none()
        );
    }

    #[test]
    fn test_kind_storage_representation_round_trips() {
        for kind in [FragmentKind::Story, FragmentKind::Decision, FragmentKind::Info] {
            assert_eq!(FragmentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FragmentKind::parse("epilogue"), None);
    }
}
