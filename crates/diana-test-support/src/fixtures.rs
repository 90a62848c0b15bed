//! Fixture builders for fragments and choices.

use chrono::{DateTime, Duration, TimeZone, Utc};
use diana_core::model::{Choice, ChoiceId, ClueId, Fragment, FragmentId, FragmentKind};

/// The instant every fixture is anchored to.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Builds a [`Fragment`] with sensible defaults: active, ungated, created at
/// [`fixed_now`].
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    fragment: Fragment,
}

impl FragmentBuilder {
    /// Starts a fragment with the given id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            fragment: Fragment {
                id: FragmentId::from(id),
                title: format!("Fragment {id}"),
                content: format!("Content of {id}"),
                kind: FragmentKind::Story,
                choices: Vec::new(),
                required_clues: Vec::new(),
                is_active: true,
                created_at: fixed_now(),
            },
        }
    }

    /// Shifts the creation time by `minutes` after [`fixed_now`].
    #[must_use]
    pub fn created_minutes_after(mut self, minutes: i64) -> Self {
        self.fragment.created_at = fixed_now() + Duration::minutes(minutes);
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn kind(mut self, kind: FragmentKind) -> Self {
        self.fragment.kind = kind;
        self
    }

    /// Adds a required clue.
    #[must_use]
    pub fn requires(mut self, clue: &str) -> Self {
        self.fragment.required_clues.push(ClueId::from(clue));
        self
    }

    /// Appends a choice.
    #[must_use]
    pub fn choice(mut self, choice: Choice) -> Self {
        self.fragment.choices.push(choice);
        self
    }

    /// Marks the fragment inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.fragment.is_active = false;
        self
    }

    /// Finishes the fragment.
    #[must_use]
    pub fn build(self) -> Fragment {
        self.fragment
    }
}

/// Builds a [`Choice`]: no reward, no unlocks, ends the branch unless
/// [`next`](Self::next) is called.
#[derive(Debug, Clone)]
pub struct ChoiceBuilder {
    choice: Choice,
}

impl ChoiceBuilder {
    /// Starts a choice with a stable id and display text.
    #[must_use]
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            choice: Choice {
                id: ChoiceId::from(id),
                text: text.to_owned(),
                reward: 0,
                next_fragment_id: None,
                unlocks: Vec::new(),
            },
        }
    }

    /// Sets the reward amount.
    #[must_use]
    pub fn reward(mut self, amount: i64) -> Self {
        self.choice.reward = amount;
        self
    }

    /// Sets the next fragment.
    #[must_use]
    pub fn next(mut self, fragment_id: &str) -> Self {
        self.choice.next_fragment_id = Some(FragmentId::from(fragment_id));
        self
    }

    /// Adds an unlocked clue.
    #[must_use]
    pub fn unlocks(mut self, clue: &str) -> Self {
        self.choice.unlocks.push(ClueId::from(clue));
        self
    }

    /// Finishes the choice.
    #[must_use]
    pub fn build(self) -> Choice {
        self.choice
    }
}
