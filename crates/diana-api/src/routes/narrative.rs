//! Routes for the narrative progression engine.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use diana_core::error::DomainError;
use diana_core::model::{ChoiceId, ChoiceRef, ClueId, Fragment, FragmentId, FragmentKind, UserId};
use diana_narrative::application::query_handlers::{
    DecisionView, NarrativeProgressView, RequirementsView,
};
use diana_narrative::domain::outcome::{ChoiceResolution, NextStep, RewardDelivery};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 20;

/// A choice as rendered to the user.
#[derive(Debug, Serialize)]
pub struct ChoiceView {
    /// Position in the fragment's choice list.
    pub index: usize,
    /// Stable choice identifier.
    pub choice_id: ChoiceId,
    /// Display text.
    pub text: String,
}

/// A fragment as rendered to the user.
#[derive(Debug, Serialize)]
pub struct FragmentView {
    pub fragment_id: FragmentId,
    pub title: String,
    pub content: String,
    pub kind: FragmentKind,
    pub required_clues: Vec<ClueId>,
    pub choices: Vec<ChoiceView>,
}

impl From<Fragment> for FragmentView {
    fn from(fragment: Fragment) -> Self {
        Self {
            fragment_id: fragment.id,
            title: fragment.title,
            content: fragment.content,
            kind: fragment.kind,
            required_clues: fragment.required_clues,
            choices: fragment
                .choices
                .into_iter()
                .enumerate()
                .map(|(index, choice)| ChoiceView {
                    index,
                    choice_id: choice.id,
                    text: choice.text,
                })
                .collect(),
        }
    }
}

/// Request body for POST /users/{user_id}/choices. Exactly one of
/// `choice_id` and `choice_index` must be given.
#[derive(Debug, Deserialize)]
pub struct ChoiceRequest {
    /// The fragment the choice was rendered on.
    pub fragment_id: FragmentId,
    /// Stable identifier of the selected choice.
    pub choice_id: Option<ChoiceId>,
    /// Position of the selected choice.
    pub choice_index: Option<usize>,
}

impl ChoiceRequest {
    fn choice_ref(&self) -> Result<ChoiceRef, DomainError> {
        match (&self.choice_id, self.choice_index) {
            (Some(id), None) => Ok(ChoiceRef::Id(id.clone())),
            (None, Some(index)) => Ok(ChoiceRef::Index(index)),
            _ => Err(DomainError::Validation(
                "exactly one of choice_id and choice_index is required".to_owned(),
            )),
        }
    }
}

/// Outcome of the reward attached to a choice.
#[derive(Debug, Serialize)]
pub struct RewardView {
    /// `not_applicable`, `granted` or `failed`.
    pub status: &'static str,
    /// Points involved.
    pub amount: i64,
}

impl From<&RewardDelivery> for RewardView {
    fn from(delivery: &RewardDelivery) -> Self {
        match delivery {
            RewardDelivery::NotApplicable => Self {
                status: "not_applicable",
                amount: 0,
            },
            RewardDelivery::Granted { amount } => Self {
                status: "granted",
                amount: *amount,
            },
            RewardDelivery::Failed { amount, .. } => Self {
                status: "failed",
                amount: *amount,
            },
        }
    }
}

/// Response body for a processed choice.
#[derive(Debug, Serialize)]
pub struct ChoiceResponse {
    /// Identifier of the recorded decision.
    pub decision_id: Uuid,
    /// Clues unlocked by this choice that the user did not hold before.
    pub newly_unlocked: Vec<ClueId>,
    /// Reward outcome.
    pub reward: RewardView,
    /// `true` if the choice ended the branch.
    pub end_of_branch: bool,
    /// The next fragment, unless the branch ended.
    pub next: Option<FragmentView>,
}

impl From<ChoiceResolution> for ChoiceResponse {
    fn from(resolution: ChoiceResolution) -> Self {
        let reward = RewardView::from(&resolution.reward);
        let (end_of_branch, next) = match resolution.next {
            NextStep::Fragment(fragment) => (false, Some(FragmentView::from(*fragment))),
            NextStep::EndOfBranch => (true, None),
        };
        Self {
            decision_id: resolution.decision.decision_id,
            newly_unlocked: resolution.newly_unlocked,
            reward,
            end_of_branch,
            next,
        }
    }
}

/// Query string for GET /users/{user_id}/decisions.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of decisions to return.
    pub limit: Option<usize>,
}

/// GET /users/{user_id}/current
#[instrument(skip(state))]
async fn get_current_fragment(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<FragmentView>, ApiError> {
    let fragment = state.engine.get_current_fragment(UserId(user_id)).await?;
    Ok(Json(FragmentView::from(fragment)))
}

/// POST /users/{user_id}/choices
#[instrument(skip(state, request), fields(fragment_id = %request.fragment_id))]
async fn process_choice(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<ChoiceRequest>,
) -> Result<Json<ChoiceResponse>, ApiError> {
    let choice = request.choice_ref()?;
    let resolution = state
        .engine
        .process_choice(UserId(user_id), request.fragment_id, choice)
        .await?;

    info!(decision_id = %resolution.decision.decision_id, "choice processed");

    Ok(Json(ChoiceResponse::from(resolution)))
}

/// GET /users/{user_id}/requirements/{fragment_id}
#[instrument(skip(state))]
async fn get_requirements(
    State(state): State<AppState>,
    Path((user_id, fragment_id)): Path<(i64, String)>,
) -> Result<Json<RequirementsView>, ApiError> {
    let view = state
        .engine
        .requirements(UserId(user_id), &FragmentId::from(fragment_id))
        .await?;
    Ok(Json(view))
}

/// GET /users/{user_id}/progress
#[instrument(skip(state))]
async fn get_progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<NarrativeProgressView>, ApiError> {
    let view = state.engine.progress(UserId(user_id)).await?;
    Ok(Json(view))
}

/// GET /users/{user_id}/decisions
#[instrument(skip(state))]
async fn get_decisions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DecisionView>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let views = state
        .engine
        .decision_history(UserId(user_id), limit)
        .await?;
    Ok(Json(views))
}

/// Returns the router for the narrative engine.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/current", get(get_current_fragment))
        .route("/users/{user_id}/choices", post(process_choice))
        .route(
            "/users/{user_id}/requirements/{fragment_id}",
            get(get_requirements),
        )
        .route("/users/{user_id}/progress", get(get_progress))
        .route("/users/{user_id}/decisions", get(get_decisions))
}
