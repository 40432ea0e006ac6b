//! Read-time projections over the entity graph. Everything is derived fresh
//! on each call so results always reflect the current answer state.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    Answer, Criteria, CriteriaId, JobRoleId, Position, ReviewId, ReviewerGroup, Score, SelfReview,
    Sheet, SheetId, User, UserId, UserRole,
};
use super::scoring::{
    sheet_avg_score, sheet_avg_score_value, sheet_is_filled, weighted_score, ScoreWithWeight,
};

/// A reviewer's or verdict comment surfaced in aggregated results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
}

/// Aggregated outcome for one criteria across every sheet of a review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaResult {
    pub criteria: Criteria,
    pub comments: Vec<Comment>,
    pub score_value: f64,
    pub min_score_value: f64,
    pub max_score_value: f64,
    pub score: Score,
    pub min_score: Score,
    pub max_score: Score,
}

/// Aggregated outcome for the whole review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalResult {
    pub comments: Vec<Comment>,
    pub score_value: f64,
    pub score: Score,
}

/// Sheet tallies shown alongside a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetCounters {
    pub all: usize,
    pub filled: usize,
    pub completed: usize,
}

/// Condensed user reference embedded in other views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
}

impl UserSummary {
    pub(crate) fn of(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// Full user projection with derived activity state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub user_role: UserRole,
    pub job_role_id: Option<JobRoleId>,
    pub position: Position,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub active: bool,
    pub has_current_reviews: bool,
}

/// One sheet as exposed to collaborators, with its derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetView {
    pub id: SheetId,
    pub reviewer: UserSummary,
    pub due_date: NaiveDate,
    pub weight: Option<f64>,
    pub reviewer_group: ReviewerGroup,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub is_filled: bool,
    pub avg_score_value: f64,
    pub avg_score: Score,
}

/// A review with every derived result computed fresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub id: ReviewId,
    pub user: UserSummary,
    pub period: String,
    pub user_position: Position,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub self_review: SelfReview,
    pub criteria_results: Vec<CriteriaResult>,
    pub total_result: TotalResult,
    pub sheet_counters: SheetCounters,
    pub sheets: Vec<SheetView>,
}

pub(crate) fn sheet_view(sheet: &Sheet, reviewer: &User) -> SheetView {
    SheetView {
        id: sheet.id,
        reviewer: UserSummary::of(reviewer),
        due_date: sheet.due_date,
        weight: sheet.weight,
        reviewer_group: sheet.reviewer_group,
        completed: sheet.completed,
        completed_date: sheet.completed_date,
        is_filled: sheet_is_filled(sheet),
        avg_score_value: sheet_avg_score_value(sheet),
        avg_score: sheet_avg_score(sheet),
    }
}

/// Group every scored answer across the review's sheets by criteria and
/// aggregate each group. Answers without a score are invisible here; NONE
/// scores contribute comments but never numbers.
pub(crate) fn criteria_results(
    sheets: &[&Sheet],
    criteria: &BTreeMap<CriteriaId, Criteria>,
) -> Vec<CriteriaResult> {
    let mut grouped: BTreeMap<CriteriaId, Vec<(&Answer, Option<f64>)>> = BTreeMap::new();
    for sheet in sheets {
        for answer in &sheet.answers {
            if answer.score.is_some() {
                grouped
                    .entry(answer.criteria_id)
                    .or_default()
                    .push((answer, sheet.weight));
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|(criteria_id, answers)| {
            let criteria = criteria.get(&criteria_id)?.clone();

            let rated: Vec<(f64, Option<f64>)> = answers
                .iter()
                .filter_map(|(answer, weight)| match answer.score {
                    Some(Score::None) | None => None,
                    Some(score) => Some((f64::from(score.ordinal()), *weight)),
                })
                .collect();

            let inputs: Vec<ScoreWithWeight> = rated
                .iter()
                .map(|(value, weight)| ScoreWithWeight {
                    value: *value,
                    weight: *weight,
                })
                .collect();

            let score_value = weighted_score(&inputs);
            let min_score_value = rated
                .iter()
                .map(|(value, _)| *value)
                .fold(f64::INFINITY, f64::min);
            let min_score_value = if min_score_value.is_finite() {
                min_score_value
            } else {
                0.0
            };
            let max_score_value = rated.iter().map(|(value, _)| *value).fold(0.0, f64::max);

            let comments = answers
                .iter()
                .filter_map(|(answer, _)| answer.comment.clone())
                .map(|text| Comment { text })
                .collect();

            Some(CriteriaResult {
                criteria,
                comments,
                score_value,
                min_score_value,
                max_score_value,
                score: Score::from_value(score_value),
                min_score: Score::from_value(min_score_value),
                max_score: Score::from_value(max_score_value),
            })
        })
        .collect()
}

/// Weighted total over sheets that carry a positive derived average. Verdict
/// comments come from every sheet, rated or not.
pub(crate) fn total_result(sheets: &[&Sheet]) -> TotalResult {
    let comments = sheets
        .iter()
        .filter_map(|sheet| sheet.sheet_answer.comment.clone())
        .map(|text| Comment { text })
        .collect();

    let inputs: Vec<ScoreWithWeight> = sheets
        .iter()
        .filter_map(|sheet| {
            let avg = sheet_avg_score_value(sheet);
            (avg > 0.0).then_some(ScoreWithWeight {
                value: avg,
                weight: sheet.weight,
            })
        })
        .collect();

    let score_value = weighted_score(&inputs);

    TotalResult {
        comments,
        score_value,
        score: Score::from_value(score_value),
    }
}

pub(crate) fn sheet_counters(sheets: &[&Sheet]) -> SheetCounters {
    SheetCounters {
        all: sheets.len(),
        filled: sheets
            .iter()
            .filter(|sheet| sheet_is_filled(sheet) && !sheet.completed)
            .count(),
        completed: sheets.iter().filter(|sheet| sheet.completed).count(),
    }
}

pub(crate) fn user_view(user: &User, has_current_reviews: bool) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        user_role: user.user_role,
        job_role_id: user.job_role_id,
        position: user.position,
        full_name: user.full_name.clone(),
        email: user.email.clone(),
        department: user.department.clone(),
        active: user.active,
        has_current_reviews,
    }
}
