//! Pure score aggregation. Nothing here mutates state; every value is
//! recomputed from the current answer graph on each read.

use super::domain::{Score, Sheet};

/// One aggregation input: a numeric score and the weight of the sheet it
/// came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWithWeight {
    pub value: f64,
    pub weight: Option<f64>,
}

/// Weighted average of the inputs, rounded to two decimals.
///
/// A single missing weight disables weighting for the whole set: the sum is
/// treated as undefined and the plain arithmetic mean is used instead, so
/// partial weighting is never applied. An empty input yields 0.
pub fn weighted_score(items: &[ScoreWithWeight]) -> f64 {
    let weights_sum = items
        .iter()
        .try_fold(0.0_f64, |acc, item| item.weight.map(|w| acc + w));

    let value = match weights_sum {
        Some(sum) if sum > 0.0 => items
            .iter()
            .map(|item| item.value * item.weight.unwrap_or(0.0) / sum)
            .sum(),
        _ => {
            if items.is_empty() {
                0.0
            } else {
                items.iter().map(|item| item.value).sum::<f64>() / items.len() as f64
            }
        }
    };

    round2(value)
}

/// Round half-up (away from zero) to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A sheet is filled once every answer carries a score and either a comment
/// or a NONE score, and the overall verdict has both fields set.
pub fn sheet_is_filled(sheet: &Sheet) -> bool {
    sheet
        .answers
        .iter()
        .all(|answer| {
            answer.score.is_some()
                && (answer.comment.is_some() || answer.score == Some(Score::None))
        })
        && sheet.sheet_answer.comment.is_some()
        && sheet.sheet_answer.total_score.is_some()
}

/// Unrounded mean of the sheet's answer ordinals plus the overall verdict
/// ordinal, restricted to positive values; 0 when nothing is rated.
pub fn sheet_avg_score_value(sheet: &Sheet) -> f64 {
    let ordinals: Vec<f64> = sheet
        .answers
        .iter()
        .filter_map(|answer| answer.score)
        .chain(sheet.sheet_answer.total_score)
        .map(|score| f64::from(score.ordinal()))
        .filter(|ordinal| *ordinal > 0.0)
        .collect();

    if ordinals.is_empty() {
        0.0
    } else {
        ordinals.iter().sum::<f64>() / ordinals.len() as f64
    }
}

/// Nearest score bucket of [`sheet_avg_score_value`].
pub fn sheet_avg_score(sheet: &Sheet) -> Score {
    Score::from_value(sheet_avg_score_value(sheet))
}
