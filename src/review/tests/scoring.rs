use crate::review::domain::{Answer, CriteriaId, Score, Sheet, SheetAnswer};
use crate::review::scoring::{
    sheet_avg_score, sheet_avg_score_value, sheet_is_filled, weighted_score, ScoreWithWeight,
};

fn item(value: f64, weight: Option<f64>) -> ScoreWithWeight {
    ScoreWithWeight { value, weight }
}

#[test]
fn empty_input_yields_zero() {
    assert_eq!(weighted_score(&[]), 0.0);
}

#[test]
fn fully_weighted_set_renormalizes_to_one() {
    // weights sum to 0.5 and get scaled up: (0.3*1 + 0.2*5) / 0.5
    let items = [item(1.0, Some(0.3)), item(5.0, Some(0.2))];
    assert_eq!(weighted_score(&items), 2.6);
}

#[test]
fn rounds_half_up_to_two_decimals() {
    // (0.5*3 + 0.3*2) / 0.8 = 2.625
    let items = [item(3.0, Some(0.5)), item(2.0, Some(0.3))];
    assert_eq!(weighted_score(&items), 2.63);
}

#[test]
fn one_missing_weight_disables_weighting_entirely() {
    let weighted = [item(1.0, Some(0.9)), item(5.0, Some(0.1))];
    let partially_weighted = [item(1.0, Some(0.9)), item(5.0, None)];

    // the partial set falls back to the plain mean, not a partial weighting
    assert_eq!(weighted_score(&weighted), 1.4);
    assert_eq!(weighted_score(&partially_weighted), 3.0);
}

#[test]
fn all_missing_weights_use_plain_mean() {
    let items = [item(2.0, None), item(3.0, None), item(4.0, None)];
    assert_eq!(weighted_score(&items), 3.0);
}

#[test]
fn zero_weight_sum_uses_plain_mean() {
    let items = [item(2.0, Some(0.0)), item(4.0, Some(0.0))];
    assert_eq!(weighted_score(&items), 3.0);
}

#[test]
fn score_buckets_round_and_clamp() {
    assert_eq!(Score::from_value(0.0), Score::None);
    assert_eq!(Score::from_value(2.49), Score::BelowExpectations);
    assert_eq!(Score::from_value(2.5), Score::MeetExpectations);
    assert_eq!(Score::from_value(7.3), Score::WayAboveExpectations);
    assert_eq!(Score::from_value(-1.0), Score::None);
}

#[test]
fn score_ordinals_follow_declaration_order() {
    let ordinals: Vec<u8> = Score::ordered().iter().map(|score| score.ordinal()).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4, 5]);
}

fn bare_sheet(answers: Vec<Answer>, sheet_answer: SheetAnswer) -> Sheet {
    Sheet {
        id: crate::review::domain::SheetId(1),
        review_id: crate::review::domain::ReviewId(1),
        reviewer_id: crate::review::domain::UserId(1),
        due_date: super::common::due_date(),
        weight: None,
        reviewer_group: Default::default(),
        completed: false,
        completed_date: None,
        sheet_answer,
        answers,
    }
}

fn answer(criteria: u64, score: Option<Score>, comment: Option<&str>) -> Answer {
    Answer {
        criteria_id: CriteriaId(criteria),
        score,
        comment: comment.map(|text| text.to_string()),
    }
}

#[test]
fn sheet_average_skips_none_and_unscored() {
    let sheet = bare_sheet(
        vec![
            answer(1, Some(Score::WayBelowExpectations), None),
            answer(2, Some(Score::None), None),
            answer(3, None, None),
            answer(4, Some(Score::BelowExpectations), None),
        ],
        SheetAnswer {
            comment: None,
            total_score: Some(Score::MeetExpectations),
        },
    );

    // mean of {1, 2, 3}; NONE and the unscored stub never count
    assert_eq!(sheet_avg_score_value(&sheet), 2.0);
    assert_eq!(sheet_avg_score(&sheet), Score::BelowExpectations);
}

#[test]
fn sheet_average_is_unrounded() {
    let sheet = bare_sheet(
        vec![
            answer(1, Some(Score::WayBelowExpectations), None),
            answer(2, Some(Score::BelowExpectations), None),
        ],
        SheetAnswer {
            comment: None,
            total_score: Some(Score::BelowExpectations),
        },
    );

    let expected = 5.0 / 3.0;
    assert!((sheet_avg_score_value(&sheet) - expected).abs() < 1e-12);
}

#[test]
fn sheet_average_is_zero_when_nothing_rated() {
    let sheet = bare_sheet(
        vec![answer(1, Some(Score::None), None), answer(2, None, None)],
        SheetAnswer::default(),
    );
    assert_eq!(sheet_avg_score_value(&sheet), 0.0);
    assert_eq!(sheet_avg_score(&sheet), Score::None);
}

#[test]
fn filled_requires_comment_unless_no_opinion() {
    let filled = bare_sheet(
        vec![
            answer(1, Some(Score::MeetExpectations), Some("good work")),
            answer(2, Some(Score::None), None),
        ],
        SheetAnswer {
            comment: Some("overall fine".to_string()),
            total_score: Some(Score::MeetExpectations),
        },
    );
    assert!(sheet_is_filled(&filled));

    let missing_comment = bare_sheet(
        vec![answer(1, Some(Score::MeetExpectations), None)],
        SheetAnswer {
            comment: Some("overall fine".to_string()),
            total_score: Some(Score::MeetExpectations),
        },
    );
    assert!(!sheet_is_filled(&missing_comment));

    let missing_verdict = bare_sheet(
        vec![answer(1, Some(Score::MeetExpectations), Some("good work"))],
        SheetAnswer {
            comment: None,
            total_score: Some(Score::MeetExpectations),
        },
    );
    assert!(!sheet_is_filled(&missing_verdict));
}
