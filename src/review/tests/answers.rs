use super::common::*;
use crate::review::domain::{Caller, Position, ReviewPatch, Score, SheetPatch, UserPatch};
use crate::review::error::ServiceError;

#[test]
fn save_answer_updates_the_creation_stub() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    let answer = fixture
        .service
        .save_answer(
            sheets[0].id,
            fixture.code.id,
            Some(Score::AboveExpectations),
            Some("picked up the worst incidents".to_string()),
        )
        .expect("answer saves");

    assert_eq!(answer.score, Some(Score::AboveExpectations));

    // the stub was updated in place, not duplicated
    let sheet = fixture
        .service
        .update_sheet(sheets[0].id, SheetPatch::default())
        .expect("reload");
    assert_eq!(sheet.answers.len(), 2);
    assert_eq!(
        sheet
            .answers
            .iter()
            .filter(|a| a.criteria_id == fixture.code.id)
            .count(),
        1
    );
}

#[test]
fn save_answer_can_clear_back_to_unscored() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    fixture.answer(
        &sheets[0],
        &fixture.code,
        Some(Score::MeetExpectations),
        Some("fine"),
    );
    let cleared = fixture
        .service
        .save_answer(sheets[0].id, fixture.code.id, None, None)
        .expect("clears");
    assert!(cleared.score.is_none());
    assert!(cleared.comment.is_none());
}

#[test]
fn completed_sheet_locks_answers_and_verdict() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();
    fixture
        .service
        .update_sheet(
            sheets[0].id,
            SheetPatch {
                completed: Some(true),
                ..SheetPatch::default()
            },
        )
        .expect("completes");

    let answer = fixture.service.save_answer(
        sheets[0].id,
        fixture.code.id,
        Some(Score::MeetExpectations),
        None,
    );
    assert!(matches!(answer, Err(ServiceError::AccessDenied(_))));

    let verdict = fixture
        .service
        .save_sheet_answer(sheets[0].id, Some(Score::MeetExpectations), None);
    assert!(matches!(verdict, Err(ServiceError::AccessDenied(_))));

    // the untouched sibling sheet still accepts writes
    fixture.answer(
        &sheets[1],
        &fixture.code,
        Some(Score::MeetExpectations),
        Some("fine"),
    );
}

#[test]
fn completed_review_locks_answers_even_on_reopened_sheets() {
    let fixture = seeded();
    let (review, sheets) = fixture.review_with_sheets();
    fixture
        .service
        .update_review(
            review.id,
            ReviewPatch {
                completed: Some(true),
                ..ReviewPatch::default()
            },
        )
        .expect("review completes");

    // reopening the sheet goes through, but the answer guard still sees the
    // completed review
    fixture
        .service
        .update_sheet(
            sheets[0].id,
            SheetPatch {
                completed: Some(false),
                ..SheetPatch::default()
            },
        )
        .expect("sheet reopens");

    let answer = fixture.service.save_answer(
        sheets[0].id,
        fixture.code.id,
        Some(Score::MeetExpectations),
        None,
    );
    assert!(matches!(answer, Err(ServiceError::AccessDenied(_))));

    let verdict = fixture
        .service
        .save_sheet_answer(sheets[0].id, Some(Score::MeetExpectations), None);
    assert!(matches!(verdict, Err(ServiceError::AccessDenied(_))));
}

#[test]
fn cross_role_criteria_is_a_validation_failure() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    let other_role = fixture.service.create_job_role("designer").expect("role");
    let other_criteria = fixture
        .service
        .create_criteria(other_role.id, "visual polish", "pixel care")
        .expect("criteria");

    match fixture.service.save_answer(
        sheets[0].id,
        other_criteria.id,
        Some(Score::MeetExpectations),
        None,
    ) {
        Err(ServiceError::Validation(message)) => {
            assert!(message.contains("job role"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn stale_answers_fail_after_reviewee_changes_role() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    let new_role = fixture.service.create_job_role("designer").expect("role");
    fixture
        .service
        .create_criteria(new_role.id, "visual polish", "pixel care")
        .expect("criteria");
    fixture
        .service
        .update_user(
            &Caller::admin("root"),
            fixture.reviewee.id,
            UserPatch {
                job_role_id: Some(new_role.id),
                ..UserPatch::default()
            },
        )
        .expect("role change");

    // the sheet's stubs reference the old role's criteria now
    let stale = fixture.service.save_answer(
        sheets[0].id,
        fixture.code.id,
        Some(Score::MeetExpectations),
        None,
    );
    assert!(matches!(stale, Err(ServiceError::Validation(_))));
}

#[test]
fn answer_for_later_added_matching_criteria_is_created() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    let ownership = fixture
        .service
        .create_criteria(fixture.role.id, "ownership", "drives work to done")
        .expect("criteria");

    let answer = fixture
        .service
        .save_answer(
            sheets[0].id,
            ownership.id,
            Some(Score::MeetExpectations),
            Some("kept the pager quiet".to_string()),
        )
        .expect("explicit save for a fresh criteria");
    assert_eq!(answer.criteria_id, ownership.id);

    let sheet = fixture
        .service
        .update_sheet(sheets[0].id, SheetPatch::default())
        .expect("reload");
    assert_eq!(sheet.answers.len(), 3);
}

#[test]
fn unknown_ids_are_not_found() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    assert!(matches!(
        fixture.service.save_answer(
            crate::review::domain::SheetId(9999),
            fixture.code.id,
            None,
            None
        ),
        Err(ServiceError::NotFound("sheet"))
    ));
    assert!(matches!(
        fixture.service.save_answer(
            sheets[0].id,
            crate::review::domain::CriteriaId(9999),
            None,
            None
        ),
        Err(ServiceError::NotFound("criteria"))
    ));
}

#[test]
fn verdict_upserts_both_fields() {
    let fixture = seeded();
    let (_, sheets) = fixture.review_with_sheets();

    fixture.verdict(
        &sheets[0],
        Some(Score::AboveExpectations),
        Some("strong half"),
    );
    let updated = fixture
        .service
        .save_sheet_answer(sheets[0].id, Some(Score::MeetExpectations), None)
        .expect("second save");

    assert_eq!(updated.total_score, Some(Score::MeetExpectations));
    assert!(updated.comment.is_none());
}

#[test]
fn position_has_no_bearing_on_answers() {
    // expectations are reference text only; saving them never blocks answers
    let fixture = seeded();
    fixture
        .service
        .save_expectation(
            fixture.code.id,
            Position::Middle,
            "owns medium-size features end to end",
        )
        .expect("expectation saves");

    let (_, sheets) = fixture.review_with_sheets();
    fixture.answer(
        &sheets[0],
        &fixture.code,
        Some(Score::MeetExpectations),
        Some("as expected"),
    );
}
