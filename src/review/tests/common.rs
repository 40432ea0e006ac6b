use chrono::NaiveDate;

use crate::review::domain::{
    Criteria, JobRole, JobRoleId, NewUser, Position, Review, ReviewerGroup, Score, Sheet,
    SheetWeight, User, UserRole,
};
use crate::review::service::ReviewService;

pub(super) fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 31).expect("valid due date")
}

pub(super) fn new_user(
    username: &str,
    job_role_id: Option<JobRoleId>,
    position: Position,
) -> NewUser {
    NewUser {
        username: username.to_string(),
        user_role: UserRole::User,
        job_role_id,
        position,
        full_name: String::new(),
        email: String::new(),
        department: "platform".to_string(),
    }
}

/// A service with one job role, two criteria, one reviewee, and three
/// reviewers: the smallest graph the aggregation fixtures need.
pub(super) struct Fixture {
    pub(super) service: ReviewService,
    pub(super) role: JobRole,
    pub(super) code: Criteria,
    pub(super) comms: Criteria,
    pub(super) reviewee: User,
    pub(super) reviewers: Vec<User>,
}

pub(super) fn seeded() -> Fixture {
    let service = ReviewService::new();
    let role = service
        .create_job_role("backend engineer")
        .expect("job role");
    let code = service
        .create_criteria(role.id, "code quality", "readable, tested changes")
        .expect("criteria");
    let comms = service
        .create_criteria(role.id, "communication", "clear and timely updates")
        .expect("criteria");

    let reviewee = service
        .create_user(new_user("uwatts", Some(role.id), Position::Middle))
        .expect("reviewee");
    let reviewers = ["rvega", "rpatel", "rnolan"]
        .iter()
        .map(|username| {
            service
                .create_user(new_user(username, Some(role.id), Position::Senior))
                .expect("reviewer")
        })
        .collect();

    Fixture {
        service,
        role,
        code,
        comms,
        reviewee,
        reviewers,
    }
}

impl Fixture {
    pub(super) fn review(&self) -> Review {
        self.service
            .create_review(self.reviewee.id, "2026-H1")
            .expect("review")
    }

    pub(super) fn review_with_sheets(&self) -> (Review, Vec<Sheet>) {
        let review = self.review();
        let sheets = self
            .reviewers
            .iter()
            .map(|reviewer| {
                self.service
                    .create_sheet(
                        review.id,
                        reviewer.id,
                        due_date(),
                        ReviewerGroup::Colleague,
                    )
                    .expect("sheet")
            })
            .collect();
        (review, sheets)
    }

    /// Standard 0.5/0.3/0.2 split over the fixture's three sheets.
    pub(super) fn assign_weights(&self, sheets: &[Sheet]) {
        let weights: Vec<SheetWeight> = sheets
            .iter()
            .zip([0.5, 0.3, 0.2])
            .map(|(sheet, weight)| SheetWeight {
                sheet_id: sheet.id,
                weight,
            })
            .collect();
        self.service.set_weights(&weights).expect("weights apply");
    }

    pub(super) fn answer(
        &self,
        sheet: &Sheet,
        criteria: &Criteria,
        score: Option<Score>,
        comment: Option<&str>,
    ) {
        self.service
            .save_answer(
                sheet.id,
                criteria.id,
                score,
                comment.map(|text| text.to_string()),
            )
            .expect("answer saves");
    }

    pub(super) fn verdict(&self, sheet: &Sheet, score: Option<Score>, comment: Option<&str>) {
        self.service
            .save_sheet_answer(sheet.id, score, comment.map(|text| text.to_string()))
            .expect("verdict saves");
    }
}
