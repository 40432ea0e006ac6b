use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use super::domain::{
    Answer, Caller, Criteria, CriteriaId, Expectation, JobRole, JobRoleId, NewUser, Position,
    Review, ReviewId, ReviewPatch, ReviewerGroup, Score, SelfReview, SelfReviewPatch, Sheet,
    SheetAnswer, SheetId, SheetPatch, SheetWeight, User, UserId, UserPatch,
};
use super::error::ServiceError;
use super::store::Workspace;
use super::views::{self, ReviewView, UserSummary, UserView};

/// The engine behind every review intent.
///
/// Each operation acquires the workspace lock once and performs all guard
/// checks, writes, and derivations inside it; the lock is the transactional
/// unit, so at most one lifecycle transition is in flight at a time.
#[derive(Debug, Default)]
pub struct ReviewService {
    workspace: Mutex<Workspace>,
}

impl ReviewService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().expect("workspace mutex poisoned")
    }

    // --- reference data ---

    pub fn create_job_role(&self, name: &str) -> Result<JobRole, ServiceError> {
        let mut ws = self.lock();
        if ws.job_role_name_taken(name) {
            return Err(ServiceError::conflict(format!(
                "job role '{name}' already exists"
            )));
        }

        let id = JobRoleId(ws.next_id());
        let role = JobRole {
            id,
            name: name.to_string(),
        };
        ws.job_roles.insert(id, role.clone());
        debug!(job_role = id.0, name, "job role created");
        Ok(role)
    }

    pub fn create_criteria(
        &self,
        job_role_id: JobRoleId,
        name: &str,
        description: &str,
    ) -> Result<Criteria, ServiceError> {
        let mut ws = self.lock();
        if !ws.job_roles.contains_key(&job_role_id) {
            return Err(ServiceError::NotFound("job role"));
        }
        if ws.criteria_name_taken(job_role_id, name) {
            return Err(ServiceError::conflict(format!(
                "criteria '{name}' already exists for this job role"
            )));
        }

        let id = CriteriaId(ws.next_id());
        let criteria = Criteria {
            id,
            job_role_id,
            name: name.to_string(),
            description: description.to_string(),
            archived: false,
        };
        ws.criteria.insert(id, criteria.clone());
        Ok(criteria)
    }

    pub fn set_criteria_archived(
        &self,
        id: CriteriaId,
        archived: bool,
    ) -> Result<Criteria, ServiceError> {
        let mut ws = self.lock();
        let criteria = ws
            .criteria
            .get_mut(&id)
            .ok_or(ServiceError::NotFound("criteria"))?;
        criteria.archived = archived;
        Ok(criteria.clone())
    }

    /// Upsert the expectation text for one (criteria, position) pair.
    pub fn save_expectation(
        &self,
        criteria_id: CriteriaId,
        position: Position,
        description: &str,
    ) -> Result<Expectation, ServiceError> {
        let mut ws = self.lock();
        if !ws.criteria.contains_key(&criteria_id) {
            return Err(ServiceError::NotFound("criteria"));
        }

        let expectation = Expectation {
            criteria_id,
            position,
            description: description.to_string(),
        };
        ws.expectations
            .insert((criteria_id, position), expectation.clone());
        Ok(expectation)
    }

    // --- users ---

    pub fn create_user(&self, new_user: NewUser) -> Result<User, ServiceError> {
        let mut ws = self.lock();
        if ws.username_taken(&new_user.username) {
            return Err(ServiceError::conflict(format!(
                "user '{}' already exists",
                new_user.username
            )));
        }
        if let Some(job_role_id) = new_user.job_role_id {
            if !ws.job_roles.contains_key(&job_role_id) {
                return Err(ServiceError::NotFound("job role"));
            }
        }

        let id = UserId(ws.next_id());
        let user = User {
            id,
            username: new_user.username,
            user_role: new_user.user_role,
            job_role_id: new_user.job_role_id,
            position: new_user.position,
            full_name: new_user.full_name,
            email: new_user.email,
            department: new_user.department,
            active: true,
        };
        ws.users.insert(id, user.clone());
        Ok(user)
    }

    /// Apply a user patch. Changing the access tier is restricted to admin
    /// callers; everything else is open.
    pub fn update_user(
        &self,
        caller: &Caller,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, ServiceError> {
        let mut ws = self.lock();
        if let Some(job_role_id) = patch.job_role_id {
            if !ws.job_roles.contains_key(&job_role_id) {
                return Err(ServiceError::NotFound("job role"));
            }
        }

        let user = ws
            .users
            .get_mut(&id)
            .ok_or(ServiceError::NotFound("user"))?;

        if let Some(user_role) = patch.user_role {
            if user_role != user.user_role && !caller.is_admin() {
                return Err(ServiceError::access_denied(
                    "you are not allowed to change user role",
                ));
            }
            user.user_role = user_role;
        }
        if let Some(job_role_id) = patch.job_role_id {
            user.job_role_id = Some(job_role_id);
        }
        if let Some(position) = patch.position {
            user.position = position;
        }
        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(department) = patch.department {
            user.department = department;
        }
        if let Some(active) = patch.active {
            user.active = active;
        }

        Ok(user.clone())
    }

    pub fn get_user(&self, id: UserId) -> Result<UserView, ServiceError> {
        let ws = self.lock();
        let user = ws.users.get(&id).ok_or(ServiceError::NotFound("user"))?;
        Ok(views::user_view(user, ws.user_has_open_reviews(id)))
    }

    // --- review lifecycle ---

    /// Open a review cycle for a user. The user's position is snapshotted
    /// onto the review and an empty self review is spawned alongside it.
    pub fn create_review(&self, user_id: UserId, period: &str) -> Result<Review, ServiceError> {
        let mut ws = self.lock();
        let user = ws
            .users
            .get(&user_id)
            .ok_or(ServiceError::NotFound("user"))?;

        if user.job_role_id.is_none() {
            return Err(ServiceError::precondition(
                "can not create review for user without job role",
            ));
        }
        if user.position == Position::None {
            return Err(ServiceError::precondition(
                "can not create review for user without position",
            ));
        }
        if ws.review_for_period(user_id, period).is_some() {
            return Err(ServiceError::conflict(format!(
                "review for period '{period}' already exists for this user"
            )));
        }

        let user_position = user.position;
        let username = user.username.clone();
        let id = ReviewId(ws.next_id());
        let review = Review {
            id,
            user_id,
            period: period.to_string(),
            user_position,
            completed: false,
            completed_date: None,
            self_review: SelfReview::default(),
            sheet_ids: Vec::new(),
        };
        ws.reviews.insert(id, review.clone());
        info!(review = id.0, user = %username, period, "review created");
        Ok(review)
    }

    /// Apply a review patch. A false-to-true completion stamps `completed_date`
    /// and force-closes every still-open sheet with the same instant; the
    /// cascade writes sheet state directly, skipping the sheet update guard.
    /// The review itself carries no immutability guard.
    pub fn update_review(&self, id: ReviewId, patch: ReviewPatch) -> Result<Review, ServiceError> {
        let mut ws = self.lock();
        let review = ws
            .reviews
            .get_mut(&id)
            .ok_or(ServiceError::NotFound("review"))?;

        let was_completed = review.completed;
        if let Some(period) = patch.period {
            review.period = period;
        }
        if let Some(completed) = patch.completed {
            review.completed = completed;
        }

        let now = Utc::now();
        if !was_completed && review.completed {
            review.completed_date = Some(now);
        }

        let completed = review.completed;
        let sheet_ids = review.sheet_ids.clone();
        let updated = review.clone();

        if completed {
            let mut closed = 0_usize;
            for sheet_id in sheet_ids {
                if let Some(sheet) = ws.sheets.get_mut(&sheet_id) {
                    if !sheet.completed {
                        sheet.completed = true;
                        sheet.completed_date = Some(now);
                        closed += 1;
                    }
                }
            }
            if closed > 0 {
                info!(review = id.0, closed, "review completed, open sheets closed");
            }
        }

        Ok(updated)
    }

    /// The self review is never locked, completed or not.
    pub fn update_self_review(
        &self,
        review_id: ReviewId,
        patch: SelfReviewPatch,
    ) -> Result<SelfReview, ServiceError> {
        let mut ws = self.lock();
        let review = ws
            .reviews
            .get_mut(&review_id)
            .ok_or(ServiceError::NotFound("review"))?;

        if let Some(description) = patch.description {
            review.self_review.description = Some(description);
        }
        if let Some(good_things) = patch.good_things {
            review.self_review.good_things = Some(good_things);
        }
        if let Some(bad_things) = patch.bad_things {
            review.self_review.bad_things = Some(bad_things);
        }

        Ok(review.self_review.clone())
    }

    pub fn delete_review(&self, id: ReviewId) -> Result<(), ServiceError> {
        let mut ws = self.lock();
        ws.remove_review(id)
            .map(|review| {
                info!(review = id.0, period = %review.period, "review deleted");
            })
            .ok_or(ServiceError::NotFound("review"))
    }

    /// Fetch a review with every derived result computed fresh from the
    /// current answer graph.
    pub fn get_review(&self, id: ReviewId) -> Result<ReviewView, ServiceError> {
        let ws = self.lock();
        let review = ws
            .reviews
            .get(&id)
            .ok_or(ServiceError::NotFound("review"))?;
        let user = ws
            .users
            .get(&review.user_id)
            .ok_or(ServiceError::NotFound("user"))?;

        let sheets = ws.sheets_of_review(review);
        let mut sheet_views = Vec::with_capacity(sheets.len());
        for sheet in &sheets {
            let reviewer = ws
                .users
                .get(&sheet.reviewer_id)
                .ok_or(ServiceError::NotFound("user"))?;
            sheet_views.push(views::sheet_view(sheet, reviewer));
        }

        Ok(ReviewView {
            id: review.id,
            user: UserSummary::of(user),
            period: review.period.clone(),
            user_position: review.user_position,
            completed: review.completed,
            completed_date: review.completed_date,
            self_review: review.self_review.clone(),
            criteria_results: views::criteria_results(&sheets, &ws.criteria),
            total_result: views::total_result(&sheets),
            sheet_counters: views::sheet_counters(&sheets),
            sheets: sheet_views,
        })
    }

    // --- sheet lifecycle ---

    /// Add a reviewer's sheet to a review. The answer stubs snapshot the
    /// non-archived criteria of the reviewee's job role at this instant;
    /// criteria added later never appear retroactively.
    pub fn create_sheet(
        &self,
        review_id: ReviewId,
        reviewer_id: UserId,
        due_date: NaiveDate,
        reviewer_group: ReviewerGroup,
    ) -> Result<Sheet, ServiceError> {
        let mut ws = self.lock();
        let review = ws
            .reviews
            .get(&review_id)
            .ok_or(ServiceError::NotFound("review"))?;
        let reviewee = ws
            .users
            .get(&review.user_id)
            .ok_or(ServiceError::NotFound("user"))?;
        if !ws.users.contains_key(&reviewer_id) {
            return Err(ServiceError::NotFound("user"));
        }

        let job_role_id = reviewee.job_role_id.ok_or_else(|| {
            ServiceError::precondition("can not create sheet for reviewee without job role")
        })?;

        let role_criteria = ws.criteria_of_role(job_role_id);
        if role_criteria.is_empty() {
            let role_name = ws
                .job_roles
                .get(&job_role_id)
                .map(|role| role.name.clone())
                .unwrap_or_default();
            return Err(ServiceError::precondition(format!(
                "can not create sheet: criteria for '{role_name}' do not exist"
            )));
        }

        if ws.sheet_for_reviewer(review, reviewer_id).is_some() {
            return Err(ServiceError::conflict(
                "sheet for this reviewer already exists in the review",
            ));
        }

        let answers: Vec<Answer> = role_criteria
            .iter()
            .filter(|criteria| !criteria.archived)
            .map(|criteria| Answer::stub(criteria.id))
            .collect();

        let id = SheetId(ws.next_id());
        let sheet = Sheet {
            id,
            review_id,
            reviewer_id,
            due_date,
            weight: None,
            reviewer_group,
            completed: false,
            completed_date: None,
            sheet_answer: SheetAnswer::default(),
            answers,
        };
        ws.sheets.insert(id, sheet.clone());
        if let Some(review) = ws.reviews.get_mut(&review_id) {
            review.sheet_ids.push(id);
        }
        debug!(
            sheet = id.0,
            review = review_id.0,
            reviewer = reviewer_id.0,
            stubs = sheet.answers.len(),
            "sheet created"
        );
        Ok(sheet)
    }

    /// Apply a sheet patch. A completed sheet is immutable while it stays
    /// completed; reopening (completed=false) in the same patch is the only
    /// way through. A false-to-true transition stamps `completed_date`.
    pub fn update_sheet(&self, id: SheetId, patch: SheetPatch) -> Result<Sheet, ServiceError> {
        let mut ws = self.lock();
        let sheet = ws
            .sheets
            .get_mut(&id)
            .ok_or(ServiceError::NotFound("sheet"))?;

        let stays_completed = patch.completed.unwrap_or(sheet.completed);
        if sheet.completed && stays_completed {
            return Err(ServiceError::access_denied(
                "not allowed to edit sheet marked as completed",
            ));
        }
        if !sheet.completed && stays_completed {
            sheet.completed_date = Some(Utc::now());
        }

        if let Some(due_date) = patch.due_date {
            sheet.due_date = due_date;
        }
        if let Some(reviewer_group) = patch.reviewer_group {
            sheet.reviewer_group = reviewer_group;
        }
        sheet.completed = stays_completed;

        Ok(sheet.clone())
    }

    // --- answer mutation guards ---

    /// Upsert the answer for one (sheet, criteria) pair. Locked sheets and
    /// reviews reject the write; a criteria from another job role than the
    /// reviewee's current one is a stale cross-reference.
    pub fn save_answer(
        &self,
        sheet_id: SheetId,
        criteria_id: CriteriaId,
        score: Option<Score>,
        comment: Option<String>,
    ) -> Result<Answer, ServiceError> {
        let mut ws = self.lock();
        let sheet = ws
            .sheets
            .get(&sheet_id)
            .ok_or(ServiceError::NotFound("sheet"))?;
        let review = ws
            .reviews
            .get(&sheet.review_id)
            .ok_or(ServiceError::NotFound("review"))?;

        if sheet.completed || review.completed {
            return Err(ServiceError::access_denied(
                "not allowed to modify sheet marked as completed",
            ));
        }

        let criteria = ws
            .criteria
            .get(&criteria_id)
            .ok_or(ServiceError::NotFound("criteria"))?;
        let reviewee = ws
            .users
            .get(&review.user_id)
            .ok_or(ServiceError::NotFound("user"))?;
        if reviewee.job_role_id != Some(criteria.job_role_id) {
            return Err(ServiceError::validation(
                "criteria job role does not match the reviewee job role",
            ));
        }

        let sheet = ws
            .sheets
            .get_mut(&sheet_id)
            .ok_or(ServiceError::NotFound("sheet"))?;
        let answer = match sheet
            .answers
            .iter_mut()
            .find(|answer| answer.criteria_id == criteria_id)
        {
            Some(answer) => {
                answer.score = score;
                answer.comment = comment;
                answer.clone()
            }
            None => {
                let answer = Answer {
                    criteria_id,
                    score,
                    comment,
                };
                sheet.answers.push(answer.clone());
                answer
            }
        };

        Ok(answer)
    }

    /// Save the reviewer's overall verdict. Same lock guard as answers; no
    /// job-role check since the verdict references no criteria.
    pub fn save_sheet_answer(
        &self,
        sheet_id: SheetId,
        total_score: Option<Score>,
        comment: Option<String>,
    ) -> Result<SheetAnswer, ServiceError> {
        let mut ws = self.lock();
        let sheet = ws
            .sheets
            .get(&sheet_id)
            .ok_or(ServiceError::NotFound("sheet"))?;
        let review = ws
            .reviews
            .get(&sheet.review_id)
            .ok_or(ServiceError::NotFound("review"))?;

        if sheet.completed || review.completed {
            return Err(ServiceError::access_denied(
                "not allowed to modify sheet marked as completed",
            ));
        }

        let sheet = ws
            .sheets
            .get_mut(&sheet_id)
            .ok_or(ServiceError::NotFound("sheet"))?;
        sheet.sheet_answer.total_score = total_score;
        sheet.sheet_answer.comment = comment;

        Ok(sheet.sheet_answer.clone())
    }

    // --- weight assignment ---

    /// Apply a weight batch. The sum must round to exactly 1.00 and every
    /// sheet must exist before anything is written; a rejected batch leaves
    /// all weights untouched. Completed sheets are not exempt on this path.
    pub fn set_weights(&self, weights: &[SheetWeight]) -> Result<(), ServiceError> {
        let sum: f64 = weights.iter().map(|entry| entry.weight).sum();
        if (sum * 100.0).round() as i64 != 100 {
            return Err(ServiceError::precondition(
                "incorrect weights: sum must equal 1.00",
            ));
        }

        let mut ws = self.lock();
        if weights
            .iter()
            .any(|entry| !ws.sheets.contains_key(&entry.sheet_id))
        {
            return Err(ServiceError::NotFound("sheet"));
        }

        for entry in weights {
            if let Some(sheet) = ws.sheets.get_mut(&entry.sheet_id) {
                sheet.weight = Some(entry.weight);
            }
        }
        debug!(count = weights.len(), "sheet weights assigned");
        Ok(())
    }
}
