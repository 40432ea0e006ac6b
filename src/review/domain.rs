use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a job role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct JobRoleId(pub u64);

/// Identifier for a scoring criteria.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CriteriaId(pub u64);

/// Identifier for a user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u64);

/// Identifier for a review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ReviewId(pub u64);

/// Identifier for a reviewer's sheet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SheetId(pub u64);

/// Discrete rating scale. `None` is a "no opinion" sentinel: it never enters
/// numeric aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Score {
    None,
    WayBelowExpectations,
    BelowExpectations,
    MeetExpectations,
    AboveExpectations,
    WayAboveExpectations,
}

impl Score {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::None,
            Self::WayBelowExpectations,
            Self::BelowExpectations,
            Self::MeetExpectations,
            Self::AboveExpectations,
            Self::WayAboveExpectations,
        ]
    }

    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Nearest bucket for an aggregated value, clamped to the scale bounds.
    pub fn from_value(value: f64) -> Self {
        let index = value.round().clamp(0.0, 5.0) as usize;
        Self::ordered()[index]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "no opinion",
            Self::WayBelowExpectations => "way below expectations",
            Self::BelowExpectations => "below expectations",
            Self::MeetExpectations => "meets expectations",
            Self::AboveExpectations => "above expectations",
            Self::WayAboveExpectations => "way above expectations",
        }
    }
}

/// Seniority ladder. `None` means the user has not been leveled yet and can
/// not be put under review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    None,
    Trainee,
    Junior,
    Middle,
    Senior,
}

impl Position {
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "unleveled",
            Self::Trainee => "trainee",
            Self::Junior => "junior",
            Self::Middle => "middle",
            Self::Senior => "senior",
        }
    }
}

/// Access tier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Head,
    Admin,
}

/// Relationship of a reviewer to the reviewee. Categorical only; it never
/// influences aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewerGroup {
    Stakeholder,
    Colleague,
    Mentee,
    Mentor,
    Manager,
    ProjectManager,
}

impl Default for ReviewerGroup {
    fn default() -> Self {
        Self::Colleague
    }
}

/// A named role that owns the set of criteria its holders are scored on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRole {
    pub id: JobRoleId,
    pub name: String,
}

/// One scoring dimension of a job role. Archived criteria stop appearing on
/// new sheets but stay attached to historical answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    pub id: CriteriaId,
    pub job_role_id: JobRoleId,
    pub name: String,
    pub description: String,
    pub archived: bool,
}

/// What a given position is expected to demonstrate for one criteria.
/// Reference text only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub criteria_id: CriteriaId,
    pub position: Position,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub user_role: UserRole,
    pub job_role_id: Option<JobRoleId>,
    pub position: Position,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub active: bool,
}

/// Fields accepted when registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default = "default_user_role")]
    pub user_role: UserRole,
    #[serde(default)]
    pub job_role_id: Option<JobRoleId>,
    #[serde(default = "default_position")]
    pub position: Position,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
}

fn default_user_role() -> UserRole {
    UserRole::User
}

fn default_position() -> Position {
    Position::None
}

/// The reviewee's own free-text self-assessment, created empty alongside its
/// review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfReview {
    pub description: Option<String>,
    pub good_things: Option<String>,
    pub bad_things: Option<String>,
}

/// One review cycle for one user in one period.
///
/// `user_position` is a snapshot taken at creation and never re-derived;
/// `sheet_ids` keeps the sheets in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub period: String,
    pub user_position: Position,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub self_review: SelfReview,
    pub sheet_ids: Vec<SheetId>,
}

/// Score and comment for one criteria within one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub criteria_id: CriteriaId,
    pub score: Option<Score>,
    pub comment: Option<String>,
}

impl Answer {
    pub(crate) fn stub(criteria_id: CriteriaId) -> Self {
        Self {
            criteria_id,
            score: None,
            comment: None,
        }
    }
}

/// The reviewer's single overall verdict for a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAnswer {
    pub comment: Option<String>,
    pub total_score: Option<Score>,
}

/// One reviewer's complete scoring form for one review.
///
/// The answer set is fixed at creation: one stub per non-archived criteria of
/// the reviewee's job role at that instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub id: SheetId,
    pub review_id: ReviewId,
    pub reviewer_id: UserId,
    pub due_date: NaiveDate,
    pub weight: Option<f64>,
    pub reviewer_group: ReviewerGroup,
    pub completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub sheet_answer: SheetAnswer,
    pub answers: Vec<Answer>,
}

/// Partial update for a review. Completion transitions are interpreted by the
/// service; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub period: Option<String>,
    pub completed: Option<bool>,
}

/// Partial update for a sheet. Weights are assigned through the batch path,
/// not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetPatch {
    pub due_date: Option<NaiveDate>,
    pub reviewer_group: Option<ReviewerGroup>,
    pub completed: Option<bool>,
}

/// Partial update for a self review.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelfReviewPatch {
    pub description: Option<String>,
    pub good_things: Option<String>,
    pub bad_things: Option<String>,
}

/// Partial update for a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub user_role: Option<UserRole>,
    pub job_role_id: Option<JobRoleId>,
    pub position: Option<Position>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub active: Option<bool>,
}

/// One entry of a weight batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetWeight {
    pub sheet_id: SheetId,
    pub weight: f64,
}

/// Identity of the caller issuing an intent. Passed explicitly; the engine
/// keeps no ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub username: String,
    pub user_role: UserRole,
}

impl Caller {
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_role: UserRole::Admin,
        }
    }

    pub const fn is_admin(&self) -> bool {
        matches!(self.user_role, UserRole::Admin)
    }
}
