//! Review scoring and lifecycle engine.
//!
//! A `Review` collects one `Sheet` per reviewer; each sheet carries one
//! `Answer` per scoring criteria plus a single overall `SheetAnswer` verdict.
//! Scores aggregate into per-criterion and per-review results through a
//! weighted average, recomputed on every read. Sheets and reviews share a
//! two-level completion state machine: completing a review force-closes its
//! open sheets, and completed sheets reject edits until reopened.

pub mod domain;
pub mod error;
pub mod router;
pub mod scoring;
pub mod service;
pub(crate) mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    Answer, Caller, Criteria, CriteriaId, Expectation, JobRole, JobRoleId, NewUser, Position,
    Review, ReviewId, ReviewPatch, ReviewerGroup, Score, SelfReview, SelfReviewPatch, Sheet,
    SheetAnswer, SheetId, SheetPatch, SheetWeight, User, UserId, UserPatch, UserRole,
};
pub use error::ServiceError;
pub use router::review_router;
pub use scoring::{weighted_score, ScoreWithWeight};
pub use service::ReviewService;
pub use views::{
    Comment, CriteriaResult, ReviewView, SheetCounters, SheetView, TotalResult, UserSummary,
    UserView,
};
