// ABOUTME: Session rating values and validation.
// ABOUTME: A rating is 1 through 5 and may be submitted once per session.

use handoff_transport::{FeedbackRequest, SessionId};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("feedback was already submitted for this session")]
    AlreadySubmitted,
}

/// Score in 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(score: u8) -> Result<Self, FeedbackError> {
        if (Self::MIN..=Self::MAX).contains(&score) {
            Ok(Self(score))
        } else {
            Err(FeedbackError::InvalidRating(score))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// The visitor's verdict on a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    /// Absent when the visitor never reached a human
    pub session_id: Option<SessionId>,
    pub rating: Rating,
    pub comment: Option<String>,
}

impl Feedback {
    /// Wire body, only when there is a session to attach it to
    pub fn to_request(&self) -> Option<FeedbackRequest> {
        self.session_id.as_ref().map(|sid| FeedbackRequest {
            session_id: sid.clone(),
            rating: self.rating.value(),
            comment: self.comment.clone().unwrap_or_default(),
        })
    }
}
