//! Application ratings and user feedback.

use std::sync::Arc;

use chrono::Utc;
use gateway_core::{ErrorType, Rating, RequestResult, ServiceType, UserFeedback};
use gateway_store::{DbResult, DbStatusCode, FeedbackDelegate, RatingDelegate};

#[derive(Clone)]
pub struct UserFeedbackService {
    ratings: Arc<dyn RatingDelegate>,
    feedback: Arc<dyn FeedbackDelegate>,
}

impl UserFeedbackService {
    pub fn new(ratings: Arc<dyn RatingDelegate>, feedback: Arc<dyn FeedbackDelegate>) -> Self {
        Self { ratings, feedback }
    }

    /// Store an anonymous rating. Success only when the row was created.
    pub async fn create_rating(&self, rating: &Rating) -> RequestResult<Rating> {
        tracing::debug!(rating_value = rating.rating_value, skip = rating.skip, "Creating rating");
        let result = self.ratings.insert_rating(rating).await;

        match result.payload {
            Some(rating) if result.status == DbStatusCode::Created => RequestResult::success(rating),
            _ => RequestResult::service_error(
                ErrorType::CommunicationInternal,
                ServiceType::Database,
                result.message,
            ),
        }
    }

    /// Store user feedback, returning the database outcome as is.
    pub async fn create_user_feedback(&self, feedback: &UserFeedback) -> DbResult<UserFeedback> {
        let feedback = UserFeedback {
            created_date_time: Utc::now(),
            ..feedback.clone()
        };
        let result = self.feedback.insert_user_feedback(&feedback).await;
        if !result.is(DbStatusCode::Created) {
            tracing::warn!(status = ?result.status, message = %result.message, "User feedback not stored");
        }
        result
    }
}
