// libs/booking-cell/src/services/reviews.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{
    CreateReviewRequest, Review, ReviewError, ReviewStatus, MAX_RATING, MIN_RATING,
};
use crate::store::BookingStore;

/// Client reviews. Submissions wait as `pending` until moderated; only
/// approved reviews are listed publicly.
pub struct ReviewService {
    store: Arc<dyn BookingStore>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Published reviews, newest first.
    pub async fn list_published(&self) -> Result<Vec<Review>, ReviewError> {
        let reviews = self.store.list_reviews().await.map_err(|e| {
            error!("Failed to load reviews: {}", e);
            ReviewError::from(e)
        })?;

        Ok(reviews
            .into_iter()
            .filter(|review| review.status == ReviewStatus::Approved)
            .collect())
    }

    pub async fn submit(
        &self,
        request: &CreateReviewRequest,
        now: DateTime<Utc>,
    ) -> Result<Review, ReviewError> {
        let review = Self::validate(request, now)?;

        let review = self.store.create_review(review).await.map_err(|e| {
            error!("Failed to store review: {}", e);
            ReviewError::from(e)
        })?;

        info!("Review {} submitted for moderation", review.id);
        Ok(review)
    }

    fn validate(request: &CreateReviewRequest, now: DateTime<Utc>) -> Result<Review, ReviewError> {
        let name = non_blank(&request.name).ok_or(ReviewError::IncompleteReview)?;
        let comment = non_blank(&request.comment).ok_or(ReviewError::IncompleteReview)?;
        let rating = request.rating.ok_or(ReviewError::IncompleteReview)?;

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::InvalidRating);
        }

        Ok(Review {
            id: Uuid::new_v4(),
            client_name: name.to_string(),
            rating,
            comment: comment.to_string(),
            status: ReviewStatus::Pending,
            created_at: now,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
