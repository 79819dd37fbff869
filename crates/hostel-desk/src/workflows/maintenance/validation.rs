use std::collections::HashSet;

use super::domain::{ImageDescriptor, MaintenanceSubmission, RatingSubmission, RequestId};

/// Input errors raised before anything reaches the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("hostel reference must not be empty")]
    MissingHostel,
    #[error("at most {max} images can be attached to a request (found {found})")]
    TooManyImages { max: usize, found: usize },
    #[error("at least one image must be attached")]
    NoImages,
    #[error("image #{index} is missing a storage key")]
    MissingStorageKey { index: usize },
    #[error("rating must be between 1 and 5 (found {0})")]
    RatingOutOfRange(u8),
    #[error("bulk update must select at least one request")]
    EmptyBatch,
    #[error("bulk update selects {found} requests but the limit is {limit}")]
    BatchTooLarge { limit: usize, found: usize },
}

pub const MAX_IMAGES_PER_REQUEST: usize = 5;
pub const DEFAULT_BULK_LIMIT: usize = 100;

/// Guard normalising submissions and batch selections.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    max_images: usize,
    bulk_limit: usize,
}

impl Default for IntakeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_BULK_LIMIT)
    }
}

impl IntakeGuard {
    pub fn new(bulk_limit: usize) -> Self {
        Self {
            max_images: MAX_IMAGES_PER_REQUEST,
            bulk_limit: bulk_limit.max(1),
        }
    }

    pub fn bulk_limit(&self) -> usize {
        self.bulk_limit
    }

    /// Trim text fields and reject empty or oversized submissions.
    pub fn sanitize(
        &self,
        mut submission: MaintenanceSubmission,
    ) -> Result<MaintenanceSubmission, ValidationError> {
        submission.title = submission.title.trim().to_string();
        submission.description = submission.description.trim().to_string();

        if submission.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if submission.description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if submission.location.hostel_id.0.trim().is_empty() {
            return Err(ValidationError::MissingHostel);
        }
        submission.location.room_id = submission
            .location
            .room_id
            .map(|room| room.trim().to_string())
            .filter(|room| !room.is_empty());

        self.check_images(0, &submission.images)?;
        Ok(submission)
    }

    /// Validate images against the cap, counting those already attached.
    pub fn check_images(
        &self,
        existing: usize,
        images: &[ImageDescriptor],
    ) -> Result<(), ValidationError> {
        let found = existing + images.len();
        if found > self.max_images {
            return Err(ValidationError::TooManyImages {
                max: self.max_images,
                found,
            });
        }

        match images
            .iter()
            .position(|image| image.storage_key.trim().is_empty())
        {
            Some(index) => Err(ValidationError::MissingStorageKey {
                index: existing + index + 1,
            }),
            None => Ok(()),
        }
    }

    pub fn check_rating(&self, rating: &RatingSubmission) -> Result<(), ValidationError> {
        if (1..=5).contains(&rating.score) {
            Ok(())
        } else {
            Err(ValidationError::RatingOutOfRange(rating.score))
        }
    }

    /// Drop duplicate ids, keeping first-seen order, and enforce the batch cap.
    pub fn batch_ids(&self, ids: Vec<RequestId>) -> Result<Vec<RequestId>, ValidationError> {
        let mut seen = HashSet::new();
        let unique: Vec<RequestId> = ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        if unique.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        if unique.len() > self.bulk_limit {
            return Err(ValidationError::BatchTooLarge {
                limit: self.bulk_limit,
                found: unique.len(),
            });
        }
        Ok(unique)
    }
}
