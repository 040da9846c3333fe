//! Product reviews and ratings.

use serde::{Deserialize, Serialize};

use super::bytes::{base64_list, data_url};
use super::{Principal, ProductId, ReviewId};

/// A review left by a caller on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: Principal,
    pub product_id: ProductId,
    pub comment: String,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: i64,
    /// 1-5 by convention; the backend does not guarantee the range.
    pub rating: u64,
    #[serde(default, with = "base64_list")]
    pub photos: Vec<Vec<u8>>,
}

impl Review {
    /// Creation time, if the timestamp is representable.
    #[must_use]
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let secs = self.timestamp.div_euclid(1_000_000_000);
        let nanos = u32::try_from(self.timestamp.rem_euclid(1_000_000_000)).ok()?;
        chrono::DateTime::from_timestamp(secs, nanos)
    }

    /// Inline URLs for the attached photos.
    #[must_use]
    pub fn photo_urls(&self) -> Vec<String> {
        self.photos
            .iter()
            .map(|bytes| data_url("image/jpeg", bytes))
            .collect()
    }
}

/// Errors that can occur when constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    #[error(
        "rating must be between {min} and {max} (got {got})",
        min = Rating::MIN,
        max = Rating::MAX
    )]
    OutOfRange { got: u64 },
}

/// A star rating submitted through the review form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u64 = 1;
    pub const MAX: u64 = 5;

    /// Validate a rating value.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] outside `1..=5`.
    pub fn new(value: u64) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            u8::try_from(value)
                .map(Self)
                .map_err(|_| RatingError::OutOfRange { got: value })
        } else {
            Err(RatingError::OutOfRange { got: value })
        }
    }

    #[must_use]
    pub fn value(self) -> u64 {
        u64::from(self.0)
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(5)
    }
}

impl TryFrom<u64> for Rating {
    type Error = RatingError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

/// Arithmetic mean of all ratings, or `None` when there are no reviews.
#[must_use]
#[allow(clippy::cast_precision_loss)] // ratings and review counts are small
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let sum: f64 = reviews.iter().map(|r| r.rating as f64).sum();
    Some(sum / reviews.len() as f64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(id: u64, rating: u64) -> Review {
        Review {
            id: ReviewId::new(id),
            user_id: Principal::parse("aaaaa-aa").unwrap(),
            product_id: ProductId::new(1),
            comment: "Lovely".to_string(),
            timestamp: 1_700_000_000_000_000_000,
            rating,
            photos: Vec::new(),
        }
    }

    #[test]
    fn test_average_rating_empty() {
        assert_eq!(average_rating(&[]), None);
    }

    #[test]
    fn test_average_rating_mean() {
        let reviews = vec![review(1, 5), review(2, 4), review(3, 3)];
        let avg = average_rating(&reviews).unwrap();
        assert!((avg - 4.0).abs() < f64::EPSILON);

        let reviews = vec![review(1, 5), review(2, 4)];
        let avg = average_rating(&reviews).unwrap();
        assert!((avg - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_range() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert_eq!(Rating::default().value(), 5);
    }

    #[test]
    fn test_created_at_from_nanos() {
        let r = review(1, 5);
        let at = r.created_at().unwrap();
        assert_eq!(at.timestamp(), 1_700_000_000);
    }
}
