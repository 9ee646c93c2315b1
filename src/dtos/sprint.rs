//! Sprint DTOs

use crate::entities::SprintStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Longest accepted sprint, in days
pub const MAX_SPRINT_DAYS: i64 = 365;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[validate(schema(function = "validate_sprint_window"))]
pub struct CreateSprintDTO {
    #[validate(length(min = 1, max = 100, message = "Sprint name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub goal: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(range(min = 0, max = 10000, message = "Story points must be between 0 and 10000"))]
    #[serde(default)]
    pub total_story_points: i64,
    pub status: Option<SprintStatus>,
}

fn validate_sprint_window(dto: &CreateSprintDTO) -> Result<(), ValidationError> {
    check_window(&dto.start_date, &dto.end_date)
}

/// A sprint may not end before it starts nor last longer than `MAX_SPRINT_DAYS`
pub fn check_window(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        let mut err = ValidationError::new("sprint_window");
        err.message = Some("end_date must not be before start_date".into());
        return Err(err);
    }
    if *end - *start > chrono::Duration::days(MAX_SPRINT_DAYS) {
        let mut err = ValidationError::new("sprint_window");
        err.message = Some(format!("a sprint may not last longer than {MAX_SPRINT_DAYS} days").into());
        return Err(err);
    }
    Ok(())
}

/// Partial update, only `Some` fields change
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateSprintDTO {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub goal: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 10000, message = "Story points must be between 0 and 10000"))]
    pub total_story_points: Option<i64>,
    pub status: Option<SprintStatus>,
}
