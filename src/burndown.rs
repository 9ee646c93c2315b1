//! Burndown chart computation
//!
//! Pure functions over a sprint and its tasks, plus the per-sprint cache
//! filled by the burndown handlers.

use crate::core::AppError;
use crate::dtos::sprint::MAX_SPRINT_DAYS;
use crate::entities::{Sprint, Task};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BurndownPoint {
    pub day: i64,
    pub remaining_points: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BurndownData {
    pub sprint_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_story_points: i64,
    pub ideal_burndown: Vec<BurndownPoint>,
    pub actual_burndown: Vec<BurndownPoint>,
    pub last_updated: DateTime<Utc>,
}

/// Whole days covered by the sprint, rounded up
pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds();
    (seconds as f64 / SECONDS_PER_DAY as f64).ceil() as i64
}

pub fn ideal_line(total: i64, duration: i64) -> Vec<BurndownPoint> {
    if duration == 0 {
        return vec![BurndownPoint {
            day: 0,
            remaining_points: total as f64,
        }];
    }
    let total = total as f64;
    (0..=duration)
        .map(|day| BurndownPoint {
            day,
            remaining_points: (total - day as f64 * total / duration as f64).max(0.0),
        })
        .collect()
}

/// Remaining points per day, counting each task on the day it was completed.
/// Completions before the start or after the last day are ignored.
pub fn actual_line(
    start: DateTime<Utc>,
    total: i64,
    duration: i64,
    completions: &[(DateTime<Utc>, i64)],
) -> Vec<BurndownPoint> {
    let mut burned = vec![0i64; duration as usize + 1];
    for (completed_at, points) in completions {
        let day = (*completed_at - start).num_seconds().div_euclid(SECONDS_PER_DAY);
        if (0..=duration).contains(&day) {
            burned[day as usize] = burned[day as usize].saturating_add(*points);
        }
    }

    let mut remaining = total;
    burned
        .into_iter()
        .enumerate()
        .map(|(day, points)| {
            remaining = remaining.saturating_sub(points);
            BurndownPoint {
                day: day as i64,
                remaining_points: remaining.max(0) as f64,
            }
        })
        .collect()
}

pub fn compute(sprint: &Sprint, tasks: &[Task]) -> Result<BurndownData, AppError> {
    let duration = duration_days(sprint.start_date, sprint.end_date);
    if duration < 0 {
        return Err(AppError::bad_request("Sprint ends before it starts"));
    }
    if duration > MAX_SPRINT_DAYS {
        return Err(AppError::bad_request("Sprint is too long to chart"));
    }

    let completions: Vec<(DateTime<Utc>, i64)> = tasks
        .iter()
        .filter_map(|t| t.completed_at.map(|at| (at, t.story_points)))
        .collect();

    Ok(BurndownData {
        sprint_id: sprint.sprint_id,
        start_date: sprint.start_date,
        end_date: sprint.end_date,
        total_story_points: sprint.total_story_points,
        ideal_burndown: ideal_line(sprint.total_story_points, duration),
        actual_burndown: actual_line(
            sprint.start_date,
            sprint.total_story_points,
            duration,
            &completions,
        ),
        last_updated: Utc::now(),
    })
}

/// Last computed chart of each sprint
pub struct BurndownCache {
    charts: DashMap<i64, BurndownData>,
}

impl BurndownCache {
    pub fn new() -> Self {
        Self {
            charts: DashMap::new(),
        }
    }

    pub fn store(&self, data: BurndownData) {
        self.charts.insert(data.sprint_id, data);
    }

    pub fn get(&self, sprint_id: i64) -> Option<BurndownData> {
        self.charts.get(&sprint_id).map(|entry| entry.value().clone())
    }

    pub fn invalidate(&self, sprint_id: i64) {
        self.charts.remove(&sprint_id);
    }
}

impl Default for BurndownCache {
    fn default() -> Self {
        Self::new()
    }
}
