use crate::errors::StorageError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date key (`YYYY-MM-DD`) to cached aggregate.
pub type DayMap = BTreeMap<String, DayData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Health,
    Learning,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Health,
        Category::Learning,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Health => "Health",
            Category::Learning => "Learning",
            Category::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    /// Day the session counts toward; may differ from `start_time`'s date.
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole minutes, fixed when the session ends.
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub target_hours: f64,
    #[serde(default)]
    pub logged_hours: f64,
    #[serde(default)]
    pub completed: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_multi_day: bool,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
    pub created_at: DateTime<Utc>,
}

/// Longest date range a goal may cover, in days.
pub const MAX_GOAL_SPAN_DAYS: i64 = 366;

impl Goal {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Inclusive number of calendar days in the goal's range.
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days().max(0) + 1
    }

    pub fn total_target_hours(&self) -> f64 {
        if self.is_multi_day {
            self.target_hours * self.span_days() as f64
        } else {
            self.target_hours
        }
    }

    pub fn logged_hours_on(&self, date: NaiveDate) -> f64 {
        self.time_entries
            .iter()
            .filter(|entry| entry.date == date)
            .map(|entry| entry.duration as f64 / 60.0)
            .sum()
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.id.trim().is_empty() {
            return Err(StorageError::InvalidGoal("missing id".into()));
        }
        if self.title.trim().is_empty() {
            return Err(StorageError::InvalidGoal("missing title".into()));
        }
        if self.target_hours.is_nan() || self.target_hours <= 0.0 {
            return Err(StorageError::InvalidGoal(
                "targetHours must be positive".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(StorageError::InvalidGoal(format!(
                "endDate {} is before startDate {}",
                self.end_date, self.start_date
            )));
        }
        if self.span_days() > MAX_GOAL_SPAN_DAYS {
            return Err(StorageError::InvalidGoal(format!(
                "goal spans {} days, at most {MAX_GOAL_SPAN_DAYS} allowed",
                self.span_days()
            )));
        }
        Ok(())
    }
}

/// Input for creating a goal; the tracker fills in id, totals and timestamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    pub target_hours: f64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_multi_day: bool,
}

impl NewGoal {
    pub fn into_goal(self, id: String, created_at: DateTime<Utc>) -> Goal {
        let end_date = match (self.is_multi_day, self.end_date) {
            (true, Some(end)) if end >= self.start_date => end,
            _ => self.start_date,
        };
        let description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Goal {
            id,
            title: self.title.trim().to_string(),
            description,
            category: self.category,
            target_hours: self.target_hours,
            logged_hours: 0.0,
            completed: false,
            start_date: self.start_date,
            end_date,
            is_multi_day: self.is_multi_day,
            time_entries: Vec::new(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayData {
    pub date: NaiveDate,
    pub goals: Vec<Goal>,
    pub total_logged_hours: f64,
    pub completed_goals: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_in: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Streak,
    Goals,
    Time,
    Special,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub requirement: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_unlocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserStats {
    pub current_streak: u64,
    pub longest_streak: u64,
    pub total_check_ins: u64,
    pub total_goals_completed: u64,
    /// Minutes.
    pub total_time_logged: u64,
    pub achievements: Vec<Achievement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_in: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct NewTodo {
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Zen,
    Forest,
    Ocean,
    Sunset,
    Lavender,
    Rose,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Zen => "zen",
            Theme::Forest => "forest",
            Theme::Ocean => "ocean",
            Theme::Sunset => "sunset",
            Theme::Lavender => "lavender",
            Theme::Rose => "rose",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Zen => "Zen Mindfulness",
            Theme::Forest => "Forest Sanctuary",
            Theme::Ocean => "Ocean Depths",
            Theme::Sunset => "Sunset Warmth",
            Theme::Lavender => "Lavender Dreams",
            Theme::Rose => "Rose Garden",
        }
    }

    pub fn parse(name: &str) -> Option<Theme> {
        match name {
            "zen" => Some(Theme::Zen),
            "forest" => Some(Theme::Forest),
            "ocean" => Some(Theme::Ocean),
            "sunset" => Some(Theme::Sunset),
            "lavender" => Some(Theme::Lavender),
            "rose" => Some(Theme::Rose),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub remote_sync: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub completion_rate: u32,
    pub progress_rate: u32,
    pub total_target_hours: f64,
    pub logged_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayResponse {
    #[serde(flatten)]
    pub day: DayData,
    pub summary: DaySummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrateResponse {
    pub hydrated: bool,
    pub days: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub checked_in: bool,
    pub stats: UserStats,
    pub unlocked: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub goals: usize,
    pub completed_goals: usize,
    pub completion_rate: u32,
    pub logged_hours: f64,
    pub target_hours: f64,
    pub progress_rate: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPoint {
    pub category: Category,
    pub label: String,
    pub goals: usize,
    pub hours: f64,
    pub completed: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub avg_completion: u32,
    pub avg_progress: u32,
    pub total_hours: f64,
    pub total_goals: usize,
    pub total_completed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    pub date: NaiveDate,
    pub logged_hours: f64,
    pub completed_goals: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHours {
    pub week: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub logged_hours: f64,
    pub completed_goals: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub timeline: Vec<TimelinePoint>,
    pub categories: Vec<CategoryPoint>,
    pub insights: Insights,
    pub last_7_days: Vec<DailyHours>,
    pub weekly_totals: Vec<WeeklyHours>,
}
