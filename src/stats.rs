use crate::days::date_key;
use crate::models::{
    Category, CategoryPoint, DailyHours, DayData, DayMap, DaySummary, Insights, StatsResponse,
    TimelinePoint, WeeklyHours,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Season,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    fn days(self) -> Option<i64> {
        match self {
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Season => Some(90),
            TimeRange::All => None,
        }
    }
}

pub fn build_stats_at(today: NaiveDate, days: &DayMap, range: TimeRange) -> StatsResponse {
    let timeline = timeline(days, today, range);
    let insights = insights(&timeline);
    StatsResponse {
        categories: category_breakdown(days),
        insights,
        timeline,
        last_7_days: last_7_days(days, today),
        weekly_totals: weekly_totals(days, today),
    }
}

pub fn timeline(days: &DayMap, today: NaiveDate, range: TimeRange) -> Vec<TimelinePoint> {
    let cutoff = range.days().map(|n| today - Duration::days(n));
    days.values()
        .filter(|day| cutoff.is_none_or(|cutoff| day.date >= cutoff))
        .map(|day| {
            let target_hours: f64 = day.goals.iter().map(|goal| goal.target_hours).sum();
            TimelinePoint {
                date: day.date,
                goals: day.goals.len(),
                completed_goals: day.completed_goals,
                completion_rate: percent(day.completed_goals as f64, day.goals.len() as f64),
                logged_hours: round_tenth(day.total_logged_hours),
                target_hours: round_tenth(target_hours),
                progress_rate: percent(day.total_logged_hours, target_hours).min(100),
            }
        })
        .collect()
}

pub fn category_breakdown(days: &DayMap) -> Vec<CategoryPoint> {
    #[derive(Default)]
    struct Tally {
        goals: usize,
        hours: f64,
        completed: usize,
    }

    let mut tallies: BTreeMap<Category, Tally> = BTreeMap::new();
    for day in days.values() {
        for goal in &day.goals {
            let tally = tallies.entry(goal.category).or_default();
            tally.goals += 1;
            tally.hours += goal.logged_hours_on(day.date);
            if goal.completed {
                tally.completed += 1;
            }
        }
    }

    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let tally = tallies.remove(&category)?;
            Some(CategoryPoint {
                category,
                label: category.label().to_string(),
                goals: tally.goals,
                hours: round_tenth(tally.hours),
                completed: tally.completed,
                completion_rate: percent(tally.completed as f64, tally.goals as f64),
            })
        })
        .collect()
}

pub fn insights(timeline: &[TimelinePoint]) -> Insights {
    if timeline.is_empty() {
        return Insights::default();
    }
    let count = timeline.len() as f64;
    let completion: u32 = timeline.iter().map(|point| point.completion_rate).sum();
    let progress: u32 = timeline.iter().map(|point| point.progress_rate).sum();

    Insights {
        avg_completion: (completion as f64 / count).round() as u32,
        avg_progress: (progress as f64 / count).round() as u32,
        total_hours: round_tenth(timeline.iter().map(|point| point.logged_hours).sum()),
        total_goals: timeline.iter().map(|point| point.goals).sum(),
        total_completed: timeline.iter().map(|point| point.completed_goals).sum(),
    }
}

pub fn last_7_days(days: &DayMap, today: NaiveDate) -> Vec<DailyHours> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let day = days.get(&date_key(date));
            DailyHours {
                date,
                logged_hours: day.map_or(0.0, |day| round_tenth(day.total_logged_hours)),
                completed_goals: day.map_or(0, |day| day.completed_goals),
            }
        })
        .collect()
}

pub fn weekly_totals(days: &DayMap, today: NaiveDate) -> Vec<WeeklyHours> {
    const WEEK_COUNT: i64 = 8;

    let current_week_start = week_start(today);
    (0..WEEK_COUNT)
        .rev()
        .map(|offset| {
            let start = current_week_start - Duration::weeks(offset);
            let end = start + Duration::days(6);

            let mut hours = 0.0;
            let mut completed = 0;
            for day_offset in 0..7 {
                if let Some(day) = days.get(&date_key(start + Duration::days(day_offset))) {
                    hours += day.total_logged_hours;
                    completed += day.completed_goals;
                }
            }

            WeeklyHours {
                week: week_label(start),
                start_date: start,
                end_date: end,
                logged_hours: round_tenth(hours),
                completed_goals: completed,
            }
        })
        .collect()
}

pub fn day_summary(day: &DayData) -> DaySummary {
    let total_target_hours: f64 = day.goals.iter().map(|goal| goal.target_hours).sum();
    DaySummary {
        completion_rate: percent(day.completed_goals as f64, day.goals.len() as f64),
        progress_rate: percent(day.total_logged_hours, total_target_hours),
        total_target_hours,
        logged_time: format_time((day.total_logged_hours * 60.0).round() as i64),
    }
}

/// `"{hours}h {minutes}m"`.
pub fn format_time(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn percent(part: f64, whole: f64) -> u32 {
    if whole > 0.0 {
        (part / whole * 100.0).round() as u32
    } else {
        0
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
