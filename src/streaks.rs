use crate::models::{Achievement, AchievementKind, Goal, UserStats};
use chrono::{DateTime, Duration, Utc};

struct AchievementDef {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    kind: AchievementKind,
    requirement: u64,
}

const DEFAULT_ACHIEVEMENTS: [AchievementDef; 7] = [
    AchievementDef {
        id: "first-checkin",
        title: "First Steps",
        description: "Complete your first daily check-in",
        icon: "🌱",
        kind: AchievementKind::Streak,
        requirement: 1,
    },
    AchievementDef {
        id: "streak-3",
        title: "Building Momentum",
        description: "Maintain a 3-day check-in streak",
        icon: "🔥",
        kind: AchievementKind::Streak,
        requirement: 3,
    },
    AchievementDef {
        id: "streak-7",
        title: "Week Warrior",
        description: "Achieve a 7-day check-in streak",
        icon: "⚡",
        kind: AchievementKind::Streak,
        requirement: 7,
    },
    AchievementDef {
        id: "streak-30",
        title: "Mindful Master",
        description: "Maintain a 30-day check-in streak",
        icon: "🏆",
        kind: AchievementKind::Streak,
        requirement: 30,
    },
    AchievementDef {
        id: "goals-10",
        title: "Goal Getter",
        description: "Complete 10 total goals",
        icon: "🎯",
        kind: AchievementKind::Goals,
        requirement: 10,
    },
    AchievementDef {
        id: "goals-50",
        title: "Achievement Hunter",
        description: "Complete 50 total goals",
        icon: "🌟",
        kind: AchievementKind::Goals,
        requirement: 50,
    },
    AchievementDef {
        id: "time-100",
        title: "Time Keeper",
        description: "Log 100 hours of focused time",
        icon: "⏰",
        kind: AchievementKind::Time,
        requirement: 6000,
    },
];

pub fn default_achievements() -> Vec<Achievement> {
    DEFAULT_ACHIEVEMENTS
        .iter()
        .map(|def| Achievement {
            id: def.id.to_string(),
            title: def.title.to_string(),
            description: def.description.to_string(),
            icon: def.icon.to_string(),
            kind: def.kind,
            requirement: def.requirement,
            unlocked_at: None,
            is_unlocked: false,
        })
        .collect()
}

pub fn can_check_in(stats: &UserStats, now: DateTime<Utc>) -> bool {
    stats
        .last_check_in
        .is_none_or(|last| last.date_naive() != now.date_naive())
}

/// Records today's check-in. Returns `false` if already checked in today.
pub fn check_in(stats: &mut UserStats, now: DateTime<Utc>) -> bool {
    if !can_check_in(stats, now) {
        return false;
    }

    let yesterday = now.date_naive() - Duration::days(1);
    let continues = stats
        .last_check_in
        .is_some_and(|last| last.date_naive() == yesterday);

    stats.current_streak = if continues { stats.current_streak + 1 } else { 1 };
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.total_check_ins += 1;
    stats.last_check_in = Some(now);
    true
}

/// Recomputes completion and logged-time totals from the goal list.
pub fn refresh_totals(stats: &mut UserStats, goals: &[Goal]) {
    stats.total_goals_completed = goals.iter().filter(|goal| goal.completed).count() as u64;
    stats.total_time_logged = goals
        .iter()
        .flat_map(|goal| goal.time_entries.iter())
        .map(|entry| entry.duration.max(0) as u64)
        .sum();
}

/// Unlocks every achievement whose threshold is met and returns the new ones.
pub fn evaluate_achievements(stats: &mut UserStats, now: DateTime<Utc>) -> Vec<Achievement> {
    if stats.achievements.is_empty() {
        stats.achievements = default_achievements();
    }

    let current_streak = stats.current_streak;
    let completed = stats.total_goals_completed;
    let minutes = stats.total_time_logged;

    let mut unlocked = Vec::new();
    for achievement in stats.achievements.iter_mut().filter(|a| !a.is_unlocked) {
        let reached = match achievement.kind {
            AchievementKind::Streak => current_streak >= achievement.requirement,
            AchievementKind::Goals => completed >= achievement.requirement,
            AchievementKind::Time => minutes >= achievement.requirement,
            AchievementKind::Special => false,
        };
        if reached {
            achievement.is_unlocked = true;
            achievement.unlocked_at = Some(now);
            unlocked.push(achievement.clone());
        }
    }
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> DateTime<Utc> {
        value.parse().unwrap()
    }

    #[test]
    fn first_check_in_starts_streak() {
        let mut stats = UserStats::default();
        assert!(check_in(&mut stats, at("2024-03-01T09:00:00Z")));
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 1);
        assert_eq!(stats.total_check_ins, 1);
    }

    #[test]
    fn second_check_in_same_day_is_ignored() {
        let mut stats = UserStats::default();
        check_in(&mut stats, at("2024-03-01T09:00:00Z"));
        assert!(!check_in(&mut stats, at("2024-03-01T22:00:00Z")));
        assert_eq!(stats.total_check_ins, 1);
    }

    #[test]
    fn consecutive_days_extend_and_gaps_reset() {
        let mut stats = UserStats::default();
        check_in(&mut stats, at("2024-03-01T09:00:00Z"));
        check_in(&mut stats, at("2024-03-02T09:00:00Z"));
        check_in(&mut stats, at("2024-03-03T09:00:00Z"));
        assert_eq!(stats.current_streak, 3);

        check_in(&mut stats, at("2024-03-05T09:00:00Z"));
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.total_check_ins, 4);
    }

    #[test]
    fn achievements_unlock_once() {
        let mut stats = UserStats {
            current_streak: 3,
            total_time_logged: 6000,
            ..UserStats::default()
        };
        let now = at("2024-03-03T09:00:00Z");

        let unlocked: Vec<String> = evaluate_achievements(&mut stats, now)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(unlocked, vec!["first-checkin", "streak-3", "time-100"]);
        assert_eq!(stats.achievements.len(), 7);

        assert!(evaluate_achievements(&mut stats, now).is_empty());
    }

    #[test]
    fn special_achievements_never_auto_unlock() {
        let mut stats = UserStats::default();
        stats.achievements = vec![Achievement {
            id: "special".into(),
            title: "Special".into(),
            description: String::new(),
            icon: String::new(),
            kind: AchievementKind::Special,
            requirement: 0,
            unlocked_at: None,
            is_unlocked: false,
        }];
        assert!(evaluate_achievements(&mut stats, Utc::now()).is_empty());
    }
}
