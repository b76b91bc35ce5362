use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Hours added to a post's age so brand-new posts don't divide by ~0.
const AGE_OFFSET_HOURS: f64 = 2.0;
const GRAVITY: f64 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    Hot,
    New,
    Top,
}

impl PostSort {
    /// Unknown or missing values fall back to `hot`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("new") => PostSort::New,
            Some("top") => PostSort::Top,
            _ => PostSort::Hot,
        }
    }
}

/// `upvotes / (age_hours + 2)^1.5`. Posts dated in the future count as age 0.
pub fn hot_score(created_at: DateTime<Utc>, upvotes: i64, now: DateTime<Utc>) -> f64 {
    let age_ms = (now - created_at).num_milliseconds().max(0);
    let age_hours = age_ms as f64 / 3_600_000.0;
    upvotes as f64 / (age_hours + AGE_OFFSET_HOURS).powf(GRAVITY)
}

pub trait HotRanked {
    fn created_at(&self) -> DateTime<Utc>;
    fn upvotes(&self) -> i64;
}

/// Stable sort, highest score first; equal scores keep their input order.
pub fn sort_by_hot<T: HotRanked>(items: &mut [T], now: DateTime<Utc>) {
    items.sort_by(|a, b| {
        let score_a = hot_score(a.created_at(), a.upvotes(), now);
        let score_b = hot_score(b.created_at(), b.upvotes(), now);
        score_b.total_cmp(&score_a)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct Item {
        name: &'static str,
        created_at: DateTime<Utc>,
        upvotes: i64,
    }

    impl HotRanked for Item {
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
        fn upvotes(&self) -> i64 {
            self.upvotes
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn score_formula() {
        let score = hot_score(now() - Duration::hours(2), 8, now());
        assert!((score - 1.0).abs() < 1e-9);
        assert_eq!(hot_score(now(), 0, now()), 0.0);
    }

    #[test]
    fn more_votes_rank_higher_at_equal_age() {
        let created = now() - Duration::hours(5);
        assert!(hot_score(created, 10, now()) > hot_score(created, 9, now()));
    }

    #[test]
    fn older_posts_rank_lower_at_equal_votes() {
        let fresh = hot_score(now() - Duration::hours(1), 5, now());
        let stale = hot_score(now() - Duration::hours(30), 5, now());
        assert!(fresh > stale);
    }

    #[test]
    fn future_timestamps_clamp_to_zero_age() {
        let future = hot_score(now() + Duration::hours(3), 4, now());
        let present = hot_score(now(), 4, now());
        assert_eq!(future, present);
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let item = |name, hours_ago, upvotes| Item {
            name,
            created_at: now() - Duration::hours(hours_ago),
            upvotes,
        };
        let mut items = vec![
            item("old", 48, 3),
            item("tie-a", 1, 0),
            item("hot", 1, 6),
            item("tie-b", 9, 0),
        ];
        sort_by_hot(&mut items, now());
        let names: Vec<&str> = items.iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["hot", "old", "tie-a", "tie-b"]);
    }

    #[test]
    fn sort_parsing_falls_back_to_hot() {
        assert_eq!(PostSort::from_query(Some("new")), PostSort::New);
        assert_eq!(PostSort::from_query(Some("top")), PostSort::Top);
        assert_eq!(PostSort::from_query(Some("trending")), PostSort::Hot);
        assert_eq!(PostSort::from_query(None), PostSort::Hot);
    }
}
