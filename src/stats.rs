use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::db;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_submissions: i64,
    pub submissions_by_form_type: BTreeMap<String, i64>,
    pub submissions_by_occupation: BTreeMap<String, i64>,
    pub submissions_by_date: BTreeMap<String, i64>,
    pub date_range_days: i32,
    pub last_updated: DateTime<Utc>,
}

pub async fn compute(pool: &PgPool, date_range_days: i32) -> Result<Stats, sqlx::Error> {
    let total_submissions = db::stats::total(pool).await?;
    let by_type = db::submissions::count_by_form_type(pool).await?;
    let by_occupation = db::stats::by_occupation(pool).await?;
    let by_date = db::stats::by_date(pool, date_range_days).await?;

    Ok(Stats {
        total_submissions,
        submissions_by_form_type: by_type.into_iter().collect(),
        submissions_by_occupation: by_occupation.into_iter().collect(),
        submissions_by_date: by_date
            .into_iter()
            .map(|(day, count)| (day.to_string(), count))
            .collect(),
        date_range_days,
        last_updated: Utc::now(),
    })
}

#[derive(Debug)]
struct Entry {
    stats: Stats,
    stored_at: DateTime<Utc>,
}

/// Single-value cache for aggregate statistics. Callers pass the current
/// time so expiry does not depend on the wall clock.
pub struct StatsCache {
    ttl: Duration,
    entry: RwLock<Option<Entry>>,
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// The cached value, if it was stored less than `ttl` before `now` for
    /// the same date range.
    pub async fn get(&self, date_range_days: i32, now: DateTime<Utc>) -> Option<Stats> {
        let guard = self.entry.read().await;
        let entry = guard.as_ref()?;
        let age = (now - entry.stored_at).to_std().unwrap_or(Duration::ZERO);
        (age < self.ttl && entry.stats.date_range_days == date_range_days)
            .then(|| entry.stats.clone())
    }

    pub async fn put(&self, stats: Stats, now: DateTime<Utc>) {
        *self.entry.write().await = Some(Entry {
            stats,
            stored_at: now,
        });
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}
