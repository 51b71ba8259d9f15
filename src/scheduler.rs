//! Blueprint scheduling.
//!
//! Schedules are derived from the blueprint files themselves on every wake,
//! so editing a blueprint on disk takes effect without restarting anything.
//! Two cadences exist: weekly (weekday + hour + minute, weekday absent
//! meaning every day) and monthly (day of month + optional month + hour,
//! on the hour).

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::blueprint::{self, Blueprint};
use crate::config::Config;
use crate::runner::{self, RunGuard};

/// Longest single sleep; keeps the blueprint directory re-scanned even when
/// the next job is far out.
const RESCAN_SECS: u64 = 60;

/// A blueprint's build cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fires at hour:minute on the given weekday (0 = Monday), or every
    /// day when no weekday is set
    Weekly {
        weekday: Option<u32>,
        hour: u32,
        minute: u32,
    },
    /// Fires on the hour on the given day of month, optionally pinned to
    /// one month of the year
    Monthly {
        day: u32,
        month: Option<u32>,
        hour: u32,
    },
}

impl Cadence {
    /// Read the cadence off a blueprint's schedule fields.
    ///
    /// `None` when the blueprint has no `every` field or an unknown value;
    /// such blueprints only run on demand.
    pub fn from_blueprint(blueprint: &Blueprint) -> Option<Self> {
        match blueprint.every.as_deref() {
            Some("weekly") => Some(Self::Weekly {
                weekday: blueprint.weekday,
                hour: blueprint.hour.unwrap_or(0),
                minute: blueprint.minute.unwrap_or(0),
            }),
            Some("monthly") => Some(Self::Monthly {
                day: blueprint.day.unwrap_or(1),
                month: blueprint.month,
                hour: blueprint.hour.unwrap_or(0),
            }),
            Some(other) => {
                tracing::warn!(playlist = %blueprint.name, every = other, "unknown cadence");
                None
            }
            None => None,
        }
    }

    /// First firing time strictly after `after`.
    ///
    /// Walks day by day, so a monthly cadence pinned to a day that a month
    /// does not have (February 30th) skips that month instead of firing on
    /// a shifted date.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        // 366 days covers a full year of monthly candidates
        for offset in 0..=366 {
            let day = (after + Duration::days(offset)).date_naive();

            let (hour, minute) = match self {
                Self::Weekly {
                    weekday,
                    hour,
                    minute,
                } => {
                    if let Some(wd) = weekday
                        && day.weekday().num_days_from_monday() != *wd
                    {
                        continue;
                    }
                    (*hour, *minute)
                }
                Self::Monthly { day: dom, month, hour } => {
                    if day.day() != *dom {
                        continue;
                    }
                    if let Some(m) = month
                        && day.month() != *m
                    {
                        continue;
                    }
                    (*hour, 0)
                }
            };

            let Some(candidate) = day.and_hms_opt(hour, minute, 0) else {
                return None;
            };
            let candidate = Utc.from_utc_datetime(&candidate);
            if candidate > after {
                return Some(candidate);
            }
        }
        None
    }
}

/// Next scheduled job across all enabled blueprints in the directory.
fn next_job(config: &Config, now: DateTime<Utc>) -> Option<(Blueprint, DateTime<Utc>)> {
    blueprint::load_dir(&config.paths.blueprints)
        .into_iter()
        .filter(|bp| bp.enabled)
        .filter_map(|bp| {
            let at = Cadence::from_blueprint(&bp)?.next_occurrence(now)?;
            Some((bp, at))
        })
        .min_by_key(|(_, at)| *at)
}

/// Scheduler loop: sleep until the next job (re-scanning the blueprint
/// directory at least every minute) and trigger runs as they come due.
///
/// Runs already in flight are skipped by the run guard, never queued.
pub async fn run(config: Arc<Config>, guard: RunGuard) {
    tracing::info!(dir = %config.paths.blueprints.display(), "scheduler started");

    loop {
        let now = Utc::now();
        let Some((blueprint, at)) = next_job(&config, now) else {
            tokio::time::sleep(std::time::Duration::from_secs(RESCAN_SECS)).await;
            continue;
        };

        let wait = (at - now).num_seconds().max(0) as u64;
        if wait > RESCAN_SECS {
            tokio::time::sleep(std::time::Duration::from_secs(RESCAN_SECS)).await;
            continue;
        }

        tracing::info!(playlist = %blueprint.name, at = %at, "next scheduled run");
        tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

        let config = Arc::clone(&config);
        let guard = guard.clone();
        tokio::spawn(async move {
            if let Err(e) = runner::run_blueprint(&config, &guard, &blueprint).await {
                tracing::error!(playlist = %blueprint.name, error = %e, "scheduled run failed");
            }
        });

        // Nudge past the firing minute so the same job isn't picked again
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}
