//! Scheduled backup functionality for dbkeeper
//!
//! Runs a backup job on a cron schedule until stopped or until a run limit
//! is reached.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use cron::Schedule;
use dbkeeper_core::ToolPaths;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::backup::{backup_database, BackupRequest};
use crate::error::{BackupError, BackupResult};

/// A parsed cron expression
#[derive(Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
}

impl CronSchedule {
    /// Parse a 5-field (minute precision) or 6/7-field (seconds, optional year) expression
    ///
    /// 5-field expressions follow crontab numbering for the day of week
    /// (0 or 7 is Sunday). Longer expressions use the cron crate's numbering
    /// (1 is Sunday).
    pub fn parse(expression: &str) -> BackupResult<Self> {
        let expression = expression.trim();
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let normalized = if fields.len() == 5 {
            let day_of_week = crontab_day_of_week(fields[4])
                .map_err(|e| BackupError::schedule(format!("'{expression}': {e}")))?;
            format!("0 {} {day_of_week}", fields[..4].join(" "))
        } else {
            expression.to_string()
        };
        let schedule = Schedule::from_str(&normalized)
            .map_err(|e| BackupError::schedule(format!("'{expression}': {e}")))?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    /// First fire time strictly after `after`
    pub fn next_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(after).next()
    }

    /// Expression as given
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

/// Rewrite a crontab day-of-week field (0-7, Sunday is 0 and 7) into the
/// cron crate's numbering (1-7, Sunday is 1)
///
/// Numeric items are expanded into explicit day lists. Names and bare `*`
/// or `?` are passed through untouched.
fn crontab_day_of_week(field: &str) -> Result<String, String> {
    let mut items = Vec::new();
    for item in field.split(',') {
        match crontab_days(item)? {
            Some(days) => items.extend(days.iter().map(|day| (day + 1).to_string())),
            None => items.push(item.to_string()),
        }
    }
    Ok(items.join(","))
}

/// Days (0 = Sunday) selected by one list item, `None` when it is not numeric
fn crontab_days(item: &str) -> Result<Option<BTreeSet<u32>>, String> {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let step = match step {
        Some(step) => match step.parse::<usize>() {
            Ok(step) if step > 0 => step,
            _ => return Err(format!("invalid day-of-week step '{step}'")),
        },
        None => 1,
    };

    let (start, end) = match base {
        "*" | "?" if step == 1 => return Ok(None),
        "*" | "?" => (0, 6),
        _ => {
            let (first, last) = base.split_once('-').unwrap_or((base, base));
            let (Some(first), Some(last)) = (day_number(first)?, day_number(last)?) else {
                return Ok(None);
            };
            // `n/step` runs to the end of the week
            let last = if step > 1 && !base.contains('-') { 6 } else { last };
            (first, last)
        }
    };
    if start > end {
        return Err(format!("day-of-week range '{base}' is reversed"));
    }
    Ok(Some((start..=end).step_by(step).map(|day| day % 7).collect()))
}

fn day_number(token: &str) -> Result<Option<u32>, String> {
    if !token.bytes().all(|b| b.is_ascii_digit()) || token.is_empty() {
        return Ok(None);
    }
    match token.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(Some(day)),
        _ => Err(format!("day of week '{token}' is out of range 0-7")),
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.expression).finish()
    }
}

/// Work performed on every tick of a schedule
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    /// Run once
    async fn run(&self) -> BackupResult<()>;
}

/// Backs up one database into a directory
#[derive(Debug, Clone)]
pub struct BackupJob {
    /// Tool locations
    pub tools: ToolPaths,
    /// Backup to take on every run, `output` is normally left empty
    pub request: BackupRequest,
    /// Directory receiving generated backup files
    pub backup_dir: PathBuf,
}

#[async_trait]
impl ScheduledJob for BackupJob {
    async fn run(&self) -> BackupResult<()> {
        backup_database(&self.tools, &self.request, &self.backup_dir)
            .await
            .map(|_| ())
    }
}

/// Manages scheduled backup operations
pub struct BackupScheduler {
    schedule: CronSchedule,
    job: Arc<dyn ScheduledJob>,
    max_runs: Option<usize>,
    handle: Option<JoinHandle<usize>>,
}

impl BackupScheduler {
    /// Create a new BackupScheduler instance
    pub fn new(schedule: CronSchedule, job: impl ScheduledJob) -> Self {
        Self {
            schedule,
            job: Arc::new(job),
            max_runs: None,
            handle: None,
        }
    }

    /// Stop after `runs` executions
    pub fn with_max_runs(mut self, runs: usize) -> Self {
        self.max_runs = Some(runs);
        self
    }

    /// Whether the scheduling task is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start the backup scheduler
    #[instrument(skip(self), fields(schedule = %self.schedule.expression()))]
    pub fn start(&mut self) -> BackupResult<()> {
        if self.handle.is_some() {
            return Err(BackupError::other("Scheduler already running"));
        }

        let schedule = self.schedule.clone();
        let job = Arc::clone(&self.job);
        let max_runs = self.max_runs;
        self.handle = Some(tokio::spawn(async move {
            Self::run_scheduled_backups(schedule, job, max_runs).await
        }));

        info!("⏰ Backup scheduler started");
        Ok(())
    }

    /// Stop the backup scheduler
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> BackupResult<()> {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            info!("🛑 Backup scheduler stopped");
        }
        Ok(())
    }

    /// Wait for the scheduler to finish, returning the number of runs
    ///
    /// Without a run limit this only returns once the schedule is exhausted.
    /// Cancelling the returned future leaves the task running and stoppable.
    pub async fn wait(&mut self) -> BackupResult<usize> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| BackupError::other("Scheduler not running"))?;
        let result = handle.await;
        self.handle = None;
        result.map_err(|e| BackupError::other(format!("Scheduler task failed: {e}")))
    }

    /// Main backup scheduling loop
    async fn run_scheduled_backups(
        schedule: CronSchedule,
        job: Arc<dyn ScheduledJob>,
        max_runs: Option<usize>,
    ) -> usize {
        let mut runs = 0;
        while max_runs.map_or(true, |max| runs < max) {
            let now = Local::now();
            let Some(next) = schedule.next_after(&now) else {
                warn!("⚠️ Schedule '{}' has no upcoming fire time", schedule.expression());
                break;
            };
            info!("⏰ Next scheduled backup at {}", next.format("%Y-%m-%d %H:%M:%S"));
            let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(delay).await;

            info!("⏰ Running scheduled backup");
            if let Err(e) = job.run().await {
                error!("❌ Scheduled backup failed: {}", e);
            }
            runs += 1;
        }
        runs
    }
}

impl fmt::Debug for BackupScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupScheduler")
            .field("schedule", &self.schedule)
            .field("max_runs", &self.max_runs)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
