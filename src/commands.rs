//! Command-line operations
//!
//! One backup, restore or point-in-time restore per invocation, or a cron
//! schedule of backups. Operations are recorded in the audit log when an
//! audit database is configured.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use dbkeeper_backup::{
    backup_database, point_in_time_restore, restore, BackupJob, BackupRequest, BackupResult,
    BackupScheduler, CronSchedule, RestoreRequest, ScheduledJob,
};
use dbkeeper_core::ConnectionParams;
use dbkeeper_db::{
    connect_audit_store, record_or_log, AuditAction, AuditLog, AuditStatus, NewAuditEntry,
};
use tracing::{error, info, instrument, warn};

use crate::clap::{ActionType, Args};
use crate::server::shutdown_signal;
use crate::Config;

/// Run the command-line mode
pub async fn run(args: &Args, config: &Config) -> Result<()> {
    let audit = match config.audit_database() {
        Some(db) => match connect_audit_store(&db).await {
            Ok(store) => Some(Arc::new(store) as Arc<dyn AuditLog>),
            Err(e) => {
                warn!("⚠️ Audit database unavailable, operations will not be recorded: {}", e);
                None
            }
        },
        None => None,
    };
    execute(args, config, audit).await
}

/// Dispatch on the parsed flags
pub async fn execute(args: &Args, config: &Config, audit: Option<Arc<dyn AuditLog>>) -> Result<()> {
    if let Some(expression) = &args.schedule {
        return run_schedule(args, config, expression, audit).await;
    }

    let action = args
        .action_type
        .context("--actiontype is required in commandline mode")?;
    let connection = connection(args)?;
    let tables = args.table_list();

    match action {
        ActionType::Backup => {
            let request = BackupRequest {
                connection,
                output: args.output_file.clone(),
                tables,
            };
            let result = backup_database(&config.tools, &request, &config.backup_directory).await;
            let file_path = match (&result, &request.output) {
                (Ok(outcome), _) => outcome.path.display().to_string(),
                (Err(_), Some(path)) => path.display().to_string(),
                (Err(_), None) => String::new(),
            };
            let tables = &request.tables;
            record(audit.as_deref(), AuditAction::Backup, file_path, tables, &result).await;
            let outcome = result?;
            info!("✅ Backup written to {} ({} bytes)", outcome.path.display(), outcome.bytes);
        }
        ActionType::Restore => {
            let input = input_file(args)?;
            let request = RestoreRequest {
                connection,
                input: input.clone(),
                tables,
                scratch_dir: None,
            };
            let result = restore(&config.tools, &request).await;
            record(
                audit.as_deref(),
                AuditAction::Restore,
                input.display().to_string(),
                &request.tables,
                &result,
            )
            .await;
            for warning in result? {
                warn!("⚠️ {}", warning);
            }
            info!("✅ Restore of {} completed", input.display());
        }
        ActionType::Pitr => {
            if !tables.is_empty() {
                bail!(
                    "point-in-time restore applies to the whole database, \
                     --tables cannot be combined with it"
                );
            }
            let input = input_file(args)?;
            let target = args
                .date
                .as_deref()
                .context("--date is required for point-in-time restore")?;
            let result =
                point_in_time_restore(&config.tools, &config.binlog, &connection, &input, target)
                    .await;
            let file_path = input.display().to_string();
            record(audit.as_deref(), AuditAction::Restore, file_path, &[], &result).await;
            result?;
        }
    }
    Ok(())
}

fn connection(args: &Args) -> Result<ConnectionParams> {
    let engine = args.db_type.context("--dbtype is required in commandline mode")?;
    if args.db_name.trim().is_empty() {
        bail!("--dbname is required in commandline mode");
    }
    let params = ConnectionParams::new(
        engine,
        args.host.trim(),
        args.username.trim(),
        args.password.as_str(),
        args.db_name.trim(),
    );
    Ok(match args.port {
        Some(port) => params.with_port(port),
        None => params,
    })
}

fn input_file(args: &Args) -> Result<PathBuf> {
    args.input_file.clone().context("--inputfile is required for restores")
}

async fn record<T>(
    audit: Option<&dyn AuditLog>,
    action: AuditAction,
    file_path: String,
    tables: &[String],
    result: &BackupResult<T>,
) {
    if let Err(e) = result {
        error!("❌ {} failed: {}", action, e);
    }
    if let Some(log) = audit {
        let entry = NewAuditEntry::new(action, file_path, tables, AuditStatus::of(result));
        record_or_log(log, entry).await;
    }
}

/// Scheduled backup that also writes an audit record per run
struct AuditedBackup {
    job: BackupJob,
    audit: Arc<dyn AuditLog>,
}

#[async_trait]
impl ScheduledJob for AuditedBackup {
    async fn run(&self) -> BackupResult<()> {
        let job = &self.job;
        let result = backup_database(&job.tools, &job.request, &job.backup_dir).await;
        let file_path = result
            .as_ref()
            .map(|outcome| outcome.path.display().to_string())
            .unwrap_or_default();
        let tables = &job.request.tables;
        record(Some(self.audit.as_ref()), AuditAction::Backup, file_path, tables, &result).await;
        result.map(|_| ())
    }
}

#[instrument(level = "debug", skip_all, fields(schedule = %expression))]
async fn run_schedule(
    args: &Args,
    config: &Config,
    expression: &str,
    audit: Option<Arc<dyn AuditLog>>,
) -> Result<()> {
    let schedule = CronSchedule::parse(expression)?;
    let job = BackupJob {
        tools: config.tools.clone(),
        request: BackupRequest {
            connection: connection(args)?,
            output: args.output_file.clone(),
            tables: args.table_list(),
        },
        backup_dir: config.backup_directory.clone(),
    };

    let mut scheduler = match audit {
        Some(audit) => BackupScheduler::new(schedule, AuditedBackup { job, audit }),
        None => BackupScheduler::new(schedule, job),
    };
    if args.once {
        scheduler = scheduler.with_max_runs(1);
    }

    info!("⏰ Scheduling backups with '{}'", expression);
    scheduler.start()?;
    tokio::select! {
        runs = scheduler.wait() => {
            info!("✅ Backup schedule finished after {} runs", runs?);
        }
        _ = shutdown_signal() => {
            scheduler.stop().await?;
        }
    }
    Ok(())
}
