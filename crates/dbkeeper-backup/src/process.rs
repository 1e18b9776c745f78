//! Native tool invocation
//!
//! Builders turn connection parameters into fully described child processes
//! and the runners execute them with `tokio::process`. Passwords are handed
//! over through the environment variable each client reads and never appear
//! on the command line.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use chrono::NaiveDateTime;
use dbkeeper_core::{ConnectionParams, Engine, ToolPaths};
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::error::{BackupError, BackupResult};

/// A fully described child process
#[derive(Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program name or path
    pub program: PathBuf,
    /// Arguments, never containing a password
    pub args: Vec<OsString>,
    /// Extra environment variables
    pub envs: Vec<(String, String)>,
    /// File fed to standard input, `None` for no input
    pub stdin: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a new command without arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            stdin: None,
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Feed a file to standard input
    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    /// Short program name used in errors and logs
    pub fn tool(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Arguments as lossy strings
    pub fn display_args(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .kill_on_drop(true);
        cmd
    }

    async fn stdin_stdio(&self) -> BackupResult<Stdio> {
        match &self.stdin {
            Some(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Stdio::from(file.into_std().await))
            }
            None => Ok(Stdio::null()),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, _) in &self.envs {
            write!(f, "{key}=*** ")?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path.display())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ToolCommand({self})")
    }
}

fn password_env(engine: Engine) -> &'static str {
    match engine {
        Engine::MySql => "MYSQL_PWD",
        Engine::Postgres => "PGPASSWORD",
    }
}

fn with_credentials(cmd: ToolCommand, conn: &ConnectionParams) -> ToolCommand {
    let user_flag = match conn.engine {
        Engine::MySql => "--user",
        Engine::Postgres => "--username",
    };
    let cmd = cmd.args([
        format!("--host={}", conn.host),
        format!("--port={}", conn.port),
        format!("{user_flag}={}", conn.username),
    ]);
    if conn.password.is_empty() {
        cmd
    } else {
        cmd.env(password_env(conn.engine), conn.password.clone())
    }
}

/// Export command writing the dump to standard output
///
/// A non-empty `tables` limits the dump to those tables.
pub fn dump_command(tools: &ToolPaths, conn: &ConnectionParams, tables: &[String]) -> ToolCommand {
    let cmd = with_credentials(ToolCommand::new(tools.dump_tool(conn.engine)), conn);
    match conn.engine {
        Engine::MySql if tables.is_empty() => cmd
            .args(["--single-transaction", "--routines", "--triggers", "--databases"])
            .arg(&conn.database),
        Engine::MySql => cmd
            .arg("--single-transaction")
            .arg(&conn.database)
            .args(tables),
        Engine::Postgres if tables.is_empty() => cmd
            .args(["--format=plain", "--create", "--clean"])
            .arg(&conn.database),
        Engine::Postgres => cmd
            .arg("--format=plain")
            .args(tables.iter().map(|t| format!("--table={t}")))
            .arg(&conn.database),
    }
}

/// Interactive client connected to the target database, reading SQL from stdin
pub fn client_command(tools: &ToolPaths, conn: &ConnectionParams) -> ToolCommand {
    let cmd = with_credentials(ToolCommand::new(tools.client_tool(conn.engine)), conn);
    match conn.engine {
        Engine::MySql => cmd.arg(&conn.database),
        Engine::Postgres => cmd
            .arg(format!("--dbname={}", conn.database))
            .args(["-v", "ON_ERROR_STOP=1"]),
    }
}

/// Import command executing the SQL file `input` against the target database
pub fn import_command(tools: &ToolPaths, conn: &ConnectionParams, input: &Path) -> ToolCommand {
    let cmd = client_command(tools, conn);
    match conn.engine {
        Engine::MySql => cmd.stdin_from(input),
        Engine::Postgres => cmd.arg("-f").arg(input),
    }
}

/// Binary log decoder emitting statements up to `stop` for the connection's database
pub fn binlog_replay_command(
    tools: &ToolPaths,
    conn: &ConnectionParams,
    stop: NaiveDateTime,
    files: &[PathBuf],
) -> ToolCommand {
    ToolCommand::new(&tools.mysqlbinlog)
        .arg(format!("--stop-datetime={}", stop.format("%Y-%m-%d %H:%M:%S")))
        .arg(format!("--database={}", conn.database))
        .args(files)
}

fn check_status(cmd: &ToolCommand, status: ExitStatus, stderr: &[u8]) -> BackupResult<()> {
    if status.success() {
        return Ok(());
    }
    let err = BackupError::tool_failed(cmd.tool(), status.code(), stderr);
    error!("❌ {}", err);
    Err(err)
}

/// Run a command, returning its standard output
#[instrument(level = "debug", skip_all, fields(tool = %cmd.tool()))]
pub async fn run(cmd: &ToolCommand) -> BackupResult<Vec<u8>> {
    debug!("🔧 Running {}", cmd);
    let child = cmd
        .command()
        .stdin(cmd.stdin_stdio().await?)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackupError::spawn(cmd.tool(), e))?;

    let output = child.wait_with_output().await?;
    check_status(cmd, output.status, &output.stderr)?;
    Ok(output.stdout)
}

/// Run a command with its standard output written to `output`
///
/// Returns the number of bytes written. The file is created before the
/// tool starts and is left in place when the tool fails.
#[instrument(level = "debug", skip_all, fields(tool = %cmd.tool(), output = %output.display()))]
pub async fn run_to_file(cmd: &ToolCommand, output: &Path) -> BackupResult<u64> {
    debug!("🔧 Running {} > {}", cmd, output.display());
    let file = tokio::fs::File::create(output).await?.into_std().await;
    let child = cmd
        .command()
        .stdin(cmd.stdin_stdio().await?)
        .stdout(Stdio::from(file))
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackupError::spawn(cmd.tool(), e))?;

    let result = child.wait_with_output().await?;
    check_status(cmd, result.status, &result.stderr)?;
    Ok(tokio::fs::metadata(output).await?.len())
}

/// Run a command reading `input` on standard input
pub async fn run_with_stdin(cmd: &ToolCommand, input: &Path) -> BackupResult<Vec<u8>> {
    run(&cmd.clone().stdin_from(input)).await
}

/// Run `producer | consumer`, returning the consumer's standard output
///
/// Both processes are awaited. When both fail the producer's error is
/// reported.
#[instrument(
    level = "debug",
    skip_all,
    fields(producer = %producer.tool(), consumer = %consumer.tool())
)]
pub async fn run_piped(producer: &ToolCommand, consumer: &ToolCommand) -> BackupResult<Vec<u8>> {
    debug!("🔧 Running {} | {}", producer, consumer);
    let mut upstream = producer
        .command()
        .stdin(producer.stdin_stdio().await?)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackupError::spawn(producer.tool(), e))?;

    let pipe: Stdio = upstream
        .stdout
        .take()
        .ok_or_else(|| BackupError::other(format!("{} stdout unavailable", producer.tool())))?
        .try_into()?;

    let downstream = consumer
        .command()
        .stdin(pipe)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| BackupError::spawn(consumer.tool(), e))?;

    let (up, down) = tokio::join!(upstream.wait_with_output(), downstream.wait_with_output());
    let (up, down) = (up?, down?);
    check_status(producer, up.status, &up.stderr)?;
    check_status(consumer, down.status, &down.stderr)?;
    Ok(down.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mysql() -> ConnectionParams {
        ConnectionParams::new(Engine::MySql, "db.local", "root", "s3cret", "shop")
    }

    fn postgres() -> ConnectionParams {
        ConnectionParams::new(Engine::Postgres, "pg.local", "postgres", "s3cret", "shop")
            .with_port(6543)
    }

    #[test]
    fn test_mysql_full_dump_args() {
        let cmd = dump_command(&ToolPaths::default(), &mysql(), &[]);
        assert_eq!(cmd.program, PathBuf::from("mysqldump"));
        assert_eq!(
            cmd.display_args(),
            vec![
                "--host=db.local",
                "--port=3306",
                "--user=root",
                "--single-transaction",
                "--routines",
                "--triggers",
                "--databases",
                "shop"
            ]
        );
        assert_eq!(cmd.envs, vec![("MYSQL_PWD".to_string(), "s3cret".to_string())]);
    }

    #[test]
    fn test_table_scoped_dumps() {
        let tables = vec!["users".to_string(), "orders".to_string()];
        let cmd = dump_command(&ToolPaths::default(), &mysql(), &tables);
        assert_eq!(&cmd.display_args()[3..], ["--single-transaction", "shop", "users", "orders"]);

        let cmd = dump_command(&ToolPaths::default(), &postgres(), &tables);
        assert_eq!(
            cmd.display_args(),
            vec![
                "--host=pg.local",
                "--port=6543",
                "--username=postgres",
                "--format=plain",
                "--table=users",
                "--table=orders",
                "shop"
            ]
        );
    }

    #[test]
    fn test_password_never_in_args() {
        for conn in [mysql(), postgres()] {
            let tools = ToolPaths::default();
            let commands = [
                dump_command(&tools, &conn, &[]),
                import_command(&tools, &conn, Path::new("/tmp/in.sql")),
            ];
            for cmd in commands {
                assert!(cmd.display_args().iter().all(|a| !a.contains("s3cret")));
                assert!(!cmd.to_string().contains("s3cret"));
            }
        }
    }

    #[test]
    fn test_empty_password_sets_no_env() {
        let conn = ConnectionParams::new(Engine::Postgres, "localhost", "app", "", "shop");
        let cmd = dump_command(&ToolPaths::default(), &conn, &[]);
        assert!(cmd.envs.is_empty());
    }

    #[test]
    fn test_import_commands() {
        let tools = ToolPaths::default();
        let cmd = import_command(&tools, &mysql(), Path::new("/backups/shop.sql"));
        assert_eq!(cmd.stdin, Some(PathBuf::from("/backups/shop.sql")));
        assert_eq!(cmd.display_args().last().map(String::as_str), Some("shop"));

        let cmd = import_command(&tools, &postgres(), Path::new("/backups/shop.sql"));
        assert_eq!(cmd.program, PathBuf::from("psql"));
        assert_eq!(cmd.stdin, None);
        assert_eq!(
            &cmd.display_args()[3..],
            ["--dbname=shop", "-v", "ON_ERROR_STOP=1", "-f", "/backups/shop.sql"]
        );
    }

    #[test]
    fn test_binlog_replay_args() {
        let stop =
            NaiveDateTime::parse_from_str("2024-03-01T12:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let files = vec![PathBuf::from("/var/log/mysql/mysql-bin.000001")];
        let cmd = binlog_replay_command(&ToolPaths::default(), &mysql(), stop, &files);
        assert_eq!(
            cmd.display_args(),
            vec![
                "--stop-datetime=2024-03-01 12:30:00",
                "--database=shop",
                "/var/log/mysql/mysql-bin.000001"
            ]
        );
        assert!(cmd.envs.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout_and_stdin() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.sql");
        std::fs::write(&input, "SELECT 1;\n").unwrap();

        let out = run_with_stdin(&ToolCommand::new("cat"), &input).await.unwrap();
        assert_eq!(out, b"SELECT 1;\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_exit_code_and_stderr() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo 'access denied' >&2; exit 3"]);
        match run(&cmd).await {
            Err(BackupError::ToolFailed { tool, code, stderr }) => {
                assert_eq!(tool, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "access denied");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let cmd = ToolCommand::new("/nonexistent/dbkeeper-tool");
        assert!(matches!(run(&cmd).await, Err(BackupError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_to_file_keeps_partial_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("dump.sql");

        let ok = ToolCommand::new("sh").args(["-c", "printf 'CREATE TABLE t;'"]);
        assert_eq!(run_to_file(&ok, &output).await.unwrap(), 15);

        let failing = ToolCommand::new("sh").args(["-c", "printf partial; exit 1"]);
        assert!(run_to_file(&failing, &output).await.is_err());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "partial");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_piped() {
        let producer = ToolCommand::new("sh").args(["-c", "printf 'a\\nb\\n'"]);
        let out = run_piped(&producer, &ToolCommand::new("cat")).await.unwrap();
        assert_eq!(out, b"a\nb\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_piped_reports_producer_first() {
        let producer = ToolCommand::new("sh").args(["-c", "exit 4"]);
        let consumer = ToolCommand::new("sh").args(["-c", "cat >/dev/null; exit 5"]);
        match run_piped(&producer, &consumer).await {
            Err(BackupError::ToolFailed { code, .. }) => assert_eq!(code, Some(4)),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
