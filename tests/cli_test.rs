//! End-to-end command-line tests
//!
//! Flags and configuration are parsed as the binary does, and the native
//! tools are replaced through the `[tools]` table.

#![cfg(unix)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use dbkeeper::clap::Args;
use dbkeeper::{commands, Config};
use dbkeeper_db::{AuditAction, AuditLog, AuditStatus, MemoryAuditStore};
use tempfile::{tempdir, NamedTempFile};

const DUMP: &str = "\
-- MySQL dump 10.13
SET NAMES utf8mb4;
-- Table structure for table `users`
CREATE TABLE `users` (id int);
INSERT INTO `users` VALUES (1,'CREATE TABLE `orders` (x int)');
-- Table structure for table `orders`
CREATE TABLE `orders` (id int);
INSERT INTO `orders` VALUES (7);
";

fn parse(args: &[&str]) -> Args {
    use clap::Parser;
    Args::try_parse_from(std::iter::once("dbkeeper").chain(args.iter().copied())).unwrap()
}

fn config_with_tools(backup_dir: &Path, tools: &str) -> (NamedTempFile, Config) {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    let directory = backup_dir.display();
    write!(file, "backup_directory = \"{directory}\"\n\n[tools]\n{tools}").unwrap();
    let config = Config::load(Some(file.path())).unwrap();
    (file, config)
}

#[test_log::test(tokio::test)]
async fn test_mysql_table_restore_from_config() {
    let dir = tempdir().unwrap();
    let dump = dir.path().join("shop.sql");
    std::fs::write(&dump, DUMP).unwrap();
    let (_file, config) = config_with_tools(dir.path(), "mysql = \"true\"\n");
    let audit = Arc::new(MemoryAuditStore::new());

    let args = parse(&[
        "-a", "commandline", "-d", "mysql", "-u", "root", "-n", "shop", "-e", "restore",
        "-t", "orders", "-i", dump.to_str().unwrap(),
    ]);
    commands::execute(&args, &config, Some(audit.clone())).await.unwrap();

    let records = audit.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, AuditAction::Restore);
    assert_eq!(records[0].tables, "orders");
    assert_eq!(records[0].status, AuditStatus::Success);
}

#[test_log::test(tokio::test)]
async fn test_unmatched_tables_fail_without_importing() {
    let dir = tempdir().unwrap();
    let dump = dir.path().join("shop.sql");
    std::fs::write(&dump, DUMP).unwrap();
    let (_file, config) = config_with_tools(dir.path(), "mysql = \"true\"\n");
    let audit = Arc::new(MemoryAuditStore::new());

    let args = parse(&[
        "-a", "commandline", "-d", "mysql", "-n", "shop", "-e", "restore", "-t", "invoices", "-i",
        dump.to_str().unwrap(),
    ]);
    assert!(commands::execute(&args, &config, Some(audit.clone())).await.is_err());
    assert_eq!(audit.list().await.unwrap()[0].status, AuditStatus::Failed);
}

#[test_log::test(tokio::test)]
async fn test_failed_backup_is_reported() {
    let dir = tempdir().unwrap();
    let (_file, config) = config_with_tools(dir.path(), "mysqldump = \"false\"\n");
    let audit = Arc::new(MemoryAuditStore::new());

    let args = parse(&[
        "-a", "commandline", "-d", "mariadb", "-n", "shop", "-e", "backup", "-t", "users",
    ]);
    let err = commands::execute(&args, &config, Some(audit.clone())).await.unwrap_err();
    assert!(err.to_string().contains("failed with exit code 1"));

    let records = audit.list().await.unwrap();
    assert_eq!(records[0].action, AuditAction::Backup);
    assert_eq!(records[0].status, AuditStatus::Failed);
}

#[test_log::test(tokio::test)]
async fn test_backup_without_output_uses_backup_directory() {
    let dir = tempdir().unwrap();
    let (_file, config) = config_with_tools(dir.path(), "pg_dump = \"echo\"\n");

    let args = parse(&[
        "-a", "commandline", "-d", "postgres", "-n", "shop", "-e", "backup", "-t", "users,orders",
    ]);
    commands::execute(&args, &config, None).await.unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".sql"))
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("shop_tables_backup_"));
}
