//! CLI integration tests for the accview binary

use assert_cmd::Command;
use rusqlite::Connection;
use tempfile::NamedTempFile;

fn kitchen_db() -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    Connection::open(file.path())
        .unwrap()
        .execute_batch(
            "
            CREATE TABLE Food (Id INTEGER, Name TEXT);
            INSERT INTO Food VALUES (1, 'Rice');
            INSERT INTO Food VALUES (2, 'Soup');
        ",
        )
        .unwrap();
    file
}

fn accview() -> Command {
    let mut cmd = Command::cargo_bin("accview").expect("Failed to find accview binary");
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_export_csv() {
    let db = kitchen_db();
    let output = accview()
        .arg(db.path())
        .args(["--backend", "sqlite", "--table", "Food", "--export", "csv"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Id,Name\n1,Rice\n2,Soup\n");
}

#[test]
fn test_export_markdown() {
    let db = kitchen_db();
    let output = accview()
        .arg(db.path())
        .args(["-b", "sqlite", "-t", "Food", "-e", "markdown"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "| Id | Name |\n| --- | --- |\n| 1 | Rice |\n| 2 | Soup |\n"
    );
}

#[test]
fn test_export_unknown_table_fails() {
    let db = kitchen_db();
    let output = accview()
        .arg(db.path())
        .args(["--backend", "sqlite", "--table", "Cellar", "--export", "csv"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cellar"));
}

#[test]
fn test_export_missing_database_fails() {
    let output = accview()
        .args(["/nonexistent/kitchen.db", "--backend", "sqlite", "-t", "Food", "-e", "csv"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Connection error"));
}

#[test]
fn test_interactive_session() {
    let db = kitchen_db();
    let output = accview()
        .arg(db.path())
        .args(["--backend", "sqlite"])
        .write_stdin(":tables\nFood\n:quit\n")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  Food"));
    assert!(stdout.contains("(2 rows)"));
}

#[test]
fn test_export_requires_table() {
    let db = kitchen_db();
    accview()
        .arg(db.path())
        .args(["--export", "csv"])
        .assert()
        .failure();
}
