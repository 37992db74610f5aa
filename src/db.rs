// ==========================================
// 院系课表排课系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键每个连接单独开启）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS），启动时可重复执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全部表结构（幂等）
///
/// 说明：
/// - timetable_slot_teacher 对 teacher 使用 RESTRICT：仍被课表引用的教师不能删除
/// - subject_teacher 对 teacher 使用 CASCADE：删除教师时顺带移除授课资格
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS teacher (
            teacher_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            rank TEXT NOT NULL,
            department TEXT NOT NULL,
            max_workload INTEGER NOT NULL,
            current_workload INTEGER NOT NULL DEFAULT 0,
            avail_monday INTEGER NOT NULL DEFAULT 1,
            avail_tuesday INTEGER NOT NULL DEFAULT 1,
            avail_wednesday INTEGER NOT NULL DEFAULT 1,
            avail_thursday INTEGER NOT NULL DEFAULT 1,
            avail_friday INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS subject (
            subject_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL,
            credits INTEGER NOT NULL,
            subject_type TEXT NOT NULL,
            semester INTEGER NOT NULL,
            department TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_subject_semester ON subject(semester);

        CREATE TABLE IF NOT EXISTS subject_teacher (
            subject_id TEXT NOT NULL REFERENCES subject(subject_id) ON DELETE CASCADE,
            teacher_id TEXT NOT NULL REFERENCES teacher(teacher_id) ON DELETE CASCADE,
            PRIMARY KEY (subject_id, teacher_id)
        );

        CREATE TABLE IF NOT EXISTS timetable (
            timetable_id TEXT PRIMARY KEY,
            semester INTEGER NOT NULL,
            department TEXT NOT NULL,
            section TEXT NOT NULL,
            cluster TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(semester, department, section)
        );

        CREATE TABLE IF NOT EXISTS timetable_slot (
            timetable_id TEXT NOT NULL REFERENCES timetable(timetable_id) ON DELETE CASCADE,
            day TEXT NOT NULL,
            slot_number INTEGER NOT NULL,
            subject_id TEXT NOT NULL REFERENCES subject(subject_id) ON DELETE RESTRICT,
            PRIMARY KEY (timetable_id, day, slot_number)
        );

        CREATE TABLE IF NOT EXISTS timetable_slot_teacher (
            timetable_id TEXT NOT NULL,
            day TEXT NOT NULL,
            slot_number INTEGER NOT NULL,
            teacher_id TEXT NOT NULL REFERENCES teacher(teacher_id) ON DELETE RESTRICT,
            seq_no INTEGER NOT NULL,
            PRIMARY KEY (timetable_id, day, slot_number, teacher_id),
            FOREIGN KEY (timetable_id, day, slot_number)
                REFERENCES timetable_slot(timetable_id, day, slot_number) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_slot_teacher_teacher ON timetable_slot_teacher(teacher_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            timetable_id TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_ts ON action_log(action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 打开连接并确保表结构存在
pub fn open_and_init(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    init_schema(&conn)?;

    if let Some(version) = read_schema_version(&conn)? {
        if version != CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                found = version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema_version 与当前代码不一致"
            );
        }
    }

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_on_empty_db() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
