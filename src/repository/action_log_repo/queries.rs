use super::core::{ActionLogRepository, TS_FORMAT};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_type, action_ts, actor, timetable_id, payload_json, detail
    FROM action_log
"#;

// 同一秒内的多条日志按写入顺序倒排
const NEWEST_FIRST: &str = "ORDER BY action_ts DESC, rowid DESC";

impl ActionLogRepository {
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?1", SELECT_COLUMNS);

        let log = conn
            .query_row(&sql, params![action_id], map_row)
            .optional()?;
        Ok(log)
    }

    /// 某张课表的全部操作记录（新 → 旧）
    ///
    /// 课表删除后记录仍保留，可据此追溯
    pub fn find_by_timetable_id(&self, timetable_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE timetable_id = ?1 {}", SELECT_COLUMNS, NEWEST_FIRST);

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![timetable_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn find_by_action_type(
        &self,
        action_type: ActionType,
        limit: usize,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE action_type = ?1 {} LIMIT ?2",
            SELECT_COLUMNS, NEWEST_FIRST
        );

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![action_type.to_string(), limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} {} LIMIT ?1", SELECT_COLUMNS, NEWEST_FIRST);

        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 某操作人提交过的操作数
    pub fn count_by_actor(&self, actor: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE actor = ?1",
            params![actor],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
    let ts_raw: String = row.get(2)?;
    let action_ts = NaiveDateTime::parse_from_str(&ts_raw, TS_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

    let payload_raw: Option<String> = row.get(5)?;
    let payload_json = payload_raw
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        action_ts,
        actor: row.get(3)?,
        timetable_id: row.get(4)?,
        payload_json,
        detail: row.get(6)?,
    })
}
