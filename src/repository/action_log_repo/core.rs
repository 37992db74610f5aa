use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

/// action_ts 的存储格式（UTC，秒精度）
pub(super) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ActionLogRepository - 课表操作日志仓储
// ==========================================
// 只追加，不提供修改与删除
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(super) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加一条日志
    ///
    /// 由 TimetableApi 在提交锁内、写入成功之后调用；
    /// 全局操作（工作量重算）的 timetable_id 为 NULL
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let payload = log
            .payload_json
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::FieldValueError {
                field: "action_log.payload_json".to_string(),
                message: e.to_string(),
            })?;

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO action_log (action_id, action_type, action_ts, actor, timetable_id, payload_json, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.action_id,
                log.action_type,
                log.action_ts.format(TS_FORMAT).to_string(),
                log.actor,
                log.timetable_id,
                payload,
                log.detail,
            ],
        )?;

        tracing::debug!(
            action_id = %log.action_id,
            action_type = %log.action_type,
            timetable_id = ?log.timetable_id,
            "操作日志已写入"
        );
        Ok(log.action_id.clone())
    }
}
