// ==========================================
// 院系课表排课系统 - 课表数据仓储
// ==========================================
// 职责: timetable / timetable_slot / timetable_slot_teacher
// 红线: 课表只做整体写入（新建或整体替换），不做单节次增量修改
// 红线: 读出的 schedule 恒为周一至周五 5 个教学日，节次升序
// ==========================================

use crate::domain::timetable::{normalize_schedule, DaySchedule, EntityRef, Slot, Timetable};
use crate::domain::types::Weekday;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SELECT_HEADER: &str = r#"
    SELECT timetable_id, semester, department, section, cluster, created_at, updated_at
    FROM timetable
"#;

// (timetable_id, day, slot_number)
type SlotKey = (String, String, u8);

// 节次明细的读取范围，与表头查询条件保持一致
enum DetailScope<'a> {
    All,
    Only(&'a str),
    Except(&'a str),
}

impl DetailScope<'_> {
    fn where_clause(&self) -> &'static str {
        match self {
            DetailScope::All => "",
            DetailScope::Only(_) => "WHERE timetable_id = ?1",
            DetailScope::Except(_) => "WHERE timetable_id <> ?1",
        }
    }

    fn bind(&self) -> Vec<&dyn rusqlite::ToSql> {
        match self {
            DetailScope::All => Vec::new(),
            DetailScope::Only(id) | DetailScope::Except(id) => vec![id as &dyn rusqlite::ToSql],
        }
    }
}

// ==========================================
// TimetableRepository - 课表仓储
// ==========================================
pub struct TimetableRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TimetableRepository {
    /// 创建新的TimetableRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新建课表（表头 + 全部节次，单事务）
    ///
    /// # 返回
    /// - `Ok(timetable_id)`: 成功
    /// - `Err(UniqueConstraintViolation)`: 同一班级已有课表
    /// - `Err(ForeignKeyViolation)`: 引用了不存在的课程/教师
    pub fn insert(&self, timetable: &Timetable) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let now = chrono::Utc::now().naive_utc();
        let created_at = timetable.created_at.unwrap_or(now);
        let updated_at = timetable.updated_at.unwrap_or(created_at);

        tx.execute(
            r#"INSERT INTO timetable (
                timetable_id, semester, department, section, cluster, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                timetable.id,
                timetable.semester,
                timetable.department,
                timetable.section,
                timetable.cluster,
                created_at.format(TS_FORMAT).to_string(),
                updated_at.format(TS_FORMAT).to_string(),
            ],
        )?;
        write_schedule(&tx, &timetable.id, &timetable.schedule)?;

        tx.commit()?;
        Ok(timetable.id.clone())
    }

    /// 整体替换课表的 cluster 与 schedule（单事务）
    pub fn replace_schedule(
        &self,
        timetable_id: &str,
        cluster: Option<&str>,
        schedule: &[DaySchedule],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let now = chrono::Utc::now().naive_utc();
        let affected = tx.execute(
            "UPDATE timetable SET cluster = ?2, updated_at = ?3 WHERE timetable_id = ?1",
            params![timetable_id, cluster, now.format(TS_FORMAT).to_string()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Timetable", timetable_id));
        }

        // 节次教师随 timetable_slot 级联删除
        tx.execute(
            "DELETE FROM timetable_slot WHERE timetable_id = ?1",
            params![timetable_id],
        )?;
        write_schedule(&tx, timetable_id, schedule)?;

        tx.commit()?;
        Ok(())
    }

    /// 删除课表（节次级联删除）
    pub fn delete(&self, timetable_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM timetable WHERE timetable_id = ?1",
            params![timetable_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Timetable", timetable_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按timetable_id查询
    pub fn find_by_id(&self, timetable_id: &str) -> RepositoryResult<Option<Timetable>> {
        let sql = format!("{} WHERE timetable_id = ?1", SELECT_HEADER);
        let timetables = self.load(&sql, params![timetable_id], DetailScope::Only(timetable_id))?;
        Ok(timetables.into_iter().next())
    }

    /// 按自然键 (semester, department, section) 查询
    pub fn find_by_natural_key(
        &self,
        semester: i32,
        department: &str,
        section: &str,
    ) -> RepositoryResult<Option<Timetable>> {
        let found_id = {
            let conn = self.get_conn()?;
            let id = conn
                .query_row(
                    "SELECT timetable_id FROM timetable WHERE semester = ?1 AND department = ?2 AND section = ?3",
                    params![semester, department, section],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            id
        };

        match found_id {
            Some(id) => self.find_by_id(&id),
            None => Ok(None),
        }
    }

    /// 查询全部课表
    pub fn list_all(&self) -> RepositoryResult<Vec<Timetable>> {
        let sql = format!(
            "{} ORDER BY department, semester, section, timetable_id",
            SELECT_HEADER
        );
        self.load(&sql, params![], DetailScope::All)
    }

    /// 查询除指定课表外的全部课表
    pub fn list_excluding(&self, exclude_id: Option<&str>) -> RepositoryResult<Vec<Timetable>> {
        match exclude_id {
            Some(id) => {
                let sql = format!(
                    "{} WHERE timetable_id <> ?1 ORDER BY department, semester, section, timetable_id",
                    SELECT_HEADER
                );
                self.load(&sql, params![id], DetailScope::Except(id))
            }
            None => self.list_all(),
        }
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 读表头后按同一范围读出节次与节次教师，在内存中组装
    fn load(
        &self,
        header_sql: &str,
        args: &[&dyn rusqlite::ToSql],
        scope: DetailScope<'_>,
    ) -> RepositoryResult<Vec<Timetable>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(header_sql)?;
        let headers = stmt
            .query_map(args, map_header)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .collect::<RepositoryResult<Vec<_>>>()?;

        if headers.is_empty() {
            return Ok(headers);
        }

        // 节次教师: 按 seq_no 保持写入顺序
        let mut teachers_by_slot: HashMap<SlotKey, Vec<EntityRef>> = HashMap::new();
        let mut stmt = conn.prepare(&format!(
            "SELECT timetable_id, day, slot_number, teacher_id FROM timetable_slot_teacher {} \
             ORDER BY timetable_id, day, slot_number, seq_no",
            scope.where_clause()
        ))?;
        let rows = stmt.query_map(scope.bind().as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u8>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        for row in rows {
            let (timetable_id, day, slot_number, teacher_id) = row?;
            teachers_by_slot
                .entry((timetable_id, day, slot_number))
                .or_default()
                .push(EntityRef::Id(teacher_id));
        }

        let mut days_by_timetable: HashMap<String, Vec<DaySchedule>> = HashMap::new();
        let mut stmt = conn.prepare(&format!(
            "SELECT timetable_id, day, slot_number, subject_id FROM timetable_slot {}",
            scope.where_clause()
        ))?;
        let rows = stmt.query_map(scope.bind().as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u8>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        for row in rows {
            let (timetable_id, day_raw, slot_number, subject_id) = row?;
            let day = Weekday::from_str(&day_raw).map_err(|message| {
                RepositoryError::FieldValueError {
                    field: format!("timetable_slot.day ({})", timetable_id),
                    message,
                }
            })?;
            let teachers = teachers_by_slot
                .remove(&(timetable_id.clone(), day_raw, slot_number))
                .unwrap_or_default();

            days_by_timetable.entry(timetable_id).or_default().push(DaySchedule {
                day,
                slots: vec![Slot {
                    slot_number,
                    subject: EntityRef::Id(subject_id),
                    teachers,
                }],
            });
        }

        Ok(headers
            .into_iter()
            .map(|mut timetable| {
                let days = days_by_timetable.remove(&timetable.id).unwrap_or_default();
                timetable.schedule = normalize_schedule(days);
                timetable
            })
            .collect())
    }
}

/// 写入全部节次与节次教师
fn write_schedule(
    tx: &Transaction<'_>,
    timetable_id: &str,
    schedule: &[DaySchedule],
) -> RepositoryResult<()> {
    let mut slot_stmt = tx.prepare(
        r#"INSERT INTO timetable_slot (timetable_id, day, slot_number, subject_id)
           VALUES (?1, ?2, ?3, ?4)"#,
    )?;
    let mut teacher_stmt = tx.prepare(
        r#"INSERT OR IGNORE INTO timetable_slot_teacher
               (timetable_id, day, slot_number, teacher_id, seq_no)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
    )?;

    for day in schedule {
        for slot in &day.slots {
            slot_stmt.execute(params![
                timetable_id,
                day.day.as_str(),
                slot.slot_number,
                slot.subject_id(),
            ])?;
            for (seq_no, teacher_id) in slot.teacher_ids().enumerate() {
                teacher_stmt.execute(params![
                    timetable_id,
                    day.day.as_str(),
                    slot.slot_number,
                    teacher_id,
                    seq_no as i64,
                ])?;
            }
        }
    }
    Ok(())
}

fn parse_ts(raw: &str, field: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn map_header(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Timetable>> {
    let created_raw: String = row.get(5)?;
    let updated_raw: String = row.get(6)?;

    let timestamps = parse_ts(&created_raw, "timetable.created_at")
        .and_then(|c| parse_ts(&updated_raw, "timetable.updated_at").map(|u| (c, u)));
    let (created_at, updated_at) = match timestamps {
        Ok(pair) => pair,
        Err(e) => return Ok(Err(e)),
    };

    Ok(Ok(Timetable {
        id: row.get(0)?,
        semester: row.get(1)?,
        department: row.get(2)?,
        section: row.get(3)?,
        cluster: row.get(4)?,
        schedule: Vec::new(),
        created_at: Some(created_at),
        updated_at: Some(updated_at),
    }))
}
