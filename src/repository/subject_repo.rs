// ==========================================
// 院系课表排课系统 - 课程数据仓储
// ==========================================
// 职责: subject + subject_teacher（授课资格）
// 红线: 课程与授课资格必须在同一事务内写入
// ==========================================

use crate::domain::subject::Subject;
use crate::domain::types::SubjectType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// SubjectRepository - 课程仓储
// ==========================================
pub struct SubjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubjectRepository {
    /// 创建新的SubjectRepository实例
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

    /// 新建课程（含授课资格）
    pub fn insert(&self, subject: &Subject) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO subject (
                subject_id, name, code, credits, subject_type, semester, department
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                subject.id,
                subject.name,
                subject.code,
                subject.credits,
                subject.subject_type.to_string(),
                subject.semester,
                subject.department,
            ],
        )?;
        write_eligible_teachers(&tx, &subject.id, &subject.teacher_ids)?;

        tx.commit()?;
        Ok(subject.id.clone())
    }

    /// 更新课程并整体替换授课资格
    pub fn update(&self, subject: &Subject) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let affected = tx.execute(
            r#"UPDATE subject
               SET name = ?2, code = ?3, credits = ?4, subject_type = ?5,
                   semester = ?6, department = ?7
               WHERE subject_id = ?1"#,
            params![
                subject.id,
                subject.name,
                subject.code,
                subject.credits,
                subject.subject_type.to_string(),
                subject.semester,
                subject.department,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Subject", &subject.id));
        }

        tx.execute(
            "DELETE FROM subject_teacher WHERE subject_id = ?1",
            params![subject.id],
        )?;
        write_eligible_teachers(&tx, &subject.id, &subject.teacher_ids)?;

        tx.commit()?;
        Ok(())
    }

    /// 删除课程
    ///
    /// 仍被课表节次引用时返回 ForeignKeyViolation
    pub fn delete(&self, subject_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM subject WHERE subject_id = ?1",
            params![subject_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Subject", subject_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按subject_id查询
    pub fn find_by_id(&self, subject_id: &str) -> RepositoryResult<Option<Subject>> {
        let subjects = self.query_subjects(
            "SELECT subject_id, name, code, credits, subject_type, semester, department
             FROM subject WHERE subject_id = ?1",
            params![subject_id],
        )?;
        Ok(subjects.into_iter().next())
    }

    /// 查询全部课程
    pub fn list_all(&self) -> RepositoryResult<Vec<Subject>> {
        self.query_subjects(
            "SELECT subject_id, name, code, credits, subject_type, semester, department
             FROM subject ORDER BY semester, code, subject_id",
            params![],
        )
    }

    /// 按学期查询
    pub fn list_by_semester(&self, semester: i32) -> RepositoryResult<Vec<Subject>> {
        self.query_subjects(
            "SELECT subject_id, name, code, credits, subject_type, semester, department
             FROM subject WHERE semester = ?1 ORDER BY code, subject_id",
            params![semester],
        )
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn query_subjects(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<Subject>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let mut subjects = rows.into_iter().collect::<RepositoryResult<Vec<_>>>()?;

        // 授课资格一次性读出后按课程分组
        let mut eligible: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT subject_id, teacher_id FROM subject_teacher ORDER BY subject_id, teacher_id",
        )?;
        let pairs = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for pair in pairs {
            let (subject_id, teacher_id) = pair?;
            eligible.entry(subject_id).or_default().push(teacher_id);
        }

        for subject in &mut subjects {
            subject.teacher_ids = eligible.remove(&subject.id).unwrap_or_default();
        }
        Ok(subjects)
    }
}

fn write_eligible_teachers(
    tx: &Transaction<'_>,
    subject_id: &str,
    teacher_ids: &[String],
) -> RepositoryResult<()> {
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO subject_teacher (subject_id, teacher_id) VALUES (?1, ?2)",
    )?;
    for teacher_id in teacher_ids {
        stmt.execute(params![subject_id, teacher_id])?;
    }
    Ok(())
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Subject>> {
    let subject_id: String = row.get(0)?;
    let type_raw: String = row.get(4)?;

    let subject_type = match SubjectType::from_str(&type_raw) {
        Ok(t) => t,
        Err(message) => {
            return Ok(Err(RepositoryError::FieldValueError {
                field: format!("subject.subject_type ({})", subject_id),
                message,
            }))
        }
    };

    Ok(Ok(Subject {
        id: subject_id,
        name: row.get(1)?,
        code: row.get(2)?,
        credits: row.get(3)?,
        subject_type,
        semester: row.get(5)?,
        department: row.get(6)?,
        teacher_ids: Vec::new(),
    }))
}
