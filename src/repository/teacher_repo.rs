// ==========================================
// 院系课表排课系统 - 教师数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::teacher::{Teacher, WeeklyAvailability};
use crate::domain::types::TeacherRank;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT teacher_id, name, rank, department, max_workload, current_workload,
           avail_monday, avail_tuesday, avail_wednesday, avail_thursday, avail_friday
    FROM teacher
"#;

// ==========================================
// TeacherRepository - 教师仓储
// ==========================================
pub struct TeacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeacherRepository {
    /// 创建新的TeacherRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建教师
    ///
    /// # 返回
    /// - `Ok(teacher_id)`: 成功
    /// - `Err`: 数据库错误（含 id 重复）
    pub fn insert(&self, teacher: &Teacher) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let a = &teacher.availability;

        conn.execute(
            r#"INSERT INTO teacher (
                teacher_id, name, rank, department, max_workload, current_workload,
                avail_monday, avail_tuesday, avail_wednesday, avail_thursday, avail_friday
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                teacher.id,
                teacher.name,
                teacher.rank.to_string(),
                teacher.department,
                teacher.max_workload,
                teacher.current_workload,
                a.monday,
                a.tuesday,
                a.wednesday,
                a.thursday,
                a.friday,
            ],
        )?;

        Ok(teacher.id.clone())
    }

    /// 更新教师资料（不触碰 current_workload）
    pub fn update_profile(&self, teacher: &Teacher) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let a = &teacher.availability;

        let affected = conn.execute(
            r#"UPDATE teacher
               SET name = ?2, rank = ?3, department = ?4, max_workload = ?5,
                   avail_monday = ?6, avail_tuesday = ?7, avail_wednesday = ?8,
                   avail_thursday = ?9, avail_friday = ?10
               WHERE teacher_id = ?1"#,
            params![
                teacher.id,
                teacher.name,
                teacher.rank.to_string(),
                teacher.department,
                teacher.max_workload,
                a.monday,
                a.tuesday,
                a.wednesday,
                a.thursday,
                a.friday,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Teacher", &teacher.id));
        }
        Ok(())
    }

    /// 写入工作量缓存
    pub fn update_current_workload(&self, teacher_id: &str, workload: u32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE teacher SET current_workload = ?2 WHERE teacher_id = ?1",
            params![teacher_id, workload],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Teacher", teacher_id));
        }
        Ok(())
    }

    /// 删除教师
    ///
    /// 仍被课表节次引用时返回 ForeignKeyViolation
    pub fn delete(&self, teacher_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM teacher WHERE teacher_id = ?1",
            params![teacher_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Teacher", teacher_id));
        }
        Ok(())
    }

    /// 按teacher_id查询
    pub fn find_by_id(&self, teacher_id: &str) -> RepositoryResult<Option<Teacher>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE teacher_id = ?1", SELECT_COLUMNS);

        let teacher = conn
            .query_row(&sql, params![teacher_id], map_row)
            .optional()?;

        teacher.transpose()
    }

    /// 查询全部教师（按姓名）
    pub fn list_all(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY name, teacher_id", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().collect()
    }

    /// 按院系查询
    pub fn list_by_department(&self, department: &str) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE department = ?1 ORDER BY name, teacher_id", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![department], map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().collect()
    }
}

/// 行映射
///
/// 外层 rusqlite::Result 表示取列失败，内层 RepositoryResult 表示字段值非法
fn map_row(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<Teacher>> {
    let rank_raw: String = row.get(2)?;
    let teacher_id: String = row.get(0)?;

    let rank = match TeacherRank::from_str(&rank_raw) {
        Ok(rank) => rank,
        Err(message) => {
            return Ok(Err(RepositoryError::FieldValueError {
                field: format!("teacher.rank ({})", teacher_id),
                message,
            }))
        }
    };

    Ok(Ok(Teacher {
        id: teacher_id,
        name: row.get(1)?,
        rank,
        department: row.get(3)?,
        max_workload: row.get(4)?,
        current_workload: row.get(5)?,
        availability: WeeklyAvailability {
            monday: row.get(6)?,
            tuesday: row.get(7)?,
            wednesday: row.get(8)?,
            thursday: row.get(9)?,
            friday: row.get(10)?,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Weekday;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_teacher(id: &str, name: &str) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: name.to_string(),
            rank: TeacherRank::Associate,
            department: "CSE".to_string(),
            max_workload: 18,
            current_workload: 0,
            availability: WeeklyAvailability::only(&[Weekday::Monday, Weekday::Wednesday]),
        }
    }

    #[test]
    fn test_insert_and_find_by_id() {
        let repo = TeacherRepository::new(setup_test_db());
        repo.insert(&make_teacher("T1", "Ada")).unwrap();

        let found = repo.find_by_id("T1").unwrap().unwrap();
        assert_eq!(found.name, "Ada");
        assert_eq!(found.rank, TeacherRank::Associate);
        assert!(found.is_available(Weekday::Monday));
        assert!(!found.is_available(Weekday::Tuesday));

        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_profile_keeps_current_workload() {
        let repo = TeacherRepository::new(setup_test_db());
        repo.insert(&make_teacher("T1", "Ada")).unwrap();
        repo.update_current_workload("T1", 7).unwrap();

        let mut changed = make_teacher("T1", "Ada Lovelace");
        changed.max_workload = 20;
        changed.current_workload = 0;
        repo.update_profile(&changed).unwrap();

        let found = repo.find_by_id("T1").unwrap().unwrap();
        assert_eq!(found.name, "Ada Lovelace");
        assert_eq!(found.max_workload, 20);
        assert_eq!(found.current_workload, 7);
    }

    #[test]
    fn test_update_workload_of_missing_teacher_is_not_found() {
        let repo = TeacherRepository::new(setup_test_db());
        let err = repo.update_current_workload("ghost", 3).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_list_all_and_delete() {
        let repo = TeacherRepository::new(setup_test_db());
        repo.insert(&make_teacher("T2", "Bob")).unwrap();
        repo.insert(&make_teacher("T1", "Ada")).unwrap();

        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Ada", "Bob"]);

        repo.delete("T1").unwrap();
        assert_eq!(repo.list_all().unwrap().len(), 1);
        assert!(repo.delete("T1").is_err());
    }
}
