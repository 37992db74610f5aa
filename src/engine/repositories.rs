// ==========================================
// 院系课表排课系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排课/校验/重算所需的全部 Repository
// 职责: 提供引擎输入快照（目录 + 其他课表）的统一读取
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::domain::timetable::Timetable;
use crate::engine::catalog::SchedulingCatalog;
use crate::engine::workload::WorkloadRecomputer;
use crate::repository::{
    ActionLogRepository, RepositoryResult, SubjectRepository, TeacherRepository,
    TimetableRepository,
};

/// 排课引擎仓储集合
///
/// # 包含的仓储
/// - `teacher_repo`: 教师
/// - `subject_repo`: 课程与授课资格
/// - `timetable_repo`: 课表
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct SchedulingRepositories {
    pub teacher_repo: Arc<TeacherRepository>,
    pub subject_repo: Arc<SubjectRepository>,
    pub timetable_repo: Arc<TimetableRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl SchedulingRepositories {
    /// 创建新的仓储集合
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        subject_repo: Arc<SubjectRepository>,
        timetable_repo: Arc<TimetableRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            teacher_repo,
            subject_repo,
            timetable_repo,
            action_log_repo,
        }
    }

    /// 在同一共享连接上创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(TeacherRepository::new(conn.clone())),
            Arc::new(SubjectRepository::new(conn.clone())),
            Arc::new(TimetableRepository::new(conn.clone())),
            Arc::new(ActionLogRepository::new(conn)),
        )
    }

    /// 读取全部教师与课程，构建只读目录
    pub fn load_catalog(&self) -> RepositoryResult<SchedulingCatalog> {
        let teachers = self.teacher_repo.list_all()?;
        let subjects = self.subject_repo.list_all()?;
        Ok(SchedulingCatalog::new(teachers, subjects))
    }

    /// 读取除指定课表外的全部已保存课表
    pub fn load_other_timetables(&self, exclude_id: Option<&str>) -> RepositoryResult<Vec<Timetable>> {
        self.timetable_repo.list_excluding(exclude_id)
    }

    /// 基于本集合的工作量重算器
    pub fn workload_recomputer(&self) -> WorkloadRecomputer {
        WorkloadRecomputer::new(self.teacher_repo.clone(), self.timetable_repo.clone())
    }
}
