// ==========================================
// 院系课表排课系统 - 教师管理 API
// ==========================================
// 职责: 教师新建、修改、删除、查询
// 红线: current_workload 只由工作量重算写入，修改资料不触碰
// 红线: 仍被课表引用的教师不可删除
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::teacher::{Teacher, TeacherDraft};
use crate::repository::error::RepositoryError;
use crate::repository::teacher_repo::TeacherRepository;

// ==========================================
// TeacherApi - 教师管理 API
// ==========================================
pub struct TeacherApi {
    teacher_repo: Arc<TeacherRepository>,
}

impl TeacherApi {
    /// 创建新的TeacherApi实例
    pub fn new(teacher_repo: Arc<TeacherRepository>) -> Self {
        Self { teacher_repo }
    }

    /// 查询全部教师（按姓名排序）
    pub fn list_teachers(&self) -> ApiResult<Vec<Teacher>> {
        Ok(self.teacher_repo.list_all()?)
    }

    /// 按院系查询教师
    pub fn list_teachers_by_department(&self, department: &str) -> ApiResult<Vec<Teacher>> {
        if department.trim().is_empty() {
            return Err(ApiError::InvalidInput("院系不能为空".to_string()));
        }
        Ok(self.teacher_repo.list_by_department(department)?)
    }

    /// 查询单个教师
    pub fn get_teacher(&self, teacher_id: &str) -> ApiResult<Teacher> {
        self.teacher_repo
            .find_by_id(teacher_id)?
            .ok_or_else(|| ApiError::NotFound(format!("教师(id={})不存在", teacher_id)))
    }

    /// 新建教师
    ///
    /// # 返回
    /// - Ok(Teacher): 新建的教师（current_workload = 0）
    pub fn create_teacher(&self, draft: TeacherDraft) -> ApiResult<Teacher> {
        validate_draft(&draft)?;

        let teacher = Teacher {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            rank: draft.rank,
            department: draft.department.trim().to_string(),
            max_workload: draft.max_workload,
            current_workload: 0,
            availability: draft.availability,
        };
        self.teacher_repo.insert(&teacher)?;

        info!(teacher_id = %teacher.id, name = %teacher.name, "教师已创建");
        Ok(teacher)
    }

    /// 修改教师资料
    pub fn update_teacher(&self, teacher_id: &str, draft: TeacherDraft) -> ApiResult<Teacher> {
        validate_draft(&draft)?;

        let mut teacher = self.get_teacher(teacher_id)?;
        teacher.name = draft.name.trim().to_string();
        teacher.rank = draft.rank;
        teacher.department = draft.department.trim().to_string();
        teacher.max_workload = draft.max_workload;
        teacher.availability = draft.availability;
        self.teacher_repo.update_profile(&teacher)?;

        info!(teacher_id = %teacher.id, "教师资料已更新");
        Ok(teacher)
    }

    /// 删除教师
    ///
    /// # 返回
    /// - Err(BusinessRuleViolation): 仍有课表节次引用该教师
    pub fn delete_teacher(&self, teacher_id: &str) -> ApiResult<()> {
        match self.teacher_repo.delete(teacher_id) {
            Ok(()) => {
                info!(teacher_id = teacher_id, "教师已删除");
                Ok(())
            }
            Err(RepositoryError::ForeignKeyViolation(_)) => Err(ApiError::BusinessRuleViolation(
                format!("教师(id={})仍被课表引用，请先调整相关课表", teacher_id),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_draft(draft: &TeacherDraft) -> ApiResult<()> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("教师姓名不能为空".to_string()));
    }
    if draft.department.trim().is_empty() {
        return Err(ApiError::InvalidInput("院系不能为空".to_string()));
    }
    if draft.max_workload == 0 {
        return Err(ApiError::InvalidInput("工作量上限必须大于0".to_string()));
    }
    Ok(())
}
