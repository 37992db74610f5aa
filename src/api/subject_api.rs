// ==========================================
// 院系课表排课系统 - 课程管理 API
// ==========================================
// 职责: 课程新建、修改、删除、查询（含授课资格教师集合）
// 红线: credits 为每周必须占用的节次数，范围 1..=35
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::subject::{Subject, SubjectDraft};
use crate::domain::types::POSITIONS_PER_WEEK;
use crate::repository::error::RepositoryError;
use crate::repository::subject_repo::SubjectRepository;
use crate::repository::teacher_repo::TeacherRepository;

// ==========================================
// SubjectApi - 课程管理 API
// ==========================================
pub struct SubjectApi {
    subject_repo: Arc<SubjectRepository>,
    teacher_repo: Arc<TeacherRepository>,
}

impl SubjectApi {
    /// 创建新的SubjectApi实例
    pub fn new(subject_repo: Arc<SubjectRepository>, teacher_repo: Arc<TeacherRepository>) -> Self {
        Self {
            subject_repo,
            teacher_repo,
        }
    }

    /// 查询全部课程
    pub fn list_subjects(&self) -> ApiResult<Vec<Subject>> {
        Ok(self.subject_repo.list_all()?)
    }

    /// 按学期查询课程
    pub fn list_subjects_by_semester(&self, semester: i32) -> ApiResult<Vec<Subject>> {
        Ok(self.subject_repo.list_by_semester(semester)?)
    }

    /// 查询单个课程
    pub fn get_subject(&self, subject_id: &str) -> ApiResult<Subject> {
        self.subject_repo
            .find_by_id(subject_id)?
            .ok_or_else(|| ApiError::NotFound(format!("课程(id={})不存在", subject_id)))
    }

    /// 新建课程
    pub fn create_subject(&self, draft: SubjectDraft) -> ApiResult<Subject> {
        self.validate_draft(&draft)?;

        let subject = build_subject(uuid::Uuid::new_v4().to_string(), draft);
        self.subject_repo.insert(&subject)?;

        info!(subject_id = %subject.id, code = %subject.code, "课程已创建");
        Ok(subject)
    }

    /// 修改课程（授课资格集合整体替换）
    pub fn update_subject(&self, subject_id: &str, draft: SubjectDraft) -> ApiResult<Subject> {
        self.validate_draft(&draft)?;
        self.get_subject(subject_id)?;

        let subject = build_subject(subject_id.to_string(), draft);
        self.subject_repo.update(&subject)?;

        info!(subject_id = %subject.id, "课程已更新");
        Ok(subject)
    }

    /// 删除课程
    ///
    /// # 返回
    /// - Err(BusinessRuleViolation): 仍有课表节次使用该课程
    pub fn delete_subject(&self, subject_id: &str) -> ApiResult<()> {
        match self.subject_repo.delete(subject_id) {
            Ok(()) => {
                info!(subject_id = subject_id, "课程已删除");
                Ok(())
            }
            Err(RepositoryError::ForeignKeyViolation(_)) => Err(ApiError::BusinessRuleViolation(
                format!("课程(id={})仍被课表使用，请先调整相关课表", subject_id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn validate_draft(&self, draft: &SubjectDraft) -> ApiResult<()> {
        if draft.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("课程名称不能为空".to_string()));
        }
        if draft.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("课程代码不能为空".to_string()));
        }
        if draft.department.trim().is_empty() {
            return Err(ApiError::InvalidInput("院系不能为空".to_string()));
        }
        if draft.credits == 0 || draft.credits as usize > POSITIONS_PER_WEEK {
            return Err(ApiError::InvalidInput(format!(
                "credits 必须在 1..={} 之间: {}",
                POSITIONS_PER_WEEK, draft.credits
            )));
        }

        for teacher_id in &draft.teacher_ids {
            if self.teacher_repo.find_by_id(teacher_id)?.is_none() {
                return Err(ApiError::InvalidInput(format!(
                    "授课教师不存在: {}",
                    teacher_id
                )));
            }
        }
        Ok(())
    }
}

fn build_subject(id: String, draft: SubjectDraft) -> Subject {
    let mut teacher_ids: Vec<String> = Vec::with_capacity(draft.teacher_ids.len());
    for teacher_id in draft.teacher_ids {
        if !teacher_ids.contains(&teacher_id) {
            teacher_ids.push(teacher_id);
        }
    }

    Subject {
        id,
        name: draft.name.trim().to_string(),
        code: draft.code.trim().to_string(),
        credits: draft.credits,
        subject_type: draft.subject_type,
        semester: draft.semester,
        department: draft.department.trim().to_string(),
        teacher_ids,
    }
}
