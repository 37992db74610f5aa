// ==========================================
// 院系课表排课系统 - 课表 API
// ==========================================
// 职责: 课表查询、校验、人工新建/修改/删除、自动排课、工作量重算、导出
// 红线: 所有提交路径（新建/修改/删除/自动排课保存）在同一把提交锁内
//       完成 读快照 → 校验 → 写入 → 工作量重算，防止并发提交造成教师重复占用
// 红线: 校验不通过的课表不落库
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::timetable::{
    normalize_schedule, Timetable, TimetableDraft, TimetableUpdate,
};
use crate::engine::generator::{GenerationRequest, GeneratorConfig, SearchStats, TimetableGenerator};
use crate::engine::repositories::SchedulingRepositories;
use crate::engine::validator::{TimetableValidator, ValidationReport};
use crate::engine::workload::WorkloadRecomputeReport;

mod commit;
mod generation;
mod views;

// ==========================================
// 返回结构
// ==========================================

/// 提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableCommitResult {
    pub timetable: Timetable,
    pub report: ValidationReport, // 通过时只可能带警告
    pub workload: WorkloadRecomputeReport,
}

/// 自动排课预览（不落库）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPreview {
    pub timetable: Timetable,
    pub soft_score: i32,
    pub stats: SearchStats,
    pub report: ValidationReport,
    pub replaces_existing: bool, // 同一班级已有课表，保存时整体替换
}

/// 自动排课并保存的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCommitResult {
    pub preview: GenerationPreview,
    pub workload: WorkloadRecomputeReport,
}

// ==========================================
// TimetableApi - 课表 API
// ==========================================
pub struct TimetableApi {
    repos: SchedulingRepositories,
    config_manager: Arc<ConfigManager>,
    validator: TimetableValidator,
    // 全校唯一的提交锁：教师占用跨院系，不能按院系分锁
    commit_lock: Mutex<()>,
}

impl TimetableApi {
    /// 创建新的TimetableApi实例
    pub fn new(repos: SchedulingRepositories, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            repos,
            config_manager,
            validator: TimetableValidator::new(),
            commit_lock: Mutex::new(()),
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询全部课表
    pub fn list_timetables(&self) -> ApiResult<Vec<Timetable>> {
        Ok(self.repos.timetable_repo.list_all()?)
    }

    /// 查询单张课表
    pub fn get_timetable(&self, timetable_id: &str) -> ApiResult<Timetable> {
        if timetable_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("课表ID不能为空".to_string()));
        }
        self.repos
            .timetable_repo
            .find_by_id(timetable_id)?
            .ok_or_else(|| ApiError::NotFound(format!("课表(id={})不存在", timetable_id)))
    }

    /// 以当前已保存数据为范围校验候选课表（不落库）
    ///
    /// 候选课表可以是新建草稿，也可以是已保存课表的修改版本（同 id 的旧版本不计入范围）。
    ///
    /// # 返回
    /// - Ok(ValidationReport): 校验报告（不通过也是 Ok）
    /// - Err(ApiError): 读取教师/课程/课表失败，无法得出结论
    pub fn validate_timetable(&self, candidate: &Timetable) -> ApiResult<ValidationReport> {
        self.check_candidate(candidate)
    }

    /// 校验已保存的课表
    pub fn check_saved_timetable(&self, timetable_id: &str) -> ApiResult<ValidationReport> {
        let timetable = self.get_timetable(timetable_id)?;
        self.check_candidate(&timetable)
    }

    /// 全量重算教师工作量（手动触发）
    pub fn recompute_workloads(&self, actor: &str) -> ApiResult<WorkloadRecomputeReport> {
        let report = self.repos.workload_recomputer().recompute(None)?;

        let log = ActionLog::new(ActionType::RecomputeWorkload, actor, None)
            .with_payload(serde_json::json!({
                "updated": report.updated.len(),
                "orphaned_teacher_ids": report.orphaned_teacher_ids,
                "failures": report.failures,
            }))
            .with_detail("手动重算教师工作量");
        self.repos.action_log_repo.insert(&log)?;

        Ok(report)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn commit_guard(&self) -> ApiResult<MutexGuard<'_, ()>> {
        self.commit_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("提交锁获取失败: {}", e)))
    }

    /// 读取目录与其他课表快照后校验
    fn check_candidate(&self, candidate: &Timetable) -> ApiResult<ValidationReport> {
        let catalog = self.repos.load_catalog()?;
        let others = self.repos.load_other_timetables(Some(&candidate.id))?;
        Ok(self.validator.validate(candidate, &others, &catalog))
    }

    /// 提交后的工作量重算
    ///
    /// 写入已经成功；重算读失败时向上报告，由调用方稍后手动重算修复。
    fn recompute_after_commit(&self, exclude_id: Option<&str>) -> ApiResult<WorkloadRecomputeReport> {
        match self.repos.workload_recomputer().recompute(exclude_id) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(error = %e, "提交后工作量重算失败");
                Err(e.into())
            }
        }
    }

    fn load_generator_config(&self) -> ApiResult<GeneratorConfig> {
        GeneratorConfig::load(self.config_manager.as_ref())
            .map_err(|e| ApiError::InternalError(format!("读取排课配置失败: {}", e)))
    }

    fn write_action_log(&self, log: ActionLog) -> ApiResult<()> {
        self.repos.action_log_repo.insert(&log)?;
        Ok(())
    }
}

/// 班级信息的基本输入检查
fn validate_section_header(semester: i32, department: &str, section: &str) -> ApiResult<()> {
    if semester <= 0 {
        return Err(ApiError::InvalidInput(format!("学期必须为正数: {}", semester)));
    }
    if department.trim().is_empty() {
        return Err(ApiError::InvalidInput("院系不能为空".to_string()));
    }
    if section.trim().is_empty() {
        return Err(ApiError::InvalidInput("班级不能为空".to_string()));
    }
    Ok(())
}
