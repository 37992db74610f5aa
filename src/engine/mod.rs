// ==========================================
// 院系课表排课系统 - 引擎层
// ==========================================
// 职责: 实现排课/校验/工作量规则，不拼 SQL
// 红线: Engine 不拼 SQL，所有规则失败必须输出原因
// ==========================================

pub mod catalog;
pub mod generator;
pub mod occupancy;
pub mod repositories;
pub mod validator;
pub mod workload;

// 重导出核心引擎
pub use catalog::SchedulingCatalog;
pub use generator::{
    GeneratedSchedule, GenerationRequest, GeneratorConfig, GeneratorError, SearchStats,
    SubjectSelection, TimetableGenerator,
};
pub use occupancy::{OccupancyIndex, WeekGrid};
pub use repositories::SchedulingRepositories;
pub use validator::{IssueKind, TimetableValidator, ValidationIssue, ValidationReport};
pub use workload::{
    compute_workloads, recompute_with, TeacherWorkloadWriter, WorkloadRecomputeReport,
    WorkloadRecomputer, WorkloadWriteFailure,
};
