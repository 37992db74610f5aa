// ==========================================
// 院系课表排课系统 - API 层
// ==========================================
// 职责: 提供调用-返回式业务接口，供 CLI/上层适配器调用
// ==========================================

pub mod error;
pub mod subject_api;
pub mod teacher_api;
pub mod timetable_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use subject_api::SubjectApi;
pub use teacher_api::TeacherApi;
pub use timetable_api::{
    GenerationCommitResult, GenerationPreview, TimetableApi, TimetableCommitResult,
};
