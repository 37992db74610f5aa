// ==========================================
// 院系课表排课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排课辅助（自动排课 + 人工编排 + 全校冲突校验）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排课/校验/工作量规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{PositionStrategy, SubjectType, TeacherRank, Weekday};

// 领域实体
pub use domain::{ActionLog, ActionType, DaySchedule, Slot, Subject, Teacher, Timetable};

// 引擎
pub use engine::{
    OccupancyIndex, SchedulingCatalog, TimetableGenerator, TimetableValidator, WorkloadRecomputer,
};

// API
pub use api::{SubjectApi, TeacherApi, TimetableApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "院系课表排课系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
