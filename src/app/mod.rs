// ==========================================
// 院系课表排课系统 - 应用层
// ==========================================
// 职责: 连接数据库、仓储与 API，供命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
