// ==========================================
// 院系课表排课系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约束: 所有仓储与配置共用一条连接（Arc<Mutex<Connection>>）
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{SubjectApi, TeacherApi, TimetableApi};
use crate::config::config_manager::ConfigManager;
use crate::db::open_and_init;
use crate::engine::repositories::SchedulingRepositories;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 课表API（含提交锁，必须全局唯一）
    pub timetable_api: Arc<TimetableApi>,

    /// 教师API
    pub teacher_api: Arc<TeacherApi>,

    /// 课程API
    pub subject_api: Arc<SubjectApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（供维护命令直接查询）
    pub repos: SchedulingRepositories,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时新建并建表）
    ///
    /// # 返回
    /// - Err(String): 打开数据库或初始化配置失败
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repos = SchedulingRepositories::from_connection(conn.clone());

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let timetable_api = Arc::new(TimetableApi::new(repos.clone(), config_manager.clone()));
        let teacher_api = Arc::new(TeacherApi::new(repos.teacher_repo.clone()));
        let subject_api = Arc::new(SubjectApi::new(
            repos.subject_repo.clone(),
            repos.teacher_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            timetable_api,
            teacher_api,
            subject_api,
            config_manager,
            repos,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 TIMETABLE_SCHEDULER_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("TIMETABLE_SCHEDULER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./timetable_scheduler.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("timetable-scheduler");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("timetable_scheduler.db"),
            Err(e) => tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "无法创建数据目录，使用当前目录"
            ),
        }
    }

    path.to_string_lossy().to_string()
}
