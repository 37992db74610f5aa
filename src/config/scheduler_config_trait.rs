// ==========================================
// 院系课表排课系统 - 排课配置读取 Trait
// ==========================================
// 职责: 定义排课/提交流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::PositionStrategy;
use std::error::Error;

// ==========================================
// SchedulerConfigReader Trait
// ==========================================
// 用途: 自动排课与课表提交所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait SchedulerConfigReader: Send + Sync {
    // ===== 自动排课 =====

    /// 获取候选位置策略
    ///
    /// # 默认值
    /// - FIRST_FIT
    fn get_position_strategy(&self) -> Result<PositionStrategy, Box<dyn Error>>;

    /// 获取搜索节点上限（每尝试一个候选位置计 1 个节点）
    ///
    /// # 默认值
    /// - 200000
    fn get_max_search_nodes(&self) -> Result<u64, Box<dyn Error>>;

    /// 获取搜索时间上限（毫秒，0 = 不限）
    ///
    /// # 默认值
    /// - 10000
    fn get_search_time_limit_ms(&self) -> Result<u64, Box<dyn Error>>;

    // ===== 课表提交 =====

    /// 自动排课结果在保存前是否必须通过完整校验
    ///
    /// # 默认值
    /// - true
    fn get_validate_generated_before_commit(&self) -> Result<bool, Box<dyn Error>>;
}
