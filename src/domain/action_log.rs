// ==========================================
// 院系课表排课系统 - 操作日志领域模型
// ==========================================
// 红线: 所有课表写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,          // ActionType 的字符串形式
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub timetable_id: Option<String>, // 工作量重算等全局操作为 None
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateTimetable,   // 人工新建课表
    UpdateTimetable,   // 整体替换课表
    DeleteTimetable,   // 删除课表
    GenerateTimetable, // 自动排课并保存
    RecomputeWorkload, // 手动触发工作量重算
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::CreateTimetable => "CreateTimetable",
            ActionType::UpdateTimetable => "UpdateTimetable",
            ActionType::DeleteTimetable => "DeleteTimetable",
            ActionType::GenerateTimetable => "GenerateTimetable",
            ActionType::RecomputeWorkload => "RecomputeWorkload",
        };
        write!(f, "{}", s)
    }
}

impl ActionLog {
    /// 以当前时间创建日志
    pub fn new(action_type: ActionType, actor: &str, timetable_id: Option<&str>) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            timetable_id: timetable_id.map(|s| s.to_string()),
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
