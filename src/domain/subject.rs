// ==========================================
// 院系课表排课系统 - 课程领域模型
// ==========================================
// 红线: credits = 该课程在单张课表中必须占用的每周节次数（精确相等）
// ==========================================

use crate::domain::types::SubjectType;
use serde::{Deserialize, Serialize};

/// 课程
///
/// `teacher_ids` 是具备授课资格的教师集合；
/// 某张课表里实际授课的教师在排课时从中挑选，不固定在课程上。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
    pub credits: u32,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub semester: i32,
    pub department: String,
    #[serde(default)]
    pub teacher_ids: Vec<String>,
}

impl Subject {
    pub fn is_lab(&self) -> bool {
        self.subject_type == SubjectType::Lab
    }

    /// 教师是否在该课程的授课资格集合内
    pub fn is_eligible(&self, teacher_id: &str) -> bool {
        self.teacher_ids.iter().any(|id| id == teacher_id)
    }
}

/// 课程新建/修改输入
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDraft {
    pub name: String,
    pub code: String,
    pub credits: u32,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub semester: i32,
    pub department: String,
    #[serde(default)]
    pub teacher_ids: Vec<String>,
}
