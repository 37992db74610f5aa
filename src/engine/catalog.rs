// ==========================================
// 院系课表排课系统 - 排课目录（只读）
// ==========================================
// 职责: 按 id 索引教师与课程，供排课与校验查找
// 红线: 课表只持有 id 引用，记录本身由目录持有（无引用环）
// ==========================================

use crate::domain::subject::Subject;
use crate::domain::teacher::Teacher;
use std::collections::HashMap;

/// 教师与课程的只读快照
#[derive(Debug, Clone, Default)]
pub struct SchedulingCatalog {
    teachers: HashMap<String, Teacher>,
    subjects: HashMap<String, Subject>,
}

impl SchedulingCatalog {
    pub fn new(teachers: Vec<Teacher>, subjects: Vec<Subject>) -> Self {
        Self {
            teachers: teachers.into_iter().map(|t| (t.id.clone(), t)).collect(),
            subjects: subjects.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn teacher(&self, teacher_id: &str) -> Option<&Teacher> {
        self.teachers.get(teacher_id)
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.get(subject_id)
    }

    /// 教师显示名（查不到时退回 id）
    pub fn teacher_name<'a>(&'a self, teacher_id: &'a str) -> &'a str {
        self.teachers
            .get(teacher_id)
            .map(|t| t.name.as_str())
            .unwrap_or(teacher_id)
    }

    /// 课程显示名（查不到时退回 id）
    pub fn subject_name<'a>(&'a self, subject_id: &'a str) -> &'a str {
        self.subjects
            .get(subject_id)
            .map(|s| s.name.as_str())
            .unwrap_or(subject_id)
    }
}
