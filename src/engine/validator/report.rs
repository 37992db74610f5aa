use crate::domain::types::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// IssueKind - 问题类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    DoubleBooking,     // 教师同一节次出现在多个班级
    ConsecutiveTheory, // 教师连续两节理论课
    TheoryLabAdjacent, // 理论课与实验课相邻（警告）
    WorkloadExceeded,  // 全校合计节次超过上限
    TeacherUnavailable,
    CreditMismatch,
    UnresolvedTeacher,
    UnresolvedSubject,
    MalformedSchedule,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::DoubleBooking => "DOUBLE_BOOKING",
            IssueKind::ConsecutiveTheory => "CONSECUTIVE_THEORY",
            IssueKind::TheoryLabAdjacent => "THEORY_LAB_ADJACENT",
            IssueKind::WorkloadExceeded => "WORKLOAD_EXCEEDED",
            IssueKind::TeacherUnavailable => "TEACHER_UNAVAILABLE",
            IssueKind::CreditMismatch => "CREDIT_MISMATCH",
            IssueKind::UnresolvedTeacher => "UNRESOLVED_TEACHER",
            IssueKind::UnresolvedSubject => "UNRESOLVED_SUBJECT",
            IssueKind::MalformedSchedule => "MALFORMED_SCHEDULE",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// ValidationIssue - 单条问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slot_numbers: Vec<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timetables: Vec<String>, // 涉及课表的标签
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            teacher_id: None,
            subject_id: None,
            day: None,
            slot_numbers: Vec::new(),
            timetables: Vec::new(),
        }
    }

    pub fn teacher(mut self, teacher_id: &str) -> Self {
        self.teacher_id = Some(teacher_id.to_string());
        self
    }

    pub fn subject(mut self, subject_id: &str) -> Self {
        self.subject_id = Some(subject_id.to_string());
        self
    }

    pub fn at(mut self, day: Weekday, slot_numbers: Vec<u8>) -> Self {
        self.day = Some(day);
        self.slot_numbers = slot_numbers;
        self
    }

    pub fn on_day(mut self, day: Weekday) -> Self {
        self.day = Some(day);
        self
    }

    pub fn timetables(mut self, labels: Vec<String>) -> Self {
        self.timetables = labels;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// 由问题列表生成报告（is_valid 当且仅当无错误）
    pub fn from_issues(errors: Vec<ValidationIssue>, warnings: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_error(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|issue| issue.kind == kind)
    }

    pub fn has_warning(&self, kind: IssueKind) -> bool {
        self.warnings.iter().any(|issue| issue.kind == kind)
    }

    /// 错误信息摘要（多条以分号拼接）
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
