// ==========================================
// 院系课表排课系统 - 课表领域模型
// ==========================================
// 职责: 课表 / 教学日 / 节次 的数据结构
// 约束: 只存已占用节次（稀疏），空节次隐式存在
// 约束: 节次里的课程/教师是按 id 的引用，不拥有对方
// ==========================================

use crate::domain::types::Weekday;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// EntityRef - 实体引用（身份归一化）
// ==========================================
// 调用方传入的教师/课程引用既可能是裸 id，也可能是展开后的记录；
// 二者在排课与校验中必须等价对待，统一经 id() 取身份。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Record(RefRecord),
}

/// 展开形式的引用记录（其余字段忽略）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Record(record) => &record.id,
        }
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        EntityRef::Id(id.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(id: String) -> Self {
        EntityRef::Id(id)
    }
}

// 按身份比较：裸 id 与展开记录只要 id 相同即相等
impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for EntityRef {}

// ==========================================
// Slot - 已占用节次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub slot_number: u8,
    pub subject: EntityRef,
    #[serde(default)]
    pub teachers: Vec<EntityRef>,
}

impl Slot {
    pub fn new(slot_number: u8, subject_id: &str, teacher_ids: &[String]) -> Self {
        Self {
            slot_number,
            subject: EntityRef::from(subject_id),
            teachers: teacher_ids.iter().map(|id| EntityRef::from(id.as_str())).collect(),
        }
    }

    pub fn subject_id(&self) -> &str {
        self.subject.id()
    }

    pub fn teacher_ids(&self) -> impl Iterator<Item = &str> {
        self.teachers.iter().map(|t| t.id())
    }

    pub fn has_teacher(&self, teacher_id: &str) -> bool {
        self.teacher_ids().any(|id| id == teacher_id)
    }
}

// ==========================================
// DaySchedule - 单个教学日
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: Weekday,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl DaySchedule {
    pub fn empty(day: Weekday) -> Self {
        Self {
            day,
            slots: Vec::new(),
        }
    }

    pub fn slot(&self, slot_number: u8) -> Option<&Slot> {
        self.slots.iter().find(|s| s.slot_number == slot_number)
    }
}

/// 周一至周五全空的课表
pub fn empty_week() -> Vec<DaySchedule> {
    Weekday::ALL.iter().map(|day| DaySchedule::empty(*day)).collect()
}

// ==========================================
// Timetable - 课表
// ==========================================
// 自然键: (semester, department, section) = 一个班级
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: String,
    pub semester: i32,
    pub department: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default)]
    pub schedule: Vec<DaySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Timetable {
    /// 校验信息中使用的课表标签
    pub fn label(&self) -> String {
        timetable_label(&self.department, self.semester, &self.section)
    }

    /// 全部已占用节次（按课表中出现的顺序）
    pub fn occupied_slots(&self) -> impl Iterator<Item = (Weekday, &Slot)> {
        self.schedule
            .iter()
            .flat_map(|day| day.slots.iter().map(move |slot| (day.day, slot)))
    }

    /// 每门课程占用的节次数
    pub fn slot_count_by_subject(&self) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for (_, slot) in self.occupied_slots() {
            *counts.entry(slot.subject_id().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// (教学日, 节次) 上的节次
    pub fn slot_at(&self, day: Weekday, slot_number: u8) -> Option<&Slot> {
        self.schedule
            .iter()
            .find(|d| d.day == day)
            .and_then(|d| d.slot(slot_number))
    }
}

pub fn timetable_label(department: &str, semester: i32, section: &str) -> String {
    format!("{} - Semester {} - Section {}", department, semester, section)
}

/// 按周一→周五、节次升序整理 schedule（缺失的教学日补空）
pub fn normalize_schedule(schedule: Vec<DaySchedule>) -> Vec<DaySchedule> {
    let mut by_day: BTreeMap<Weekday, Vec<Slot>> = BTreeMap::new();
    for day in schedule {
        by_day.entry(day.day).or_default().extend(day.slots);
    }

    Weekday::ALL
        .iter()
        .map(|day| {
            let mut slots = by_day.remove(day).unwrap_or_default();
            slots.sort_by_key(|s| s.slot_number);
            DaySchedule { day: *day, slots }
        })
        .collect()
}

// ==========================================
// TimetableDraft - 人工编排/新建输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableDraft {
    pub semester: i32,
    pub department: String,
    pub section: String,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub schedule: Vec<DaySchedule>,
}

impl TimetableDraft {
    /// 转为待校验课表（id 由调用方分配）
    pub fn into_timetable(self, id: String) -> Timetable {
        Timetable {
            id,
            semester: self.semester,
            department: self.department,
            section: self.section,
            cluster: self.cluster,
            schedule: self.schedule,
            created_at: None,
            updated_at: None,
        }
    }
}

// ==========================================
// TimetableUpdate - 课表整体替换输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableUpdate {
    #[serde(default)]
    pub cluster: Option<String>,
    pub schedule: Vec<DaySchedule>,
}

// ==========================================
// TeacherSlotView - 教师视角的课表条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSlotView {
    pub day: Weekday,
    pub slot_number: u8,
    pub subject_id: String,
    pub subject_name: Option<String>,
    pub timetable_id: String,
    pub timetable_info: String,
}
