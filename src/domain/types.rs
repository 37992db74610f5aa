// ==========================================
// 院系课表排课系统 - 领域类型定义
// ==========================================
// 职责: 星期 / 课程类型 / 教师职级 / 节次常量
// 红线: 每天固定 7 节课（课间休息不计入节次）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 节次常量
// ==========================================

/// 每天的教学节次数量（节次编号 1..=7）
pub const SLOTS_PER_DAY: u8 = 7;

/// 每周教学日数量（周一至周五）
pub const DAYS_PER_WEEK: usize = 5;

/// 一周内全部候选位置数量（天 × 节）
pub const POSITIONS_PER_WEEK: usize = DAYS_PER_WEEK * SLOTS_PER_DAY as usize;

/// 实验课连排的合法起止节次
///
/// 注意: (5,6) 与 (6,7) 共享第 6 节，这是现行规则的一部分，保持原样。
pub const LAB_SLOT_PAIRS: [(u8, u8); 4] = [(1, 2), (3, 4), (5, 6), (6, 7)];

/// 节次编号是否合法（1..=7）
pub fn is_valid_slot_number(slot_number: u8) -> bool {
    (1..=SLOTS_PER_DAY).contains(&slot_number)
}

/// 以 `start` 为起始节次的实验课连排第二节（无则 None）
pub fn lab_pair_for_start(start: u8) -> Option<u8> {
    LAB_SLOT_PAIRS
        .iter()
        .find(|(first, _)| *first == start)
        .map(|(_, second)| *second)
}

// ==========================================
// 星期 (Weekday)
// ==========================================
// 序列化格式: "Monday" .. "Friday"（与课表数据一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    /// 周一至周五，按顺序
    pub const ALL: [Weekday; DAYS_PER_WEEK] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    /// 0 起始的下标（周一 = 0）
    pub fn index(self) -> usize {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Weekday> {
        Weekday::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// 不区分大小写，接受全称或三字母缩写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Weekday::Monday),
            "tuesday" | "tue" => Ok(Weekday::Tuesday),
            "wednesday" | "wed" => Ok(Weekday::Wednesday),
            "thursday" | "thu" => Ok(Weekday::Thursday),
            "friday" | "fri" => Ok(Weekday::Friday),
            other => Err(format!("无效的教学日: {}", other)),
        }
    }
}

// ==========================================
// 课程类型 (Subject Type)
// ==========================================
// 序列化格式: lowercase（theory / lab）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Theory, // 理论课，单节
    Lab,    // 实验课，两节连排
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectType::Theory => write!(f, "theory"),
            SubjectType::Lab => write!(f, "lab"),
        }
    }
}

impl FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "theory" => Ok(SubjectType::Theory),
            "lab" => Ok(SubjectType::Lab),
            other => Err(format!("无效的课程类型: {}", other)),
        }
    }
}

// ==========================================
// 教师职级 (Teacher Rank)
// ==========================================
// 仅作展示，不参与排课约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeacherRank {
    Assistant, // 助理教授
    Associate, // 副教授
    Senior,    // 教授
}

impl fmt::Display for TeacherRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeacherRank::Assistant => write!(f, "assistant"),
            TeacherRank::Associate => write!(f, "associate"),
            TeacherRank::Senior => write!(f, "senior"),
        }
    }
}

impl FromStr for TeacherRank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assistant" => Ok(TeacherRank::Assistant),
            "associate" => Ok(TeacherRank::Associate),
            "senior" => Ok(TeacherRank::Senior),
            other => Err(format!("无效的教师职级: {}", other)),
        }
    }
}

// ==========================================
// 候选位置策略 (Position Strategy)
// ==========================================
// 配置值: FIRST_FIT / BEST_SCORE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStrategy {
    FirstFit,  // 按节次优先顺序，首个合法位置即采用
    BestScore, // 当前步的合法位置按软约束得分降序尝试
}

impl Default for PositionStrategy {
    fn default() -> Self {
        PositionStrategy::FirstFit
    }
}

impl fmt::Display for PositionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionStrategy::FirstFit => write!(f, "FIRST_FIT"),
            PositionStrategy::BestScore => write!(f, "BEST_SCORE"),
        }
    }
}

impl FromStr for PositionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FIRST_FIT" => Ok(PositionStrategy::FirstFit),
            "BEST_SCORE" => Ok(PositionStrategy::BestScore),
            other => Err(format!("无效的候选位置策略: {}", other)),
        }
    }
}
