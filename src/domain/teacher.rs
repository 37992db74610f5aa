// ==========================================
// 院系课表排课系统 - 教师领域模型
// ==========================================
// 红线: current_workload 只是缓存，权威来源永远是已保存的课表
// ==========================================

use crate::domain::types::{TeacherRank, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// WeeklyAvailability - 每周可排课日
// ==========================================
// 缺省字段视为可排（与历史数据一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAvailability {
    #[serde(default = "available_by_default")]
    pub monday: bool,
    #[serde(default = "available_by_default")]
    pub tuesday: bool,
    #[serde(default = "available_by_default")]
    pub wednesday: bool,
    #[serde(default = "available_by_default")]
    pub thursday: bool,
    #[serde(default = "available_by_default")]
    pub friday: bool,
}

fn available_by_default() -> bool {
    true
}

impl Default for WeeklyAvailability {
    fn default() -> Self {
        Self::all_days()
    }
}

impl WeeklyAvailability {
    /// 周一至周五全部可排
    pub fn all_days() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
        }
    }

    /// 仅指定日期可排
    pub fn only(days: &[Weekday]) -> Self {
        let mut availability = Self {
            monday: false,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: false,
        };
        for day in days {
            availability.set(*day, true);
        }
        availability
    }

    pub fn is_available(&self, day: Weekday) -> bool {
        match day {
            Weekday::Monday => self.monday,
            Weekday::Tuesday => self.tuesday,
            Weekday::Wednesday => self.wednesday,
            Weekday::Thursday => self.thursday,
            Weekday::Friday => self.friday,
        }
    }

    pub fn set(&mut self, day: Weekday, available: bool) {
        match day {
            Weekday::Monday => self.monday = available,
            Weekday::Tuesday => self.tuesday = available,
            Weekday::Wednesday => self.wednesday = available,
            Weekday::Thursday => self.thursday = available,
            Weekday::Friday => self.friday = available,
        }
    }

    /// 可排课日数量
    pub fn available_day_count(&self) -> usize {
        Weekday::ALL
            .iter()
            .filter(|day| self.is_available(**day))
            .count()
    }
}

// ==========================================
// Teacher - 教师
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub rank: TeacherRank,
    pub department: String,
    pub max_workload: u32, // 全校所有课表合计节次上限
    #[serde(default)]
    pub current_workload: u32, // 派生缓存，由工作量重算写入
    #[serde(default)]
    pub availability: WeeklyAvailability,
}

impl Teacher {
    pub fn is_available(&self, day: Weekday) -> bool {
        self.availability.is_available(day)
    }
}

// ==========================================
// TeacherDraft - 教师新建/修改输入
// ==========================================
// 不含 id 与 current_workload（二者都不由调用方决定）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDraft {
    pub name: String,
    pub rank: TeacherRank,
    pub department: String,
    pub max_workload: u32,
    #[serde(default)]
    pub availability: WeeklyAvailability,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_availability_fields_default_to_available() {
        let json = r#"{"monday": false}"#;
        let availability: WeeklyAvailability = serde_json::from_str(json).unwrap();
        assert!(!availability.monday);
        assert!(availability.tuesday);
        assert!(availability.friday);
        assert_eq!(availability.available_day_count(), 4);
    }

    #[test]
    fn test_only_marks_listed_days() {
        let availability = WeeklyAvailability::only(&[Weekday::Tuesday, Weekday::Thursday]);
        assert!(!availability.is_available(Weekday::Monday));
        assert!(availability.is_available(Weekday::Tuesday));
        assert!(!availability.is_available(Weekday::Wednesday));
        assert!(availability.is_available(Weekday::Thursday));
        assert!(!availability.is_available(Weekday::Friday));
    }
}
