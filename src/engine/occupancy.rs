// ==========================================
// 院系课表排课系统 - 教师占用索引
// ==========================================
// 职责: 教师 × 教学日 × 节次 的占用表
// 输入: 一组课表（已保存的其他课表，可选加上候选课表）
// 红线: 纯函数构建，不读库、不写库
// 红线: 教师引用无论裸 id 还是展开记录，均按 id 归一
// ==========================================
// 排课时由单次调用独占并在回溯中精确撤销；调用之间不共享
// ==========================================

use crate::domain::timetable::Timetable;
use crate::domain::types::{Weekday, DAYS_PER_WEEK, SLOTS_PER_DAY};
use std::collections::HashMap;

/// 单个教师一周的占用表 [天][节次-1]
pub type WeekGrid = [[bool; SLOTS_PER_DAY as usize]; DAYS_PER_WEEK];

const EMPTY_WEEK: WeekGrid = [[false; SLOTS_PER_DAY as usize]; DAYS_PER_WEEK];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    grids: HashMap<String, WeekGrid>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 扫描课表的每个已占用节次，为其上的每位教师标记占用
    pub fn from_timetables<'a, I>(timetables: I) -> Self
    where
        I: IntoIterator<Item = &'a Timetable>,
    {
        let mut index = Self::new();
        for timetable in timetables {
            for (day, slot) in timetable.occupied_slots() {
                for teacher_id in slot.teacher_ids() {
                    if !index.occupy(teacher_id, day, slot.slot_number) {
                        tracing::warn!(
                            timetable_id = %timetable.id,
                            teacher_id = teacher_id,
                            day = %day,
                            slot_number = slot.slot_number,
                            "节次编号越界，未计入占用索引"
                        );
                    }
                }
            }
        }
        index
    }

    /// (day, slot_number) 是否已被该教师占用
    ///
    /// 越界节次视为未占用
    pub fn is_occupied(&self, teacher_id: &str, day: Weekday, slot_number: u8) -> bool {
        match (self.grids.get(teacher_id), slot_cell(slot_number)) {
            (Some(grid), Some(cell)) => grid[day.index()][cell],
            _ => false,
        }
    }

    /// 标记占用；节次越界时返回 false 且不做修改
    pub fn occupy(&mut self, teacher_id: &str, day: Weekday, slot_number: u8) -> bool {
        self.set(teacher_id, day, slot_number, true)
    }

    /// 取消占用；节次越界时返回 false 且不做修改
    pub fn release(&mut self, teacher_id: &str, day: Weekday, slot_number: u8) -> bool {
        self.set(teacher_id, day, slot_number, false)
    }

    /// 教师一周的占用表（无记录时为全空）
    pub fn week_of(&self, teacher_id: &str) -> WeekGrid {
        self.grids.get(teacher_id).copied().unwrap_or(EMPTY_WEEK)
    }

    /// 教师已占用的节次总数
    pub fn occupied_count(&self, teacher_id: &str) -> usize {
        self.grids
            .get(teacher_id)
            .map(|grid| grid.iter().flatten().filter(|cell| **cell).count())
            .unwrap_or(0)
    }

    fn set(&mut self, teacher_id: &str, day: Weekday, slot_number: u8, value: bool) -> bool {
        let cell = match slot_cell(slot_number) {
            Some(cell) => cell,
            None => return false,
        };
        let grid = self
            .grids
            .entry(teacher_id.to_string())
            .or_insert(EMPTY_WEEK);
        grid[day.index()][cell] = value;
        true
    }
}

fn slot_cell(slot_number: u8) -> Option<usize> {
    if (1..=SLOTS_PER_DAY).contains(&slot_number) {
        Some(slot_number as usize - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timetable::{DaySchedule, Slot};

    fn timetable_from_json(json: &str) -> Timetable {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_bare_and_expanded_teacher_refs_mark_the_same_teacher() {
        let timetable = timetable_from_json(
            r#"{
                "id": "TT1", "semester": 3, "department": "CSE", "section": "A",
                "schedule": [
                    {"day": "Monday", "slots": [
                        {"slotNumber": 2, "subject": "S1", "teachers": ["T1"]},
                        {"slotNumber": 3, "subject": {"_id": "S2"}, "teachers": [{"_id": "T1", "name": "Ada"}]}
                    ]}
                ]
            }"#,
        );

        let index = OccupancyIndex::from_timetables([&timetable]);
        assert!(index.is_occupied("T1", Weekday::Monday, 2));
        assert!(index.is_occupied("T1", Weekday::Monday, 3));
        assert!(!index.is_occupied("T1", Weekday::Monday, 4));
        assert!(!index.is_occupied("T1", Weekday::Tuesday, 2));
        assert_eq!(index.occupied_count("T1"), 2);
    }

    #[test]
    fn test_occupy_and_release_roundtrip_restores_state() {
        let timetable = Timetable {
            id: "TT1".to_string(),
            semester: 1,
            department: "EEE".to_string(),
            section: "B".to_string(),
            cluster: None,
            schedule: vec![DaySchedule {
                day: Weekday::Friday,
                slots: vec![Slot::new(7, "S1", &["T2".to_string()])],
            }],
            created_at: None,
            updated_at: None,
        };
        let mut index = OccupancyIndex::from_timetables([&timetable]);
        let before = index.clone();

        assert!(index.occupy("T2", Weekday::Friday, 6));
        assert!(index.is_occupied("T2", Weekday::Friday, 6));
        assert!(index.release("T2", Weekday::Friday, 6));
        assert_eq!(index, before);
    }

    #[test]
    fn test_out_of_range_slot_is_ignored() {
        let mut index = OccupancyIndex::new();
        assert!(!index.occupy("T1", Weekday::Monday, 0));
        assert!(!index.occupy("T1", Weekday::Monday, 8));
        assert!(!index.is_occupied("T1", Weekday::Monday, 8));
        assert_eq!(index.occupied_count("T1"), 0);
        assert_eq!(index.week_of("T9"), EMPTY_WEEK);
    }
}
