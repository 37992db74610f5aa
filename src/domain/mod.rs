// ==========================================
// 院系课表排课系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod subject;
pub mod teacher;
pub mod timetable;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use subject::{Subject, SubjectDraft};
pub use teacher::{Teacher, TeacherDraft, WeeklyAvailability};
pub use timetable::{
    empty_week, normalize_schedule, timetable_label, DaySchedule, EntityRef, RefRecord, Slot,
    TeacherSlotView, Timetable, TimetableDraft, TimetableUpdate,
};
pub use types::{
    is_valid_slot_number, lab_pair_for_start, PositionStrategy, SubjectType, TeacherRank, Weekday,
    DAYS_PER_WEEK, LAB_SLOT_PAIRS, POSITIONS_PER_WEEK, SLOTS_PER_DAY,
};
