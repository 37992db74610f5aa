// ==========================================
// 院系课表排课系统 - 教师工作量重算
// ==========================================
// 职责: 由全部已保存课表全量重算每位教师的 current_workload
// 红线: 全量重算，不做增量；连续两次结果相同
// 红线: 单个教师写入失败只记录，不中断其余教师
// ==========================================

use crate::domain::teacher::Teacher;
use crate::domain::timetable::Timetable;
use crate::repository::error::RepositoryResult;
use crate::repository::{TeacherRepository, TimetableRepository};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

// ==========================================
// TeacherWorkloadWriter - 工作量写入接口
// ==========================================
pub trait TeacherWorkloadWriter: Send + Sync {
    fn write_workload(&self, teacher_id: &str, workload: u32) -> RepositoryResult<()>;
}

impl TeacherWorkloadWriter for TeacherRepository {
    fn write_workload(&self, teacher_id: &str, workload: u32) -> RepositoryResult<()> {
        self.update_current_workload(teacher_id, workload)
    }
}

/// 单个教师的写入失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadWriteFailure {
    pub teacher_id: String,
    pub message: String,
}

/// 重算报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRecomputeReport {
    pub updated: BTreeMap<String, u32>,     // teacher_id -> 新的 current_workload
    pub orphaned_teacher_ids: Vec<String>,  // 课表引用但教师库中不存在
    pub failures: Vec<WorkloadWriteFailure>,
}

impl WorkloadRecomputeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 统计每位教师在全部课表中的 (节次, 教师) 对数
///
/// 返回值包含 `teachers` 中的每一位教师（无课为 0），
/// 以及课表中引用到的未知教师。
pub fn compute_workloads(
    teachers: &[Teacher],
    timetables: &[Timetable],
    exclude_timetable_id: Option<&str>,
) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> =
        teachers.iter().map(|t| (t.id.clone(), 0)).collect();

    for timetable in timetables {
        if Some(timetable.id.as_str()) == exclude_timetable_id {
            continue;
        }
        for (_, slot) in timetable.occupied_slots() {
            // 同一节次重复列出的教师只计一次
            let distinct: HashSet<&str> = slot.teacher_ids().collect();
            for teacher_id in distinct {
                *counts.entry(teacher_id.to_string()).or_insert(0) += 1;
            }
        }
    }

    counts
}

// ==========================================
// WorkloadRecomputer - 工作量重算器
// ==========================================
pub struct WorkloadRecomputer {
    teacher_repo: Arc<TeacherRepository>,
    timetable_repo: Arc<TimetableRepository>,
}

impl WorkloadRecomputer {
    pub fn new(
        teacher_repo: Arc<TeacherRepository>,
        timetable_repo: Arc<TimetableRepository>,
    ) -> Self {
        Self {
            teacher_repo,
            timetable_repo,
        }
    }

    /// 读取当前已保存的教师与课表后全量重算
    ///
    /// # 参数
    /// - `exclude_timetable_id`: 正在删除的课表（不计入）
    ///
    /// # 返回
    /// - `Err`: 读取教师或课表失败（无法确定结果）
    pub fn recompute(
        &self,
        exclude_timetable_id: Option<&str>,
    ) -> RepositoryResult<WorkloadRecomputeReport> {
        let teachers = self.teacher_repo.list_all()?;
        let timetables = self.timetable_repo.list_all()?;
        Ok(recompute_with(
            &teachers,
            &timetables,
            exclude_timetable_id,
            self.teacher_repo.as_ref(),
        ))
    }
}

/// 以给定快照重算并写回
#[instrument(skip_all, fields(teachers = teachers.len(), timetables = timetables.len(), exclude = ?exclude_timetable_id))]
pub fn recompute_with(
    teachers: &[Teacher],
    timetables: &[Timetable],
    exclude_timetable_id: Option<&str>,
    writer: &dyn TeacherWorkloadWriter,
) -> WorkloadRecomputeReport {
    let counts = compute_workloads(teachers, timetables, exclude_timetable_id);
    let known: BTreeSet<&str> = teachers.iter().map(|t| t.id.as_str()).collect();

    let mut report = WorkloadRecomputeReport::default();

    for (teacher_id, workload) in counts {
        if !known.contains(teacher_id.as_str()) {
            warn!(teacher_id = %teacher_id, slots = workload, "课表引用了不存在的教师");
            report.orphaned_teacher_ids.push(teacher_id);
            continue;
        }

        match writer.write_workload(&teacher_id, workload) {
            Ok(()) => {
                report.updated.insert(teacher_id, workload);
            }
            Err(e) => {
                error!(teacher_id = %teacher_id, error = %e, "教师工作量写入失败");
                report.failures.push(WorkloadWriteFailure {
                    teacher_id,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        updated = report.updated.len(),
        orphaned = report.orphaned_teacher_ids.len(),
        failures = report.failures.len(),
        "教师工作量重算完成"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::teacher::WeeklyAvailability;
    use crate::domain::timetable::{empty_week, Slot};
    use crate::domain::types::{TeacherRank, Weekday};
    use crate::repository::error::RepositoryError;
    use std::sync::Mutex;

    fn teacher(id: &str) -> Teacher {
        Teacher {
            id: id.to_string(),
            name: format!("Teacher {}", id),
            rank: TeacherRank::Assistant,
            department: "ECE".to_string(),
            max_workload: 20,
            current_workload: 0,
            availability: WeeklyAvailability::all_days(),
        }
    }

    fn timetable(id: &str, slots: &[(Weekday, u8, &[&str])]) -> Timetable {
        let mut schedule = empty_week();
        for (day, slot, teachers) in slots {
            let ids: Vec<String> = teachers.iter().map(|s| s.to_string()).collect();
            schedule[day.index()].slots.push(Slot::new(*slot, "S1", &ids));
        }
        Timetable {
            id: id.to_string(),
            semester: 1,
            department: "ECE".to_string(),
            section: id.to_string(),
            cluster: None,
            schedule,
            created_at: None,
            updated_at: None,
        }
    }

    /// 记录写入；指定教师写入失败
    #[derive(Default)]
    struct RecordingWriter {
        written: Mutex<BTreeMap<String, u32>>,
        failing: Option<String>,
    }

    impl TeacherWorkloadWriter for RecordingWriter {
        fn write_workload(&self, teacher_id: &str, workload: u32) -> RepositoryResult<()> {
            if self.failing.as_deref() == Some(teacher_id) {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            self.written
                .lock()
                .unwrap()
                .insert(teacher_id.to_string(), workload);
            Ok(())
        }
    }

    #[test]
    fn test_counts_slot_teacher_pairs_and_zero_for_idle() {
        let teachers = vec![teacher("T1"), teacher("T2"), teacher("T3")];
        let timetables = vec![
            timetable("A", &[(Weekday::Monday, 1, &["T1", "T2"]), (Weekday::Monday, 2, &["T1"])]),
            timetable("B", &[(Weekday::Friday, 7, &["T1"])]),
        ];

        let counts = compute_workloads(&teachers, &timetables, None);

        assert_eq!(counts.get("T1"), Some(&3));
        assert_eq!(counts.get("T2"), Some(&1));
        assert_eq!(counts.get("T3"), Some(&0));
    }

    #[test]
    fn test_excluded_timetable_is_not_counted() {
        let teachers = vec![teacher("T1")];
        let timetables = vec![
            timetable("A", &[(Weekday::Monday, 1, &["T1"])]),
            timetable("B", &[(Weekday::Tuesday, 1, &["T1"]), (Weekday::Tuesday, 3, &["T1"])]),
        ];

        let counts = compute_workloads(&teachers, &timetables, Some("B"));
        assert_eq!(counts.get("T1"), Some(&1));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let teachers = vec![teacher("T1"), teacher("T2")];
        let timetables = vec![timetable("A", &[(Weekday::Monday, 1, &["T1", "T2"])])];
        let writer = RecordingWriter::default();

        let first = recompute_with(&teachers, &timetables, None, &writer);
        let second = recompute_with(&teachers, &timetables, None, &writer);

        assert_eq!(first, second);
        assert!(first.is_complete());
        assert_eq!(writer.written.lock().unwrap().get("T2"), Some(&1));
    }

    #[test]
    fn test_single_failure_does_not_abort_others() {
        let teachers = vec![teacher("T1"), teacher("T2"), teacher("T3")];
        let timetables = vec![timetable("A", &[(Weekday::Monday, 1, &["T1", "T2", "T3"])])];
        let writer = RecordingWriter {
            failing: Some("T2".to_string()),
            ..Default::default()
        };

        let report = recompute_with(&teachers, &timetables, None, &writer);

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].teacher_id, "T2");
        assert_eq!(report.updated.len(), 2);
        let written = writer.written.lock().unwrap();
        assert_eq!(written.get("T1"), Some(&1));
        assert_eq!(written.get("T3"), Some(&1));
    }

    #[test]
    fn test_unknown_teacher_is_reported_as_orphan() {
        let teachers = vec![teacher("T1")];
        let timetables = vec![timetable("A", &[(Weekday::Monday, 1, &["T1", "GONE"])])];
        let writer = RecordingWriter::default();

        let report = recompute_with(&teachers, &timetables, None, &writer);

        assert_eq!(report.orphaned_teacher_ids, vec!["GONE".to_string()]);
        assert!(!writer.written.lock().unwrap().contains_key("GONE"));
    }
}
