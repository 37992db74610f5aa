use super::report::{IssueKind, ValidationIssue, ValidationReport};
use crate::domain::timetable::Timetable;
use crate::domain::types::{is_valid_slot_number, SubjectType, Weekday};
use crate::engine::catalog::SchedulingCatalog;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, instrument};

/// 教师在某天的一条占用记录
#[derive(Debug, Clone)]
struct TeacherSlotEntry {
    slot_number: u8,
    subject_type: Option<SubjectType>, // None = 课程无法解析
    label: String,
}

/// teacher_id -> 教学日 -> 占用记录
type TeacherWeekMap = BTreeMap<String, BTreeMap<Weekday, Vec<TeacherSlotEntry>>>;

// ==========================================
// TimetableValidator - 课表校验引擎
// ==========================================
pub struct TimetableValidator {
    // 无状态引擎,不需要注入依赖
}

impl Default for TimetableValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimetableValidator {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 校验候选课表
    ///
    /// # 参数
    /// - `candidate`: 待校验课表（新建/修改/自动生成，不要求已保存）
    /// - `others`: 其他已保存课表；与候选 id 相同者忽略
    /// - `catalog`: 教师与课程目录
    #[instrument(skip_all, fields(timetable = %candidate.label(), others = others.len()))]
    pub fn validate(
        &self,
        candidate: &Timetable,
        others: &[Timetable],
        catalog: &SchedulingCatalog,
    ) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_structure(candidate, &mut errors);
        self.check_references(candidate, catalog, &mut errors);

        let scope: Vec<&Timetable> = others
            .iter()
            .filter(|t| t.id != candidate.id)
            .chain(std::iter::once(candidate))
            .collect();
        let week_map = build_teacher_week_map(&scope, catalog);

        self.check_teacher_rules(&week_map, catalog, &mut errors, &mut warnings);
        self.check_availability(candidate, catalog, &mut errors);
        self.check_credits(candidate, catalog, &mut errors);

        let report = ValidationReport::from_issues(errors, warnings);
        debug!(
            is_valid = report.is_valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "课表校验完成"
        );
        report
    }

    // ==========================================
    // 候选课表: 结构
    // ==========================================

    fn check_structure(&self, candidate: &Timetable, errors: &mut Vec<ValidationIssue>) {
        let mut seen_days = HashSet::new();

        for day in &candidate.schedule {
            if !seen_days.insert(day.day) {
                errors.push(
                    ValidationIssue::new(
                        IssueKind::MalformedSchedule,
                        format!("{}: {} 在课表中重复出现", candidate.label(), day.day),
                    )
                    .on_day(day.day),
                );
            }

            let mut seen_slots = HashSet::new();
            for slot in &day.slots {
                if !is_valid_slot_number(slot.slot_number) {
                    errors.push(
                        ValidationIssue::new(
                            IssueKind::MalformedSchedule,
                            format!(
                                "{}: {} 的节次编号 {} 超出 1-7",
                                candidate.label(),
                                day.day,
                                slot.slot_number
                            ),
                        )
                        .at(day.day, vec![slot.slot_number]),
                    );
                }
                if !seen_slots.insert(slot.slot_number) {
                    errors.push(
                        ValidationIssue::new(
                            IssueKind::MalformedSchedule,
                            format!(
                                "{}: {} 第 {} 节重复出现",
                                candidate.label(),
                                day.day,
                                slot.slot_number
                            ),
                        )
                        .at(day.day, vec![slot.slot_number]),
                    );
                }
                if slot.teachers.is_empty() {
                    errors.push(
                        ValidationIssue::new(
                            IssueKind::MalformedSchedule,
                            format!(
                                "{}: {} 第 {} 节未指定授课教师",
                                candidate.label(),
                                day.day,
                                slot.slot_number
                            ),
                        )
                        .subject(slot.subject_id())
                        .at(day.day, vec![slot.slot_number]),
                    );
                }
            }
        }
    }

    // ==========================================
    // 候选课表: 引用可解析
    // ==========================================

    fn check_references(
        &self,
        candidate: &Timetable,
        catalog: &SchedulingCatalog,
        errors: &mut Vec<ValidationIssue>,
    ) {
        let mut unresolved_teachers = BTreeSet::new();

        for (_, slot) in candidate.occupied_slots() {
            for teacher_id in slot.teacher_ids() {
                if catalog.teacher(teacher_id).is_none() {
                    unresolved_teachers.insert(teacher_id.to_string());
                }
            }
        }

        for teacher_id in unresolved_teachers {
            errors.push(
                ValidationIssue::new(
                    IssueKind::UnresolvedTeacher,
                    format!("{}: 找不到教师 {}", candidate.label(), teacher_id),
                )
                .teacher(&teacher_id),
            );
        }
    }

    // ==========================================
    // 全校范围: 教师维度规则
    // ==========================================

    fn check_teacher_rules(
        &self,
        week_map: &TeacherWeekMap,
        catalog: &SchedulingCatalog,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) {
        for (teacher_id, days) in week_map {
            // 未知教师只在候选课表中报错（见 check_references），此处跳过
            let teacher = match catalog.teacher(teacher_id) {
                Some(teacher) => teacher,
                None => continue,
            };
            let mut workload: u32 = 0;

            for (day, entries) in days {
                let mut entries = entries.clone();
                entries.sort_by_key(|e| e.slot_number);

                // 重复占用: 同一节次出现多条记录
                let mut by_slot: BTreeMap<u8, Vec<&TeacherSlotEntry>> = BTreeMap::new();
                for entry in &entries {
                    by_slot.entry(entry.slot_number).or_default().push(entry);
                }
                for (slot_number, clashing) in &by_slot {
                    if clashing.len() > 1 {
                        let labels: Vec<String> = clashing.iter().map(|e| e.label.clone()).collect();
                        errors.push(
                            ValidationIssue::new(
                                IssueKind::DoubleBooking,
                                format!(
                                    "教师 {} 在 {} 第 {} 节同时排入多个班级: {}",
                                    teacher.name,
                                    day,
                                    slot_number,
                                    labels.join(" 与 ")
                                ),
                            )
                            .teacher(teacher_id)
                            .at(*day, vec![*slot_number])
                            .timetables(labels),
                        );
                    }
                }

                // 连续节次: 理论-理论为错误，理论-实验为警告；类型未知不参与
                for pair in entries.windows(2) {
                    let (current, next) = (&pair[0], &pair[1]);
                    if next.slot_number != current.slot_number + 1 {
                        continue;
                    }
                    let (current_type, next_type) = match (current.subject_type, next.subject_type)
                    {
                        (Some(a), Some(b)) => (a, b),
                        _ => continue,
                    };

                    let detail = format!(
                        "{} (第 {} 节) 与 {} (第 {} 节)",
                        current.label, current.slot_number, next.label, next.slot_number
                    );
                    let slots = vec![current.slot_number, next.slot_number];
                    let labels = vec![current.label.clone(), next.label.clone()];

                    if current_type == SubjectType::Theory && next_type == SubjectType::Theory {
                        errors.push(
                            ValidationIssue::new(
                                IssueKind::ConsecutiveTheory,
                                format!("教师 {} 在 {} 连续上两节理论课: {}", teacher.name, day, detail),
                            )
                            .teacher(teacher_id)
                            .at(*day, slots)
                            .timetables(labels),
                        );
                    } else if current_type != next_type {
                        warnings.push(
                            ValidationIssue::new(
                                IssueKind::TheoryLabAdjacent,
                                format!(
                                    "教师 {} 在 {} 理论课与实验课相邻: {}",
                                    teacher.name, day, detail
                                ),
                            )
                            .teacher(teacher_id)
                            .at(*day, slots)
                            .timetables(labels),
                        );
                    }
                }

                workload += entries.len() as u32;
            }

            if workload > teacher.max_workload {
                errors.push(
                    ValidationIssue::new(
                        IssueKind::WorkloadExceeded,
                        format!(
                            "教师 {} 全校合计 {} 节，超过工作量上限 {}",
                            teacher.name, workload, teacher.max_workload
                        ),
                    )
                    .teacher(teacher_id),
                );
            }
        }
    }

    // ==========================================
    // 候选课表: 教师可排日
    // ==========================================

    fn check_availability(
        &self,
        candidate: &Timetable,
        catalog: &SchedulingCatalog,
        errors: &mut Vec<ValidationIssue>,
    ) {
        for (day, slot) in candidate.occupied_slots() {
            for teacher_id in slot.teacher_ids() {
                let teacher = match catalog.teacher(teacher_id) {
                    Some(teacher) => teacher,
                    None => continue,
                };
                if !teacher.is_available(day) {
                    errors.push(
                        ValidationIssue::new(
                            IssueKind::TeacherUnavailable,
                            format!(
                                "教师 {} 在 {} 不可排课，但被安排在第 {} 节",
                                teacher.name, day, slot.slot_number
                            ),
                        )
                        .teacher(teacher_id)
                        .subject(slot.subject_id())
                        .at(day, vec![slot.slot_number]),
                    );
                }
            }
        }
    }

    // ==========================================
    // 候选课表: 课程节次数 = credits
    // ==========================================

    fn check_credits(
        &self,
        candidate: &Timetable,
        catalog: &SchedulingCatalog,
        errors: &mut Vec<ValidationIssue>,
    ) {
        for (subject_id, count) in candidate.slot_count_by_subject() {
            match catalog.subject(&subject_id) {
                None => errors.push(
                    ValidationIssue::new(
                        IssueKind::UnresolvedSubject,
                        format!("{}: 找不到课程 {}", candidate.label(), subject_id),
                    )
                    .subject(&subject_id),
                ),
                Some(subject) if subject.credits != count => errors.push(
                    ValidationIssue::new(
                        IssueKind::CreditMismatch,
                        format!(
                            "课程 {} 排了 {} 节，但 credits 要求 {} 节",
                            subject.name, count, subject.credits
                        ),
                    )
                    .subject(&subject_id),
                ),
                Some(_) => {}
            }
        }
    }
}

/// 汇总范围内每位教师每天的占用记录
fn build_teacher_week_map(scope: &[&Timetable], catalog: &SchedulingCatalog) -> TeacherWeekMap {
    let mut map: TeacherWeekMap = BTreeMap::new();

    for timetable in scope {
        let label = timetable.label();
        for (day, slot) in timetable.occupied_slots() {
            let subject_type = catalog.subject(slot.subject_id()).map(|s| s.subject_type);

            // 同一节次里重复列出的教师只计一次
            let mut listed = HashSet::new();
            for teacher_id in slot.teacher_ids() {
                if !listed.insert(teacher_id) {
                    continue;
                }
                map.entry(teacher_id.to_string())
                    .or_default()
                    .entry(day)
                    .or_default()
                    .push(TeacherSlotEntry {
                        slot_number: slot.slot_number,
                        subject_type,
                        label: label.clone(),
                    });
            }
        }
    }

    map
}
