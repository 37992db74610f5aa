use super::*;
use crate::domain::teacher::WeeklyAvailability;
use crate::domain::types::{SubjectType, TeacherRank, LAB_SLOT_PAIRS};
use std::collections::HashMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn teacher(id: &str, days: &[Weekday]) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: format!("Teacher {}", id),
        rank: TeacherRank::Associate,
        department: "CSE".to_string(),
        max_workload: 30,
        current_workload: 0,
        availability: if days.is_empty() {
            WeeklyAvailability::all_days()
        } else {
            WeeklyAvailability::only(days)
        },
    }
}

fn subject(id: &str, credits: u32, subject_type: SubjectType, eligible: &[&str]) -> Subject {
    Subject {
        id: id.to_string(),
        name: format!("Subject {}", id),
        code: format!("CS{}", id),
        credits,
        subject_type,
        semester: 3,
        department: "CSE".to_string(),
        teacher_ids: eligible.iter().map(|s| s.to_string()).collect(),
    }
}

fn request(selections: Vec<SubjectSelection>) -> GenerationRequest {
    GenerationRequest {
        semester: 3,
        department: "CSE".to_string(),
        section: "A".to_string(),
        cluster: None,
        selections,
    }
}

fn other_timetable(id: &str, section: &str, slots: &[(Weekday, u8, &str, &str)]) -> Timetable {
    let mut schedule: Vec<DaySchedule> = crate::domain::timetable::empty_week();
    for (day, slot, subject_id, teacher_id) in slots {
        schedule[day.index()]
            .slots
            .push(Slot::new(*slot, subject_id, &[teacher_id.to_string()]));
    }
    Timetable {
        id: id.to_string(),
        semester: 3,
        department: "CSE".to_string(),
        section: section.to_string(),
        cluster: None,
        schedule,
        created_at: None,
        updated_at: None,
    }
}

fn positions_of(schedule: &[DaySchedule], subject_id: &str) -> Vec<(Weekday, u8)> {
    schedule
        .iter()
        .flat_map(|day| {
            day.slots
                .iter()
                .filter(move |s| s.subject_id() == subject_id)
                .map(move |s| (day.day, s.slot_number))
        })
        .collect()
}

/// 断言: 无教师在同一 (天, 节) 出现两次（本课表内部及与其他课表之间）
fn assert_no_teacher_double_booking(schedule: &[DaySchedule], others: &[Timetable]) {
    let mut seen: HashMap<(String, Weekday, u8), usize> = HashMap::new();
    let all_days = others
        .iter()
        .flat_map(|t| t.schedule.iter())
        .chain(schedule.iter());
    for day in all_days {
        for slot in &day.slots {
            for teacher_id in slot.teacher_ids() {
                *seen
                    .entry((teacher_id.to_string(), day.day, slot.slot_number))
                    .or_insert(0) += 1;
            }
        }
    }
    for (key, count) in seen {
        assert_eq!(count, 1, "教师重复占用: {:?}", key);
    }
}

/// 断言: 实验课节次两两组成合法连排，且教师一致
fn assert_lab_pairs(schedule: &[DaySchedule], subject_id: &str) {
    for day in schedule {
        let slots: Vec<&Slot> = day
            .slots
            .iter()
            .filter(|s| s.subject_id() == subject_id)
            .collect();
        assert_eq!(slots.len() % 2, 0, "{} 的实验课节次不成对", day.day);
        for pair in slots.chunks(2) {
            let key = (pair[0].slot_number, pair[1].slot_number);
            assert!(LAB_SLOT_PAIRS.contains(&key), "非法连排 {:?}", key);
            assert_eq!(pair[0].teachers, pair[1].teachers);
        }
    }
}

// ==========================================
// 基本场景
// ==========================================

#[test]
fn test_single_theory_subject_fills_exactly_its_credits() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("S1", 3, SubjectType::Theory, &["T1"])],
    );
    let generator = TimetableGenerator::default();

    let result = generator
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &catalog,
            &[],
        )
        .unwrap();

    assert_eq!(result.schedule.len(), 5);
    // 节次优先: 第 1 节的周一、周二、周三
    assert_eq!(
        positions_of(&result.schedule, "S1"),
        vec![
            (Weekday::Monday, 1),
            (Weekday::Tuesday, 1),
            (Weekday::Wednesday, 1)
        ]
    );
    assert_eq!(result.stats.backtracks, 0);
}

#[test]
fn test_lab_is_placed_as_a_valid_pair() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("L1", 4, SubjectType::Lab, &["T1"])],
    );

    let result = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("L1", &["T1"])]),
            &catalog,
            &[],
        )
        .unwrap();

    assert_eq!(positions_of(&result.schedule, "L1").len(), 4);
    assert_lab_pairs(&result.schedule, "L1");
    assert_eq!(
        positions_of(&result.schedule, "L1")[..2],
        [(Weekday::Monday, 1), (Weekday::Monday, 2)]
    );
}

#[test]
fn test_existing_occupancy_is_avoided() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("S1", 1, SubjectType::Theory, &["T1"])],
    );
    let others = vec![other_timetable("TT-B", "B", &[(Weekday::Monday, 1, "S1", "T1")])];

    let result = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &catalog,
            &others,
        )
        .unwrap();

    assert_eq!(
        positions_of(&result.schedule, "S1"),
        vec![(Weekday::Tuesday, 1)]
    );
    assert_no_teacher_double_booking(&result.schedule, &others);
}

#[test]
fn test_availability_restricts_days() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[Weekday::Wednesday])],
        vec![subject("S1", 3, SubjectType::Theory, &["T1"])],
    );

    let result = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &catalog,
            &[],
        )
        .unwrap();

    let positions = positions_of(&result.schedule, "S1");
    assert_eq!(positions.len(), 3);
    assert!(positions.iter().all(|(day, _)| *day == Weekday::Wednesday));
}

#[test]
fn test_backtracking_moves_earlier_subject() {
    // L1 先排（credits 高），首选周一 1-2 节；
    // S1 的教师只在周一可排且周一 3-7 节已被其他班占用，只能用周一 1 或 2 节
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[]), teacher("T2", &[Weekday::Monday])],
        vec![
            subject("L1", 2, SubjectType::Lab, &["T1"]),
            subject("S1", 1, SubjectType::Theory, &["T2"]),
        ],
    );
    let busy: Vec<(Weekday, u8, &str, &str)> =
        (3..=7).map(|slot| (Weekday::Monday, slot, "S1", "T2")).collect();
    let others = vec![other_timetable("TT-B", "B", &busy)];

    let result = TimetableGenerator::default()
        .generate(
            &request(vec![
                SubjectSelection::new("S1", &["T2"]),
                SubjectSelection::new("L1", &["T1"]),
            ]),
            &catalog,
            &others,
        )
        .unwrap();

    assert_eq!(
        positions_of(&result.schedule, "L1"),
        vec![(Weekday::Tuesday, 1), (Weekday::Tuesday, 2)]
    );
    assert_eq!(
        positions_of(&result.schedule, "S1"),
        vec![(Weekday::Monday, 1)]
    );
    assert!(result.stats.backtracks >= 1);
    assert_no_teacher_double_booking(&result.schedule, &others);
}

#[test]
fn test_shared_teacher_across_subjects_is_never_double_booked() {
    let catalog = SchedulingCatalog::new(
        vec![
            teacher("T1", &[]),
            teacher("T2", &[Weekday::Monday, Weekday::Tuesday, Weekday::Thursday]),
            teacher("T3", &[]),
        ],
        vec![
            subject("S1", 4, SubjectType::Theory, &["T1", "T2"]),
            subject("S2", 3, SubjectType::Theory, &["T1"]),
            subject("L1", 4, SubjectType::Lab, &["T2", "T3"]),
            subject("L2", 2, SubjectType::Lab, &["T1"]),
            subject("S3", 5, SubjectType::Theory, &["T3"]),
        ],
    );
    let others = vec![other_timetable(
        "TT-B",
        "B",
        &[
            (Weekday::Monday, 1, "S1", "T1"),
            (Weekday::Tuesday, 3, "S1", "T2"),
            (Weekday::Friday, 5, "S1", "T3"),
        ],
    )];

    let result = TimetableGenerator::default()
        .generate(
            &request(vec![
                SubjectSelection::new("S1", &["T1", "T2"]),
                SubjectSelection::new("S2", &["T1"]),
                SubjectSelection::new("L1", &["T2", "T3"]),
                SubjectSelection::new("L2", &["T1"]),
                SubjectSelection::new("S3", &["T3"]),
            ]),
            &catalog,
            &others,
        )
        .unwrap();

    for (id, credits) in [("S1", 4), ("S2", 3), ("L1", 4), ("L2", 2), ("S3", 5)] {
        assert_eq!(positions_of(&result.schedule, id).len(), credits, "{}", id);
    }
    assert_lab_pairs(&result.schedule, "L1");
    assert_lab_pairs(&result.schedule, "L2");
    assert_no_teacher_double_booking(&result.schedule, &others);

    // T2 只在周一/周二/周四授课
    for day in &result.schedule {
        for slot in &day.slots {
            if slot.has_teacher("T2") {
                assert!(matches!(
                    day.day,
                    Weekday::Monday | Weekday::Tuesday | Weekday::Thursday
                ));
            }
        }
    }
}

// ==========================================
// 不可行与非法输入
// ==========================================

#[test]
fn test_too_many_credits_for_available_days_is_infeasible() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[Weekday::Monday])],
        vec![subject("S1", 8, SubjectType::Theory, &["T1"])],
    );

    let err = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &catalog,
            &[],
        )
        .unwrap_err();

    assert!(err.is_infeasibility());
    assert!(matches!(err, GeneratorError::Infeasible { ref reason } if reason.contains("Subject S1")));
}

#[test]
fn test_odd_lab_credits_are_rejected_up_front() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("L1", 3, SubjectType::Lab, &["T1"])],
    );

    let err = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("L1", &["T1"])]),
            &catalog,
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, GeneratorError::Infeasible { .. }));
}

#[test]
fn test_empty_or_ineligible_teacher_subset_is_infeasible() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[]), teacher("T2", &[])],
        vec![subject("S1", 2, SubjectType::Theory, &["T1"])],
    );
    let generator = TimetableGenerator::default();

    let empty = generator
        .generate(&request(vec![SubjectSelection::new("S1", &[])]), &catalog, &[])
        .unwrap_err();
    assert!(matches!(empty, GeneratorError::Infeasible { .. }));

    let ineligible = generator
        .generate(&request(vec![SubjectSelection::new("S1", &["T2"])]), &catalog, &[])
        .unwrap_err();
    assert!(matches!(ineligible, GeneratorError::Infeasible { .. }));

    let unknown = generator
        .generate(&request(vec![SubjectSelection::new("S1", &["T9"])]), &catalog, &[])
        .unwrap_err();
    assert!(matches!(unknown, GeneratorError::Infeasible { .. }));
}

#[test]
fn test_unknown_or_duplicate_subject_is_invalid_request() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("S1", 2, SubjectType::Theory, &["T1"])],
    );
    let generator = TimetableGenerator::default();

    let unknown = generator
        .generate(&request(vec![SubjectSelection::new("S9", &["T1"])]), &catalog, &[])
        .unwrap_err();
    assert!(matches!(unknown, GeneratorError::InvalidRequest(_)));

    let duplicate = generator
        .generate(
            &request(vec![
                SubjectSelection::new("S1", &["T1"]),
                SubjectSelection::new("S1", &["T1"]),
            ]),
            &catalog,
            &[],
        )
        .unwrap_err();
    assert!(matches!(duplicate, GeneratorError::InvalidRequest(_)));

    let nothing = generator.generate(&request(vec![]), &catalog, &[]).unwrap_err();
    assert!(matches!(nothing, GeneratorError::InvalidRequest(_)));
}

#[test]
fn test_node_budget_exhaustion_is_reported() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("S1", 3, SubjectType::Theory, &["T1"])],
    );
    let generator = TimetableGenerator::new(GeneratorConfig {
        max_search_nodes: 2,
        ..GeneratorConfig::default()
    });

    let err = generator
        .generate(&request(vec![SubjectSelection::new("S1", &["T1"])]), &catalog, &[])
        .unwrap_err();

    assert!(err.is_infeasibility());
    assert!(matches!(
        err,
        GeneratorError::SearchBudgetExhausted { nodes_visited: 3, .. }
    ));
}

// ==========================================
// 候选位置策略
// ==========================================

#[test]
fn test_best_score_prefers_late_lab_slots() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[])],
        vec![subject("L1", 2, SubjectType::Lab, &["T1"])],
    );
    let req = request(vec![SubjectSelection::new("L1", &["T1"])]);

    let first_fit = TimetableGenerator::default()
        .generate(&req, &catalog, &[])
        .unwrap();
    assert_eq!(
        positions_of(&first_fit.schedule, "L1"),
        vec![(Weekday::Monday, 1), (Weekday::Monday, 2)]
    );

    let best_score = TimetableGenerator::new(GeneratorConfig {
        strategy: PositionStrategy::BestScore,
        ..GeneratorConfig::default()
    })
    .generate(&req, &catalog, &[])
    .unwrap();
    assert_eq!(
        positions_of(&best_score.schedule, "L1"),
        vec![(Weekday::Monday, 5), (Weekday::Monday, 6)]
    );
    assert!(best_score.soft_score > first_fit.soft_score);
}

#[test]
fn test_generation_is_deterministic() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[]), teacher("T2", &[])],
        vec![
            subject("S1", 3, SubjectType::Theory, &["T1"]),
            subject("L1", 2, SubjectType::Lab, &["T2"]),
        ],
    );
    let req = request(vec![
        SubjectSelection::new("S1", &["T1"]),
        SubjectSelection::new("L1", &["T2"]),
    ]);
    let generator = TimetableGenerator::default();

    let a = generator.generate(&req, &catalog, &[]).unwrap();
    let b = generator.generate(&req, &catalog, &[]).unwrap();
    assert_eq!(a.schedule, b.schedule);
    assert_eq!(a.soft_score, b.soft_score);
}

#[test]
fn test_selection_accepts_alias_field_names() {
    let json = r#"{
        "semester": 3, "department": "CSE", "section": "A",
        "selectedSubjects": [{"subject": "S1", "teachers": ["T1"]}]
    }"#;
    let req: GenerationRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.selections, vec![SubjectSelection::new("S1", &["T1"])]);
}

#[test]
fn test_post_check_flags_credit_mismatch_as_internal_fault() {
    crate::logging::init_test();

    let t1 = teacher("T1", &[]);
    let s1 = subject("S1", 2, SubjectType::Theory, &["T1"]);
    let units = vec![PlacementUnit {
        subject: &s1,
        teachers: vec![&t1],
        teacher_ids: vec!["T1".to_string()],
    }];

    // 结果中只有 1 节，计数器却声称 2 节
    let mut schedule = crate::domain::timetable::empty_week();
    schedule[0]
        .slots
        .push(Slot::new(1, "S1", &["T1".to_string()]));

    let err = verify_credit_counts(&units, &schedule, &[2]).unwrap_err();
    assert!(!err.is_infeasibility());
    match err {
        GeneratorError::InternalConsistency(message) => assert!(message.contains("S1")),
        other => panic!("Expected InternalConsistency, got {:?}", other),
    }
}

#[test]
fn test_teacher_overcommitted_across_subjects_fails_before_search() {
    // 单科均可排下，但同一教师合计 30 节 > 4 天 × 7 节
    let ids = ["S1", "S2", "S3", "S4", "S5", "S6"];
    let catalog = SchedulingCatalog::new(
        vec![teacher(
            "T1",
            &[Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday, Weekday::Thursday],
        )],
        ids.iter()
            .map(|id| subject(id, 5, SubjectType::Theory, &["T1"]))
            .collect(),
    );
    let generator = TimetableGenerator::new(GeneratorConfig {
        max_search_nodes: 50,
        ..GeneratorConfig::default()
    });

    let err = generator
        .generate(
            &request(ids.iter().map(|id| SubjectSelection::new(id, &["T1"])).collect()),
            &catalog,
            &[],
        )
        .unwrap_err();

    match err {
        GeneratorError::Infeasible { reason } => {
            assert!(reason.contains("Teacher T1"));
            assert!(reason.contains("30"));
            assert!(reason.contains("28"));
        }
        other => panic!("Expected Infeasible, got {:?}", other),
    }
}

#[test]
fn test_capacity_counts_only_free_slots_on_available_days() {
    let catalog = SchedulingCatalog::new(
        vec![teacher("T1", &[Weekday::Monday])],
        vec![subject("S1", 6, SubjectType::Theory, &["T1"])],
    );
    // 周一已被占 2 节，周二的占用不影响（本就不可排）
    let busy = other_timetable(
        "TT-X",
        "X",
        &[
            (Weekday::Monday, 1, "S1", "T1"),
            (Weekday::Monday, 2, "S1", "T1"),
            (Weekday::Tuesday, 1, "S1", "T1"),
        ],
    );

    let err = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &catalog,
            &[busy.clone()],
        )
        .unwrap_err();
    assert!(matches!(err, GeneratorError::Infeasible { ref reason } if reason.contains("5")));

    let relaxed = SchedulingCatalog::new(
        vec![teacher("T1", &[Weekday::Monday])],
        vec![subject("S1", 5, SubjectType::Theory, &["T1"])],
    );
    let generated = TimetableGenerator::default()
        .generate(
            &request(vec![SubjectSelection::new("S1", &["T1"])]),
            &relaxed,
            &[busy],
        )
        .unwrap();
    assert_eq!(positions_of(&generated.schedule, "S1").len(), 5);
}
