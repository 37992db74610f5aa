// ==========================================
// TeacherApi / SubjectApi 集成测试
// ==========================================
// 测试目标: 教师与课程的增删改查，以及与已保存课表的联动约束
// ==========================================


use timetable_scheduler::api::ApiError;
use timetable_scheduler::domain::{SubjectType, Weekday};
use test_helpers::{
    add_subject, add_teacher, section_draft, setup_app, subject_draft, teacher_draft,
};

const ACTOR: &str = "tester";

// ==========================================
// 课程
// ==========================================

#[test]
fn test_subject_list_update_and_semester_filter() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;
    let t2 = add_teacher(&state, "Grace", 20).id;
    let compilers = add_subject(&state, "Compilers", 3, SubjectType::Theory, &[&t1]).id;

    let mut later = subject_draft("Robotics", 2, SubjectType::Lab, &[&t2]);
    later.semester = 5;
    state.subject_api.create_subject(later).unwrap();

    assert_eq!(state.subject_api.list_subjects().unwrap().len(), 2);
    let third = state.subject_api.list_subjects_by_semester(3).unwrap();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].id, compilers);

    // 授课资格整体替换，重复 id 去重
    let updated = state
        .subject_api
        .update_subject(
            &compilers,
            subject_draft("Compilers II", 4, SubjectType::Theory, &[&t2, &t1, &t2]),
        )
        .unwrap();
    assert_eq!(updated.teacher_ids, vec![t2.clone(), t1.clone()]);

    let reloaded = state.subject_api.get_subject(&compilers).unwrap();
    assert_eq!(reloaded.name, "Compilers II");
    assert_eq!(reloaded.credits, 4);
    assert_eq!(reloaded.teacher_ids.len(), 2);
}

#[test]
fn test_subject_credits_outside_week_are_rejected() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;

    for credits in [0, 36] {
        let err = state
            .subject_api
            .create_subject(subject_draft("Overload", credits, SubjectType::Theory, &[&t1]))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)), "credits={}", credits);
    }

    // 上限本身合法
    assert!(state
        .subject_api
        .create_subject(subject_draft("Full Week", 35, SubjectType::Theory, &[&t1]))
        .is_ok());

    let existing = add_subject(&state, "Compilers", 3, SubjectType::Theory, &[&t1]).id;
    let err = state
        .subject_api
        .update_subject(&existing, subject_draft("Compilers", 0, SubjectType::Theory, &[&t1]))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert_eq!(state.subject_api.get_subject(&existing).unwrap().credits, 3);
}

#[test]
fn test_subject_with_unknown_teacher_is_rejected() {
    let (_temp_file, state) = setup_app();

    let err = state
        .subject_api
        .create_subject(subject_draft("Compilers", 3, SubjectType::Theory, &["ghost"]))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_subject_used_by_timetable_cannot_be_deleted() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;
    let networks = add_subject(&state, "Networks", 1, SubjectType::Theory, &[&t1]).id;
    let unused = add_subject(&state, "Ethics", 1, SubjectType::Theory, &[&t1]).id;

    state
        .timetable_api
        .create_timetable(
            section_draft("A", &[(Weekday::Monday, 1, &networks, &t1)]),
            ACTOR,
        )
        .unwrap();

    let err = state.subject_api.delete_subject(&networks).unwrap_err();
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert!(state.subject_api.get_subject(&networks).is_ok());

    state.subject_api.delete_subject(&unused).unwrap();
    assert!(matches!(
        state.subject_api.get_subject(&unused),
        Err(ApiError::NotFound(_))
    ));
}

// ==========================================
// 教师
// ==========================================

#[test]
fn test_update_teacher_keeps_current_workload() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;
    let networks = add_subject(&state, "Networks", 1, SubjectType::Theory, &[&t1]).id;

    state
        .timetable_api
        .create_timetable(
            section_draft(
                "A",
                &[(Weekday::Monday, 1, &networks, &t1)],
            ),
            ACTOR,
        )
        .unwrap();
    assert_eq!(state.teacher_api.get_teacher(&t1).unwrap().current_workload, 1);

    let updated = state
        .teacher_api
        .update_teacher(&t1, teacher_draft("Ada Lovelace", 12, &[Weekday::Monday]))
        .unwrap();
    assert_eq!(updated.current_workload, 1);

    let reloaded = state.teacher_api.get_teacher(&t1).unwrap();
    assert_eq!(reloaded.name, "Ada Lovelace");
    assert_eq!(reloaded.max_workload, 12);
    assert!(!reloaded.is_available(Weekday::Tuesday));
    assert_eq!(reloaded.current_workload, 1);
}

#[test]
fn test_update_teacher_validates_input() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;

    let err = state
        .teacher_api
        .update_teacher(&t1, teacher_draft("  ", 20, &[]))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = state
        .teacher_api
        .update_teacher("missing", teacher_draft("Ghost", 20, &[]))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_unreferenced_teacher_can_be_deleted() {
    let (_temp_file, state) = setup_app();
    let t1 = add_teacher(&state, "Ada", 20).id;
    // 仅有授课资格、未被课表引用
    add_subject(&state, "Networks", 1, SubjectType::Theory, &[&t1]);

    state.teacher_api.delete_teacher(&t1).unwrap();
    assert!(state.teacher_api.list_teachers().unwrap().is_empty());
}
