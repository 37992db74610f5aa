// Dev utility: reset a database and seed a small demo institution, then
// auto-generate one timetable per section through the regular commit path.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path]

use std::error::Error;
use std::fs;
use std::path::Path;

use timetable_scheduler::app::{get_default_db_path, AppState};
use timetable_scheduler::domain::{
    SubjectDraft, SubjectType, TeacherDraft, TeacherRank, WeeklyAvailability, Weekday,
};
use timetable_scheduler::engine::{GenerationRequest, SubjectSelection};
use timetable_scheduler::logging;

const ACTOR: &str = "seed_demo_db";
const SEMESTER: i32 = 3;
const DEPARTMENT: &str = "CSE";
const SECTIONS: [&str; 3] = ["A", "B", "C"];

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;

    // ===== 教师 =====
    // 每个班级由一对教师承担（下标 2i 与 2i+1），各教一门理论课
    let teacher_specs: [(&str, TeacherRank, &[Weekday]); 6] = [
        ("Ada Lovelace", TeacherRank::Senior, &[]),
        ("Alan Turing", TeacherRank::Senior, &[]),
        ("Grace Hopper", TeacherRank::Associate, &[]),
        ("Edsger Dijkstra", TeacherRank::Associate, &[Weekday::Monday, Weekday::Tuesday, Weekday::Friday]),
        ("Barbara Liskov", TeacherRank::Assistant, &[]),
        ("Donald Knuth", TeacherRank::Assistant, &[Weekday::Monday, Weekday::Tuesday, Weekday::Thursday, Weekday::Friday]),
    ];
    let mut teacher_ids = Vec::new();
    for (name, rank, days) in teacher_specs {
        let teacher = state.teacher_api.create_teacher(TeacherDraft {
            name: name.to_string(),
            rank,
            department: DEPARTMENT.to_string(),
            max_workload: 20,
            availability: if days.is_empty() {
                WeeklyAvailability::all_days()
            } else {
                WeeklyAvailability::only(days)
            },
        })?;
        teacher_ids.push(teacher.id);
    }

    // ===== 课程 =====
    // (名称, 代码, credits, 类型, 本班承担教师: 0 = 第一位, 1 = 第二位)
    let subject_specs: [(&str, &str, u32, SubjectType, usize); 4] = [
        ("Data Structures", "CS201", 4, SubjectType::Theory, 0),
        ("Operating Systems", "CS301", 3, SubjectType::Theory, 1),
        ("Systems Lab", "CS391", 2, SubjectType::Lab, 0),
        ("Database Lab", "CS392", 2, SubjectType::Lab, 1),
    ];
    let mut subjects = Vec::new();
    for (name, code, credits, subject_type, role) in subject_specs {
        let eligible = SECTIONS
            .iter()
            .enumerate()
            .map(|(section_idx, _)| teacher_ids[section_idx * 2 + role].clone())
            .collect();
        let subject = state.subject_api.create_subject(SubjectDraft {
            name: name.to_string(),
            code: code.to_string(),
            credits,
            subject_type,
            semester: SEMESTER,
            department: DEPARTMENT.to_string(),
            teacher_ids: eligible,
        })?;
        subjects.push(subject);
    }

    // ===== 每个班级自动排课 =====
    // 课程的第 i 位授课资格教师即第 i 个班级的承担教师
    let mut rejected = Vec::new();
    for (section_idx, section) in SECTIONS.iter().enumerate() {
        let selections = subjects
            .iter()
            .map(|subject| SubjectSelection {
                subject_id: subject.id.clone(),
                teacher_ids: vec![subject.teacher_ids[section_idx].clone()],
            })
            .collect();

        let request = GenerationRequest {
            semester: SEMESTER,
            department: DEPARTMENT.to_string(),
            section: section.to_string(),
            cluster: None,
            selections,
        };

        match state.timetable_api.generate_and_save(&request, ACTOR) {
            Ok(result) => println!(
                "generated {} (id={}, nodes={}, backtracks={}, warnings={})",
                result.preview.timetable.label(),
                result.preview.timetable.id,
                result.preview.stats.nodes_visited,
                result.preview.stats.backtracks,
                result.preview.report.warnings.len()
            ),
            Err(e) => {
                println!("section {} not generated: {}", section, e);
                rejected.push(section.to_string());
            }
        }
    }

    for teacher in state.teacher_api.list_teachers()? {
        println!(
            "{:<18} workload {}/{}",
            teacher.name, teacher.current_workload, teacher.max_workload
        );
    }
    if !rejected.is_empty() {
        return Err(format!("sections not generated: {}", rejected.join(", ")).into());
    }
    println!("seeded {}", db_path);
    Ok(())
}

fn reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if path.exists() {
        let backup = format!("{}.bak", db_path);
        fs::copy(path, &backup)?;
        fs::remove_file(path)?;
        println!("backed up existing db to {}", backup);
    }
    Ok(())
}
