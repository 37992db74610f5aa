// ==========================================
// 院系课表排课系统 - 维护命令行入口
// ==========================================
// 用法:
//   timetable-scheduler list                 列出全部课表
//   timetable-scheduler check <timetable_id> 以当前数据校验已保存课表
//   timetable-scheduler export <timetable_id> 导出课表 CSV 到标准输出
//   timetable-scheduler recompute            全量重算教师工作量
//   timetable-scheduler teacher <teacher_id> 查看教师课表
// 数据库路径: TIMETABLE_SCHEDULER_DB_PATH 或默认数据目录
// ==========================================

use std::error::Error;
use std::process::ExitCode;

use timetable_scheduler::app::{get_default_db_path, AppState};
use timetable_scheduler::logging;

const ACTOR: &str = "cli";

fn main() -> ExitCode {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", timetable_scheduler::APP_NAME, timetable_scheduler::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<ExitCode, Box<dyn Error>> {
    let command = args.first().map(String::as_str).unwrap_or("help");
    let argument = args.get(1).map(String::as_str);

    if matches!(command, "help" | "-h" | "--help") {
        print_usage();
        return Ok(ExitCode::SUCCESS);
    }

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, "使用数据库");
    let state = AppState::new(db_path)?;

    match (command, argument) {
        ("list", _) => {
            for timetable in state.timetable_api.list_timetables()? {
                let occupied = timetable.occupied_slots().count();
                println!("{}\t{}\t{} 节", timetable.id, timetable.label(), occupied);
            }
        }
        ("check", Some(timetable_id)) => {
            let report = state.timetable_api.check_saved_timetable(timetable_id)?;
            for issue in &report.errors {
                println!("ERROR   {}", issue);
            }
            for issue in &report.warnings {
                println!("WARNING {}", issue);
            }
            println!(
                "{}: {} 个错误, {} 个警告",
                if report.is_valid { "通过" } else { "未通过" },
                report.errors.len(),
                report.warnings.len()
            );
            if !report.is_valid {
                return Ok(ExitCode::from(2));
            }
        }
        ("export", Some(timetable_id)) => {
            print!("{}", state.timetable_api.export_csv(timetable_id)?);
        }
        ("recompute", _) => {
            let report = state.timetable_api.recompute_workloads(ACTOR)?;
            for (teacher_id, workload) in &report.updated {
                println!("{}\t{}", teacher_id, workload);
            }
            for teacher_id in &report.orphaned_teacher_ids {
                println!("ORPHAN  {}", teacher_id);
            }
            for failure in &report.failures {
                println!("FAILED  {}\t{}", failure.teacher_id, failure.message);
            }
            if !report.is_complete() {
                return Ok(ExitCode::from(2));
            }
        }
        ("teacher", Some(teacher_id)) => {
            for view in state.timetable_api.teacher_timetable(teacher_id)? {
                println!(
                    "{}\t第{}节\t{}\t{}",
                    view.day,
                    view.slot_number,
                    view.subject_name.as_deref().unwrap_or(&view.subject_id),
                    view.timetable_info
                );
            }
        }
        _ => {
            print_usage();
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_usage() {
    eprintln!("用法: timetable-scheduler <list | check <id> | export <id> | recompute | teacher <id>>");
}
