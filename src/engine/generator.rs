// ==========================================
// 院系课表排课系统 - 自动排课引擎
// ==========================================
// 职责: 为单个班级在周一至周五 × 7 节的网格上回溯求解一张可行课表
// 输入: 班级 + 课程/授课教师选择 + 目录 + 其他已保存课表
// 输出: 完整 schedule（每门课程恰好 credits 节）或明确的不可行错误
// 红线: 永不返回部分课表
// 红线: 引擎不读库、不写库，快照由调用方提供
// ==========================================
// 顺序: credits 降序，同 credits 时实验课在前（启发式，不影响正确性）
// 位置: 节次优先，再按教学日（slot 1..7 × Mon..Fri）
// ==========================================

mod scoring;
mod search;

#[cfg(test)]
mod tests;

use crate::config::SchedulerConfigReader;
use crate::domain::subject::Subject;
use crate::domain::teacher::Teacher;
use crate::domain::timetable::{DaySchedule, Slot, Timetable};
use crate::domain::types::{PositionStrategy, Weekday, POSITIONS_PER_WEEK, SLOTS_PER_DAY};
use crate::engine::catalog::SchedulingCatalog;
use crate::engine::occupancy::OccupancyIndex;
use search::{PlacementUnit, SearchState};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// 请求与结果
// ==========================================

/// 单门课程的选择：课程 + 本班实际授课教师
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSelection {
    #[serde(alias = "subject")]
    pub subject_id: String,
    #[serde(default, alias = "teachers")]
    pub teacher_ids: Vec<String>,
}

impl SubjectSelection {
    pub fn new(subject_id: &str, teacher_ids: &[&str]) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            teacher_ids: teacher_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// 排课请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub semester: i32,
    pub department: String,
    pub section: String,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(alias = "selectedSubjects")]
    pub selections: Vec<SubjectSelection>,
}

impl GenerationRequest {
    /// 以生成结果组装待保存课表
    pub fn to_timetable(&self, id: String, schedule: Vec<DaySchedule>) -> Timetable {
        Timetable {
            id,
            semester: self.semester,
            department: self.department.clone(),
            section: self.section.clone(),
            cluster: self.cluster.clone(),
            schedule,
            created_at: None,
            updated_at: None,
        }
    }
}

/// 搜索统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub nodes_visited: u64, // 尝试过的放置次数
    pub backtracks: u64,    // 撤销次数
    pub elapsed_ms: u64,
}

/// 排课结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSchedule {
    pub schedule: Vec<DaySchedule>,
    pub soft_score: i32, // 各次放置的软约束得分之和（观测用）
    pub stats: SearchStats,
}

// ==========================================
// GeneratorError - 排课错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("无效的排课请求: {0}")]
    InvalidRequest(String),

    #[error("无法在现有约束下生成课表: {reason}")]
    Infeasible { reason: String },

    #[error("排课搜索超出预算: 已尝试 {nodes_visited} 次放置, 耗时 {elapsed_ms}ms")]
    SearchBudgetExhausted { nodes_visited: u64, elapsed_ms: u64 },

    #[error("排课结果内部一致性校验失败: {0}")]
    InternalConsistency(String),
}

impl GeneratorError {
    fn infeasible(reason: impl Into<String>) -> Self {
        GeneratorError::Infeasible {
            reason: reason.into(),
        }
    }

    /// 是否属于"不可行"一类（调用方应修改输入而非重试）
    pub fn is_infeasibility(&self) -> bool {
        matches!(
            self,
            GeneratorError::Infeasible { .. } | GeneratorError::SearchBudgetExhausted { .. }
        )
    }
}

// ==========================================
// GeneratorConfig - 排课参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub strategy: PositionStrategy,
    pub max_search_nodes: u64, // 0 = 不限
    pub time_limit_ms: u64,    // 0 = 不限
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            strategy: PositionStrategy::FirstFit,
            max_search_nodes: crate::config::config_manager::defaults::MAX_SEARCH_NODES,
            time_limit_ms: crate::config::config_manager::defaults::SEARCH_TIME_LIMIT_MS,
        }
    }
}

impl GeneratorConfig {
    /// 从配置读取器加载
    pub fn load(reader: &dyn SchedulerConfigReader) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            strategy: reader.get_position_strategy()?,
            max_search_nodes: reader.get_max_search_nodes()?,
            time_limit_ms: reader.get_search_time_limit_ms()?,
        })
    }
}

// ==========================================
// TimetableGenerator - 自动排课引擎
// ==========================================
pub struct TimetableGenerator {
    config: GeneratorConfig,
}

impl Default for TimetableGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl TimetableGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// 生成课表
    ///
    /// # 参数
    /// - `request`: 班级与课程/教师选择
    /// - `catalog`: 教师与课程目录
    /// - `others`: 其他已保存课表（构建跨班级的教师占用）
    ///
    /// # 返回
    /// - `Ok(GeneratedSchedule)`: 每门课程恰好 credits 节
    /// - `Err(InvalidRequest)`: 选择本身不合法（课程不存在/重复）
    /// - `Err(Infeasible | SearchBudgetExhausted)`: 无可行解或搜索超限
    /// - `Err(InternalConsistency)`: 结果复核失败
    #[instrument(
        skip_all,
        fields(
            semester = request.semester,
            department = %request.department,
            section = %request.section,
            strategy = %self.config.strategy,
        )
    )]
    pub fn generate(
        &self,
        request: &GenerationRequest,
        catalog: &SchedulingCatalog,
        others: &[Timetable],
    ) -> Result<GeneratedSchedule, GeneratorError> {
        let mut units = resolve_units(request, catalog)?;

        // 最难排的先排: credits 降序，同分实验课在前（稳定排序）
        units.sort_by(|a, b| {
            b.required()
                .cmp(&a.required())
                .then_with(|| b.is_lab().cmp(&a.is_lab()))
        });

        let occupancy = OccupancyIndex::from_timetables(others);
        check_teacher_capacity(&units, &occupancy)?;
        info!(
            subjects = units.len(),
            required_slots = units.iter().map(|u| u.required()).sum::<u32>(),
            other_timetables = others.len(),
            "开始自动排课"
        );

        let mut state = SearchState::new(&units, occupancy, &self.config);
        let found = state.search(0, 0);
        let stats = state.stats();

        match found {
            Ok(true) => {}
            Ok(false) => {
                let reason = match state.deepest_dead_end() {
                    Some(idx) => {
                        let subject = units[idx].subject;
                        format!(
                            "课程 {} ({}) 无法在教师可用日与现有占用下排满 {} 节",
                            subject.name, subject.code, subject.credits
                        )
                    }
                    None => "搜索穷尽全部候选位置".to_string(),
                };
                warn!(
                    nodes_visited = stats.nodes_visited,
                    backtracks = stats.backtracks,
                    reason = %reason,
                    "自动排课失败"
                );
                return Err(GeneratorError::infeasible(reason));
            }
            Err(e) => {
                warn!(error = %e, "自动排课中止");
                return Err(e);
            }
        }

        let counts = state.assigned_counts();
        let schedule = state.compose_schedule();
        let soft_score = state.soft_score();

        verify_credit_counts(&units, &schedule, &counts)?;

        info!(
            nodes_visited = stats.nodes_visited,
            backtracks = stats.backtracks,
            elapsed_ms = stats.elapsed_ms,
            soft_score,
            "自动排课成功"
        );

        Ok(GeneratedSchedule {
            schedule,
            soft_score,
            stats,
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 解析选择为待放置单元，并做可提前判定的不可行检查
fn resolve_units<'a>(
    request: &GenerationRequest,
    catalog: &'a SchedulingCatalog,
) -> Result<Vec<PlacementUnit<'a>>, GeneratorError> {
    if request.selections.is_empty() {
        return Err(GeneratorError::InvalidRequest("未选择任何课程".to_string()));
    }

    let mut seen_subjects = HashSet::new();
    let mut units = Vec::with_capacity(request.selections.len());
    let mut total_required: u32 = 0;

    for selection in &request.selections {
        let subject: &Subject = catalog.subject(&selection.subject_id).ok_or_else(|| {
            GeneratorError::InvalidRequest(format!("课程不存在: {}", selection.subject_id))
        })?;

        if !seen_subjects.insert(subject.id.as_str()) {
            return Err(GeneratorError::InvalidRequest(format!(
                "课程重复选择: {}",
                subject.name
            )));
        }

        if subject.semester != request.semester || subject.department != request.department {
            debug!(
                subject_id = %subject.id,
                subject_semester = subject.semester,
                subject_department = %subject.department,
                "所选课程不属于本班学期/院系"
            );
        }

        // 去重并保持选择顺序
        let mut teacher_ids: Vec<String> = Vec::new();
        for id in &selection.teacher_ids {
            if !teacher_ids.contains(id) {
                teacher_ids.push(id.clone());
            }
        }

        if teacher_ids.is_empty() {
            return Err(GeneratorError::infeasible(format!(
                "课程 {} 未选择授课教师",
                subject.name
            )));
        }

        let mut teachers: Vec<&Teacher> = Vec::with_capacity(teacher_ids.len());
        for id in &teacher_ids {
            let teacher = catalog.teacher(id).ok_or_else(|| {
                GeneratorError::infeasible(format!("课程 {} 的授课教师不存在: {}", subject.name, id))
            })?;
            if !subject.is_eligible(id) {
                return Err(GeneratorError::infeasible(format!(
                    "教师 {} 不在课程 {} 的授课资格内",
                    teacher.name, subject.name
                )));
            }
            if teacher.availability.available_day_count() == 0 {
                return Err(GeneratorError::infeasible(format!(
                    "课程 {} 的授课教师 {} 周一至周五均不可排",
                    subject.name, teacher.name
                )));
            }
            teachers.push(teacher);
        }

        if subject.is_lab() && subject.credits % 2 != 0 {
            return Err(GeneratorError::infeasible(format!(
                "实验课 {} 的 credits={} 为奇数，无法按两节连排恰好排满",
                subject.name, subject.credits
            )));
        }

        total_required += subject.credits;
        units.push(PlacementUnit {
            subject,
            teachers,
            teacher_ids,
        });
    }

    if total_required as usize > POSITIONS_PER_WEEK {
        return Err(GeneratorError::infeasible(format!(
            "所选课程共需 {} 节，超过每周 {} 节",
            total_required, POSITIONS_PER_WEEK
        )));
    }

    Ok(units)
}

/// 每位教师在本班的总节次不得超过其可用日上尚未被占用的节次数
///
/// 不满足时搜索必然失败，提前判定可避免耗尽搜索预算
fn check_teacher_capacity(
    units: &[PlacementUnit<'_>],
    occupancy: &OccupancyIndex,
) -> Result<(), GeneratorError> {
    // (教师, 所需节次, 涉及课程)，按单元顺序首次出现排列
    let mut demands: Vec<(&Teacher, u32, Vec<&str>)> = Vec::new();
    for unit in units {
        for teacher in &unit.teachers {
            match demands.iter_mut().find(|(t, _, _)| t.id == teacher.id) {
                Some((_, required, subjects)) => {
                    *required += unit.required();
                    subjects.push(unit.subject.name.as_str());
                }
                None => {
                    demands.push((*teacher, unit.required(), vec![unit.subject.name.as_str()]))
                }
            }
        }
    }

    for (teacher, required, subjects) in demands {
        let week = occupancy.week_of(&teacher.id);
        let free = Weekday::ALL
            .iter()
            .filter(|day| teacher.is_available(**day))
            .map(|day| week[day.index()].iter().filter(|cell| !**cell).count())
            .sum::<usize>() as u32;

        if required > free {
            let reason = format!(
                "教师 {} 需为课程 {} 共排 {} 节，可用日仅剩 {} 节空闲",
                teacher.name,
                subjects.join("、"),
                required,
                free
            );
            warn!(teacher_id = %teacher.id, required, free, "教师可用节次不足");
            return Err(GeneratorError::infeasible(reason));
        }
    }

    Ok(())
}

/// 复核: 每门课程在结果中占用的节次数必须恰好等于 credits
fn verify_credit_counts(
    units: &[PlacementUnit<'_>],
    schedule: &[DaySchedule],
    counters: &[u32],
) -> Result<(), GeneratorError> {
    let mut mismatches = Vec::new();

    for (idx, unit) in units.iter().enumerate() {
        let placed = schedule
            .iter()
            .flat_map(|day| day.slots.iter())
            .filter(|slot: &&Slot| slot.subject_id() == unit.subject.id)
            .count() as u32;

        if placed != unit.required() || counters[idx] != unit.required() {
            mismatches.push(format!(
                "{}: 期望 {} 节, 实际 {} 节 (计数器 {})",
                unit.subject.name,
                unit.required(),
                placed,
                counters[idx]
            ));
        }
    }

    let slots_in_range = schedule.iter().all(|day| {
        Weekday::ALL.contains(&day.day)
            && day
                .slots
                .iter()
                .all(|slot| (1..=SLOTS_PER_DAY).contains(&slot.slot_number))
    });
    if !slots_in_range {
        mismatches.push("存在越界节次".to_string());
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        let message = mismatches.join("; ");
        error!(detail = %message, "排课结果复核失败");
        Err(GeneratorError::InternalConsistency(message))
    }
}
