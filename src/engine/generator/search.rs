use super::scoring::placement_score;
use super::{GeneratorConfig, GeneratorError, SearchStats};
use crate::domain::subject::Subject;
use crate::domain::teacher::Teacher;
use crate::domain::timetable::{DaySchedule, Slot};
use crate::domain::types::{
    lab_pair_for_start, PositionStrategy, Weekday, DAYS_PER_WEEK, POSITIONS_PER_WEEK, SLOTS_PER_DAY,
};
use crate::engine::occupancy::OccupancyIndex;
use std::time::{Duration, Instant};
use tracing::trace;

/// 本班网格 [天][节次-1] -> 单元下标
pub(super) type ScheduleGrid = [[Option<usize>; SLOTS_PER_DAY as usize]; DAYS_PER_WEEK];

// ==========================================
// PlacementUnit - 待放置的课程
// ==========================================
pub(super) struct PlacementUnit<'a> {
    pub subject: &'a Subject,
    pub teachers: Vec<&'a Teacher>,
    pub teacher_ids: Vec<String>,
}

impl PlacementUnit<'_> {
    pub fn required(&self) -> u32 {
        self.subject.credits
    }

    pub fn is_lab(&self) -> bool {
        self.subject.is_lab()
    }
}

/// 候选位置 -> (教学日下标, 节次)
///
/// 节次优先: pos = (slot - 1) * 5 + day
fn position(pos: usize) -> (usize, u8) {
    (pos % DAYS_PER_WEEK, (pos / DAYS_PER_WEEK) as u8 + 1)
}

/// 一次放置（用于精确撤销）
struct Placement {
    unit_idx: usize,
    day: usize,
    slots: Vec<u8>,
    score: i32,
}

// ==========================================
// SearchState - 单次排课调用的私有搜索状态
// ==========================================
pub(super) struct SearchState<'s> {
    units: &'s [PlacementUnit<'s>],
    strategy: PositionStrategy,
    max_nodes: u64,
    deadline: Option<Instant>,
    started: Instant,
    grid: ScheduleGrid,
    occupancy: OccupancyIndex,
    assigned: Vec<u32>,
    score: i32,
    stats: SearchStats,
    deepest_dead_end: Option<usize>,
}

impl<'s> SearchState<'s> {
    pub fn new(
        units: &'s [PlacementUnit<'s>],
        occupancy: OccupancyIndex,
        config: &GeneratorConfig,
    ) -> Self {
        let started = Instant::now();
        let deadline = match config.time_limit_ms {
            0 => None,
            ms => Some(started + Duration::from_millis(ms)),
        };

        Self {
            units,
            strategy: config.strategy,
            max_nodes: config.max_search_nodes,
            deadline,
            started,
            grid: [[None; SLOTS_PER_DAY as usize]; DAYS_PER_WEEK],
            occupancy,
            assigned: vec![0; units.len()],
            score: 0,
            stats: SearchStats::default(),
            deepest_dead_end: None,
        }
    }

    /// 递归搜索: 为 unit_idx 再放置一次，从 start_pos 起尝试
    ///
    /// 同一课程的后续放置只在更靠后的位置上尝试（组合而非排列）
    pub fn search(&mut self, unit_idx: usize, start_pos: usize) -> Result<bool, GeneratorError> {
        let units = self.units;
        let unit = match units.get(unit_idx) {
            Some(unit) => unit,
            None => return Ok(true),
        };

        if self.assigned[unit_idx] >= unit.required() {
            return self.search(unit_idx + 1, 0);
        }

        for (pos, score) in self.candidates(unit_idx, start_pos) {
            self.charge_node()?;

            let placement = self.place(unit_idx, pos, score);
            let found = if self.assigned[unit_idx] >= unit.required() {
                self.search(unit_idx + 1, 0)?
            } else {
                self.search(unit_idx, pos + 1)?
            };
            if found {
                return Ok(true);
            }

            self.undo(placement);
            self.stats.backtracks += 1;
        }

        self.deepest_dead_end = Some(
            self.deepest_dead_end
                .map_or(unit_idx, |deepest| deepest.max(unit_idx)),
        );
        Ok(false)
    }

    /// 当前步的合法位置及其软约束得分
    ///
    /// FIRST_FIT 保持节次优先顺序；BEST_SCORE 按得分降序（稳定，同分保持原顺序）
    fn candidates(&self, unit_idx: usize, start_pos: usize) -> Vec<(usize, i32)> {
        let unit = &self.units[unit_idx];
        let mut candidates: Vec<(usize, i32)> = (start_pos..POSITIONS_PER_WEEK)
            .filter(|pos| {
                let (day, slot) = position(*pos);
                self.is_legal(unit_idx, day, slot)
            })
            .map(|pos| {
                let (day, slot) = position(pos);
                (pos, placement_score(&self.grid, unit_idx, day, slot, unit.is_lab()))
            })
            .collect();

        if self.strategy == PositionStrategy::BestScore {
            candidates.sort_by(|a, b| b.1.cmp(&a.1));
        }
        candidates
    }

    /// 硬约束: 本班该节空闲、全部授课教师当天可排且未被占用；实验课需合法连排且两节均满足
    fn is_legal(&self, unit_idx: usize, day: usize, slot: u8) -> bool {
        let unit = &self.units[unit_idx];
        let remaining = unit.required() - self.assigned[unit_idx];

        let slots: Vec<u8> = if unit.is_lab() {
            if remaining < 2 {
                return false;
            }
            match lab_pair_for_start(slot) {
                Some(second) => vec![slot, second],
                None => return false,
            }
        } else {
            vec![slot]
        };

        let weekday = Weekday::ALL[day];
        if unit.teachers.is_empty() || !unit.teachers.iter().all(|t| t.is_available(weekday)) {
            return false;
        }

        slots.iter().all(|s| {
            self.grid[day][*s as usize - 1].is_none()
                && unit
                    .teacher_ids
                    .iter()
                    .all(|id| !self.occupancy.is_occupied(id, weekday, *s))
        })
    }

    fn place(&mut self, unit_idx: usize, pos: usize, score: i32) -> Placement {
        let units = self.units;
        let unit = &units[unit_idx];
        let (day, slot) = position(pos);
        let weekday = Weekday::ALL[day];

        let slots = match (unit.is_lab(), lab_pair_for_start(slot)) {
            (true, Some(second)) => vec![slot, second],
            _ => vec![slot],
        };

        for s in &slots {
            self.grid[day][*s as usize - 1] = Some(unit_idx);
            for id in &unit.teacher_ids {
                self.occupancy.occupy(id, weekday, *s);
            }
        }
        self.assigned[unit_idx] += slots.len() as u32;
        self.score += score;

        trace!(
            subject = %unit.subject.name,
            day = %weekday,
            slots = ?slots,
            soft_score = score,
            assigned = self.assigned[unit_idx],
            "放置"
        );

        Placement {
            unit_idx,
            day,
            slots,
            score,
        }
    }

    fn undo(&mut self, placement: Placement) {
        let units = self.units;
        let unit = &units[placement.unit_idx];
        let weekday = Weekday::ALL[placement.day];

        for s in &placement.slots {
            self.grid[placement.day][*s as usize - 1] = None;
            for id in &unit.teacher_ids {
                self.occupancy.release(id, weekday, *s);
            }
        }
        self.assigned[placement.unit_idx] -= placement.slots.len() as u32;
        self.score -= placement.score;

        trace!(
            subject = %unit.subject.name,
            day = %weekday,
            slots = ?placement.slots,
            "回溯撤销"
        );
    }

    /// 计入一次放置尝试并检查搜索预算
    fn charge_node(&mut self) -> Result<(), GeneratorError> {
        self.stats.nodes_visited += 1;

        let over_nodes = self.max_nodes > 0 && self.stats.nodes_visited > self.max_nodes;
        let over_time = self.deadline.map_or(false, |d| Instant::now() >= d);
        if over_nodes || over_time {
            return Err(GeneratorError::SearchBudgetExhausted {
                nodes_visited: self.stats.nodes_visited,
                elapsed_ms: self.elapsed_ms(),
            });
        }
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn stats(&self) -> SearchStats {
        SearchStats {
            elapsed_ms: self.elapsed_ms(),
            ..self.stats.clone()
        }
    }

    pub fn deepest_dead_end(&self) -> Option<usize> {
        self.deepest_dead_end
    }

    pub fn soft_score(&self) -> i32 {
        self.score
    }

    pub fn assigned_counts(&self) -> Vec<u32> {
        self.assigned.clone()
    }

    /// 去掉空节次，输出周一至周五的 schedule
    pub fn compose_schedule(&self) -> Vec<DaySchedule> {
        Weekday::ALL
            .iter()
            .map(|weekday| {
                let slots = self.grid[weekday.index()]
                    .iter()
                    .enumerate()
                    .filter_map(|(cell, unit_idx)| {
                        unit_idx.map(|idx| {
                            let unit = &self.units[idx];
                            Slot::new(cell as u8 + 1, &unit.subject.id, &unit.teacher_ids)
                        })
                    })
                    .collect();
                DaySchedule {
                    day: *weekday,
                    slots,
                }
            })
            .collect()
    }
}
