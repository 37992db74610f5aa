use super::search::ScheduleGrid;
use crate::domain::types::DAYS_PER_WEEK;

/// 软约束得分（放置前计算）
///
/// - 当天已有该课程: -1
/// - 该课程在五天间的分布（放置前）最多与最少相差不超过 1: +1
/// - 实验课落在第 4 节以后: +1
pub(super) fn placement_score(
    grid: &ScheduleGrid,
    unit_idx: usize,
    day: usize,
    slot_number: u8,
    is_lab: bool,
) -> i32 {
    let mut score = 0;

    let per_day: Vec<usize> = (0..DAYS_PER_WEEK)
        .map(|d| grid[d].iter().filter(|cell| **cell == Some(unit_idx)).count())
        .collect();

    if per_day[day] > 0 {
        score -= 1;
    }

    let max = per_day.iter().copied().max().unwrap_or(0);
    let min = per_day.iter().copied().min().unwrap_or(0);
    if max - min <= 1 {
        score += 1;
    }

    if is_lab && slot_number > 3 {
        score += 1;
    }

    score
}
