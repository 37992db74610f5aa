use super::*;

use crate::domain::timetable::TeacherSlotView;
use crate::domain::types::{Weekday, SLOTS_PER_DAY};

impl TimetableApi {
    // ==========================================
    // 视图与导出接口
    // ==========================================

    /// 教师视角课表：该教师在全部课表中的节次，按教学日、节次排序
    pub fn teacher_timetable(&self, teacher_id: &str) -> ApiResult<Vec<TeacherSlotView>> {
        if self.repos.teacher_repo.find_by_id(teacher_id)?.is_none() {
            return Err(ApiError::NotFound(format!("教师(id={})不存在", teacher_id)));
        }

        let catalog = self.repos.load_catalog()?;
        let mut views: Vec<TeacherSlotView> = self
            .repos
            .timetable_repo
            .list_all()?
            .iter()
            .flat_map(|timetable| {
                let label = timetable.label();
                let catalog = &catalog;
                timetable
                    .occupied_slots()
                    .filter(move |(_, slot)| slot.has_teacher(teacher_id))
                    .map(move |(day, slot)| TeacherSlotView {
                        day,
                        slot_number: slot.slot_number,
                        subject_id: slot.subject_id().to_string(),
                        subject_name: catalog.subject(slot.subject_id()).map(|s| s.name.clone()),
                        timetable_id: timetable.id.clone(),
                        timetable_info: label.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        views.sort_by(|a, b| {
            a.day
                .cmp(&b.day)
                .then(a.slot_number.cmp(&b.slot_number))
                .then_with(|| a.timetable_info.cmp(&b.timetable_info))
        });
        Ok(views)
    }

    /// 导出课表为 CSV（5 行教学日 × 7 列节次）
    ///
    /// 单元格格式: `课程名 (教师A / 教师B)`，空节次为空字符串
    pub fn export_csv(&self, timetable_id: &str) -> ApiResult<String> {
        let timetable = self.get_timetable(timetable_id)?;
        let catalog = self.repos.load_catalog()?;

        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec![timetable.label()];
        header.extend((1..=SLOTS_PER_DAY).map(|n| format!("Slot {}", n)));
        writer
            .write_record(&header)
            .map_err(|e| ApiError::InternalError(format!("CSV写入失败: {}", e)))?;

        for day in Weekday::ALL {
            let mut row = vec![day.to_string()];
            for slot_number in 1..=SLOTS_PER_DAY {
                let cell = match timetable.slot_at(day, slot_number) {
                    Some(slot) => {
                        let teachers: Vec<&str> = slot
                            .teacher_ids()
                            .map(|id| catalog.teacher_name(id))
                            .collect();
                        format!(
                            "{} ({})",
                            catalog.subject_name(slot.subject_id()),
                            teachers.join(" / ")
                        )
                    }
                    None => String::new(),
                };
                row.push(cell);
            }
            writer
                .write_record(&row)
                .map_err(|e| ApiError::InternalError(format!("CSV写入失败: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::InternalError(format!("CSV写入失败: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ApiError::InternalError(format!("CSV编码失败: {}", e)))
    }
}
