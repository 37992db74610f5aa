use super::*;

impl TimetableApi {
    // ==========================================
    // 人工编排提交接口
    // ==========================================

    /// 新建课表（人工编排）
    ///
    /// # 返回
    /// - Ok(TimetableCommitResult): 已保存的课表、校验报告（可能含警告）、工作量重算结果
    /// - Err(BusinessRuleViolation): 同一班级已有课表
    /// - Err(ValidationFailed): 校验未通过，未落库
    pub fn create_timetable(&self, draft: TimetableDraft, actor: &str) -> ApiResult<TimetableCommitResult> {
        validate_section_header(draft.semester, &draft.department, &draft.section)?;

        let _guard = self.commit_guard()?;

        if let Some(existing) = self.repos.timetable_repo.find_by_natural_key(
            draft.semester,
            &draft.department,
            &draft.section,
        )? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "{} 已有课表(id={})，请修改原课表",
                existing.label(),
                existing.id
            )));
        }

        let candidate = draft.into_timetable(uuid::Uuid::new_v4().to_string());
        let report = self.check_candidate(&candidate)?;
        if !report.is_valid {
            warn!(timetable = %candidate.label(), errors = report.errors.len(), "新建课表校验未通过");
            return Err(ApiError::validation_failed(report));
        }

        let mut timetable = candidate;
        timetable.schedule = normalize_schedule(timetable.schedule);
        self.repos.timetable_repo.insert(&timetable)?;
        let saved = self.get_timetable(&timetable.id)?;

        let workload = self.recompute_after_commit(None)?;
        self.write_action_log(
            ActionLog::new(ActionType::CreateTimetable, actor, Some(&saved.id))
                .with_payload(serde_json::json!({
                    "label": saved.label(),
                    "warnings": report.warnings.len(),
                }))
                .with_detail(format!("新建课表: {}", saved.label())),
        )?;

        info!(timetable_id = %saved.id, timetable = %saved.label(), "课表已新建");
        Ok(TimetableCommitResult {
            timetable: saved,
            report,
            workload,
        })
    }

    /// 整体替换课表的 schedule 与 cluster
    pub fn update_timetable(
        &self,
        timetable_id: &str,
        update: TimetableUpdate,
        actor: &str,
    ) -> ApiResult<TimetableCommitResult> {
        let _guard = self.commit_guard()?;

        let mut candidate = self.get_timetable(timetable_id)?;
        candidate.cluster = update.cluster;
        candidate.schedule = update.schedule;

        let report = self.check_candidate(&candidate)?;
        if !report.is_valid {
            warn!(timetable = %candidate.label(), errors = report.errors.len(), "修改课表校验未通过");
            return Err(ApiError::validation_failed(report));
        }

        let schedule = normalize_schedule(candidate.schedule);
        self.repos.timetable_repo.replace_schedule(
            timetable_id,
            candidate.cluster.as_deref(),
            &schedule,
        )?;
        let saved = self.get_timetable(timetable_id)?;

        let workload = self.recompute_after_commit(None)?;
        self.write_action_log(
            ActionLog::new(ActionType::UpdateTimetable, actor, Some(timetable_id))
                .with_payload(serde_json::json!({
                    "label": saved.label(),
                    "warnings": report.warnings.len(),
                }))
                .with_detail(format!("修改课表: {}", saved.label())),
        )?;

        info!(timetable_id = timetable_id, "课表已修改");
        Ok(TimetableCommitResult {
            timetable: saved,
            report,
            workload,
        })
    }

    /// 删除课表
    pub fn delete_timetable(&self, timetable_id: &str, actor: &str) -> ApiResult<WorkloadRecomputeReport> {
        let _guard = self.commit_guard()?;

        let timetable = self.get_timetable(timetable_id)?;
        self.repos.timetable_repo.delete(timetable_id)?;

        // 行已删除；仍传入 id 以保证该课表不计入
        let workload = self.recompute_after_commit(Some(timetable_id))?;
        self.write_action_log(
            ActionLog::new(ActionType::DeleteTimetable, actor, Some(timetable_id))
                .with_payload(serde_json::json!({ "label": timetable.label() }))
                .with_detail(format!("删除课表: {}", timetable.label())),
        )?;

        info!(timetable_id = timetable_id, "课表已删除");
        Ok(workload)
    }
}
