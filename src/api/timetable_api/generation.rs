use super::*;
use crate::config::SchedulerConfigReader;

impl TimetableApi {
    // ==========================================
    // 自动排课接口
    // ==========================================

    /// 自动排课预览（不落库）
    ///
    /// 同一班级已有课表时，旧课表不计入教师占用（预览的是替换后的结果）。
    ///
    /// # 返回
    /// - Ok(GenerationPreview): 完整课表 + 校验报告
    /// - Err(Infeasible): 无可行解或搜索超出预算
    pub fn generate_timetable(&self, request: &GenerationRequest) -> ApiResult<GenerationPreview> {
        self.run_generation(request)
    }

    /// 自动排课并保存
    ///
    /// `commit.validate_generated` 为 true（默认）时，校验不通过则拒绝保存；
    /// 为 false 时校验结果只记录日志。
    pub fn generate_and_save(
        &self,
        request: &GenerationRequest,
        actor: &str,
    ) -> ApiResult<GenerationCommitResult> {
        let _guard = self.commit_guard()?;

        let preview = self.run_generation(request)?;
        let enforce_validation = self
            .config_manager
            .get_validate_generated_before_commit()
            .map_err(|e| ApiError::InternalError(format!("读取提交配置失败: {}", e)))?;

        if !preview.report.is_valid {
            if enforce_validation {
                warn!(
                    timetable = %preview.timetable.label(),
                    errors = preview.report.errors.len(),
                    "自动排课结果校验未通过，拒绝保存"
                );
                return Err(ApiError::validation_failed(preview.report));
            }
            warn!(
                timetable = %preview.timetable.label(),
                summary = %preview.report.error_summary(),
                "自动排课结果校验未通过（提交前校验已关闭，仍保存）"
            );
        }

        let timetable = &preview.timetable;
        if preview.replaces_existing {
            self.repos.timetable_repo.replace_schedule(
                &timetable.id,
                timetable.cluster.as_deref(),
                &timetable.schedule,
            )?;
        } else {
            self.repos.timetable_repo.insert(timetable)?;
        }

        let workload = self.recompute_after_commit(None)?;

        let config_snapshot = self
            .config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(format!("读取配置快照失败: {}", e)))?;
        self.write_action_log(
            ActionLog::new(ActionType::GenerateTimetable, actor, Some(&timetable.id))
                .with_payload(serde_json::json!({
                    "request": request,
                    "replaces_existing": preview.replaces_existing,
                    "soft_score": preview.soft_score,
                    "stats": preview.stats,
                    "config_snapshot": config_snapshot,
                }))
                .with_detail(format!("自动排课: {}", timetable.label())),
        )?;

        let saved = self.get_timetable(&timetable.id)?;
        info!(
            timetable_id = %saved.id,
            timetable = %saved.label(),
            replaced = preview.replaces_existing,
            "自动排课结果已保存"
        );

        Ok(GenerationCommitResult {
            preview: GenerationPreview {
                timetable: saved,
                ..preview
            },
            workload,
        })
    }

    fn run_generation(&self, request: &GenerationRequest) -> ApiResult<GenerationPreview> {
        validate_section_header(request.semester, &request.department, &request.section)?;

        let existing = self.repos.timetable_repo.find_by_natural_key(
            request.semester,
            &request.department,
            &request.section,
        )?;
        let timetable_id = existing
            .as_ref()
            .map(|t| t.id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let catalog = self.repos.load_catalog()?;
        let others = self.repos.load_other_timetables(Some(&timetable_id))?;
        let generator = TimetableGenerator::new(self.load_generator_config()?);

        let generated = generator.generate(request, &catalog, &others)?;

        let mut timetable = request.to_timetable(timetable_id, generated.schedule);
        if let Some(existing) = &existing {
            timetable.created_at = existing.created_at;
        }
        let report = self.validator.validate(&timetable, &others, &catalog);

        Ok(GenerationPreview {
            timetable,
            soft_score: generated.soft_score,
            stats: generated.stats,
            report,
            replaces_existing: existing.is_some(),
        })
    }
}
