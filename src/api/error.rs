// ==========================================
// 院系课表排课系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将仓储/引擎错误转换为用户可读的错误消息
// 红线: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::generator::GeneratorError;
use crate::engine::validator::ValidationReport;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 提交前校验未通过（附完整报告）
    #[error("课表校验未通过: {reason}")]
    ValidationFailed {
        reason: String,
        report: ValidationReport,
    },

    /// 排课无解（含搜索预算耗尽）
    #[error("无法排课: {0}")]
    Infeasible(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 由校验报告构造提交拒绝错误
    pub fn validation_failed(report: ValidationReport) -> Self {
        ApiError::ValidationFailed {
            reason: report.error_summary(),
            report,
        }
    }

    /// 校验报告（仅 ValidationFailed 有）
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            ApiError::ValidationFailed { report, .. } => Some(report),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("字段{}数据错误: {}", field, message))
            }
            e @ RepositoryError::CorruptColumn { .. } => ApiError::DatabaseError(e.to_string()),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 GeneratorError 转换
// ==========================================
impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        match err {
            GeneratorError::InvalidRequest(msg) => ApiError::InvalidInput(msg),
            e @ GeneratorError::Infeasible { .. } => ApiError::Infeasible(e.to_string()),
            e @ GeneratorError::SearchBudgetExhausted { .. } => {
                ApiError::Infeasible(e.to_string())
            }
            GeneratorError::InternalConsistency(msg) => {
                tracing::error!(error = %msg, "排课结果未通过自检");
                ApiError::InternalError(msg)
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
