// ==========================================
// 院系课表排课系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误
///
/// 对应"协作方故障"：调用方据此判断的是"无法确定结果"，
/// 不得当作校验不通过处理
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束 =====
    // 课表 (semester, department, section) 重复、教师/课程 id 重复
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // 删除仍被课表节次引用的教师、节次引用不存在的课程
    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 存储内容 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("第 {column} 列无法解析: {message}")]
    CorruptColumn { column: usize, message: String },

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            RepositoryError::UniqueConstraintViolation(_) | RepositoryError::ForeignKeyViolation(_)
        )
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let message = msg.unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::UniqueConstraintViolation(message)
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        RepositoryError::ForeignKeyViolation(message)
                    }
                    // ON DELETE RESTRICT 由 SQLite 以触发器形式执行，扩展码为 CONSTRAINT_TRIGGER
                    ffi::SQLITE_CONSTRAINT_TRIGGER if message.contains("FOREIGN KEY") => {
                        RepositoryError::ForeignKeyViolation(message)
                    }
                    _ if code.code == rusqlite::ErrorCode::DatabaseBusy
                        || code.code == rusqlite::ErrorCode::DatabaseLocked =>
                    {
                        RepositoryError::LockError(message)
                    }
                    _ => RepositoryError::DatabaseQueryError(message),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                RepositoryError::CorruptColumn {
                    column,
                    message: source.to_string(),
                }
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
