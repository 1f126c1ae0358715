pub mod schema;
pub mod sqlite_store;

pub use sqlite_store::SqliteStore;

/// 通用持久化工具：错误映射
pub mod utils {
    use atlas_core::error::CoreError;

    pub fn map_sql_err(e: rusqlite::Error) -> CoreError {
        CoreError::Store {
            message: e.to_string(),
        }
    }

    /// 唯一约束冲突转换为字段校验错误，其余按存储错误处理
    pub fn map_unique_err(e: rusqlite::Error, field: &str, message: &str) -> CoreError {
        match &e {
            rusqlite::Error::SqliteFailure(err, Some(detail))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && detail.starts_with("UNIQUE") =>
            {
                CoreError::invalid_field(field, message)
            }
            _ => map_sql_err(e),
        }
    }
}
