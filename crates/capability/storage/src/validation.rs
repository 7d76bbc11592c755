//! 入参校验
//!
//! - ensure_name：名称非空且长度受限
//! - ensure_finite / ensure_finite_opt：波形与变换参数必须是有限数
//!
//! 设备/点位/映射的创建与更新在落库前都会经过这里。

use crate::error::StorageError;

/// 名称长度上限。
const MAX_NAME_LEN: usize = 120;

/// 验证名称非空且不超长
pub fn ensure_name(field: &str, value: &str) -> Result<(), StorageError> {
    if value.trim().is_empty() {
        return Err(StorageError::invalid(format!("{field} required")));
    }
    if value.len() > MAX_NAME_LEN {
        return Err(StorageError::invalid(format!("{field} too long")));
    }
    Ok(())
}

/// 可选字段版本的 [`ensure_name`]，`None` 直接通过。
pub fn ensure_name_opt(field: &str, value: Option<&str>) -> Result<(), StorageError> {
    match value {
        Some(value) => ensure_name(field, value),
        None => Ok(()),
    }
}

/// 验证数值参数是有限数（拒绝 NaN 与无穷）
pub fn ensure_finite(field: &str, value: f64) -> Result<(), StorageError> {
    if !value.is_finite() {
        return Err(StorageError::invalid(format!("{field} must be finite")));
    }
    Ok(())
}

/// 验证可选数值参数是有限数
pub fn ensure_finite_opt(field: &str, value: Option<f64>) -> Result<(), StorageError> {
    match value {
        Some(value) => ensure_finite(field, value),
        None => Ok(()),
    }
}
