//! 请求字段规整
//!
//! Handler 在落库前先通过这里规整文本字段：
//! - normalize_required：必填字段，去除首尾空格后不得为空
//! - normalize_optional：可选字段，缺省直接放行，出现则按必填规则处理
//! - normalize_protocol：协议名额外统一为大写，端点启动按大写常量匹配协议
//!
//! 规整失败统一返回 bad_request_error 响应，由调用方直接透传给客户端。

use crate::utils::response::bad_request_error;
use axum::response::Response;

/// 规整必填文本字段，失败返回 400 响应
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 规整可选文本字段，None 原样放行
pub fn normalize_optional(value: Option<String>, field: &str) -> Result<Option<String>, Response> {
    value.map(|value| normalize_required(value, field)).transpose()
}

/// 规整协议名：去空格后统一为大写，"opcua" 与 "OPCUA" 等价
pub fn normalize_protocol(value: String) -> Result<String, Response> {
    Ok(normalize_required(value, "protocol")?.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(
            normalize_required("  Press PLC  ".to_string(), "name").unwrap(),
            "Press PLC"
        );
        let response = normalize_required("   ".to_string(), "name").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn optional_passes_absent_field() {
        assert_eq!(normalize_optional(None, "brand").unwrap(), None);
        assert_eq!(
            normalize_optional(Some(" SIEMENS ".to_string()), "brand").unwrap(),
            Some("SIEMENS".to_string())
        );
        assert!(normalize_optional(Some("".to_string()), "brand").is_err());
    }

    #[test]
    fn protocol_is_uppercased() {
        assert_eq!(
            normalize_protocol(" modbus_tcp ".to_string()).unwrap(),
            "MODBUS_TCP"
        );
    }
}
