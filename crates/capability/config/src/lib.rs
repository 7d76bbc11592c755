//! 网关运行配置，全部来自 PLCGW_* 环境变量。

use std::env;

/// 环境变量解析失败。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。所有变量均有默认值，可零配置启动。
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP API 监听地址。
    pub http_addr: String,
    /// 广播中继 TCP 监听地址。
    pub relay_addr: String,
    /// 信号发生器 tick 周期（毫秒）。
    pub tick_ms: u64,
    /// 事件中枢环形缓冲容量。
    pub bus_capacity: usize,
    /// OPC UA 端点自动分配端口的起始值。
    pub opcua_port_base: u16,
    /// Modbus TCP 端点自动分配端口的起始值。
    pub modbus_port_base: u16,
    /// 启动时写入演示设备数据。
    pub seed_demo: bool,
    /// 启动时自动拉起 enabled 的 SOURCE 设备。
    pub auto_start: bool,
}

impl AppConfig {
    /// 读取环境变量并套用默认值。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr =
            env::var("PLCGW_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let relay_addr =
            env::var("PLCGW_RELAY_ADDR").unwrap_or_else(|_| "0.0.0.0:9090".to_string());
        let tick_ms = read_u64_with_default("PLCGW_TICK_MS", 1000)?;
        let bus_capacity = read_usize_with_default("PLCGW_BUS_CAPACITY", 1024)?;
        let opcua_port_base = read_u16_with_default("PLCGW_OPCUA_PORT_BASE", 4840)?;
        let modbus_port_base = read_u16_with_default("PLCGW_MODBUS_PORT_BASE", 5502)?;
        let seed_demo = read_bool_with_default("PLCGW_SEED_DEMO", true);
        let auto_start = read_bool_with_default("PLCGW_AUTO_START", true);

        Ok(Self {
            http_addr,
            relay_addr,
            tick_ms,
            bus_capacity,
            opcua_port_base,
            modbus_port_base,
            seed_demo,
            auto_start,
        })
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
