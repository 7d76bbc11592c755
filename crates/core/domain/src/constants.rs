//! 领域字符串常量。
//!
//! 设备方向、波形类型、协议与质量标记在存储记录里以字符串表示，
//! 统一从这里引用，避免各 crate 散落字面量。

/// 设备方向：仿真输入设备。
pub const DIRECTION_SOURCE: &str = "SOURCE";
/// 设备方向：输出模拟设备。
pub const DIRECTION_SINK: &str = "SINK";

/// 波形：正弦。
pub const SIGNAL_SINE: &str = "SINE";
/// 波形：锯齿。
pub const SIGNAL_RAMP: &str = "RAMP";
/// 波形：均匀随机。
pub const SIGNAL_RANDOM: &str = "RANDOM";
/// 波形：数字开关量。
pub const SIGNAL_DIGITAL: &str = "DIGITAL";

/// 输出协议：OPC UA。
pub const PROTOCOL_OPCUA: &str = "OPCUA";
/// 输出协议：Modbus TCP。
pub const PROTOCOL_MODBUS_TCP: &str = "MODBUS_TCP";

/// 采样质量：正常。
pub const QUALITY_GOOD: &str = "GOOD";
