//! 存储层的记录与更新结构
//!
//! - 设备：DeviceRecord, DeviceUpdate, DeviceFilter
//! - 点位：TagRecord, TagUpdate（含波形参数）
//! - 路由映射：MappingRecord, MappingUpdate（含线性变换参数）
//! - 组合查询：ResolvedTag（点位 + 所属设备 + 启用的映射）

/// 设备记录。
///
/// 设备分两个方向：
/// - `SOURCE`: 仿真输入设备，信号发生器按波形参数持续产出点位值
/// - `SINK`: 输出模拟设备，以协议端点形式对外暴露变量
///
/// 协议字段对 SOURCE 仅作展示（S7COMM、ETHERNET_IP 等），
/// 对 SINK 决定端点类型：OPCUA | MODBUS_TCP。
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    pub device_id: String,
    pub name: String,
    pub brand: Option<String>,
    pub protocol: String,
    /// 设备方向: SOURCE | SINK
    pub direction: String,
    /// 是否随进程启动自动拉起（start/stop 操作会回写该标记）
    pub enabled: bool,
    /// SINK 设备期望监听的端口（缺省时自动分配）
    pub port: Option<u16>,
    /// 端点启动成功后回写的访问地址
    pub endpoint: Option<String>,
    /// 协议私有参数，存 JSON 字符串
    pub protocol_config: Option<String>,
}

/// 设备更新输入。
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    pub protocol_config: Option<String>,
}

/// 设备列表过滤条件。
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    /// 按方向过滤: SOURCE | SINK
    pub direction: Option<String>,
    /// 按启用标记过滤
    pub enabled: Option<bool>,
}

/// 点位记录。
///
/// 波形参数决定信号发生器的取值函数：
/// - `SINE`: amplitude * sin(phase) + offset
/// - `RAMP`: 锯齿，按相位周期线性爬升
/// - `RANDOM`: [0, amplitude) 均匀随机 + offset
/// - `DIGITAL`: sin(phase) 的符号映射到 0/1
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub tag_id: String,
    pub device_id: String,
    /// 点位名，设备内唯一
    pub name: String,
    /// 协议地址（DB1.DBD0、N7:0、40001 等，管道不解析其内容）
    pub address: String,
    pub data_type: String,
    pub unit: Option<String>,
    /// 最近一次采样值
    pub value: f64,
    /// 最近一次采样质量
    pub quality: String,
    /// 波形类型: SINE | RAMP | RANDOM | DIGITAL
    pub signal_type: String,
    /// 相位步进系数，缺省 1.0
    pub frequency: Option<f64>,
    /// 振幅，缺省 100.0
    pub amplitude: Option<f64>,
    /// 基线偏移，缺省 0.0
    pub offset: Option<f64>,
}

/// 点位更新输入。
#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub data_type: Option<String>,
    pub unit: Option<String>,
    pub signal_type: Option<String>,
    pub frequency: Option<f64>,
    pub amplitude: Option<f64>,
    pub offset: Option<f64>,
}

/// 路由映射记录。
///
/// 将一个输入点位的值经线性变换（value * scale_factor + offset）
/// 路由到一个 SINK 设备的输出变量。
/// (input_tag_id, output_device_id, output_tag_name) 组合唯一。
#[derive(Debug, Clone)]
pub struct MappingRecord {
    pub mapping_id: String,
    pub input_tag_id: String,
    pub output_device_id: String,
    pub output_tag_name: String,
    pub output_address: String,
    /// 缩放系数，缺省 1.0
    pub scale_factor: Option<f64>,
    /// 加性偏移，缺省 0.0
    pub offset: Option<f64>,
    /// 停用的映射保留配置但不触发输出写
    pub enabled: bool,
}

/// 路由映射更新输入。
#[derive(Debug, Clone, Default)]
pub struct MappingUpdate {
    pub output_tag_name: Option<String>,
    pub output_address: Option<String>,
    pub scale_factor: Option<f64>,
    pub offset: Option<f64>,
    pub enabled: Option<bool>,
}

/// 点位解析结果：路由引擎一次查询拿到变换所需的全部上下文。
#[derive(Debug, Clone)]
pub struct ResolvedTag {
    pub tag: TagRecord,
    pub device: DeviceRecord,
    pub enabled_mappings: Vec<MappingRecord>,
}
