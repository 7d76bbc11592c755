//! 端点端口分配。

use domain::constants;

/// 按协议单调递增的端口分配器。
///
/// 设备自带端口时优先使用；否则从各协议的基准端口开始依次分配。
/// 分配器只保证进程内不重复发同一个号，端口是否真的可绑定由
/// 端点启动时裁决。
pub struct PortAllocator {
    next_opcua: u16,
    next_modbus: u16,
}

impl PortAllocator {
    pub fn new(opcua_base: u16, modbus_base: u16) -> Self {
        Self {
            next_opcua: opcua_base,
            next_modbus: modbus_base,
        }
    }

    /// 解析某台设备应使用的端口。
    pub fn resolve(&mut self, protocol: &str, requested: Option<u16>) -> u16 {
        if let Some(port) = requested {
            if port != 0 {
                return port;
            }
        }
        match protocol {
            constants::PROTOCOL_MODBUS_TCP => {
                let port = self.next_modbus;
                self.next_modbus = self.next_modbus.wrapping_add(1);
                port
            }
            _ => {
                let port = self.next_opcua;
                self.next_opcua = self.next_opcua.wrapping_add(1);
                port
            }
        }
    }
}
