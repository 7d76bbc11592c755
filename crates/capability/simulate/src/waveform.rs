//! 波形合成。
//!
//! 值 = f(信号类型, 幅值, 偏移, 相位)。相位由调用方按点位维护，
//! 合成一律使用推进前的相位。

use std::f64::consts::TAU;

use domain::constants;

/// 未配置频率时的默认值。
pub const DEFAULT_FREQUENCY: f64 = 1.0;
/// 未配置幅值时的默认值。
pub const DEFAULT_AMPLITUDE: f64 = 100.0;
/// 未配置偏移时的默认值。
pub const DEFAULT_OFFSET: f64 = 0.0;
/// 相位每周期推进 `frequency * PHASE_STEP`。
pub const PHASE_STEP: f64 = 0.1;

/// 按信号类型合成一个采样值，未知类型按 SINE 处理。
///
/// - `SINE`：`amplitude * sin(phase) + offset`
/// - `RAMP`：相位折回一个周期后线性爬升，`(phase mod 2π) / 2π * amplitude + offset`
/// - `RANDOM`：`uniform(0, amplitude) + offset`，不做种子控制
/// - `DIGITAL`：`sin(phase) > 0` 输出 1，否则 0
pub fn generate(signal_type: &str, amplitude: f64, offset: f64, phase: f64) -> f64 {
    match signal_type {
        constants::SIGNAL_RAMP => (phase.rem_euclid(TAU) / TAU) * amplitude + offset,
        constants::SIGNAL_RANDOM => rand::random::<f64>() * amplitude + offset,
        constants::SIGNAL_DIGITAL => {
            if phase.sin() > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        _ => amplitude * phase.sin() + offset,
    }
}

/// 推进相位并折回 [0, 2π)。
///
/// 对 SINE / DIGITAL 折回不改变取值（正弦以 2π 为周期），但避免
/// 长时间运行后相位无界增长带来的浮点精度漂移。
pub fn advance_phase(phase: f64, frequency: f64) -> f64 {
    (phase + frequency * PHASE_STEP).rem_euclid(TAU)
}
