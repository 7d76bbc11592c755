//! Handlers 模块

pub mod devices;
pub mod health;
pub mod mappings;
pub mod metrics;
pub mod realtime;
pub mod status;
pub mod tags;

pub use devices::*;
pub use health::*;
pub use mappings::*;
pub use metrics::*;
pub use realtime::*;
pub use status::*;
pub use tags::*;
