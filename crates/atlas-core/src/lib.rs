//! Atlas Core - 资产管理控制台的共享基础设施
//!
//! 提供标识类型、统一错误、配置加载、遥测初始化与优雅停机。

pub mod config;
pub mod constants;
pub mod core_types;
pub mod error;
pub mod shutdown;
pub mod telemetry;

pub use constants::*;
