//! Atlas Server - 基于 DDD 分层的资产清单控制台
//!
//! 提供资产的列表、详情、授权视图，以及创建、更新、批量更新与删除。

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod interface;
