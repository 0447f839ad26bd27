//! 规则模块：负责规则配置的加载、校验、数据模型定义
pub mod model;
pub mod loader;

// 导出核心接口
pub use self::model::{Rule, RuleLibrary};
pub use self::loader::RuleLoader;
