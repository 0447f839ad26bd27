//! 分发模块：参数路由、交互选择、explain 报告
pub mod selector;
pub mod explain;
pub mod dispatcher;

// 导出核心接口
pub use self::selector::{PromptSelector, Selector};
pub use self::explain::ExplainReport;
pub use self::dispatcher::{Dispatcher, SYSTEM_DEFAULT_OPTION};
