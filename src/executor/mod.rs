//! 执行模块：命令模板渲染、进程启动、系统默认打开
pub mod template;
pub mod opener;
pub mod executor;

// 导出核心接口
pub use self::template::{CommandContext, CommandTemplate};
pub use self::opener::SystemOpener;
pub use self::executor::{ExecutionOptions, Executor};
