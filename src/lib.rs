//! rsvia - 基于规则的文件/URL/命令分发工具

// 导出全局错误类型
pub use self::error::{RsviaError, RsvResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{Rule, RuleLibrary, RuleLoader};

// 导出匹配模块核心接口
pub use self::matcher::{
    RuleMatcher, MatchCriterion, MatchTarget, is_url,
    ScriptEvaluator, RhaiEvaluator, MimeSniffer, ContentSniffer,
};

// 导出执行模块核心接口
pub use self::executor::{CommandContext, CommandTemplate, ExecutionOptions, Executor, SystemOpener};

// 导出分发模块核心接口
pub use self::dispatch::{Dispatcher, ExplainReport, PromptSelector, Selector};

// 导出工具模块核心接口
pub use self::utils::{PathUtils, HistoryEntry, HistoryRecorder, JsonHistory, NoopHistory};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod matcher;
pub mod executor;
pub mod dispatch;
pub mod utils;
