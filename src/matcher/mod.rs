//! 匹配模块：规则评估、MIME 嗅探、脚本谓词
pub mod target;
pub mod mime;
pub mod script;
pub mod matcher;

// 导出核心接口
pub use self::target::{is_url, MatchTarget};
pub use self::mime::{ContentSniffer, MimeSniffer};
pub use self::script::{RhaiEvaluator, ScriptEvaluator};
pub use self::matcher::{current_platform, MatchCriterion, RuleMatcher};
