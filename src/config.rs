//! 全局配置管理,存储单次分发的所有运行时选项
//! 取代命令行全局变量，由调用方显式构建并传入分发器

use std::path::PathBuf;

/// 全局配置
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    // 规则配置文件路径（为空时按 profile / 默认路径解析）
    pub config_path: Option<PathBuf>,
    // 配置 profile 名称
    pub profile: Option<String>,
    // 只打印命令，不执行
    pub dry_run: bool,
    // 交互选择模式
    pub select: bool,
    // 输出匹配详情
    pub explain: bool,
    // 是否启用详细日志
    pub verbose: bool,
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.config_path = path;
        self
    }

    /// 空字符串视为未设置
    pub fn profile(mut self, profile: Option<String>) -> Self {
        self.config.profile = profile.filter(|p| !p.is_empty());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn select(mut self, select: bool) -> Self {
        self.config.select = select;
        self
    }

    pub fn explain(mut self, explain: bool) -> Self {
        self.config.explain = explain;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
