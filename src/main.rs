//! via 命令行入口

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rsvia::{
    ConfigManager, Dispatcher, Executor, GlobalConfig, HistoryRecorder, JsonHistory, NoopHistory,
    RuleLibrary, RuleLoader,
};

/// 按规则打开文件、URL，或执行命令
#[derive(Parser, Debug)]
#[command(name = "via", version, about)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/via/config.yml）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 只打印将要执行的命令
    #[arg(long)]
    dry_run: bool,

    /// 交互选择要执行的规则
    #[arg(short, long)]
    select: bool,

    /// 输出规则匹配详情，不执行
    #[arg(long)]
    explain: bool,

    /// 详细日志
    #[arg(short, long)]
    verbose: bool,

    /// 使用 ~/.config/via/profiles/<NAME>.yml
    #[arg(short, long, value_name = "NAME")]
    profile: Option<String>,

    /// 文件、URL 或命令及其参数；`:config`、`:history` 为内置命令
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = cli.verbose || env_flag("VIA_VERBOSE");
    init_logging(verbose);

    if cli.args.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let config = ConfigManager::custom()
        .config_path(cli.config.clone())
        .profile(cli.profile.clone().or_else(|| std::env::var("VIA_PROFILE").ok()))
        .dry_run(cli.dry_run)
        .select(cli.select)
        .explain(cli.explain)
        .verbose(verbose)
        .build();
    debug!("运行配置：{:?}", config);

    if cli.args[0].starts_with(':') {
        return run_builtin(&config, &cli.args);
    }

    let library = RuleLoader::load(&config)?;
    new_dispatcher(&library, config).run(&cli.args)?;
    Ok(())
}

fn new_dispatcher(library: &RuleLibrary, config: GlobalConfig) -> Dispatcher<'_, io::Stdout> {
    let executor = Executor::new(io::stdout(), config.dry_run).with_history(history_recorder());
    Dispatcher::new(library, config, executor)
}

/// 日志输出到 stderr；RUST_LOG 优先
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn env_flag(name: &str) -> bool {
    matches!(std::env::var(name).as_deref(), Ok("true") | Ok("1"))
}

// 无法定位主目录时不记录历史
fn history_recorder() -> Box<dyn HistoryRecorder> {
    match JsonHistory::default_location() {
        Ok(history) => Box::new(history),
        Err(e) => {
            debug!("历史记录不可用：{}", e);
            Box::new(NoopHistory)
        }
    }
}

/// 内置命令：`:config list|check|path`、`:history`（选择并重新执行）、`:history clear`
fn run_builtin(config: &GlobalConfig, args: &[String]) -> Result<()> {
    let sub = args.get(1).map(String::as_str);
    match (args[0].as_str(), sub) {
        (":config", Some("list")) => {
            let library = RuleLoader::load(config)?;
            print!("{}", RuleLoader::to_yaml(&library)?);
        }
        (":config", Some("check")) => {
            let library = RuleLoader::load(config)?;
            RuleLoader::validate(&library)?;
            println!("Configuration is valid");
        }
        (":config", Some("path")) => {
            println!("{}", RuleLoader::resolve_path(config)?.display());
        }
        (":history", None) => {
            let history = JsonHistory::default_location()?;
            let entries = history
                .load()
                .with_context(|| format!("reading {}", history.path().display()))?;
            let library = if entries.is_empty() {
                RuleLibrary::default()
            } else {
                RuleLoader::load(config)?
            };
            new_dispatcher(&library, config.clone()).handle_history(&entries)?;
        }
        (":history", Some("clear")) => {
            JsonHistory::default_location()?.clear()?;
            println!("History cleared");
        }
        (name, sub) => bail!(
            "unknown built-in command: {} {}",
            name,
            sub.unwrap_or_default()
        ),
    }
    Ok(())
}
