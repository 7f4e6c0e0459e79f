//! JMX Vitals 主程序入口
//!
//! JMX Bean 采集配置的校验、查看与热重载工具

use anyhow::{Context, Result};
use clap::Parser;
use jmx_vitals::cli::args::{Args, Commands};
use jmx_vitals::cli::commands::{
    Command, ShowCommand, UnitsCommand, ValidateCommand, VersionCommand, WatchCommand,
};
use jmx_vitals::config::{ConfigLoader, LoadOutcome, LogLevel};
use jmx_vitals::logging::LoggingSystem;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 预加载配置以确定日志级别，命令行参数优先。
    // 此时 subscriber 尚未安装，加载过程中的日志会丢失，来源和告警由 load_outcome_log 补记；
    // 加载失败时不在这里报告，交给命令重新加载并输出错误
    let preloaded = match &args.command {
        Commands::Version { .. } | Commands::Units { .. } => None,
        _ => args.loader().load_outcome().ok(),
    };
    let log_level = args
        .log_level
        .map(LogLevel::from)
        .or_else(|| preloaded.as_ref().map(|outcome| outcome.config.log_level))
        .unwrap_or_default();

    let logging_system = LoggingSystem::setup_logging(args.log_config(log_level))
        .context("初始化日志系统失败")?;

    info!("JMX Vitals v{} 启动", jmx_vitals::VERSION);
    if let Some(outcome) = &preloaded {
        logging_system.load_outcome_log(outcome);
    }

    // 执行命令
    if let Err(e) = execute_command(&args, preloaded).await {
        error!("命令执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 执行CLI命令
async fn execute_command(args: &Args, preloaded: Option<LoadOutcome>) -> Result<()> {
    let command: Box<dyn Command> = match &args.command {
        Commands::Validate { .. } => Box::new(ValidateCommand::new(preloaded)),
        Commands::Show { .. } => Box::new(ShowCommand::new(preloaded)),
        Commands::Units { .. } => Box::new(UnitsCommand),
        Commands::Watch { .. } => Box::new(WatchCommand::new(preloaded)),
        Commands::Version { .. } => Box::new(VersionCommand),
    };

    command.execute(args).await.map_err(|e| anyhow::anyhow!(e))
}
