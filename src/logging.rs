//! 日志系统模块
//!
//! 提供结构化日志配置和配置加载结果的日志输出

use crate::config::{ConfigWarning, LoadOutcome, LogLevel};
use log::LevelFilter;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 日志文件路径（可选）
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
            module_levels: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// 按配置文件中的日志级别创建
    pub fn for_level(level: LogLevel) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }
}

/// 日志系统管理器
pub struct LoggingSystem {
    /// 配置
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    ///
    /// 重复调用时不会重新安装 subscriber
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let state_mutex =
            GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()));

        let mut state = state_mutex
            .lock()
            .map_err(|_| anyhow::anyhow!("日志状态锁已损坏"))?;

        if !state.initialized {
            Self::init_log_tracer()?;
            Self::init_tracing_subscriber(&config)?;
            state.initialized = true;
        }
        state.current_config = Some(config.clone());

        Ok(Self { config })
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接）
    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    /// 初始化 tracing subscriber
    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        // 创建环境过滤器
        let mut env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        // 添加模块级别过滤
        for (module, level) in &config.module_levels {
            match format!("{}={}", module, Self::level_to_string(*level)).parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(e) => tracing::warn!("忽略无效的模块日志级别 {}: {}", module, e),
            }
        }

        let result = if let Some(file_path) = config.file_path.as_ref().filter(|_| !config.console)
        {
            let file = std::fs::File::create(file_path)
                .map_err(|e| anyhow::anyhow!("创建日志文件失败: {}", e))?;
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true);

            registry().with(env_filter).with(file_layer).try_init()
        } else {
            let fmt_layer = if config.json_format {
                fmt::layer()
                    .json()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_file(true)
                    .with_line_number(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_ansi(true)
                    .with_target(false)
                    .boxed()
            };
            registry().with(env_filter).with(fmt_layer).try_init()
        };

        match result {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains(
                    "attempted to set a logger after the logging system was already initialized",
                ) || error_msg.contains("a global default trace dispatcher has already been set")
                {
                    // LogTracer 已安装，或测试中已被其他代码初始化
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }

    /// 将 log::LevelFilter 转换为字符串
    fn level_to_string(level: LevelFilter) -> &'static str {
        match level {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        }
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE
            .get()
            .and_then(|state| state.lock().ok().map(|state| state.initialized))
            .unwrap_or(false)
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE
            .get()
            .and_then(|state| state.lock().ok().and_then(|state| state.current_config.clone()))
    }

    /// 记录配置加载结果
    ///
    /// 加载发生在日志初始化之前，文件来源和告警在这里补记
    pub fn load_outcome_log(&self, outcome: &LoadOutcome) {
        let describe = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<无>".to_string())
        };

        if self.config.json_format {
            let entry = json!({
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "type": "config_load",
                "user_config": outcome.sources.user,
                "default_config": outcome.sources.defaults,
                "default_queries": outcome.config.default_bean_queries.len(),
                "process_rules": outcome.config.process_rules.len(),
                "warnings": outcome.warnings,
            });
            tracing::info!("{entry}");
        } else {
            tracing::info!(
                "CONFIG: user={} default={} - {} 个默认查询, {} 条进程规则",
                describe(&outcome.sources.user),
                describe(&outcome.sources.defaults),
                outcome.config.default_bean_queries.len(),
                outcome.config.process_rules.len()
            );
        }

        for warning in &outcome.warnings {
            match warning {
                ConfigWarning::MalformedAttributeType { .. } => tracing::error!("{}", warning),
                ConfigWarning::ConfigFileMissing { .. } => tracing::warn!("{}", warning),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ConfigLayer, ConfigSources};

    #[test]
    fn test_log_config_for_level() {
        assert_eq!(LogConfig::for_level(LogLevel::Warning).level, LevelFilter::Warn);
        assert_eq!(LogConfig::for_level(LogLevel::Debug).level, LevelFilter::Debug);
        assert!(LogConfig::for_level(LogLevel::Info).console);
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(LoggingSystem::level_to_string(LevelFilter::Warn), "warn");
        assert_eq!(
            LoggingSystem::convert_level_to_directive(LevelFilter::Debug).to_string(),
            "debug"
        );
    }

    #[test]
    fn test_setup_logging_is_repeatable() {
        let first = LoggingSystem::setup_logging(LogConfig::default());
        assert!(first.is_ok());
        assert!(LoggingSystem::is_initialized());

        let mut config = LogConfig::for_level(LogLevel::Debug);
        config
            .module_levels
            .insert("jmx_vitals::config".to_string(), LevelFilter::Trace);
        let second = LoggingSystem::setup_logging(config).unwrap();

        let current = LoggingSystem::current_config().unwrap();
        assert_eq!(current.level, LevelFilter::Debug);

        let outcome = LoadOutcome {
            config: Config::default(),
            warnings: vec![ConfigWarning::ConfigFileMissing {
                layer: ConfigLayer::User,
            }],
            sources: ConfigSources::default(),
        };
        second.load_outcome_log(&outcome);
    }
}
