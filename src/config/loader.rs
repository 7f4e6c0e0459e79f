//! 配置加载器实现
//!
//! 定位用户层和默认层配置文件、合并并构造类型化的配置

use crate::config::layers::{ConfigLayer, YamlLayers};
use crate::config::types::Config;
use crate::config::warning::ConfigWarning;
use crate::error::{ConfigError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// 用户配置文件名
pub const USER_CONFIG_FILE: &str = "jmx-vitals.yaml";
/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "jmx-vitals.default.yaml";

/// 配置加载器trait，定义配置加载接口
pub trait ConfigLoader: Send + Sync {
    /// 加载配置并返回告警和实际使用的文件
    fn load_outcome(&self) -> Result<LoadOutcome>;

    /// 需要监控变更的文件
    fn watched_paths(&self) -> Vec<PathBuf>;

    /// 加载配置
    fn load(&self) -> Result<Config> {
        self.load_outcome().map(|outcome| outcome.config)
    }
}

/// 单层配置的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    /// 按顺序取第一个存在的候选路径，都不存在时为空层
    Candidates(Vec<PathBuf>),
    /// 明确指定的文件，必须存在
    Explicit(PathBuf),
}

impl LayerSource {
    /// 解析出实际使用的文件
    fn resolve(&self) -> Result<Option<PathBuf>> {
        match self {
            LayerSource::Candidates(candidates) => Ok(first_existing(candidates)),
            LayerSource::Explicit(path) if path.exists() => Ok(Some(path.clone())),
            LayerSource::Explicit(path) => Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into()),
        }
    }

    fn paths(&self) -> Vec<PathBuf> {
        match self {
            LayerSource::Candidates(candidates) => candidates.clone(),
            LayerSource::Explicit(path) => vec![path.clone()],
        }
    }
}

/// 实际使用的配置文件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub user: Option<PathBuf>,
    pub defaults: Option<PathBuf>,
}

/// 一次加载的完整结果
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
    pub sources: ConfigSources,
}

/// YAML配置加载器实现
#[derive(Debug, Clone)]
pub struct YamlConfigLoader {
    /// 用户层来源
    user: LayerSource,
    /// 默认层来源
    defaults: LayerSource,
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
}

impl YamlConfigLoader {
    /// 创建使用默认候选路径的加载器
    ///
    /// # 参数
    /// * `enable_env_substitution` - 是否启用环境变量替换
    pub fn new(enable_env_substitution: bool) -> Self {
        Self {
            user: LayerSource::Candidates(user_config_candidates()),
            defaults: LayerSource::Candidates(default_config_candidates()),
            enable_env_substitution,
        }
    }

    /// 指定用户层配置文件
    pub fn with_user_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.user = LayerSource::Explicit(path.into());
        self
    }

    /// 指定默认层配置文件
    pub fn with_default_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults = LayerSource::Explicit(path.into());
        self
    }

    /// 替换两层的候选路径
    pub fn with_candidates(mut self, user: Vec<PathBuf>, defaults: Vec<PathBuf>) -> Self {
        self.user = LayerSource::Candidates(user);
        self.defaults = LayerSource::Candidates(defaults);
        self
    }

    /// 从YAML文本加载配置，不涉及文件系统
    ///
    /// # 参数
    /// * `user` - 用户层内容
    /// * `defaults` - 默认层内容
    ///
    /// # 返回
    /// * `Result<LoadOutcome>` - 配置与告警
    pub fn load_from_strings(
        &self,
        user: Option<&str>,
        defaults: Option<&str>,
    ) -> Result<LoadOutcome> {
        let user = user.map(|text| self.substitute_env_vars(text)).transpose()?;
        let defaults = defaults
            .map(|text| self.substitute_env_vars(text))
            .transpose()?;

        let layers = YamlLayers::from_strings(user.as_deref(), defaults.as_deref())?;
        let mut warnings = Vec::new();
        let config = Config::from_layers(&layers, &mut warnings)?;

        debug!(
            "配置解析完成: {} 个默认查询, {} 条进程规则",
            config.default_bean_queries.len(),
            config.process_rules.len()
        );

        Ok(LoadOutcome {
            config,
            warnings,
            sources: ConfigSources::default(),
        })
    }

    /// 替换字符串中的环境变量
    ///
    /// # 参数
    /// * `content` - 要处理的字符串
    ///
    /// # 返回
    /// * `Result<String>` - 替换后的字符串或错误
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        // 匹配 ${VAR_NAME} 格式的环境变量
        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match std::env::var(var_name) {
                Ok(value) => {
                    result = result.replace(full_match, &value);
                }
                Err(_) => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    fn read_layer(path: Option<&Path>) -> Result<Option<String>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(path)
            .inspect_err(|e| error!("读取配置文件 {} 失败: {}", path.display(), e))?;
        Ok(Some(content))
    }
}

impl Default for YamlConfigLoader {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConfigLoader for YamlConfigLoader {
    fn load_outcome(&self) -> Result<LoadOutcome> {
        let sources = ConfigSources {
            user: self.user.resolve()?,
            defaults: self.defaults.resolve()?,
        };

        let mut missing = Vec::new();
        for (layer, path) in [
            (ConfigLayer::User, &sources.user),
            (ConfigLayer::Default, &sources.defaults),
        ] {
            match path {
                Some(path) => info!("使用{}配置文件: {}", layer, path.display()),
                None => {
                    let warning = ConfigWarning::ConfigFileMissing { layer };
                    warn!("{}", warning);
                    missing.push(warning);
                }
            }
        }

        let user = Self::read_layer(sources.user.as_deref())?;
        let defaults = Self::read_layer(sources.defaults.as_deref())?;

        let mut outcome = self.load_from_strings(user.as_deref(), defaults.as_deref())?;
        missing.append(&mut outcome.warnings);
        outcome.warnings = missing;
        outcome.sources = sources;

        Ok(outcome)
    }

    fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.user.paths();
        paths.extend(self.defaults.paths());
        paths
    }
}

/// 返回第一个存在的候选路径
pub fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

/// 用户层候选路径：当前目录、用户配置目录、/etc
pub fn user_config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(USER_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("jmx-vitals").join(USER_CONFIG_FILE));
    }
    candidates.push(Path::new("/etc/jmx-vitals").join(USER_CONFIG_FILE));
    candidates
}

/// 默认层候选路径：当前目录、/etc
pub fn default_config_candidates() -> Vec<PathBuf> {
    vec![
        PathBuf::from(DEFAULT_CONFIG_FILE),
        Path::new("/etc/jmx-vitals").join(DEFAULT_CONFIG_FILE),
    ]
}
