//! 配置管理器模块
//!
//! 持有当前配置快照，重载时整体替换，不在原地修改

use crate::config::loader::ConfigLoader;
use crate::config::types::{Config, LogLevel};
use crate::config::watcher::{ConfigChangeEvent, ConfigWatcher};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 配置差异类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigDiff {
    /// 日志级别修改
    LogLevelModified { old: LogLevel, new: LogLevel },
    /// 默认查询修改
    DefaultBeansModified,
    /// 进程规则添加
    ProcessRuleAdded(String),
    /// 进程规则移除
    ProcessRuleRemoved(String),
    /// 进程规则修改
    ProcessRuleModified(String),
}

/// 配置变更通知
#[derive(Debug, Clone)]
pub struct ConfigUpdateNotification {
    /// 配置版本号
    pub version: u64,
    /// 配置差异列表
    pub diffs: Vec<ConfigDiff>,
    /// 变更时间
    pub timestamp: DateTime<Utc>,
}

/// 配置管理器
pub struct ConfigManager {
    /// 当前配置快照
    current_config: Arc<RwLock<Arc<Config>>>,
    /// 配置版本号
    version: Arc<RwLock<u64>>,
    /// 配置文件监控器
    watcher: Option<ConfigWatcher>,
    /// 配置更新通知发送器
    update_sender: broadcast::Sender<ConfigUpdateNotification>,
}

impl ConfigManager {
    /// 创建新的配置管理器
    ///
    /// # 参数
    /// * `initial_config` - 初始配置
    ///
    /// # 返回
    /// * `(Self, broadcast::Receiver<ConfigUpdateNotification>)` - 管理器和更新通知接收器
    pub fn new(initial_config: Config) -> (Self, broadcast::Receiver<ConfigUpdateNotification>) {
        let (update_sender, update_receiver) = broadcast::channel(32);

        let manager = Self {
            current_config: Arc::new(RwLock::new(Arc::new(initial_config))),
            version: Arc::new(RwLock::new(1)),
            watcher: None,
            update_sender,
        };

        (manager, update_receiver)
    }

    /// 启用配置文件监控
    ///
    /// # 参数
    /// * `loader` - 重载时使用的加载器
    /// * `debounce_delay` - 防抖动延迟
    pub fn enable_hot_reload(
        &mut self,
        loader: Arc<dyn ConfigLoader>,
        debounce_delay: Duration,
    ) -> Result<()> {
        info!("启用配置热重载功能");

        let (mut watcher, change_receiver) =
            ConfigWatcher::new(loader, debounce_delay).context("创建配置监控器失败")?;

        watcher.start().context("启动配置监控失败")?;
        self.watcher = Some(watcher);

        self.start_change_handler(change_receiver);

        info!("配置热重载功能已启用");
        Ok(())
    }

    /// 启动配置变更处理任务
    fn start_change_handler(&self, mut receiver: broadcast::Receiver<ConfigChangeEvent>) {
        let current_config = Arc::clone(&self.current_config);
        let version = Arc::clone(&self.version);
        let update_sender = self.update_sender.clone();

        tokio::spawn(async move {
            while let Ok(change_event) = receiver.recv().await {
                info!("处理配置变更: {}", change_event.changed_path.display());
                for warning in &change_event.warnings {
                    warn!("{}", warning);
                }
                Self::swap_config(
                    change_event.new_config,
                    &current_config,
                    &version,
                    &update_sender,
                )
                .await;
            }
        });
    }

    /// 整体替换配置快照，无差异时不更新版本
    async fn swap_config(
        new_config: Config,
        current_config: &RwLock<Arc<Config>>,
        version: &RwLock<u64>,
        update_sender: &broadcast::Sender<ConfigUpdateNotification>,
    ) -> u64 {
        let mut config = current_config.write().await;
        let diffs = Self::calculate_config_diff(&config, &new_config);

        let mut ver = version.write().await;
        if diffs.is_empty() {
            debug!("配置无实质性变更，跳过更新");
            return *ver;
        }

        *config = Arc::new(new_config);
        *ver += 1;

        let notification = ConfigUpdateNotification {
            version: *ver,
            diffs,
            timestamp: Utc::now(),
        };

        if let Err(e) = update_sender.send(notification) {
            warn!("发送配置更新通知失败: {}", e);
        }

        info!("配置更新完成，版本: {}", *ver);
        *ver
    }

    /// 计算配置差异
    fn calculate_config_diff(old_config: &Config, new_config: &Config) -> Vec<ConfigDiff> {
        let mut diffs = Vec::new();

        if old_config.log_level != new_config.log_level {
            diffs.push(ConfigDiff::LogLevelModified {
                old: old_config.log_level,
                new: new_config.log_level,
            });
        }

        if old_config.default_bean_queries != new_config.default_bean_queries {
            diffs.push(ConfigDiff::DefaultBeansModified);
        }

        // 检查新增和修改的规则
        for (name, new_rule) in &new_config.process_rules {
            match old_config.process_rules.get(name) {
                Some(old_rule) if old_rule != new_rule => {
                    diffs.push(ConfigDiff::ProcessRuleModified(name.clone()));
                }
                Some(_) => {}
                None => diffs.push(ConfigDiff::ProcessRuleAdded(name.clone())),
            }
        }

        // 检查删除的规则
        for name in old_config.process_rules.keys() {
            if !new_config.process_rules.contains_key(name) {
                diffs.push(ConfigDiff::ProcessRuleRemoved(name.clone()));
            }
        }

        diffs
    }

    /// 获取当前配置快照
    pub async fn get_config(&self) -> Arc<Config> {
        Arc::clone(&*self.current_config.read().await)
    }

    /// 获取当前版本号
    pub async fn get_version(&self) -> u64 {
        *self.version.read().await
    }

    /// 手动替换配置
    ///
    /// # 参数
    /// * `new_config` - 新配置
    ///
    /// # 返回
    /// * `u64` - 替换后的版本号
    pub async fn replace_config(&self, new_config: Config) -> u64 {
        info!("手动更新配置");
        Self::swap_config(
            new_config,
            &self.current_config,
            &self.version,
            &self.update_sender,
        )
        .await
    }

    /// 获取配置更新通知接收器
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateNotification> {
        self.update_sender.subscribe()
    }
}
