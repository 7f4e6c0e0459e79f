//! 配置文件监控模块
//!
//! 监控用户层和默认层配置文件，变更时重新构造完整配置

use crate::config::loader::ConfigLoader;
use crate::config::types::Config;
use crate::config::warning::ConfigWarning;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// 配置变更事件
#[derive(Debug, Clone)]
pub struct ConfigChangeEvent {
    /// 触发重载的文件
    pub changed_path: PathBuf,
    /// 新配置
    pub new_config: Config,
    /// 重载过程中的告警
    pub warnings: Vec<ConfigWarning>,
    /// 变更时间
    pub timestamp: DateTime<Utc>,
}

/// 配置文件监控器
pub struct ConfigWatcher {
    /// 监控的配置文件（绝对路径）
    paths: Vec<PathBuf>,
    /// 文件系统监控器
    watcher: Option<RecommendedWatcher>,
    /// 配置加载器
    loader: Arc<dyn ConfigLoader>,
    /// 事件发送器
    event_sender: broadcast::Sender<ConfigChangeEvent>,
    /// 防抖动延迟
    debounce_delay: Duration,
}

impl ConfigWatcher {
    /// 创建新的配置监控器
    ///
    /// # 参数
    /// * `loader` - 用于重新加载的配置加载器
    /// * `debounce_delay` - 防抖动延迟时间
    ///
    /// # 返回
    /// * `Result<(Self, broadcast::Receiver<ConfigChangeEvent>)>` - 监控器和事件接收器
    pub fn new(
        loader: Arc<dyn ConfigLoader>,
        debounce_delay: Duration,
    ) -> Result<(Self, broadcast::Receiver<ConfigChangeEvent>)> {
        let paths = loader
            .watched_paths()
            .iter()
            .map(std::path::absolute)
            .collect::<std::io::Result<Vec<_>>>()
            .context("解析配置文件路径失败")?;

        let (event_sender, event_receiver) = broadcast::channel(32);

        let watcher = Self {
            paths,
            watcher: None,
            loader,
            event_sender,
            debounce_delay,
        };

        Ok((watcher, event_receiver))
    }

    /// 需要监控的目录：配置文件所在的已存在目录
    fn watch_dirs(&self) -> BTreeSet<PathBuf> {
        self.paths
            .iter()
            .filter_map(|path| path.parent())
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
            .collect()
    }

    /// 启动配置文件监控
    ///
    /// # 返回
    /// * `Result<()>` - 启动结果
    pub fn start(&mut self) -> Result<()> {
        let dirs = self.watch_dirs();
        if dirs.is_empty() {
            warn!("没有可监控的配置目录");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            notify::Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .context("创建文件监控器失败")?;

        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("监控目录失败: {}", dir.display()))?;
            info!("启动配置目录监控: {}", dir.display());
        }

        self.watcher = Some(watcher);

        let paths = self.paths.clone();
        let event_sender = self.event_sender.clone();
        let loader = Arc::clone(&self.loader);
        let debounce_delay = self.debounce_delay;

        tokio::spawn(async move {
            Self::handle_file_events(rx, paths, event_sender, loader, debounce_delay).await;
        });

        info!("配置文件监控已启动");
        Ok(())
    }

    /// 处理文件系统事件
    async fn handle_file_events(
        mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
        paths: Vec<PathBuf>,
        event_sender: broadcast::Sender<ConfigChangeEvent>,
        loader: Arc<dyn ConfigLoader>,
        debounce_delay: Duration,
    ) {
        let mut last_event_time: Option<Instant> = None;

        while let Some(res) = rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("文件监控事件错误: {}", e);
                    continue;
                }
            };

            let Some(changed_path) = Self::target_file_of(&event, &paths) else {
                continue;
            };

            debug!("检测到配置文件变更事件: {:?}", event);

            // 防抖动处理
            let now = Instant::now();
            if let Some(last_time) = last_event_time {
                if now.duration_since(last_time) < debounce_delay {
                    debug!("跳过重复事件（防抖动）");
                    continue;
                }
            }
            last_event_time = Some(now);

            // 延迟处理，确保文件写入完成
            tokio::time::sleep(debounce_delay).await;

            match Self::reload_config(loader.as_ref(), changed_path) {
                Ok(change_event) => {
                    if let Err(e) = event_sender.send(change_event) {
                        error!("发送配置变更事件失败: {}", e);
                    }
                }
                Err(e) => {
                    error!("配置重载失败，继续使用当前配置: {:#}", e);
                }
            }
        }
    }

    /// 返回事件涉及的被监控文件
    fn target_file_of(event: &Event, targets: &[PathBuf]) -> Option<PathBuf> {
        match &event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => event
                .paths
                .iter()
                .find(|path| targets.contains(path))
                .cloned(),
            _ => None,
        }
    }

    /// 重新加载配置
    fn reload_config(loader: &dyn ConfigLoader, changed_path: PathBuf) -> Result<ConfigChangeEvent> {
        debug!("重新加载配置，触发文件: {}", changed_path.display());

        let outcome = loader.load_outcome().context("重新加载配置失败")?;

        Ok(ConfigChangeEvent {
            changed_path,
            new_config: outcome.config,
            warnings: outcome.warnings,
            timestamp: Utc::now(),
        })
    }

    /// 停止监控
    pub fn stop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            drop(watcher);
            info!("配置文件监控已停止");
        }
    }

    /// 监控的配置文件
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
