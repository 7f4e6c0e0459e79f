//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{
    BeanQuery, Config, ConfigDiff, ConfigLoader, ConfigManager, LoadOutcome, Unit,
};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Yaml => {
                    println!("name: {}", crate::APP_NAME);
                    println!("version: {}", crate::VERSION);
                    println!("description: {}", crate::APP_DESCRIPTION);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 取用启动时预加载的结果，没有时重新加载
fn preloaded_or_load(preloaded: &Option<LoadOutcome>, args: &Args) -> Result<LoadOutcome> {
    match preloaded {
        Some(outcome) => Ok(outcome.clone()),
        None => args.loader().load_outcome(),
    }
}

/// 配置验证命令
#[derive(Default)]
pub struct ValidateCommand {
    /// 启动时已加载的配置
    preloaded: Option<LoadOutcome>,
}

impl ValidateCommand {
    pub fn new(preloaded: Option<LoadOutcome>) -> Self {
        Self { preloaded }
    }
}

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Validate { verbose } = &args.command else {
            return Ok(());
        };

        let outcome = match preloaded_or_load(&self.preloaded, args) {
            Ok(outcome) => outcome,
            Err(e) => {
                println!("❌ 配置无效: {}", e);
                return Err(e);
            }
        };

        println!("✅ 配置有效");
        print_sources(&outcome);
        println!("   日志级别: {}", outcome.config.log_level);
        println!("   默认查询: {}", outcome.config.default_bean_queries.len());
        println!("   进程规则: {}", outcome.config.process_rules.len());
        println!("   查询总数: {}", outcome.config.query_count());

        if !outcome.warnings.is_empty() {
            println!();
            println!("⚠️  告警 ({}):", outcome.warnings.len());
            for warning in &outcome.warnings {
                println!("   - {}", warning);
            }
        }

        if *verbose {
            let empty = outcome.config.queries_without_attributes();
            if !empty.is_empty() {
                println!();
                println!("ℹ️  以下查询没有配置属性，不会采集任何数据:");
                for (rule, query) in empty {
                    match rule {
                        Some(rule) => println!("   - [{}] {}", rule, query.object_name),
                        None => println!("   - [default] {}", query.object_name),
                    }
                }
            }
            println!();
            print!("{}", render_text(&outcome.config));
        }

        Ok(())
    }
}

/// 配置输出命令
#[derive(Default)]
pub struct ShowCommand {
    /// 启动时已加载的配置
    preloaded: Option<LoadOutcome>,
}

impl ShowCommand {
    pub fn new(preloaded: Option<LoadOutcome>) -> Self {
        Self { preloaded }
    }
}

#[async_trait]
impl Command for ShowCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Show { format } = &args.command else {
            return Ok(());
        };

        let outcome = preloaded_or_load(&self.preloaded, args)?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome.config)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&outcome.config)?),
            OutputFormat::Text => print!("{}", render_text(&outcome.config)),
        }
        Ok(())
    }
}

/// 单位表中的一行
#[derive(Debug, Serialize)]
struct UnitRow {
    id: u32,
    name: &'static str,
    alias: Option<&'static str>,
}

/// 单位列表命令
pub struct UnitsCommand;

#[async_trait]
impl Command for UnitsCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Units { format } = &args.command else {
            return Ok(());
        };

        let rows: Vec<UnitRow> = Unit::ALL
            .iter()
            .map(|unit| UnitRow {
                id: unit.id(),
                name: unit.name(),
                alias: unit.alias(),
            })
            .collect();

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&rows)?),
            OutputFormat::Text => {
                println!("{:<4} {:<14} {}", "ID", "UNIT", "ALIAS");
                for row in rows {
                    println!("{:<4} {:<14} {}", row.id, row.name, row.alias.unwrap_or("-"));
                }
            }
        }
        Ok(())
    }
}

/// 配置监控命令
#[derive(Default)]
pub struct WatchCommand {
    /// 启动时已加载的配置
    preloaded: Option<LoadOutcome>,
}

impl WatchCommand {
    pub fn new(preloaded: Option<LoadOutcome>) -> Self {
        Self { preloaded }
    }
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        let Commands::Watch { debounce_ms } = &args.command else {
            return Ok(());
        };

        let loader: Arc<dyn ConfigLoader> = Arc::new(args.loader());
        let initial = preloaded_or_load(&self.preloaded, args)?.config;

        let (mut manager, mut updates) = ConfigManager::new(initial);
        manager.enable_hot_reload(Arc::clone(&loader), Duration::from_millis(*debounce_ms))?;

        println!("👀 正在监控配置文件，按 Ctrl+C 退出");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("收到退出信号，停止监控");
                    break;
                }
                notification = updates.recv() => {
                    let Ok(notification) = notification else {
                        break;
                    };
                    println!("🔄 配置已更新到版本 {}", notification.version);
                    for diff in &notification.diffs {
                        println!("   - {}", describe_diff(diff));
                    }
                }
            }
        }

        Ok(())
    }
}

fn describe_diff(diff: &ConfigDiff) -> String {
    match diff {
        ConfigDiff::LogLevelModified { old, new } => format!("日志级别: {} -> {}", old, new),
        ConfigDiff::DefaultBeansModified => "默认查询已修改".to_string(),
        ConfigDiff::ProcessRuleAdded(name) => format!("新增进程规则: {}", name),
        ConfigDiff::ProcessRuleRemoved(name) => format!("移除进程规则: {}", name),
        ConfigDiff::ProcessRuleModified(name) => format!("修改进程规则: {}", name),
    }
}

fn print_sources(outcome: &LoadOutcome) {
    let describe = |path: &Option<std::path::PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<未找到>".to_string())
    };
    println!("   用户配置: {}", describe(&outcome.sources.user));
    println!("   默认配置: {}", describe(&outcome.sources.defaults));
}

/// 以缩进文本输出配置
pub fn render_text(config: &Config) -> String {
    fn render_queries(out: &mut String, queries: &[BeanQuery], indent: &str) {
        for query in queries {
            out.push_str(&format!("{indent}{}\n", query.object_name));
            for attribute in &query.attributes {
                out.push_str(&format!(
                    "{indent}  - {} ({}, {})\n",
                    attribute.name, attribute.kind, attribute.unit
                ));
            }
        }
    }

    let mut out = format!("log_level: {}\n", config.log_level);

    out.push_str("default_beans:\n");
    render_queries(&mut out, &config.default_bean_queries, "  ");

    out.push_str("per_process_beans:\n");
    for (name, rule) in &config.process_rules {
        out.push_str(&format!("  {} (pattern: {})\n", name, rule.pattern));
        render_queries(&mut out, &rule.queries, "    ");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YamlConfigLoader;
    use clap::Parser;

    #[test]
    fn test_render_text() {
        let outcome = YamlConfigLoader::default()
            .load_from_strings(
                Some(
                    r#"
jmx:
  default_beans:
    - query: "java.lang:type=Memory"
      attributes: [{name: HeapMemoryUsage, unit: B}]
  per_process_beans:
    kafka:
      pattern: kafka.Kafka
      beans:
        - query: "kafka.server:type=BrokerTopicMetrics,name=*"
          attributes: [{name: Count, type: counter}]
"#,
                ),
                None,
            )
            .unwrap();

        let text = render_text(&outcome.config);
        assert!(text.starts_with("log_level: info\n"));
        assert!(text.contains("  java.lang:type=Memory\n    - HeapMemoryUsage (rate, BYTE)\n"));
        assert!(text.contains("  kafka (pattern: kafka.Kafka)\n"));
        assert!(text.contains("      - Count (counter, NONE)\n"));
    }

    #[test]
    fn test_preloaded_outcome_is_reused() {
        let outcome = YamlConfigLoader::default()
            .load_from_strings(Some("log: {file_priority: debug}"), None)
            .unwrap();
        // 指向不存在的文件，重新加载必然失败
        let args = crate::cli::args::Args::try_parse_from([
            "jmx-vitals",
            "--config",
            "/nonexistent/jmx-vitals.yaml",
            "validate",
        ])
        .unwrap();

        let reused = preloaded_or_load(&Some(outcome), &args).unwrap();
        assert_eq!(reused.config.log_level, crate::config::LogLevel::Debug);
        assert!(preloaded_or_load(&None, &args).is_err());
    }

    #[tokio::test]
    async fn test_show_uses_preloaded_outcome() {
        let outcome = YamlConfigLoader::default()
            .load_from_strings(None, None)
            .unwrap();
        let args = crate::cli::args::Args::try_parse_from([
            "jmx-vitals",
            "--config",
            "/nonexistent/jmx-vitals.yaml",
            "show",
        ])
        .unwrap();

        assert!(ShowCommand::new(Some(outcome)).execute(&args).await.is_ok());
        assert!(ShowCommand::default().execute(&args).await.is_err());
    }

    #[test]
    fn test_describe_diff() {
        assert_eq!(
            describe_diff(&ConfigDiff::ProcessRuleAdded("web".to_string())),
            "新增进程规则: web"
        );
    }
}
