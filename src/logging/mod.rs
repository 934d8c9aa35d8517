//! 日志初始化与计时工具
//!
//! 容器自身只产生 `tracing` 事件；由宿主程序决定是否调用 `init_logging`
//! 安装订阅者。`RUST_LOG` 优先于配置中的日志级别。

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志环境配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingEnvironment {
    /// 开发环境
    Development,
    /// 测试环境
    Testing,
    /// 生产环境
    Production,
}

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 人类可读格式
    Pretty,
    /// JSON 格式
    Json,
    /// 紧凑格式
    Compact,
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub environment: LoggingEnvironment,
    pub level: Level,
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: LoggingEnvironment::Development,
            level: Level::INFO,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            environment: LoggingEnvironment::Development,
            level: Level::DEBUG,
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: true,
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        Self {
            environment: LoggingEnvironment::Production,
            level: Level::INFO,
            format: LogFormat::Json,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 创建测试环境配置
    pub fn testing() -> Self {
        Self {
            environment: LoggingEnvironment::Testing,
            level: Level::ERROR,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_lowercase()))
    }
}

/// 初始化日志系统
///
/// 全局订阅者只能安装一次，重复调用返回错误。
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = config.env_filter();
    let ansi = config.environment != LoggingEnvironment::Production;

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(ansi),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(ansi),
            )
            .try_init(),
    };
    installed.context("failed to install tracing subscriber")?;

    tracing::info!(
        environment = ?config.environment,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );
    Ok(())
}

/// 操作计时器，结束时输出 debug 事件
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    metadata: BTreeMap<&'static str, String>,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            metadata: BTreeMap::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: &'static str, value: &str) -> Self {
        self.metadata.insert(key, value.to_string());
        self
    }

    /// 完成计时并记录日志
    pub fn finish(self, success: bool) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = self.operation,
            success,
            elapsed_us = duration.as_micros() as u64,
            metadata = ?self.metadata,
            "Operation completed"
        );
        duration
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
