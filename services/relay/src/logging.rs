//! 日志系统模块职责：
//! 1. 初始化 stderr tracing 日志，stdout 只留给命令输出（token、JSON）。
//! 2. 设置 `RELAY_LOG_DIR` 时额外按天滚动写文件日志。

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// 文件日志目录环境变量。
const LOG_DIR_ENV: &str = "RELAY_LOG_DIR";
/// 文件日志级别环境变量（独立于 `RUST_LOG`）。
const FILE_LOG_LEVEL_ENV: &str = "RELAY_FILE_LOG_LEVEL";
/// stderr 默认日志过滤。
const DEFAULT_CONSOLE_FILTER: &str = "info";

/// 日志运行时守卫，防止 non-blocking writer 提前析构。
pub(crate) struct LogRuntime {
    _console_guard: WorkerGuard,
    _file_guard: Option<WorkerGuard>,
}

/// 初始化日志系统。
pub(crate) fn init(service_name: &str) -> Result<LogRuntime> {
    let (console_writer, console_guard) = tracing_appender::non_blocking(std::io::stderr());
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(console_writer)
        .with_ansi(false)
        .with_target(false)
        .compact()
        .with_filter(resolve_console_env_filter());

    let (file_layer, file_guard) = match resolve_log_dir() {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("create log dir: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, format!("{service_name}.log"));
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(resolve_file_level_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(LogRuntime {
        _console_guard: console_guard,
        _file_guard: file_guard,
    })
}

/// 优先 `RUST_LOG`，回退默认级别。
fn resolve_console_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER))
}

fn resolve_file_level_filter() -> LevelFilter {
    std::env::var(FILE_LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::DEBUG)
}

fn resolve_log_dir() -> Option<PathBuf> {
    let raw = std::env::var(LOG_DIR_ENV).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}
