//! # Logging モジュール
//!
//! 軌道シミュレーターのログ出力を設定します。
//!
//! コンソールには compact 形式、ファイルには JSON 形式で出力します。
//! ファイル出力は tracing-appender の日次ローテーションと非同期ライターを使用します。
//!
//! ## 設定可能な出力先
//!
//! - `Console`: コンソールのみ
//! - `File`: ファイルのみ（`<log_dir>/orbitsim.YYYY-MM-DD`）
//! - `Both`: コンソールとファイルの両方
//!
//! `RUST_LOG` 環境変数が設定されている場合は、指定レベルより優先されます。

use std::path::Path;
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Registry,
};

/// ログ出力先の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogOutput {
    /// コンソールのみ
    Console,
    /// ファイルのみ
    File,
    /// コンソールとファイルの両方
    Both,
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(format!("無効な出力先: {}. 利用可能: console, file, both", s)),
        }
    }
}

/// ログ設定構造体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル
    pub level: Level,
    /// 出力先
    pub output: LogOutput,
    /// ログファイルのディレクトリ（Fileまたは Bothの場合）
    pub log_dir: String,
    /// ログファイル名のプレフィックス
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: "logs".to_string(),
            file_prefix: "orbitsim".to_string(),
        }
    }
}

/// ログシステムを初期化
///
/// ファイル出力を伴う場合はログディレクトリを作成し、非同期ライターの
/// ガードをプロセス終了まで保持します。グローバルサブスクライバーが
/// 既に設定されている場合はエラーを返します。
///
/// ```no_run
/// use orbitsim::logging::{init_logging, LogConfig, LogOutput};
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     output: LogOutput::Console,
///     ..LogConfig::default()
/// };
/// init_logging(config)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = build_filter(config.level);

    match config.output {
        LogOutput::Console => {
            Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .try_init()?;
        }
        LogOutput::File => {
            let (writer, guard) = file_writer(&config)?;

            Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .json(),
                )
                .try_init()?;

            // プロセス終了まで非同期書き込みを維持
            std::mem::forget(guard);
        }
        LogOutput::Both => {
            let (writer, guard) = file_writer(&config)?;

            Registry::default()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_ansi(false)
                        .json(),
                )
                .try_init()?;

            std::mem::forget(guard);
        }
    }

    Ok(())
}

fn build_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_string()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_writer(config: &LogConfig) -> Result<(NonBlocking, WorkerGuard), std::io::Error> {
    ensure_log_directory(&config.log_dir)?;
    let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
    Ok(non_blocking(file_appender))
}

/// ログレベルを文字列から解析（無効な場合は INFO）
pub fn parse_log_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("警告: 無効なログレベル '{}'. INFOを使用します", level_str);
            Level::INFO
        }
    }
}

/// ログディレクトリが存在しない場合は作成
pub fn ensure_log_directory<P: AsRef<Path>>(log_dir: P) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_output_from_str() {
        assert_eq!(LogOutput::from_str("console"), Ok(LogOutput::Console));
        assert_eq!(LogOutput::from_str("file"), Ok(LogOutput::File));
        assert_eq!(LogOutput::from_str("both"), Ok(LogOutput::Both));
        assert!(LogOutput::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_output_aliases() {
        assert_eq!("STDOUT".parse::<LogOutput>(), Ok(LogOutput::Console));
        assert_eq!("all".parse::<LogOutput>(), Ok(LogOutput::Both));
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.output, LogOutput::Console);
        assert_eq!(config.file_prefix, "orbitsim");
    }

    #[test]
    fn test_ensure_log_directory() {
        let dir = std::env::temp_dir().join(format!("orbitsim-log-test-{}", std::process::id()));
        ensure_log_directory(&dir).unwrap();
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Level::DEBUG);
        assert_eq!(parse_log_level("INFO"), Level::INFO);
        assert_eq!(parse_log_level("Warn"), Level::WARN);
        assert_eq!(parse_log_level("invalid"), Level::INFO);
    }
}