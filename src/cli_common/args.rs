//! Общие аргументы командной строки для CLI утилит

use clap::Parser;
use std::path::PathBuf;

use super::output::OutputFormat;

/// Общие аргументы для всех CLI команд
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (TOML or YAML); defaults apply when absent
    #[arg(long, global = true, default_value = "fmtast.toml")]
    pub config: PathBuf,

    /// Output format (text, json, table); overrides the config file
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,
}

impl CommonArgs {
    /// Определяет уровень логирования на основе флагов
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Проверяет, нужно ли выводить информацию
    pub fn should_print(&self) -> bool {
        !self.quiet
    }
}
