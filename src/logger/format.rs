//! Log formatting and output
//!
//! Handles:
//! - Colorized console output with tag and level columns
//! - Mirroring every line into the `log` facade (target = tag)
//! - Broken pipe handling for piped commands

use super::config::get_logger_config;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Column widths for alignment
const TAG_WIDTH: usize = 9;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str) {
    let config = get_logger_config();
    let time = Local::now().format("%H:%M:%S").to_string();

    let line = if config.use_colors {
        format!(
            "{} [{}] [{}] {}",
            time.dimmed(),
            format_tag(tag),
            format_level(level),
            message
        )
    } else {
        format!(
            "{} [{:<tag_width$}] [{:<level_width$}] {}",
            time,
            tag.to_plain_string(),
            level.as_str(),
            message,
            tag_width = TAG_WIDTH,
            level_width = LEVEL_WIDTH
        )
    };
    print_stdout_safe(&line);

    log::log!(target: "dashsync", level.to_log_level(), "[{}] {}", tag, message);
}

/// Format a tag with its color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Cache => label.bright_cyan().bold(),
        LogTag::Broker => label.bright_magenta().bold(),
        LogTag::Scheduler => label.bright_blue().bold(),
        LogTag::Stream => label.bright_green().bold(),
        LogTag::Endpoint => label.bright_purple().bold(),
        LogTag::Test => label.blue().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

/// Format a level with its color
fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug => label.bright_black(),
        LogLevel::Verbose => label.dimmed(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            return;
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    let _ = out.flush();
}
