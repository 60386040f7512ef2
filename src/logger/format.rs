//! Log formatting and colored console output

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Width used to align tags in the console output
const TAG_WIDTH: usize = 10;

/// Format and print a single log line
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let time = Local::now().format("%H:%M:%S").to_string();
    let line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_level(level),
        message
    );
    print_stdout_safe(&line);
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.as_str(), width = TAG_WIDTH);
    match tag {
        LogTag::System | LogTag::Config => padded.bright_yellow().bold(),
        LogTag::Scheduler => padded.bright_green().bold(),
        LogTag::Confirm => padded.bright_cyan().bold(),
        LogTag::Price | LogTag::Swap => padded.bright_blue().bold(),
        LogTag::Lock | LogTag::Store => padded.bright_magenta().bold(),
        LogTag::Chain => padded.bright_white().bold(),
        LogTag::Database => padded.bright_black().bold(),
        LogTag::Events | LogTag::Notify => padded.cyan().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    match level {
        LogLevel::Error => level.as_str().bright_red().bold(),
        LogLevel::Warning => level.as_str().bright_yellow(),
        LogLevel::Info => level.as_str().bright_green(),
        LogLevel::Debug => level.as_str().bright_blue(),
        LogLevel::Verbose => level.as_str().dimmed(),
    }
}

/// Print without panicking when stdout is a closed pipe
fn print_stdout_safe(line: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() != ErrorKind::BrokenPipe {
            eprintln!("{}", line);
        }
    }
}
