//! Status lines and build summaries, written to stderr.

use std::time::Duration;

use console::style;
use cube_bundler::BuildReport;

/// Respect `--no-color` and `NO_COLOR`; otherwise let `console` detect the
/// terminal.
pub fn init_colors(no_color: bool) {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// `850ms`, `1.25s` or `2m 5s`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One line per recoverable error, then the totals.
pub fn print_report(report: &BuildReport) {
    for err in &report.errors {
        error(&err.to_string());
    }

    let summary = format!(
        "{} files in {}s ({})",
        report.total,
        report.elapsed_seconds(),
        format_duration(report.elapsed)
    );
    if report.is_clean() {
        success(&summary);
    } else {
        warning(&format!("{summary}, {} error(s)", report.errors.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_a_readable_unit() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(1250)), "1.25s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
