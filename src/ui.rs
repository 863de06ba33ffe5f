use colored::{Color, Colorize};
use fleet::ErrorHostMap;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

/// Print which hosts failed and why
pub fn error_summary(errors: &ErrorHostMap) {
    if errors.is_empty() {
        return;
    }
    section(&format!("Failed hosts ({})", errors.len()));
    for (host, err) in errors {
        println!("  {} {}: {}", "✗".red(), host.bold(), err);
    }
}

// ============================================================================
// Tables
// ============================================================================

/// One table cell, optionally colored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    text: String,
    color: Option<Color>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

/// Lay out a table as lines; padding is computed on the uncolored text
pub fn table_lines(headers: &[String], rows: &[Vec<Cell>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.text.chars().count());
            }
        }
    }

    let header = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}").bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    let rule = widths
        .iter()
        .map(|w| "─".repeat(*w))
        .collect::<Vec<_>>()
        .join("  ");

    let mut lines = vec![header, rule];
    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let padded = format!("{:<w$}", cell.text);
                match cell.color {
                    Some(color) => padded.color(color).to_string(),
                    None => padded,
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Print a table
pub fn table(headers: &[String], rows: &[Vec<Cell>]) {
    for line in table_lines(headers, rows) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_columns_align() {
        colored::control::set_override(false);
        let headers = vec!["Node ID".to_string(), "IP".to_string()];
        let rows = vec![
            vec![Cell::plain("node-1"), Cell::plain("10.0.0.1")],
            vec![Cell::plain("validator-22"), Cell::plain("10.0.0.22")],
        ];

        let lines = table_lines(&headers, &rows);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Node ID       IP       ");
        assert_eq!(lines[2], "node-1        10.0.0.1");
        assert_eq!(lines[3], "validator-22  10.0.0.22");
    }
}
