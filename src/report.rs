//! Risk-report text export
//!
//! Renders the assembled risk report as a paginated plain-text document:
//! a title header, the malicious verdict, then every entry exactly once in
//! mapper order, numbered, with long answers wrapped. Pages are separated
//! by a form feed plus a page header so the export prints cleanly.

use crate::projection::RiskReport;

/// Maximum content lines per exported page.
const LINES_PER_PAGE: usize = 48;

/// Wrap width for answer text.
const WRAP_WIDTH: usize = 90;

/// Render the report as a paginated text document.
pub fn render_text(report: &RiskReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("Threat Analysis Report".to_string());
    lines.push(format!(
        "Malicious: {}",
        if report.malicious { "Yes" } else { "No" }
    ));
    if !report.risk_evaluation.is_empty() {
        lines.push(format!("Risk evaluation: {}", report.risk_evaluation));
    }
    if !report.summary.is_empty() {
        lines.push(format!("Summary: {}", report.summary));
    }
    lines.push(String::new());

    for (index, entry) in report.entries.iter().enumerate() {
        lines.push(format!("{}. {}", index + 1, entry.query));
        for wrapped in wrap(&entry.answer_text(), WRAP_WIDTH) {
            lines.push(format!("   {wrapped}"));
        }
        lines.push(String::new());
    }

    paginate_lines(&lines)
}

/// Greedy word wrap; words longer than the width get their own line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn paginate_lines(lines: &[String]) -> String {
    let total_pages = lines.len().div_ceil(LINES_PER_PAGE).max(1);
    let mut doc = String::new();

    for (page_index, chunk) in lines.chunks(LINES_PER_PAGE).enumerate() {
        if page_index > 0 {
            doc.push('\u{0c}');
        }
        doc.push_str(&format!("-- Page {} of {} --\n", page_index + 1, total_pages));
        for line in chunk {
            doc.push_str(line);
            doc.push('\n');
        }
    }

    if lines.is_empty() {
        doc.push_str("-- Page 1 of 1 --\n");
    }

    doc
}
