//! Markdown rendering of an analysis, standing in for the dashboard cards.

use std::fmt::Write as _;

use crate::core::types::AnalysisResult;

/// ` (p. N)`, or nothing when the page is unknown.
pub fn page_badge(page: u32) -> String {
    if page == 0 {
        String::new()
    } else {
        format!(" (p. {page})")
    }
}

pub fn render_markdown(pdf_name: &str, result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Analysis: {pdf_name}\n");

    let _ = writeln!(out, "## Summary\n");
    let _ = writeln!(out, "{}{}\n", result.summary.text, page_badge(result.summary.page));

    if !result.key_insights.is_empty() {
        let _ = writeln!(out, "## Key insights\n");
        for insight in &result.key_insights {
            let _ = writeln!(
                out,
                "- **{}**{}: {}",
                insight.title,
                page_badge(insight.page),
                insight.explanation
            );
        }
        out.push('\n');
    }

    if !result.key_statistics.is_empty() {
        let _ = writeln!(out, "## Key statistics\n");
        let _ = writeln!(out, "| Statistic | Value | Page |");
        let _ = writeln!(out, "| --- | --- | --- |");
        for stat in &result.key_statistics {
            let page = if stat.page == 0 {
                String::new()
            } else {
                stat.page.to_string()
            };
            let _ = writeln!(out, "| {} | {} | {page} |", stat.label, stat.value);
        }
        out.push('\n');
    }

    if !result.action_items.is_empty() {
        let _ = writeln!(out, "## Action items\n");
        for (idx, item) in result.action_items.iter().enumerate() {
            let _ = writeln!(out, "{}. {}{}", idx + 1, item.text, page_badge(item.page));
        }
        out.push('\n');
    }

    out.trim_end().to_string() + "\n"
}
