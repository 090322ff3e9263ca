use comfy_table::{Cell, Table};

use storage::{BufferStats, FrameInfo};

use crate::workload::ScanReport;

const MAX_DISPLAY_FRAMES: usize = 64;

pub fn format_stats(stats: &BufferStats) -> String {
    let mut table = Table::new();
    table.set_header(vec![Cell::new("metric"), Cell::new("value")]);
    let rows: [(&str, String); 8] = [
        ("frames", stats.total_frames.to_string()),
        ("used", stats.used_frames.to_string()),
        ("pinned", stats.pinned_frames.to_string()),
        ("dirty", stats.dirty_frames.to_string()),
        ("hits", stats.hits.to_string()),
        ("misses", stats.misses.to_string()),
        ("evictions", stats.evictions.to_string()),
        ("write-backs", stats.write_backs.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.to_string()
}

pub fn format_frames(frames: &[FrameInfo]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["frame", "page", "pins", "dirty", "valid"]);
    for info in frames.iter().take(MAX_DISPLAY_FRAMES) {
        let page = info
            .page_no
            .map_or_else(|| "-".to_string(), |page_no| page_no.to_string());
        table.add_row(vec![
            info.frame_no.0.to_string(),
            page,
            info.pin_cnt.to_string(),
            info.dirty.to_string(),
            info.valid.to_string(),
        ]);
    }

    let mut output = table.to_string();
    let hidden = frames.len().saturating_sub(MAX_DISPLAY_FRAMES);
    if hidden > 0 {
        output.push('\n');
        output.push_str(&format!("... ({} frames hidden)", hidden));
    }
    output
}

pub fn format_report(report: &ScanReport) -> String {
    let mut output = format!(
        "scanned {} pages x {} passes\n",
        report.pages, report.passes
    );
    output.push_str(&format_stats(&report.stats));
    output.push('\n');
    output.push_str(&format_frames(&report.frames));
    if !report.mismatched.is_empty() {
        output.push('\n');
        output.push_str(&format!("stamp mismatch on pages {:?}", report.mismatched));
    }
    output
}
