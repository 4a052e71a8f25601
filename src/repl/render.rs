//! Plain-text rendering of the display log.

use textwrap::Options;

use crate::backend::StagedFile;
use crate::core::state::{App, LogEntry, LogKind};

const MIN_WIDTH: usize = 40;

/// Terminal width from `$COLUMNS`, 80 when unset.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(80)
}

fn label(kind: LogKind) -> &'static str {
    match kind {
        LogKind::User => "you",
        LogKind::Reply => "bot",
        LogKind::Notice => " --",
        LogKind::Error => " !!",
    }
}

/// One entry as `[HH:MM:SS] who text`, wrapped with a hanging indent.
pub fn render_entry(entry: &LogEntry, width: usize) -> String {
    let prefix = format!("[{}] {} ", entry.at.format("%H:%M:%S"), label(entry.kind));
    let indent = " ".repeat(prefix.len());
    let options = Options::new(width.max(MIN_WIDTH))
        .initial_indent(&prefix)
        .subsequent_indent(&indent);

    // Keep paragraph breaks in replies; fill() would collapse them.
    entry
        .text
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let opts = if i == 0 {
                options.clone()
            } else {
                options.clone().initial_indent(&indent)
            };
            textwrap::fill(line, opts)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(app: &App) -> String {
    let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(unset)".to_string());
    let describe = |f: &Option<StagedFile>| {
        f.as_ref()
            .map(|f| format!("{} ({} bytes)", f.name, f.bytes.len()))
            .unwrap_or_else(|| "(none)".to_string())
    };
    let mut lines = vec![
        format!("phase:        {}", app.phase.label()),
        format!("vector store: {}", or_unset(&app.ids.vector_store_id)),
        format!("thread:       {}", or_unset(&app.ids.thread_id)),
        format!("staged file:  {}", describe(&app.staged_file)),
    ];
    if app.uploading.is_some() {
        lines.push(format!("uploading:    {}", describe(&app.uploading)));
    }
    lines.push(format!("merge policy: {:?}", app.merge_policy));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use chrono::{Local, TimeZone};

    fn entry(kind: LogKind, text: &str) -> LogEntry {
        LogEntry {
            at: Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap(),
            kind,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_short_entry_single_line() {
        assert_eq!(render_entry(&entry(LogKind::User, "hello"), 80), "[09:05:07] you hello");
    }

    #[test]
    fn test_long_reply_wraps_with_hanging_indent() {
        let text = "word ".repeat(30);
        let rendered = render_entry(&entry(LogKind::Reply, text.trim()), 40);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("[09:05:07] bot word"));
        for line in &lines[1..] {
            assert!(line.starts_with(&" ".repeat(15)));
            assert!(line.len() <= 40);
        }
    }

    #[test]
    fn test_reply_keeps_line_breaks() {
        let rendered = render_entry(&entry(LogKind::Reply, "one\ntwo"), 80);
        assert_eq!(rendered, "[09:05:07] bot one\n               two");
    }

    #[test]
    fn test_status_shows_unset_ids() {
        let mut app = test_app();
        app.ids.vector_store_id = Some("vs1".to_string());
        let status = render_status(&app);
        assert!(status.contains("vector store: vs1"));
        assert!(status.contains("thread:       (unset)"));
        assert!(status.contains("phase:        idle"));
        assert!(!status.contains("uploading:"));
    }

    #[test]
    fn test_status_separates_uploading_and_staged_files() {
        let mut app = test_app();
        app.uploading = Some(StagedFile::new("a.pdf", vec![0; 3]));
        app.staged_file = Some(StagedFile::new("b.pdf", vec![]));
        let status = render_status(&app);
        assert!(status.contains("staged file:  b.pdf (0 bytes)"));
        assert!(status.contains("uploading:    a.pdf (3 bytes)"));
    }
}
