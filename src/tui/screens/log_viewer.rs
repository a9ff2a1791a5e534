use crate::logging::LogStore;

use super::viewer::{InitialPosition, Viewer};

/// A pager over the in-memory log ring, opened at the newest record.
///
/// The snapshot is taken once; records logged while the screen is open show
/// up the next time it is opened.
pub fn log_viewer(store: &LogStore) -> Viewer {
    let text = store
        .snapshot()
        .iter()
        .map(|record| record.format())
        .collect::<Vec<_>>()
        .join("\n");
    Viewer::new("logs", &text, InitialPosition::Bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogRecord;
    use crate::test_support::plain_lines;
    use crate::tui::screen::Screen;
    use chrono::Local;
    use log::Level;

    #[test]
    fn opens_at_newest_record() {
        let store = LogStore::new(100);
        for i in 0..20 {
            store.push(LogRecord {
                time: Local::now(),
                level: Level::Warn,
                target: "lumen".into(),
                message: format!("event {i}"),
            });
        }
        let mut viewer = log_viewer(&store);
        viewer.set_size(80, 8);
        assert_eq!(viewer.total_lines(), 20);
        assert_eq!(viewer.offset(), 15);

        let lines = plain_lines(&viewer.render(80, 8));
        assert!(lines[4].ends_with("WARN  lumen: event 19"));
        assert!(lines[7].ends_with("20/20 (100%)"));
    }

    #[test]
    fn empty_store_renders_footer_only() {
        let mut viewer = log_viewer(&LogStore::new(10));
        viewer.set_size(40, 5);
        let lines = plain_lines(&viewer.render(40, 5));
        assert_eq!(lines.len(), 5);
        assert!(lines[4].ends_with("0/0 (0%)"));
    }
}
