//! Application state and TUI event loop for Deadline Chart.
//!
//! [`App`] owns the theme and the horizontal scroll position of the chart.
//! The chart itself is static for the lifetime of the screen; the loop only
//! reacts to keys and terminal resizes.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::chart_view::{self, max_offset, ChartView};
use crate::themes::Theme;

/// What a key press asks the event loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ScrollLeft,
    ScrollRight,
    PageLeft,
    PageRight,
    Home,
    End,
    None,
}

impl KeyAction {
    /// Map a key event to an action.
    pub fn from_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Self::Quit,
            KeyCode::Left | KeyCode::Char('h') => Self::ScrollLeft,
            KeyCode::Right | KeyCode::Char('l') => Self::ScrollRight,
            KeyCode::PageUp => Self::PageLeft,
            KeyCode::PageDown => Self::PageRight,
            KeyCode::Home => Self::Home,
            KeyCode::End => Self::End,
            _ => Self::None,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the Deadline Chart TUI.
pub struct App {
    /// Active colour theme.
    pub theme: Theme,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Index of the leftmost visible bar.
    pub offset: usize,
    /// Bars that fit on screen at the last draw.
    pub page: usize,
}

impl App {
    /// Construct a new application with the given configuration.
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            should_quit: false,
            offset: 0,
            page: 1,
        }
    }

    /// Apply `action` to the scroll state of a chart with `total` bars.
    pub fn apply(&mut self, action: KeyAction, total: usize) {
        let last = max_offset(total, self.page);
        match action {
            KeyAction::Quit => self.should_quit = true,
            KeyAction::ScrollLeft => self.offset = self.offset.saturating_sub(1),
            KeyAction::ScrollRight => self.offset = (self.offset + 1).min(last),
            KeyAction::PageLeft => self.offset = self.offset.saturating_sub(self.page),
            KeyAction::PageRight => self.offset = (self.offset + self.page).min(last),
            KeyAction::Home => self.offset = 0,
            KeyAction::End => self.offset = last,
            KeyAction::None => {}
        }
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Show the chart (or the empty state when `view` is `None`) until the
    /// user quits with `q`, `Esc` or `Ctrl+C`.
    pub async fn run_chart(
        mut self,
        view: Option<ChartView>,
        latest_upload: String,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);
        let total = view.as_ref().map_or(0, ChartView::bar_count);

        let result = loop {
            let drawn = terminal.draw(|frame| self.render(frame, view.as_ref(), &latest_upload));
            if let Err(e) = drawn {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.apply(KeyAction::from_key(key), total);
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn render(&mut self, frame: &mut Frame, view: Option<&ChartView>, latest_upload: &str) {
        let area = frame.area();
        match view {
            Some(view) => {
                self.page = chart_view::render_chart(frame, area, view, self.offset, &self.theme);
                self.offset = self.offset.min(max_offset(view.bar_count(), self.page));
            }
            None => chart_view::render_no_data(frame, area, latest_upload, &self.theme),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use deadline_core::models::{ChartData, DailyBucket};
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_view(days: i64) -> ChartView {
        let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let buckets: Vec<DailyBucket> = (0..days)
            .map(|i| DailyBucket::new(start + chrono::Duration::days(i), 1))
            .collect();
        let end = start + chrono::Duration::days(days - 1);
        ChartView::new(
            ChartData::new(start, end, buckets),
            "uploaded".to_string(),
            "UTC".to_string(),
        )
    }

    // ── KeyAction ─────────────────────────────────────────────────────────────

    #[test]
    fn test_key_action_quit_keys() {
        assert_eq!(KeyAction::from_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(key(KeyCode::Char('Q'))), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(key(KeyCode::Esc)), KeyAction::Quit);
        assert_eq!(
            KeyAction::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_key_action_plain_c_is_ignored() {
        assert_eq!(KeyAction::from_key(key(KeyCode::Char('c'))), KeyAction::None);
    }

    #[test]
    fn test_key_action_scroll_keys() {
        assert_eq!(KeyAction::from_key(key(KeyCode::Left)), KeyAction::ScrollLeft);
        assert_eq!(KeyAction::from_key(key(KeyCode::Char('l'))), KeyAction::ScrollRight);
        assert_eq!(KeyAction::from_key(key(KeyCode::End)), KeyAction::End);
    }

    // ── App::new ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_creation_defaults() {
        let app = App::new("dark");
        assert!(!app.should_quit);
        assert_eq!(app.offset, 0);
    }

    #[test]
    fn test_app_creation_unknown_theme_falls_back() {
        let app = App::new("neon");
        assert!(app.theme.header.fg.is_some());
    }

    // ── apply ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_apply_scroll_is_clamped() {
        let mut app = App::new("dark");
        app.page = 10;

        app.apply(KeyAction::ScrollLeft, 60);
        assert_eq!(app.offset, 0);

        app.apply(KeyAction::ScrollRight, 60);
        assert_eq!(app.offset, 1);

        app.apply(KeyAction::End, 60);
        assert_eq!(app.offset, 50);

        app.apply(KeyAction::ScrollRight, 60);
        assert_eq!(app.offset, 50);

        app.apply(KeyAction::PageLeft, 60);
        assert_eq!(app.offset, 40);

        app.apply(KeyAction::Home, 60);
        assert_eq!(app.offset, 0);
    }

    #[test]
    fn test_apply_no_scroll_when_everything_fits() {
        let mut app = App::new("dark");
        app.page = 20;
        app.apply(KeyAction::PageRight, 5);
        assert_eq!(app.offset, 0);
    }

    #[test]
    fn test_apply_quit() {
        let mut app = App::new("dark");
        app.apply(KeyAction::Quit, 0);
        assert!(app.should_quit);
    }

    // ── render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_records_page_size() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut app = App::new("dark");
        let view = make_view(60);

        terminal
            .draw(|frame| app.render(frame, Some(&view), "uploaded"))
            .unwrap();

        assert_eq!(app.page, 13);
    }

    #[test]
    fn test_render_clamps_stale_offset_after_resize() {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut app = App::new("dark");
        app.offset = 59;
        let view = make_view(60);

        terminal
            .draw(|frame| app.render(frame, Some(&view), "uploaded"))
            .unwrap();

        assert_eq!(app.offset, 47);
    }

    #[test]
    fn test_render_without_data_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut app = App::new("light");

        terminal
            .draw(|frame| app.render(frame, None, "まだCSVファイルがアップロードされていません。"))
            .unwrap();
    }
}
