//! Daily due-date bar chart for the Deadline Chart TUI.
//!
//! Renders a header with the window and upload provenance, a scrollable
//! [`ratatui::widgets::BarChart`] with one bar per day, and a key-hint
//! footer.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use deadline_core::formatting::format_count;
use deadline_core::models::ChartData;

use crate::themes::Theme;

/// Gap between neighbouring bars, in columns.
pub const BAR_GAP: u16 = 1;

const HEADER_HEIGHT: u16 = 4;
const FOOTER_HEIGHT: u16 = 1;

/// Everything the chart screen shows.
#[derive(Debug, Clone)]
pub struct ChartView {
    pub chart: ChartData,
    /// Provenance line, e.g. `"最終アップロード: 0110.csv (2025-01-10 09:30:00)"`.
    pub latest_upload: String,
    /// Timezone the window was computed in.
    pub timezone: String,
}

impl ChartView {
    pub fn new(chart: ChartData, latest_upload: String, timezone: String) -> Self {
        Self {
            chart,
            latest_upload,
            timezone,
        }
    }

    /// Number of day bars.
    pub fn bar_count(&self) -> usize {
        self.chart.buckets.len()
    }
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Bar width wide enough for the widest day label.
///
/// Labels mix ASCII with a full-width weekday character, so display width
/// rather than byte or char length decides.
pub fn bar_width(chart: &ChartData) -> u16 {
    chart
        .buckets
        .iter()
        .map(|b| UnicodeWidthStr::width(b.label.as_str()))
        .max()
        .unwrap_or(1)
        .clamp(1, u16::MAX as usize) as u16
}

/// How many bars of `bar_width` fit across `inner_width` columns.
pub fn visible_bars(inner_width: u16, bar_width: u16) -> usize {
    let slot = bar_width.saturating_add(BAR_GAP).max(1);
    (usize::from(inner_width.saturating_add(BAR_GAP)) / usize::from(slot)).max(1)
}

/// Largest valid scroll offset when `visible` of `total` bars fit.
pub fn max_offset(total: usize, visible: usize) -> usize {
    total.saturating_sub(visible)
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Header lines: title, separator, window summary, provenance.
pub fn header_lines<'a>(view: &'a ChartView, theme: &Theme) -> Vec<Line<'a>> {
    let chart = &view.chart;
    vec![
        Line::from(Span::styled("DEADLINE CHART ─ 納期分布", theme.header)),
        Line::from(Span::styled("=".repeat(60), theme.separator)),
        Line::from(vec![
            Span::styled("[ ", theme.label),
            Span::styled(format!("{} 〜 {}", chart.start, chart.end), theme.value),
            Span::styled(" | ", theme.label),
            Span::styled(format!("{} 件", format_count(chart.total())), theme.value),
            Span::styled(" | ", theme.label),
            Span::styled(view.timezone.as_str(), theme.value),
            Span::styled(" ]", theme.label),
        ]),
        Line::from(Span::styled(view.latest_upload.as_str(), theme.dim)),
    ]
}

/// Render the chart screen with the bars starting at `offset`.
///
/// Returns the number of bars that fit, so the caller can clamp scrolling.
pub fn render_chart(
    frame: &mut Frame,
    area: Rect,
    view: &ChartView,
    offset: usize,
    theme: &Theme,
) -> usize {
    let [header_area, chart_area, footer_area] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(FOOTER_HEIGHT),
    ])
    .areas(area);

    frame.render_widget(Paragraph::new(header_lines(view, theme)), header_area);

    let width = bar_width(&view.chart);
    let visible = visible_bars(chart_area.width.saturating_sub(2), width);
    let offset = offset.min(max_offset(view.bar_count(), visible));
    let max_count = view.chart.max_count();

    let bars: Vec<Bar> = view
        .chart
        .buckets
        .iter()
        .skip(offset)
        .take(visible)
        .map(|bucket| {
            Bar::default()
                .value(u64::from(bucket.count))
                .label(Line::styled(
                    bucket.label.clone(),
                    theme.label_style(bucket.date),
                ))
                .style(theme.bar_style(bucket.count, max_count))
                .value_style(theme.bar_value)
        })
        .collect();

    let title = format!(
        " 納期件数 ({}/{}) ",
        (offset + visible).min(view.bar_count()),
        view.bar_count()
    );
    let bar_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(title),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(BAR_GAP)
        .max(u64::from(view.chart.y_axis_max));
    frame.render_widget(bar_chart, chart_area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "←/→: scroll  Home/End: jump  q: quit",
            theme.dim,
        ))),
        footer_area,
    );

    visible
}

/// Placeholder shown when the window holds no due dates.
pub fn render_no_data(frame: &mut Frame, area: Rect, latest_upload: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("該当期間の納期データが存在しません。", theme.info)),
        Line::from(""),
        Line::from(Span::styled(latest_upload, theme.dim)),
        Line::from(Span::styled(
            "Run `deadline-chart ingest <FILE>` to load a CSV export.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border)
                .title(" Deadline Chart "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
