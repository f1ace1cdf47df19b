use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row,
        Table, Tabs, Wrap,
    },
};

use crate::controller::NoticeKind;
use crate::domain::email::{EmailRecord, SortField};
use crate::domain::status_log::LogKind;
use crate::pipeline::table::SortDirection;
use crate::terminal::state::{AppState, View};

pub fn render(f: &mut Frame, state: &AppState) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_header(f, header, state);

    match state.view {
        View::Dashboard => render_dashboard(f, body, state),
        View::Emails => render_emails(f, body, state),
        View::Logs => render_logs(f, body, state),
        View::Settings => render_settings(f, body, state),
    }

    render_footer(f, footer, state);
    render_notice(f, body, state);
}

fn render_header(f: &mut Frame, area: Rect, state: &AppState) {
    let [tabs_area, status_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(28)]).areas(area);

    let titles = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {}", i + 1, v.title()));
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Email Classifier "),
        )
        .select(state.view as usize)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, tabs_area);

    let (label, color) = match &state.health {
        None => ("Checking API status...", Color::DarkGray),
        Some(h) if h.is_running => ("API Running", Color::Green),
        Some(_) => ("API Offline", Color::Red),
    };
    let status = Paragraph::new(Line::from(Span::styled(
        format!("● {label}"),
        Style::default().fg(color),
    )))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, status_area);
}

// ----- Dashboard -----

fn render_dashboard(f: &mut Frame, area: Rect, state: &AppState) {
    let c = &state.controller;
    if c.is_loading() && c.last_success().is_none() {
        f.render_widget(
            Paragraph::new("Loading dashboard data...").style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    }

    let [cards, charts] =
        Layout::vertical([Constraint::Length(6), Constraint::Min(0)]).areas(area);
    let [total, spam, dup] = Layout::horizontal([Constraint::Ratio(1, 3); 3]).areas(cards);

    let stats = c.stats();
    metric_card(
        f,
        total,
        "Total Emails Processed",
        stats.total_count,
        "Total emails processed by the AI system",
        None,
    );
    metric_card(
        f,
        spam,
        "Spam Emails Detected",
        stats.spam_count,
        "Emails identified as potential spam",
        stats.spam_percent(),
    );
    metric_card(
        f,
        dup,
        "Duplicate Emails",
        stats.duplicate_count,
        "Emails identified as duplicates",
        stats.duplicate_percent(),
    );

    let [cat_area, dept_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(charts);
    count_chart(f, cat_area, " Email Categories ", &stats.category_counts, stats.total_count);
    count_chart(
        f,
        dept_area,
        " Department Distribution ",
        &stats.department_counts,
        stats.total_count,
    );
}

fn metric_card(
    f: &mut Frame,
    area: Rect,
    title: &str,
    value: usize,
    description: &str,
    share: Option<u32>,
) {
    let mut lines = vec![
        Line::from(Span::styled(
            value.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            description.to_string(),
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(p) = share {
        lines.push(Line::from(Span::styled(
            format!("{p}% of total"),
            Style::default().fg(Color::Red),
        )));
    }
    let card = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} ")),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(card, area);
}

fn count_chart(f: &mut Frame, area: Rect, title: &str, counts: &[(String, usize)], total: usize) {
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    if counts.is_empty() {
        f.render_widget(
            Paragraph::new("No data").block(block).style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    }

    let bars: Vec<Bar> = counts
        .iter()
        .map(|(name, n)| {
            let pct = crate::pipeline::aggregate::percent_of(*n, total).unwrap_or(0);
            Bar::default()
                .value(*n as u64)
                .label(Line::from(name.clone()))
                .text_value(format!("{n} ({pct}%)"))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2);
    let per_bar = (inner_width / counts.len().max(1) as u16).saturating_sub(1);
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(per_bar.clamp(3, 16))
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Blue));
    f.render_widget(chart, area);
}

// ----- Emails -----

fn render_emails(f: &mut Frame, area: Rect, state: &AppState) {
    let c = &state.controller;
    if c.is_loading() && !c.is_rechecking() && c.last_success().is_none() {
        f.render_widget(
            Paragraph::new("Loading emails...").style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    }

    let filter_height = if state.show_filters { 4 } else { 0 };
    let detail_height = if state.opened().is_some() { 12 } else { 0 };
    let [filters_area, table_area, detail_area] = Layout::vertical([
        Constraint::Length(filter_height),
        Constraint::Min(3),
        Constraint::Length(detail_height),
    ])
    .areas(area);

    if state.show_filters {
        render_filter_panel(f, filters_area, state);
    }

    let rows_data = state.visible();

    let mut title = format!(" Emails ({}) ", rows_data.len());
    if state.filters.is_active() {
        title.push_str(&format!("[{} filters] ", state.filters.active_count()));
    }
    if c.is_rechecking() {
        title.push_str("Checking Emails... ");
    }
    let block = Block::default().borders(Borders::ALL).title(title);

    if rows_data.is_empty() {
        f.render_widget(
            Paragraph::new("No emails found matching the filters.")
                .block(block)
                .style(Style::default().fg(Color::Gray)),
            table_area,
        );
        return;
    }

    let header = Row::new(vec![
        Cell::from(column_title(state, "From", SortField::From)),
        Cell::from(column_title(state, "Subject", SortField::Subject)),
        Cell::from(column_title(state, "Routed To", SortField::RoutedTo)),
        Cell::from(column_title(state, "Date", SortField::Date)),
        Cell::from("Status"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = rows_data
        .iter()
        .map(|e| {
            let opened = state.opened_id.as_deref() == Some(e.id.as_str());
            let style = if opened {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(e.from.clone()),
                Cell::from(e.subject.clone()),
                Cell::from(Span::styled(
                    e.routed_to.clone(),
                    Style::default().fg(Color::Blue),
                )),
                Cell::from(display_date(&e.date)),
                Cell::from(status_span(e)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(34),
        Constraint::Percentage(16),
        Constraint::Length(17),
        Constraint::Length(16),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_symbol("➜ ")
        .row_highlight_style(Style::default().fg(Color::Green));

    f.render_stateful_widget(table, table_area, &mut state.table_state.clone());

    if let Some(e) = state.opened() {
        render_detail(f, detail_area, e);
    }
}

fn column_title(state: &AppState, label: &str, field: SortField) -> String {
    if state.sort.field != field {
        return label.to_string();
    }
    match state.sort.direction {
        SortDirection::Ascending => format!("{label} ▲"),
        SortDirection::Descending => format!("{label} ▼"),
    }
}

fn status_span(e: &EmailRecord) -> Span<'static> {
    let color = match (e.spam(), e.duplicate()) {
        (true, _) => Color::Yellow,
        (false, true) => Color::Cyan,
        (false, false) => Color::Green,
    };
    Span::styled(e.status_label(), Style::default().fg(color))
}

fn render_filter_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let fs = &state.filters;
    let or_all = |v: &str, all: &'static str| {
        if v.is_empty() {
            all.to_string()
        } else {
            v.to_string()
        }
    };
    let check = |b: bool| if b { "[x]" } else { "[ ]" };

    let line = Line::from(vec![
        Span::styled("c", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" Category: {}   ", or_all(&fs.category, "All Categories"))),
        Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " Department: {}   ",
            or_all(&fs.department, "All Departments")
        )),
        Span::styled("s", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} Spam Only   ", check(fs.spam_only))),
        Span::styled("u", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} Duplicates Only   ", check(fs.duplicate_only))),
        Span::styled("x", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" Clear"),
    ]);
    let p = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(" Filters "))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn render_detail(f: &mut Frame, area: Rect, e: &EmailRecord) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let field = |name: &str, value: String| {
        Line::from(vec![Span::styled(format!("{name}: "), bold), Span::raw(value)])
    };

    let mut lines = vec![
        field("From", e.from.clone()),
        field("Subject", e.subject.clone()),
        field("Date", display_date(&e.date)),
        field("Routed To", e.routed_to.clone()),
        field(
            "Category",
            e.category.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    if let Some(c) = e.confidence {
        lines.push(field("Confidence", format!("{:.0}%", c * 100.0)));
    }
    if let Some(t) = &e.extracted_text {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Extracted Text", bold)));
        lines.push(Line::raw(t.clone()));
    }
    if let Some(b) = &e.body {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Body", bold)));
        lines.push(Line::raw(b.clone()));
    }

    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Email "))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

/// Local rendering of an ISO 8601 stamp; anything unparsable is shown as-is.
pub fn display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ----- Logs -----

fn render_logs(f: &mut Frame, area: Rect, state: &AppState) {
    if state.logs_loading && state.logs.is_empty() {
        f.render_widget(
            Paragraph::new("Loading logs...").style(Style::default().fg(Color::Gray)),
            area,
        );
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Real-time Status Logs ({} entries) ", state.logs.len()));

    if state.logs.is_empty() {
        f.render_widget(
            Paragraph::new("No logs available yet.").block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = state
        .logs
        .iter()
        .map(|l| {
            let color = match l.kind {
                LogKind::Info => Color::Blue,
                LogKind::Success => Color::Green,
                LogKind::Warning => Color::Yellow,
                LogKind::Error => Color::Red,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    l.timestamp.with_timezone(&Local).format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(format!("{:<8}", l.kind.as_upper()), Style::default().fg(color)),
                Span::raw(l.message.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, area, &mut state.log_list_state.clone());
}

// ----- Settings -----

fn render_settings(f: &mut Frame, area: Rect, state: &AppState) {
    let cfg = &state.config;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let row = |k: &str, v: String| Line::from(vec![Span::styled(format!("{k:<22}"), bold), Span::raw(v)]);

    let mut lines = vec![
        row("API Endpoint", cfg.api_url.clone()),
        row(
            "Refresh Interval",
            format!("{}s", cfg.refresh_interval_secs),
        ),
        row("Health Interval", format!("{}s", cfg.health_interval_secs)),
        row("Logs Interval", format!("{}s", cfg.logs_interval_secs)),
        row(
            "Request Timeout",
            format!("{}s", cfg.request_timeout_secs),
        ),
        row("Log Export Dir", cfg.resolve_log_dir().display().to_string()),
        row(
            "Backend",
            if cfg.use_mock {
                "built-in demo data".to_string()
            } else {
                "remote".to_string()
            },
        ),
    ];
    if let Ok(p) = crate::config::config_path() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("Edit {} to change these values.", p.display()),
            Style::default().fg(Color::Gray),
        )));
    }

    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Settings "))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

// ----- Chrome -----

fn render_footer(f: &mut Frame, area: Rect, state: &AppState) {
    let key = |k: &'static str| Span::styled(k, Style::default().add_modifier(Modifier::BOLD));
    let mut spans = vec![key("1-4/Tab"), Span::raw(" view  ")];
    match state.view {
        View::Dashboard => {
            spans.extend([key("r"), Span::raw(" refresh  ")]);
        }
        View::Emails if state.show_filters => {
            spans.extend([
                key("c/d"),
                Span::raw(" category/department  "),
                key("s/u"),
                Span::raw(" spam/dupes  "),
                key("x"),
                Span::raw(" clear  "),
                key("f/Esc"),
                Span::raw(" close  "),
            ]);
        }
        View::Emails => {
            spans.extend([
                key("j/k"),
                Span::raw(" move  "),
                key("Enter"),
                Span::raw(" details  "),
                key("f"),
                Span::raw(" filters  "),
                key("F/S/R/D"),
                Span::raw(" sort  "),
                key("r"),
                Span::raw(" recheck  "),
            ]);
        }
        View::Logs => {
            spans.extend([
                key("r"),
                Span::raw(" refresh  "),
                key("w"),
                Span::raw(" download  "),
            ]);
        }
        View::Settings => {}
    }
    spans.extend([key("q"), Span::raw(" quit")]);
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(f: &mut Frame, area: Rect, state: &AppState) {
    let Some((notice, _)) = state.notices.last() else {
        return;
    };
    let width = area.width.min(54);
    let height = 4.min(area.height);
    let rect = Rect {
        x: area.right().saturating_sub(width),
        y: area.bottom().saturating_sub(height),
        width,
        height,
    };
    let color = match notice.kind {
        NoticeKind::Success => Color::Green,
        NoticeKind::Error => Color::Red,
    };
    let p = Paragraph::new(notice.description.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", notice.title)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
