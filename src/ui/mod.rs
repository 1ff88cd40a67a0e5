mod theme;

use crate::app::{AppModel, FieldEditor, FormField, View};
use crate::domain::{COLUMNS, SessionRecord, format_epoch_seconds};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    frame.render_widget(Block::default().style(Style::default().bg(theme::BG)), area);

    match model.view {
        View::Query => render_query_form(frame, area, model),
        View::Results => render_results(frame, area, model),
    }

    if model.help_open {
        render_help_overlay(frame, area);
    }
}

fn render_query_form(frame: &mut Frame, area: Rect, model: &AppModel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let form = &model.form;
    let mut lines = vec![Line::default()];
    lines.push(selector_line(
        FormField::SessionType,
        form.session_type.label(),
        form.focus == FormField::SessionType,
    ));
    lines.push(Line::default());
    lines.push(editor_line(
        FormField::User,
        &form.user,
        form.focus == FormField::User,
    ));
    lines.push(Line::default());
    lines.push(editor_line(
        FormField::AppName,
        &form.app_name,
        form.focus == FormField::AppName,
    ));
    lines.push(Line::default());
    lines.push(editor_line(
        FormField::Since,
        &form.since,
        form.focus == FormField::Since,
    ));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Enter run query · Tab/↑↓ move · Esc quit · F1 help",
        Style::default().fg(theme::DIM),
    )));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::BORDER))
            .padding(Padding::horizontal(2))
            .title("Query Sessions")
            .title_style(Style::default().fg(theme::ACCENT)),
    );
    frame.render_widget(paragraph, chunks[0]);

    frame.render_widget(footer_line(model), chunks[1]);
}

fn selector_line(field: FormField, value: &str, focused: bool) -> Line<'static> {
    let mut spans = vec![label_span(field, focused)];
    spans.push(Span::styled(
        format!("◂ {value} ▸"),
        if focused {
            Style::default().fg(theme::ACCENT)
        } else {
            Style::default().fg(theme::FG)
        },
    ));
    if focused {
        spans.push(Span::styled(
            "  (space toggles)",
            Style::default().fg(theme::DIM),
        ));
    }
    Line::from(spans)
}

fn editor_line(field: FormField, editor: &FieldEditor, focused: bool) -> Line<'static> {
    let mut spans = vec![label_span(field, focused)];

    if !focused {
        spans.push(Span::styled(
            editor.text.clone(),
            Style::default().fg(theme::FG),
        ));
        return Line::from(spans);
    }

    let before: String = editor.text.chars().take(editor.cursor).collect();
    let at_cursor: String = editor
        .text
        .chars()
        .nth(editor.cursor)
        .map(|ch| ch.to_string())
        .unwrap_or_else(|| " ".to_string());
    let after: String = editor.text.chars().skip(editor.cursor + 1).collect();

    spans.push(Span::styled(before, Style::default().fg(theme::FG)));
    spans.push(Span::styled(
        at_cursor,
        Style::default()
            .fg(theme::FG)
            .add_modifier(Modifier::REVERSED),
    ));
    spans.push(Span::styled(after, Style::default().fg(theme::FG)));
    Line::from(spans)
}

fn label_span(field: FormField, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .fg(theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme::MUTED)
    };
    Span::styled(format!("{:<14}", field.label()), style)
}

const COLUMN_WIDTHS: [u16; 11] = [10, 6, 12, 15, 14, 12, 4, 15, 9, 19, 19];

fn render_results(frame: &mut Frame, area: Rect, model: &AppModel) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_criteria_header(frame, chunks[0], model);

    let pager = &model.pager;
    let visible = pager.visible_slice();
    if visible.is_empty() {
        let message = if pager.loading() {
            "Loading…"
        } else if pager.error().is_some() {
            "No data available."
        } else if pager.known_count() == 0 {
            "No sessions."
        } else {
            "Past the end of the result set."
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(theme::MUTED))
            .block(results_block());
        frame.render_widget(paragraph, chunks[1]);
    } else {
        render_table(frame, chunks[1], model, visible);
    }

    frame.render_widget(footer_line(model), chunks[2]);
}

fn render_criteria_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let form = &model.form;
    let mut parts = vec![format!("type={}", form.session_type.label())];
    if !form.user.text.trim().is_empty() {
        parts.push(format!("user={}", form.user.text.trim()));
    }
    if !form.app_name.text.trim().is_empty() {
        parts.push(format!("app={}", form.app_name.text.trim()));
    }
    parts.push(format!("since={}", form.since.text.trim()));

    let header = Paragraph::new(parts.join("  ·  "))
        .style(Style::default().fg(theme::MUTED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::BORDER))
                .padding(Padding::horizontal(1))
                .title("Sessions")
                .title_style(Style::default().fg(theme::ACCENT)),
        );
    frame.render_widget(header, area);
}

fn render_table(frame: &mut Frame, area: Rect, model: &AppModel, visible: &[SessionRecord]) {
    let pager = &model.pager;

    let header_cells: Vec<Cell> = COLUMNS
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let mut text = key.label().to_string();
            if *key == pager.sort_key() {
                text.push(' ');
                text.push_str(pager.sort_direction().indicator());
            }
            let mut style = Style::default().fg(theme::MUTED).bg(theme::SURFACE);
            if index == model.selected_column {
                style = style.fg(theme::ACCENT).add_modifier(Modifier::BOLD);
            }
            Cell::from(text).style(style)
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = visible
        .iter()
        .map(|record| {
            let ended = if record.ended_at == 0 {
                "-".to_string()
            } else {
                format_epoch_seconds(record.ended_at)
            };
            Row::new(vec![
                Cell::from(record.session_id.to_string()),
                Cell::from(record.session_type.label()),
                Cell::from(fit(&record.user, COLUMN_WIDTHS[2] as usize)),
                Cell::from(record.source_ip.clone()),
                Cell::from(fit(&record.app_name, COLUMN_WIDTHS[4] as usize)),
                Cell::from(fit(&record.proc_name, COLUMN_WIDTHS[5] as usize)),
                Cell::from(record.instance_no.to_string()),
                Cell::from(record.node_ip.clone()),
                Cell::from(fit(&record.status, COLUMN_WIDTHS[8] as usize)),
                Cell::from(format_epoch_seconds(record.created_at)),
                Cell::from(ended),
            ])
            .style(Style::default().fg(theme::FG))
        })
        .collect();

    let widths: Vec<Constraint> = COLUMN_WIDTHS
        .iter()
        .map(|&width| Constraint::Length(width))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(results_block());
    frame.render_widget(table, area);
}

fn results_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1))
}

fn footer_line(model: &AppModel) -> Paragraph<'_> {
    let pager = &model.pager;
    let mut spans: Vec<Span> = Vec::new();

    if let Some(notice) = model.notice.as_deref() {
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(theme::ACCENT),
        ));
    } else if pager.loading() {
        spans.push(Span::styled(
            "Loading…".to_string(),
            Style::default().fg(theme::LOADING),
        ));
    } else if let Some(error) = pager.error() {
        spans.push(Span::styled(
            fit(error, 60),
            Style::default().fg(theme::ERROR),
        ));
    }

    if model.view == View::Results {
        if !spans.is_empty() {
            spans.push(Span::styled("  ·  ", Style::default().fg(theme::DIM)));
        }
        let more = if pager.exhausted() { "" } else { "+" };
        spans.push(Span::styled(
            format!(
                "page {} · rows {} · {}{} known · sort {} {}",
                pager.page() + 1,
                pager.rows_per_page(),
                pager.known_count(),
                more,
                pager.sort_key().label(),
                pager.sort_direction().indicator(),
            ),
            Style::default().fg(theme::MUTED),
        ));
        spans.push(Span::styled(
            "  ·  ←/→ page · Tab col · s sort · r rows · e edit",
            Style::default().fg(theme::DIM),
        ));
    }

    Paragraph::new(Line::from(spans))
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(52);
    let height = area.height.min(16);
    let overlay = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, overlay);

    let lines = vec![
        Line::from("Query form"),
        Line::from("  Tab / ↑↓      move between fields"),
        Line::from("  Space         toggle session type"),
        Line::from("  Enter         run the query"),
        Line::from(""),
        Line::from("Results"),
        Line::from("  ← / →         previous / next page"),
        Line::from("  Tab / S-Tab   move column cursor"),
        Line::from("  s / Enter     sort by highlighted column"),
        Line::from("  r             cycle rows per page (5/10/25)"),
        Line::from("  Ctrl+R        re-run the query"),
        Line::from("  e / Esc       back to the query form"),
        Line::from(""),
        Line::from("  q / Ctrl+C    quit · F1 close help"),
    ];
    let help = Paragraph::new(lines)
        .style(Style::default().fg(theme::FG).bg(theme::SURFACE))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::ACCENT))
                .padding(Padding::horizontal(1))
                .title("Help"),
        );
    frame.render_widget(help, overlay);
}

fn fit(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    let keep = width.saturating_sub(1);
    let mut used = 0usize;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > keep {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}
