use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::card::{field_text, LogStyle};
use crate::conversation::layout::TextLine;
use crate::surface::{ElementId, Target};
use crate::theme::Theme;

// Load theme colors from system (Omarchy/Hyprland) once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn accent_bright() -> Color { theme().accent_bright }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn info() -> Color { theme().info }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

/// Split the screen into info line, messages box, selection box and footer
fn screen_layout(area: Rect) -> (Rect, Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(4),    // Messages + selection
            Constraint::Length(1), // Footer
        ])
        .split(area);

    // Narrow terminals stack the selection box under the messages
    let direction = if area.width < 80 { Direction::Vertical } else { Direction::Horizontal };
    let body = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    (rows[0], body[0], body[1], rows[2])
}

fn messages_block() -> Block<'static> {
    Block::default().borders(Borders::ALL)
}

/// Inner area of the messages box, where message text is laid out
pub fn message_pane(area: Rect) -> Rect {
    let (_, messages, _, _) = screen_layout(area);
    messages_block().inner(messages)
}

pub fn draw(f: &mut Frame, app: &App) {
    let (info_area, messages_area, selection_area, footer_area) = screen_layout(f.area());

    draw_info_line(f, app, info_area);
    draw_messages_box(f, app, messages_area);
    draw_selection_box(f, app, selection_area);
    draw_footer(f, footer_area);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::ErrorCard => draw_error_card(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(warning())))
    } else if let Some(record) = app.tracker.record() {
        Line::from(vec![
            Span::styled("󰆏 ", Style::default().fg(accent())),
            Span::styled(
                format!("{} characters selected in #{}", record.text.chars().count(), record.message_id),
                Style::default().fg(text_dim()),
            ),
        ])
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_messages_box(f: &mut Frame, app: &App, area: Rect) {
    let frame = messages_block()
        .title(Span::styled(" Messages ", Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .border_style(Style::default().fg(accent()));

    let height = app.pane.height as usize;
    let mut rows: Vec<Line> = vec![Line::from(""); app.layout.total_rows];

    for block in &app.layout.blocks {
        let Some(message) = app.message(block.index) else {
            continue;
        };
        let hovered = app.hovered == Some(block.index);
        let author_style = if hovered {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD)
        };
        let author = if message.author.is_empty() { "anonymous" } else { message.author.as_str() };
        rows[block.header_row] = Line::from(vec![
            Span::styled(author, author_style),
            Span::styled(format!("  #{}", message.id), Style::default().fg(text_dim())),
        ]);

        let span = app
            .drag
            .span()
            .filter(|(index, _, _)| *index == block.index)
            .map(|(_, start, end)| (start, end));
        for line in &block.lines {
            rows[line.row] = highlighted_line(line, span);
        }
    }

    let visible: Vec<Line> = rows.into_iter().skip(app.scroll).take(height).collect();
    f.render_widget(Paragraph::new(visible).block(frame), area);
}

/// A wrapped text row with the part inside `span` (message char offsets)
/// drawn as selected
fn highlighted_line(line: &TextLine, span: Option<(usize, usize)>) -> Line<'static> {
    let normal = Style::default().fg(text());
    let Some((start, end)) = span else {
        return Line::from(Span::styled(line.text.clone(), normal));
    };

    let len = line.len();
    let from = start.saturating_sub(line.start).min(len);
    let to = end.saturating_sub(line.start).min(len);
    if from >= to {
        return Line::from(Span::styled(line.text.clone(), normal));
    }

    let chars: Vec<char> = line.text.chars().collect();
    let piece = |a: usize, b: usize| chars[a..b].iter().collect::<String>();
    Line::from(vec![
        Span::styled(piece(0, from), normal),
        Span::styled(piece(from, to), Style::default().fg(text()).bg(bg_selected())),
        Span::styled(piece(to, len), normal),
    ])
}

fn draw_selection_box(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Selection ", Style::default().fg(header())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let Some(record) = app.tracker.record() else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Drag over a message to select text,",
                Style::default().fg(text_dim()),
            )),
            Line::from(Span::styled(
                "then move the pointer over it.",
                Style::default().fg(text_dim()),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(hint, area);
        return;
    };

    let id = &record.message_id;
    let widget = |target| app.surface.widget(id, target).cloned().unwrap_or_default();
    let dom_id = |target| ElementId::new(id, target).to_string();

    let mut lines = vec![Line::from(Span::styled(
        "═══ Comment on selection ═══",
        Style::default().fg(header()).add_modifier(Modifier::BOLD),
    ))];
    if widget(Target::CommentContainer).visible {
        lines.push(Line::from(vec![
            Span::styled("  \"", Style::default().fg(text_dim())),
            Span::styled(widget(Target::CommentSpan).inner_html, Style::default().fg(text())),
            Span::styled("\"", Style::default().fg(text_dim())),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {} = {} chars", dom_id(Target::CommentInput), widget(Target::CommentInput).value.chars().count()),
            Style::default().fg(text_dim()),
        )));
    } else {
        lines.push(Line::from(Span::styled("  (hidden)", Style::default().fg(text_dim()))));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "═══ Like selection ═══",
        Style::default().fg(header()).add_modifier(Modifier::BOLD),
    )));
    let length = widget(Target::SelectionLength).inner_html;
    let cost = widget(Target::LikeCost).inner_html;
    if widget(Target::LikeForm).visible {
        lines.push(Line::from(vec![
            Span::styled("  󰋑 ", Style::default().fg(success())),
            Span::styled(format!("{} characters", length), Style::default().fg(text())),
            Span::styled(" │ ", Style::default().fg(inactive())),
            Span::styled(format!("cost {}", cost), Style::default().fg(accent())),
        ]));
    }
    if widget(Target::LikeError).visible {
        lines.push(Line::from(vec![
            Span::styled("  ", Style::default()),
            Span::styled(
                format!("Too long to like: {} of {} characters", cost, app.config.max_likeable_length),
                Style::default().fg(danger()),
            ),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!("  {}", dom_id(Target::LikeInput)),
        Style::default().fg(text_dim()),
    )));

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block.title(Span::styled(format!("#{} ", id), Style::default().fg(text_dim()))));
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(accent()));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(text_dim()));

    let footer = Paragraph::new(Line::from(vec![
        key("drag"), label(" select  "),
        key("e"), label(" error card  "),
        key("j/k"), label(" scroll  "),
        key("?"), label(" help  "),
        key("q"), label(" quit"),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_error_card(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 100 { 95 } else { 80 },
        if area.height < 35 { 90 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let mode = if app.show_card_source { "HTML" } else { "Card" };
    let block = Block::default()
        .title(Span::styled(format!(" 󰅚 Error {} (s toggles) ", mode), Style::default().fg(danger())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(danger()));

    let lines = if app.show_card_source {
        let html = app.card_html.as_deref().unwrap_or("");
        vec![Line::styled(html.to_string(), Style::default().fg(text()))]
    } else {
        card_lines(app)
    };

    let card = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    f.render_widget(card, popup_area);
}

/// The card as the page would show it: error fields then colored logs
fn card_lines(app: &App) -> Vec<Line<'static>> {
    let Some(envelope) = app.envelope.as_ref() else {
        return Vec::new();
    };
    if envelope.is_success() {
        return vec![Line::styled("No error: the response reports success.", Style::default().fg(success()))];
    }

    let mut lines = vec![Line::from(Span::styled(
        "Error",
        Style::default().fg(danger()).add_modifier(Modifier::BOLD),
    ))];
    if let Some(error) = envelope.error.as_ref() {
        for (label, value) in [
            ("Code", &error.code),
            ("Dev Message", &error.dev_message),
            ("User Message", &error.user_message),
        ] {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
                Span::styled(
                    value.as_ref().map(|v| field_text(v).into_owned()).unwrap_or_default(),
                    Style::default().fg(danger()),
                ),
            ]));
        }
    }

    lines.push(Line::from(""));
    for log in envelope.logs.iter().flatten() {
        let style = match LogStyle::classify(log) {
            LogStyle::Error => Style::default().fg(danger()),
            LogStyle::Warning => Style::default().fg(warning()),
            LogStyle::Todo => Style::default().fg(info()),
            LogStyle::Marker => Style::default().fg(accent_bright()).add_modifier(Modifier::BOLD),
            LogStyle::Plain => Style::default().fg(text_dim()),
        };
        lines.push(Line::styled(log.clone(), style));
    }
    lines
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
    };
    let entry = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("═══ Selecting ═══"),
        entry("  drag      ", "Select text inside one message"),
        entry("  move      ", "Capture the selection for the message under the pointer"),
        entry("  Esc       ", "Drop the live selection (captured one stays)"),
        Line::from(""),
        section("═══ Viewing ═══"),
        entry("  j/k ↑/↓   ", "Scroll messages"),
        entry("  e         ", "Show the error card of the loaded response"),
        entry("  s         ", "Toggle card / HTML source in the error card"),
        Line::from(""),
        section("═══ Command line ═══"),
        entry("  dimantic --card resp.json  ", "Print the error card HTML"),
        entry("  dimantic --envelope resp.json  ", "Open the viewer with a response"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 dimantic Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::conversation::Transcript;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_message_pane_is_inside_messages_box() {
        let area = Rect::new(0, 0, 100, 30);
        let pane = message_pane(area);

        assert_eq!(pane.x, 1);
        assert_eq!(pane.y, 2);
        assert_eq!(pane.width, 58);
        assert_eq!(pane.height, 26);
    }

    #[test]
    fn test_draw_shows_messages_and_hint() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut app = App::new(AppConfig::default(), Transcript::demo(), None);
        app.resize(Rect::new(0, 0, 100, 30));

        terminal.draw(|f| draw(f, &app)).unwrap();
        let screen = screen_text(&terminal);

        assert!(screen.contains("Messages"));
        assert!(screen.contains("#101"));
        assert!(screen.contains("Drag over a message"));
    }

    #[test]
    fn test_highlighted_line_splits_selection() {
        let line = TextLine {
            row: 1,
            start: 10,
            text: "abcdef".to_string(),
        };

        let plain = highlighted_line(&line, None);
        assert_eq!(plain.spans.len(), 1);

        let split = highlighted_line(&line, Some((12, 14)));
        let pieces: Vec<&str> = split.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(pieces, vec!["ab", "cd", "ef"]);

        let outside = highlighted_line(&line, Some((0, 5)));
        assert_eq!(outside.spans.len(), 1);
    }
}
