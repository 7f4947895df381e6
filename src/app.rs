use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::Instant;

use crate::card::{render_error_card, ResponseEnvelope};
use crate::config::AppConfig;
use crate::conversation::drag::DragSelection;
use crate::conversation::layout::{Hit, TranscriptLayout};
use crate::conversation::{Message, Transcript};
use crate::selection::{SelectionOutcome, SelectionTracker};
use crate::surface::MemorySurface;

/// Seconds a status message stays on the info line
const STATUS_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    ErrorCard,
    Help,
}

pub struct App {
    pub popup: Popup,
    pub config: AppConfig,

    // Messages and where they sit on screen
    pub transcript: Transcript,
    pub layout: TranscriptLayout,
    pub pane: Rect,       // Inner area of the messages box, from the last resize
    pub scroll: usize,    // First visible content row
    pub hovered: Option<usize>,

    // Selection state
    pub drag: DragSelection,
    pub tracker: SelectionTracker,
    pub surface: MemorySurface,

    // Error card
    pub envelope: Option<ResponseEnvelope>,
    pub card_html: Option<String>,
    pub show_card_source: bool,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, transcript: Transcript, envelope: Option<ResponseEnvelope>) -> Self {
        // One set of selection widgets per message, as the page markup has
        let mut surface = MemorySurface::new();
        for message in &transcript.messages {
            surface.register_message(&message.id);
        }

        let mut app = Self {
            popup: Popup::None,
            tracker: SelectionTracker::new(config.missing_targets),
            config,

            transcript,
            layout: TranscriptLayout::default(),
            pane: Rect::default(),
            scroll: 0,
            hovered: None,

            drag: DragSelection::default(),
            surface,

            envelope: None,
            card_html: None,
            show_card_source: false,

            status_message: None,
            status_message_time: None,
        };

        if let Some(envelope) = envelope {
            app.load_envelope(envelope);
        }

        app
    }

    /// Set a status message (auto-clears after a few seconds)
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Render and keep the error card for `envelope`
    pub fn load_envelope(&mut self, envelope: ResponseEnvelope) {
        match render_error_card(&envelope, &self.config.card_options()) {
            Ok(html) => {
                if html.is_empty() {
                    self.set_status("Response envelope reports success, no error card");
                }
                self.card_html = Some(html);
            }
            Err(e) => {
                tracing::warn!("Could not render error card: {}", e);
                self.set_status(format!("Error card: {}", e));
                self.card_html = None;
            }
        }
        self.envelope = Some(envelope);
    }

    /// Recompute the message layout for a new terminal size
    pub fn resize(&mut self, area: Rect) {
        let pane = crate::ui::message_pane(area);
        if pane.width != self.pane.width || self.layout.blocks.len() != self.transcript.messages.len() {
            self.layout = TranscriptLayout::new(&self.transcript, pane.width as usize);
        }
        self.pane = pane;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.layout.total_rows.saturating_sub(self.pane.height as usize)
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.transcript.get(index)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            self.handle_popup_key(key);
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => {
                // Drops the live selection; the captured one stays in the widgets
                self.drag.clear();
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(self.pane.height as isize),
            KeyCode::PageUp => self.scroll_by(-(self.pane.height as isize)),
            KeyCode::Char('e') => {
                if self.envelope.is_some() {
                    self.popup = Popup::ErrorCard;
                } else {
                    self.set_status("No response envelope loaded (use --envelope)");
                }
            }
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            _ => {}
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        match (self.popup, key.code) {
            (Popup::ErrorCard, KeyCode::Char('s')) => {
                self.show_card_source = !self.show_card_source;
            }
            (_, KeyCode::Esc) | (Popup::ErrorCard, KeyCode::Char('e')) => {
                self.popup = Popup::None;
            }
            (Popup::Help, KeyCode::Char('?') | KeyCode::Char('h')) => {
                self.popup = Popup::None;
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.popup != Popup::None {
            return Ok(());
        }

        let hit = self.hit_at(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => match hit {
                Some(hit) => self.drag.start(hit),
                None => self.drag.clear(),
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(hit) = hit {
                    self.drag.extend(&self.transcript, hit);
                }
                self.hovered = hit.map(|h| h.message);
                // The drag belongs to the message it started in
                let anchor = self.drag.span().map(|(message, _, _)| message);
                self.track_selection(anchor.or(self.hovered))?;
            }
            MouseEventKind::Moved => {
                self.hovered = hit.map(|h| h.message);
                self.track_selection(self.hovered)?;
            }
            MouseEventKind::ScrollDown => self.scroll_by(3),
            MouseEventKind::ScrollUp => self.scroll_by(-3),
            _ => {}
        }
        Ok(())
    }

    /// Feed the current selection to the tracker on behalf of `message`
    fn track_selection(&mut self, message: Option<usize>) -> Result<()> {
        let Some(message_id) = message
            .and_then(|index| self.transcript.get(index))
            .map(|m| m.id.clone())
        else {
            return Ok(());
        };

        let outcome = self.tracker.update_selection(
            &mut self.surface,
            &self.drag,
            &message_id,
            self.config.max_likeable_length,
        )?;

        if let SelectionOutcome::Updated { length, likeable } = outcome {
            if !likeable {
                self.set_status(format!(
                    "Selection of {} characters is over the like limit of {}",
                    length, self.config.max_likeable_length
                ));
            }
        }
        Ok(())
    }

    /// Map a terminal cell to a message position
    fn hit_at(&self, column: u16, row: u16) -> Option<Hit> {
        let pane = self.pane;
        if column < pane.x || row < pane.y || column >= pane.right() || row >= pane.bottom() {
            return None;
        }
        let col = (column - pane.x) as usize;
        let row = (row - pane.y) as usize + self.scroll;
        self.layout.hit_test(col, row)
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }

    pub fn tick(&mut self) {
        // Clear status message after a few seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_SECONDS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::surface::{ElementId, MessageId, Target};
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(config: AppConfig) -> App {
        let mut app = App::new(config, Transcript::demo(), None);
        app.resize(Rect::new(0, 0, 120, 40));
        app
    }

    /// Screen cell of a char offset in the first wrapped line of a message
    fn cell(app: &App, message: usize, offset: usize) -> (u16, u16) {
        let line = &app.layout.block(message).unwrap().lines[0];
        (
            app.pane.x + (offset - line.start) as u16,
            app.pane.y + (line.row - app.scroll) as u16,
        )
    }

    fn select(app: &mut App, message: usize, from: usize, to: usize) {
        let (x0, y0) = cell(app, message, from);
        let (x1, y1) = cell(app, message, to);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), x0, y0))
            .unwrap();
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), x1, y1))
            .unwrap();
    }

    #[test]
    fn test_drag_updates_widgets() {
        let mut app = app_with(AppConfig::default());
        select(&mut app, 0, 0, 4);

        let id = app.message(0).unwrap().id.clone();
        let record = app.tracker.record().unwrap();
        assert_eq!(record.message_id, id);
        assert_eq!(record.text, "Drag");
        assert_eq!(
            app.surface.widget(&id, Target::CommentSpan).unwrap().inner_html,
            "Drag"
        );
        assert!(app.surface.widget(&id, Target::LikeForm).unwrap().visible);
    }

    #[test]
    fn test_drag_into_next_message_stays_with_anchor() {
        let mut app = app_with(AppConfig::default());
        let (x0, y0) = cell(&app, 0, 5);
        let (x1, y1) = cell(&app, 1, 3);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), x0, y0))
            .unwrap();
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), x1, y1))
            .unwrap();

        assert_eq!(app.hovered, Some(1));
        let first = app.message(0).unwrap().clone();
        let expected: String = first.text.chars().skip(5).collect();
        let record = app.tracker.record().unwrap();
        assert_eq!(record.message_id.as_str(), "101");
        assert_eq!(record.text, expected);
        assert_eq!(
            app.surface.widget(&first.id, Target::CommentSpan).unwrap().inner_html,
            expected
        );

        let second = app.message(1).unwrap().id.clone();
        assert!(!app.surface.widget(&second, Target::CommentContainer).unwrap().visible);
        assert_eq!(
            app.surface.widget(&second, Target::CommentSpan).unwrap().inner_html,
            ""
        );
    }

    #[test]
    fn test_moving_over_other_message_keeps_selection() {
        let mut app = app_with(AppConfig::default());
        select(&mut app, 0, 0, 4);

        let (x, y) = cell(&app, 1, 2);
        app.handle_mouse(mouse(MouseEventKind::Moved, x, y)).unwrap();

        assert_eq!(app.hovered, Some(1));
        let record = app.tracker.record().unwrap();
        assert_eq!(record.message_id, app.message(0).unwrap().id);
        assert_eq!(record.text, "Drag");
    }

    #[test]
    fn test_long_selection_over_limit() {
        let config = AppConfig {
            max_likeable_length: 3,
            ..AppConfig::default()
        };
        let mut app = app_with(config);
        select(&mut app, 1, 0, 5);

        let id = app.message(1).unwrap().id.clone();
        assert!(!app.surface.widget(&id, Target::LikeForm).unwrap().visible);
        assert!(app.surface.widget(&id, Target::LikeError).unwrap().visible);
        assert!(app.status_message.as_deref().unwrap().contains("over the like limit"));
    }

    #[test]
    fn test_missing_widget_error_reaches_caller() {
        let mut app = app_with(AppConfig {
            missing_targets: FailurePolicy::Fail,
            ..AppConfig::default()
        });
        let id: MessageId = app.message(0).unwrap().id.clone();
        app.surface.remove(&ElementId::new(&id, Target::LikeError));

        let (x0, y0) = cell(&app, 0, 0);
        let (x1, y1) = cell(&app, 0, 3);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), x0, y0))
            .unwrap();
        let err = app
            .handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), x1, y1))
            .unwrap_err();
        assert!(err.to_string().contains("like_error_div_101"));
    }

    #[test]
    fn test_click_outside_messages_clears_drag() {
        let mut app = app_with(AppConfig::default());
        select(&mut app, 0, 0, 4);

        let outside = app.pane.right() + 2;
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), outside, 5))
            .unwrap();

        assert_eq!(app.drag.text(), "");
        // The captured selection outlives the live one
        assert_eq!(app.tracker.record().unwrap().text, "Drag");
    }

    #[test]
    fn test_error_card_popup_requires_envelope() {
        let mut app = app_with(AppConfig::default());
        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.popup, Popup::None);
        assert!(app.status_message.is_some());

        let envelope = crate::card::parse_envelope(
            r#"{"success": false, "error": {"code": 500, "dev_message": "d", "user_message": "u"}, "logs": ["(err) x"]}"#,
        )
        .unwrap();
        app.load_envelope(envelope);
        app.handle_key(key(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.popup, Popup::ErrorCard);
        assert!(app.card_html.as_deref().unwrap().contains("(err) x"));

        app.handle_key(key(KeyCode::Char('s'))).unwrap();
        assert!(app.show_card_source);
        app.handle_key(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn test_malformed_envelope_sets_status() {
        let mut app = app_with(AppConfig::default());
        app.load_envelope(crate::card::parse_envelope(r#"{"success": false}"#).unwrap());

        assert!(app.card_html.is_none());
        assert!(app.status_message.as_deref().unwrap().starts_with("Error card:"));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app_with(AppConfig::default());
        app.handle_key(key(KeyCode::Char('k'))).unwrap();
        assert_eq!(app.scroll, 0);

        app.resize(Rect::new(0, 0, 40, 8));
        for _ in 0..200 {
            app.handle_key(key(KeyCode::Char('j'))).unwrap();
        }
        assert_eq!(app.scroll, app.layout.total_rows - app.pane.height as usize);
    }
}
