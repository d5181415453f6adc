use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::{io, time::Duration};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input};

use chatsync::chat::{ChatSnapshot, ContactRow};
use chatsync::models::{DeliveryStatus, Message};

pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

/// What the user asked for during one input poll
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Quit,
    Select(String),
    Send(String),
    ClearError,
    Refresh,
}

enum Tab {
    Messages,
    Contacts,
}

// Presentation only: everything it shows comes from the snapshot it is handed
pub struct ChatUI {
    input: Input,
    active_tab: Tab,
}

impl ChatUI {
    pub fn new() -> Self {
        ChatUI {
            input: Input::default(),
            active_tab: Tab::Messages,
        }
    }

    pub fn handle_input(&mut self, snapshot: &ChatSnapshot) -> Result<Option<Intent>> {
        if !event::poll(Duration::from_millis(10))? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(None);
        }

        let intent = match key.code {
            KeyCode::Esc => Some(Intent::Quit),
            KeyCode::Tab => {
                self.active_tab = match self.active_tab {
                    Tab::Messages => Tab::Contacts,
                    Tab::Contacts => Tab::Messages,
                };
                None
            }
            KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Intent::ClearError)
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Intent::Refresh)
            }
            KeyCode::Up | KeyCode::Down if matches!(self.active_tab, Tab::Contacts) => {
                step_selection(snapshot, key.code == KeyCode::Down).map(Intent::Select)
            }
            KeyCode::Enter if matches!(self.active_tab, Tab::Messages) => {
                let text = self.input.value().to_string();
                if text.trim().is_empty() || !snapshot.can_send {
                    None
                } else {
                    // Clear input field immediately
                    self.input = Input::default();
                    Some(Intent::Send(text))
                }
            }
            _ => {
                if let Tab::Messages = self.active_tab {
                    self.input.handle_event(&Event::Key(key));
                }
                None
            }
        };

        if let Some(intent) = &intent {
            debug!("UI: intent {:?}", intent);
        }
        Ok(intent)
    }

    pub fn draw<B: Backend>(&self, frame: &mut Frame<B>, snapshot: &ChatSnapshot) {
        let size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30), // Contacts panel
                Constraint::Percentage(70), // Chat panel
            ])
            .split(size);

        let chat_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // Messages area
                Constraint::Length(3), // Input box
                Constraint::Length(1), // Help line
            ])
            .split(chunks[1]);

        draw_contacts(frame, snapshot, chunks[0], matches!(self.active_tab, Tab::Contacts));
        draw_messages(frame, snapshot, chat_chunks[0]);

        let input_title = if snapshot.can_send { "Message" } else { "Message (unavailable)" };
        let input_block = Block::default()
            .title(input_title)
            .borders(Borders::ALL)
            .border_style(match self.active_tab {
                Tab::Messages => Style::default().fg(Color::Yellow),
                Tab::Contacts => Style::default(),
            });
        let input_widget = Paragraph::new(self.input.value()).block(input_block);
        frame.render_widget(input_widget, chat_chunks[1]);

        let help = Paragraph::new(Line::from(vec![Span::styled(
            "ESC quit | TAB switch | Up/Down select | Enter send | Ctrl+E dismiss error | Ctrl+R refresh",
            Style::default().fg(Color::Gray),
        )]));
        frame.render_widget(help, chat_chunks[2]);

        if let Tab::Messages = self.active_tab {
            frame.set_cursor(
                chat_chunks[1].x + self.input.cursor() as u16 + 1,
                chat_chunks[1].y + 1,
            );
        }
    }
}

// Id of the contact above or below the current selection, wrapping around
fn step_selection(snapshot: &ChatSnapshot, forward: bool) -> Option<String> {
    let count = snapshot.contacts.len();
    if count == 0 {
        return None;
    }
    let current = snapshot.contacts.iter().position(|c| c.is_selected);
    let next = match (current, forward) {
        (None, _) => 0,
        (Some(i), true) => (i + 1) % count,
        (Some(i), false) => (i + count - 1) % count,
    };
    Some(snapshot.contacts[next].id.clone())
}

fn contact_lines(contact: &ContactRow) -> Vec<Line<'static>> {
    let marker = if contact.is_selected { "> " } else { "  " };
    let presence = if contact.is_online { "● " } else { "" };
    let mut header = vec![Span::raw(format!(
        "{}[{}] {}{}",
        marker, contact.initials, presence, contact.phone_number
    ))];
    if let (false, Some(seen)) = (contact.is_online, &contact.last_seen) {
        header.push(Span::styled(
            format!(" · last seen {}", seen),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if contact.unread > 0 {
        header.push(Span::styled(
            format!(" ({})", contact.unread),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ));
    }

    let detail = Span::styled(
        format!("     {} · {}", contact.last_message, contact.timestamp),
        Style::default().fg(Color::Gray),
    );
    vec![Line::from(header), Line::from(detail)]
}

fn draw_contacts<B: Backend>(f: &mut Frame<B>, snapshot: &ChatSnapshot, area: Rect, focused: bool) {
    let items: Vec<ListItem> = if snapshot.loading && snapshot.contacts.is_empty() {
        vec![ListItem::new("Loading contacts...")]
    } else if snapshot.contacts.is_empty() {
        vec![ListItem::new("No contacts found")]
    } else {
        snapshot
            .contacts
            .iter()
            .map(|c| {
                let style = if c.is_selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(Text::from(contact_lines(c))).style(style)
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title("Contacts (Tab to focus)")
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }),
    );
    f.render_widget(list, area);
}

fn status_glyph(message: &Message) -> &'static str {
    if !message.is_outgoing() {
        return "";
    }
    match message.status {
        Some(DeliveryStatus::Sending) => " …",
        Some(DeliveryStatus::Sent) => " ✓",
        Some(DeliveryStatus::Delivered) => " ✓✓",
        Some(DeliveryStatus::Read) => " ✓✓✓",
        None => "",
    }
}

fn draw_messages<B: Backend>(f: &mut Frame<B>, snapshot: &ChatSnapshot, area: Rect) {
    let (banner_area, list_area) = if snapshot.error.is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);
        (Some(chunks[0]), chunks[1])
    } else {
        (None, area)
    };

    if let (Some(error), Some(banner_area)) = (&snapshot.error, banner_area) {
        let banner = Paragraph::new(format!("⚠ {}", error))
            .style(Style::default().fg(Color::White).bg(Color::Red));
        f.render_widget(banner, banner_area);
    }

    let Some(contact) = &snapshot.selected_contact else {
        let placeholder = Paragraph::new("Select a contact to start chatting")
            .block(Block::default().borders(Borders::ALL).title("Messages"));
        f.render_widget(placeholder, list_area);
        return;
    };

    let wrap_width = list_area.width.saturating_sub(2).max(1) as usize; // Account for borders

    let items: Vec<ListItem> = snapshot
        .messages
        .iter()
        .flat_map(|m| {
            let who = if m.is_outgoing() { "You" } else { "Them" };
            let full_content = format!("[{}] {}: {}{}", m.timestamp, who, m.text, status_glyph(m));

            let wrapped_lines: Vec<String> = wrap(&full_content, wrap_width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect();

            let style = match m.status {
                Some(DeliveryStatus::Sending) => Style::default().fg(Color::DarkGray),
                Some(_) => Style::default().fg(Color::Blue),
                None => Style::default(),
            };

            wrapped_lines
                .into_iter()
                .map(move |line| ListItem::new(Text::from(line)).style(style))
        })
        .collect();

    let title = format!("Chat with {}", contact.phone_number);

    // Keep the newest message in view
    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(items.len() - 1));
    }

    let messages_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default());
    f.render_stateful_widget(messages_list, list_area, &mut list_state);
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, selected: bool) -> ContactRow {
        ContactRow {
            id: id.to_string(),
            phone_number: "+1 (555) 123-4567".to_string(),
            initials: "45".to_string(),
            last_message: "Hi".to_string(),
            timestamp: "2:30 PM".to_string(),
            unread: 0,
            is_selected: selected,
            is_online: false,
            last_seen: None,
        }
    }

    fn header_text(row: &ContactRow) -> String {
        contact_lines(row)[0]
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    fn snapshot(rows: Vec<ContactRow>) -> ChatSnapshot {
        ChatSnapshot {
            selected_contact: rows.iter().find(|r| r.is_selected).cloned(),
            contacts: rows,
            messages: Vec::new(),
            loading: false,
            error: None,
            can_send: true,
        }
    }

    #[test]
    fn test_step_selection_wraps() {
        let snap = snapshot(vec![row("1", false), row("2", false), row("3", true)]);
        assert_eq!(step_selection(&snap, true), Some("1".to_string()));
        assert_eq!(step_selection(&snap, false), Some("2".to_string()));

        let empty = snapshot(Vec::new());
        assert_eq!(step_selection(&empty, true), None);
    }

    #[test]
    fn test_presence_in_contact_header() {
        let mut away = row("1", false);
        away.last_seen = Some("10:15 AM".to_string());
        assert!(header_text(&away).ends_with(" · last seen 10:15 AM"));

        // Online contacts show the dot instead
        let mut online = away.clone();
        online.is_online = true;
        let header = header_text(&online);
        assert!(header.contains("● +1 (555) 123-4567"));
        assert!(!header.contains("last seen"));

        assert!(!header_text(&row("2", false)).contains("last seen"));
    }
}
