use collab_shooter::{
    ControllerSnapshot,
    ReadinessState,
    accounts::format_address,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    thread,
};
use tokio::sync::mpsc;

pub type InputEventReceiver = mpsc::UnboundedReceiver<std::io::Result<Event>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Redraw,
    Connect { passphrase: String },
    Disconnect,
    CreateBase,
    CreateUser,
    AddEnemy,
    Refresh,
}

impl UserEvent {
    /// Line shown while the controller call is outstanding.
    pub fn busy_message(&self) -> &'static str {
        match self {
            UserEvent::Connect { .. } => "Unlocking wallet...",
            UserEvent::Disconnect => "Disconnecting...",
            UserEvent::CreateBase => "Creating program account...",
            UserEvent::CreateUser => "Creating user account...",
            UserEvent::AddEnemy => "Adding enemy...",
            UserEvent::Refresh => "Refreshing accounts...",
            UserEvent::Quit | UserEvent::Redraw => "",
        }
    }
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    faucet_url: Option<&'static str>,
}

impl UiState {
    pub fn with_faucet(faucet_url: Option<&'static str>) -> Self {
        Self {
            faucet_url,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    Passphrase(String),
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Reads terminal events on a dedicated thread so the async loop can select on them.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        loop {
            let event = event::read();
            let failed = event.is_err();
            if tx.send(event).is_err() || failed {
                break;
            }
        }
    });
    rx
}

pub async fn next_raw_event(input_events: &mut InputEventReceiver) -> Result<Event> {
    let event = input_events
        .recv()
        .await
        .ok_or_else(|| eyre!("terminal input stream closed"))?;
    Ok(event?)
}

/// Drops key presses that queued up while a call was in flight.
pub fn discard_pending(input_events: &mut InputEventReceiver) -> usize {
    let mut dropped = 0;
    while input_events.try_recv().is_ok() {
        dropped += 1;
    }
    dropped
}

pub fn interpret_event(
    state: &mut UiState,
    readiness: ReadinessState,
    event: Event,
) -> Option<UserEvent> {
    let Event::Key(key) = event else {
        return match event {
            Event::Resize(_, _) => Some(UserEvent::Redraw),
            _ => None,
        };
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(UserEvent::Quit);
    }
    if let Mode::Passphrase(buffer) = &mut state.mode {
        let outcome = passphrase_key(buffer, key)?;
        if outcome != UserEvent::Redraw {
            state.mode = Mode::Normal;
        }
        return Some(outcome);
    }
    normal_key(state, readiness, key)
}

fn passphrase_key(buffer: &mut String, key: KeyEvent) -> Option<UserEvent> {
    match key.code {
        KeyCode::Enter => Some(UserEvent::Connect {
            passphrase: std::mem::take(buffer),
        }),
        // Closing the prompt declines the connection.
        KeyCode::Esc => {
            buffer.clear();
            Some(UserEvent::Connect {
                passphrase: String::new(),
            })
        }
        KeyCode::Backspace => {
            buffer.pop();
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            Some(UserEvent::Redraw)
        }
        _ => None,
    }
}

fn normal_key(
    state: &mut UiState,
    readiness: ReadinessState,
    key: KeyEvent,
) -> Option<UserEvent> {
    match (key.code, readiness) {
        (KeyCode::Char('q') | KeyCode::Esc, _) => Some(UserEvent::Quit),
        (KeyCode::Char('c'), ReadinessState::Disconnected) => {
            state.mode = Mode::Passphrase(String::new());
            Some(UserEvent::Redraw)
        }
        (KeyCode::Char('d'), current) if current != ReadinessState::Disconnected => {
            Some(UserEvent::Disconnect)
        }
        (KeyCode::Char('b'), ReadinessState::NeedsBaseInit) => Some(UserEvent::CreateBase),
        (KeyCode::Char('u'), ReadinessState::NeedsUserInit) => Some(UserEvent::CreateUser),
        (KeyCode::Char('e') | KeyCode::Enter, ReadinessState::Ready) => {
            Some(UserEvent::AddEnemy)
        }
        (KeyCode::Char('r'), _) => Some(UserEvent::Refresh),
        _ => None,
    }
}

pub fn draw(state: &mut UiState, snap: &ControllerSnapshot, busy: Option<&str>) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        let mode = state.mode.clone();
        let faucet_url = state.faucet_url;
        let result = term.draw(|f| ui(f, &mode, snap, busy, faucet_url)).map(|_| ());
        state.terminal = Some(term);
        result?;
    }
    Ok(())
}

fn ui(
    f: &mut Frame,
    mode: &Mode,
    snap: &ControllerSnapshot,
    busy: Option<&str>,
    faucet_url: Option<&str>,
) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_wallet_panel(f, chunks[0], snap);
    draw_main_panel(f, chunks[1], snap, faucet_url);
    draw_status(f, chunks[2], snap, busy);
    draw_help(f, chunks[3], snap.state);
    if let Mode::Passphrase(buffer) = mode {
        draw_passphrase_modal(f, buffer);
    }
}

fn draw_wallet_panel(f: &mut Frame, area: Rect, snap: &ControllerSnapshot) {
    let wallet = snap
        .wallet_address
        .as_ref()
        .map(format_address)
        .unwrap_or_else(|| "(not connected)".to_string());
    let user_account = snap
        .user_account
        .map(|address| address.to_string())
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(format!("Wallet: {wallet}")),
        Line::from(format!("User account: {user_account}")),
        Line::from(format!("Program account: {}", snap.base_account)),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Collaborative Space Shooter"));
    f.render_widget(widget, area);
}

fn draw_main_panel(
    f: &mut Frame,
    area: Rect,
    snap: &ControllerSnapshot,
    faucet_url: Option<&str>,
) {
    let (title, lines) = panel_text(snap, faucet_url);
    let widget = Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn panel_text(
    snap: &ControllerSnapshot,
    faucet_url: Option<&str>,
) -> (&'static str, Vec<String>) {
    match snap.state {
        ReadinessState::Disconnected => (
            "Not connected",
            vec!["Press c to connect to your wallet.".to_string()],
        ),
        ReadinessState::NeedsBaseInit => {
            let mut lines = vec![
                "The program account has not been initialized.".to_string(),
                "Press b to do the one-time initialization for the program account."
                    .to_string(),
            ];
            if snap.base_exists {
                lines.push(
                    "A program account exists but no enemies have been added yet."
                        .to_string(),
                );
            }
            ("Program account", lines)
        }
        ReadinessState::NeedsUserInit => {
            let mut lines = vec![
                "Make sure your wallet holds enough funds for the transaction fee."
                    .to_string(),
            ];
            if let Some(url) = faucet_url {
                lines.push(format!("Claim free test tokens at {url}"));
            }
            lines.push(
                "Press u to do the one-time initialization for your user account."
                    .to_string(),
            );
            ("User account", lines)
        }
        ReadinessState::Ready => (
            "Game",
            vec![
                format!("Enemies in the shared game: {}", snap.enemy_count),
                format!("Enemies added with this address: {}", snap.enemies_added),
                String::new(),
                "Press e to add an enemy.".to_string(),
            ],
        ),
    }
}

fn draw_status(f: &mut Frame, area: Rect, snap: &ControllerSnapshot, busy: Option<&str>) {
    let widget = if let Some(message) = busy {
        Paragraph::new(message.to_string())
            .block(Block::default().borders(Borders::ALL).title("Working"))
            .style(Style::default().fg(Color::Yellow))
    } else if snap.notices.is_empty() {
        let status = if snap.status.trim().is_empty() {
            snap.state.to_string()
        } else {
            snap.status.clone()
        };
        Paragraph::new(status)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let lines: Vec<Line> = snap.notices.iter().map(|n| Line::from(n.clone())).collect();
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Notices"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(widget, area);
}

fn help_text(state: ReadinessState) -> &'static str {
    match state {
        ReadinessState::Disconnected => "c connect | r refresh | q/Esc quit",
        ReadinessState::NeedsBaseInit => "b init program account | r refresh | d disconnect | q quit",
        ReadinessState::NeedsUserInit => "u init user account | r refresh | d disconnect | q quit",
        ReadinessState::Ready => "e/Enter add enemy | r refresh | d disconnect | q quit",
    }
}

fn draw_help(f: &mut Frame, area: Rect, state: ReadinessState) {
    let help = Paragraph::new(help_text(state))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_passphrase_modal(f: &mut Frame, buffer: &str) {
    let area = centered_rect(50, 25, f.area());
    let block = Block::default().borders(Borders::ALL).title("Unlock wallet");
    let masked = "*".repeat(buffer.chars().count());
    let p = Paragraph::new(format!(
        "Passphrase: {masked}\n\nEnter=unlock Esc=cancel"
    ));
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(p, block.inner(area));
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use collab_shooter::BaseAccountId;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(state: &mut UiState, text: &str) {
        for c in text.chars() {
            interpret_event(state, ReadinessState::Disconnected, press(KeyCode::Char(c)));
        }
    }

    fn snapshot(state: ReadinessState) -> ControllerSnapshot {
        ControllerSnapshot {
            state,
            wallet_address: None,
            user_account: None,
            base_account: BaseAccountId([0u8; 32]),
            base_exists: false,
            enemy_count: 3,
            enemies_added: 1,
            status: String::new(),
            notices: Vec::new(),
        }
    }

    #[test]
    fn interpret_event__connect_then_enter__submits_typed_passphrase() {
        // given
        let mut state = UiState::default();
        let opened = interpret_event(
            &mut state,
            ReadinessState::Disconnected,
            press(KeyCode::Char('c')),
        );
        type_text(&mut state, "hunter2");

        // when
        let submitted =
            interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Enter));

        // then
        assert_eq!(opened, Some(UserEvent::Redraw));
        assert_eq!(
            submitted,
            Some(UserEvent::Connect {
                passphrase: "hunter2".to_string()
            })
        );
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn interpret_event__escape_in_prompt__declines_with_empty_passphrase() {
        // given
        let mut state = UiState::default();
        interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Char('c')));
        type_text(&mut state, "abc");

        // when
        let event = interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Esc));

        // then
        assert_eq!(
            event,
            Some(UserEvent::Connect {
                passphrase: String::new()
            })
        );
    }

    #[test]
    fn interpret_event__letters_in_prompt_are_not_shortcuts() {
        // given
        let mut state = UiState::default();
        interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Char('c')));

        // when
        let event = interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Char('q')));

        // then
        assert_eq!(event, Some(UserEvent::Redraw));
        assert_eq!(state.mode, Mode::Passphrase("q".to_string()));
    }

    #[test]
    fn interpret_event__actions_only_offered_in_matching_state() {
        let mut state = UiState::default();
        let cases = [
            (KeyCode::Char('b'), ReadinessState::NeedsBaseInit, Some(UserEvent::CreateBase)),
            (KeyCode::Char('b'), ReadinessState::Ready, None),
            (KeyCode::Char('u'), ReadinessState::NeedsUserInit, Some(UserEvent::CreateUser)),
            (KeyCode::Char('u'), ReadinessState::NeedsBaseInit, None),
            (KeyCode::Char('e'), ReadinessState::Ready, Some(UserEvent::AddEnemy)),
            (KeyCode::Enter, ReadinessState::Ready, Some(UserEvent::AddEnemy)),
            (KeyCode::Char('e'), ReadinessState::NeedsUserInit, None),
            (KeyCode::Char('d'), ReadinessState::Disconnected, None),
            (KeyCode::Char('d'), ReadinessState::Ready, Some(UserEvent::Disconnect)),
            (KeyCode::Char('c'), ReadinessState::Ready, None),
        ];
        for (code, readiness, expected) in cases {
            assert_eq!(
                interpret_event(&mut state, readiness, press(code)),
                expected,
                "{code:?} in {readiness}"
            );
        }
    }

    #[test]
    fn interpret_event__ctrl_c__quits_even_in_prompt() {
        // given
        let mut state = UiState::default();
        interpret_event(&mut state, ReadinessState::Disconnected, press(KeyCode::Char('c')));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        // when
        let event = interpret_event(&mut state, ReadinessState::Disconnected, ctrl_c);

        // then
        assert_eq!(event, Some(UserEvent::Quit));
    }

    #[test]
    fn panel_text__ready_shows_both_counters() {
        let (_, lines) = panel_text(&snapshot(ReadinessState::Ready), None);
        assert!(lines.iter().any(|l| l == "Enemies in the shared game: 3"));
        assert!(lines.iter().any(|l| l == "Enemies added with this address: 1"));
    }

    #[test]
    fn panel_text__zero_enemy_program_account_is_called_out() {
        // given
        let mut snap = snapshot(ReadinessState::NeedsBaseInit);
        snap.base_exists = true;

        // when
        let (_, lines) = panel_text(&snap, None);

        // then
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn panel_text__user_init_points_at_faucet_when_network_has_one() {
        // given
        let snap = snapshot(ReadinessState::NeedsUserInit);

        // when
        let (_, with_faucet) = panel_text(&snap, Some("https://faucet.example"));
        let (_, without_faucet) = panel_text(&snap, None);

        // then
        assert!(
            with_faucet
                .iter()
                .any(|l| l == "Claim free test tokens at https://faucet.example")
        );
        assert!(!without_faucet.iter().any(|l| l.contains("faucet")));
        assert_eq!(with_faucet.len(), without_faucet.len() + 1);
    }

    #[tokio::test]
    async fn discard_pending__drains_queued_events() {
        // given
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(Ok(press(KeyCode::Char('e')))).unwrap();
        tx.send(Ok(press(KeyCode::Char('e')))).unwrap();

        // when
        let dropped = discard_pending(&mut rx);

        // then
        assert_eq!(dropped, 2);
        assert!(rx.try_recv().is_err());
    }
}
