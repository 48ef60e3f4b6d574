//! TUI layout and rendering with ratatui.
//!
//! # Overview
//!
//! - Login screen with the credential form
//! - Main screen: identity header, naming form with hints, filename
//!   preview, device and session controls, status line, key hints
//! - Modal dialogs for notices, confirmations and the folder prompt
//!
//! Rendering only reads [`App`]; nothing here changes state.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{App, LoginFocus, MainFocus, Modal, PendingConfirm, Screen};
use super::theme::Theme;
use crate::auth::DEFAULT_ACCOUNTS;
use crate::naming::NamingField;

const TITLE: &str = "Endoscopy Data Logger";

fn block_with_title<'a>(title: impl Into<Line<'a>>, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(theme.primary))
        .title(title)
}

/// Render the current screen and any open dialog.
pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let area = frame.area();

    match app.screen() {
        Screen::Login => render_login(frame, app, theme, area),
        Screen::Main => render_main(frame, app, theme, area),
    }

    match app.modal() {
        Modal::None => {}
        Modal::Notice { title, message } => render_notice(frame, theme, title, message, area),
        Modal::Confirm(pending) => render_confirm(frame, theme, pending, area),
        Modal::FolderPrompt(buffer) => render_folder_prompt(frame, theme, buffer, area),
    }
}

// ==================== Login ====================

fn render_login(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let form_area = centered_rect(60, 60, area);

    let masked = "*".repeat(app.password_len());
    let mut lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        input_line(
            "Username",
            app.username(),
            app.login_focus() == LoginFocus::Username,
            theme,
        ),
        input_line(
            "Password",
            &masked,
            app.login_focus() == LoginFocus::Password,
            theme,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Sign in   [Tab] Switch field   [Esc] Quit",
            Style::default().fg(theme.dim),
        )),
        Line::from(""),
        Line::from(Span::styled("Default credentials:", Style::default().fg(theme.dim))),
    ];
    for (username, secret, role) in DEFAULT_ACCOUNTS {
        lines.push(Line::from(Span::styled(
            format!("{role}: {username} / {secret}"),
            Style::default().fg(theme.dim),
        )));
    }

    let form = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(block_with_title("Sign in", theme));
    frame.render_widget(form, form_area);
}

fn input_line<'a>(label: &'a str, value: &str, focused: bool, theme: &Theme) -> Line<'a> {
    let style = if focused {
        Style::default()
            .fg(theme.highlight)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.normal)
    };
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:>12}: "), Style::default().fg(theme.dim)),
        Span::styled(format!("{value}{cursor}"), style),
    ])
}

// ==================== Main ====================

fn render_main(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(9),    // Naming form
            Constraint::Length(4), // Preview
            Constraint::Length(3), // Device and controls
            Constraint::Length(3), // Status
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_header(frame, app, theme, chunks[0]);
    render_form(frame, app, theme, chunks[1]);
    render_preview(frame, app, theme, chunks[2]);
    render_controls(frame, app, theme, chunks[3]);
    render_status(frame, app, theme, chunks[4]);
    render_footer(frame, theme, chunks[5]);
}

fn render_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let user = app
        .controller()
        .identity()
        .map(|identity| format!("Logged in as: {identity}"))
        .unwrap_or_default();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            TITLE,
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(user, Style::default().fg(theme.normal)),
    ]))
    .block(block_with_title("", theme));
    frame.render_widget(header, area);
}

fn render_form(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let controller = app.controller();
    let mut lines: Vec<Line> = NamingField::ALL
        .iter()
        .map(|field| {
            let focused = app.main_focus() == MainFocus::Field(*field);
            let value = controller.fields().get(*field);
            let mut line = input_line(field.label(), value, focused, theme);
            line.spans.push(Span::styled(
                format!("   ({})", field.hint()),
                Style::default().fg(theme.dim),
            ));
            line
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(input_line(
        "Output folder",
        &controller.output_folder().display().to_string(),
        app.main_focus() == MainFocus::Folder,
        theme,
    ));

    let form = Paragraph::new(Text::from(lines)).block(block_with_title("File Naming", theme));
    frame.render_widget(form, area);
}

fn render_preview(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let controller = app.controller();
    let lines = vec![
        Line::from(vec![
            Span::styled("Filename: ", Style::default().fg(theme.dim)),
            Span::styled(
                controller.filename().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Full path: ", Style::default().fg(theme.dim)),
            Span::raw(controller.full_path().display().to_string()),
        ]),
    ];
    let preview = Paragraph::new(Text::from(lines)).block(block_with_title("Preview", theme));
    frame.render_widget(preview, area);
}

fn render_controls(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let controller = app.controller();
    let device = match controller.device() {
        Some(device) => Span::styled(
            format!("Device: {device}"),
            Style::default().fg(theme.success),
        ),
        None => Span::styled("Device: not detected", Style::default().fg(theme.danger)),
    };
    let control = |label: &'static str, enabled: bool, color| {
        if enabled {
            Span::styled(
                label,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label, Style::default().fg(theme.dim))
        }
    };

    let line = Line::from(vec![
        device,
        Span::raw("    "),
        control("[F5] Start Logging", controller.start_enabled(), theme.success),
        Span::raw("  "),
        control("[F6] Stop Logging", controller.stop_enabled(), theme.danger),
        Span::raw("    "),
        Span::styled(
            format!("{} lines", controller.lines_logged()),
            Style::default().fg(theme.normal),
        ),
    ]);
    let controls = Paragraph::new(line).block(block_with_title("Data Logging", theme));
    frame.render_widget(controls, area);
}

fn render_status(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let color = if app.controller().is_running() {
        theme.success
    } else {
        theme.normal
    };
    let status = Paragraph::new(Span::styled(
        app.controller().status().to_string(),
        Style::default().fg(color),
    ))
    .block(block_with_title("Status", theme));
    frame.render_widget(status, area);
}

fn render_footer(frame: &mut Frame, theme: &Theme, area: Rect) {
    let commands = [
        ("Tab", "Next"),
        ("F2", "Detect"),
        ("F3", "Folder"),
        ("F5", "Start"),
        ("F6", "Stop"),
        ("F8", "Logout"),
        ("F10", "Quit"),
    ];
    let spans: Vec<Span> = commands
        .iter()
        .flat_map(|(key, desc)| {
            [
                Span::styled(
                    format!("[{key}]"),
                    Style::default()
                        .fg(theme.highlight)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{desc} "), Style::default().fg(theme.normal)),
            ]
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

// ==================== Dialogs ====================

fn render_notice(frame: &mut Frame, theme: &Theme, title: &str, message: &str, area: Rect) {
    let dialog_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, dialog_area);

    let color = if title == "Error" || title == "Warning" {
        theme.danger
    } else {
        theme.success
    };
    let text = Text::from(vec![
        Line::from(""),
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("[Enter] OK", Style::default().fg(theme.primary))),
    ]);
    let notice = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block_with_title(title.to_string(), theme).border_style(Style::default().fg(color)));
    frame.render_widget(notice, dialog_area);
}

fn render_confirm(frame: &mut Frame, theme: &Theme, pending: &PendingConfirm, area: Rect) {
    let dialog_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, dialog_area);

    let (title, question) = match pending {
        PendingConfirm::Overwrite(path) => (
            "File Exists",
            format!("File {} already exists. Overwrite?", path.display()),
        ),
        PendingConfirm::StopForLogout => (
            "Confirm Logout",
            "Data logging is active. Stop logging and logout?".to_string(),
        ),
        PendingConfirm::StopForExit => (
            "Confirm Exit",
            "Data logging is active. Stop logging and exit?".to_string(),
        ),
    };
    let text = Text::from(vec![
        Line::from(""),
        Line::from(question),
        Line::from(""),
        Line::from(Span::styled(
            "[Y/Enter] Yes    [N/Esc] No",
            Style::default().fg(theme.primary),
        )),
    ]);
    let confirm = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block_with_title(title, theme).border_style(Style::default().fg(theme.danger)));
    frame.render_widget(confirm, dialog_area);
}

fn render_folder_prompt(frame: &mut Frame, theme: &Theme, buffer: &str, area: Rect) {
    let dialog_area = centered_rect(70, 25, area);
    frame.render_widget(Clear, dialog_area);

    let text = Text::from(vec![
        Line::from(""),
        input_line("Folder", buffer, true, theme),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Select    [Esc] Cancel",
            Style::default().fg(theme.primary),
        )),
    ]);
    let prompt = Paragraph::new(text).block(block_with_title("Select Output Folder", theme));
    frame.render_widget(prompt, dialog_area);
}

/// Create a centered rectangle with given percentage of parent.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

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
    use crate::auth::CredentialStore;
    use crate::config::Config;
    use crate::controller::SessionController;
    use crate::device::{
        DeviceConnector, DeviceError, DeviceRef, LineSource, LinkSettings, PortInfo,
    };
    use crate::tui::app::Action;
    use ratatui::{backend::TestBackend, Terminal};

    struct Unplugged;

    impl DeviceConnector for Unplugged {
        fn connect(
            &self,
            _device: &DeviceRef,
            _settings: &LinkSettings,
        ) -> Result<Box<dyn LineSource>, DeviceError> {
            Err(DeviceError::NotFound)
        }
    }

    fn app() -> App {
        let controller = SessionController::new(
            CredentialStore::seeded(),
            &Config::default(),
            Box::new(Unplugged),
        );
        App::new(
            controller,
            Box::new(vec![PortInfo::new("COM5", "Arduino Uno")]),
            None,
        )
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal
            .draw(|frame| render(frame, app, &Theme::dark()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 100);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.width < area.width);
    }

    #[test]
    fn test_login_screen_masks_password() {
        let mut app = app();
        for c in "admin".chars() {
            app.handle_action(Action::Input(c));
        }
        app.handle_action(Action::NextInput);
        for c in "secret".chars() {
            app.handle_action(Action::Input(c));
        }
        let screen = draw(&app);
        assert!(screen.contains("admin"));
        assert!(screen.contains("******"));
        assert!(!screen.contains("secret"));
        assert!(screen.contains("admin / admin123"));
    }

    #[test]
    fn test_main_screen_shows_preview_and_device() {
        let mut app = app();
        for c in "admin".chars() {
            app.handle_action(Action::Input(c));
        }
        app.handle_action(Action::NextInput);
        for c in "admin123".chars() {
            app.handle_action(Action::Input(c));
        }
        app.handle_action(Action::Submit);
        app.handle_action(Action::Submit);

        let screen = draw(&app);
        assert!(screen.contains("Logged in as: admin (admin)"));
        assert!(screen.contains("CRB1Y1E01S1T1.csv"));
        assert!(screen.contains("Device: COM5"));
        assert!(screen.contains("Experiment Type"));
    }
}
