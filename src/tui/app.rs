//! TUI application state.
//!
//! # Overview
//!
//! [`App`] owns the [`SessionController`] and the bits of state that only
//! exist on screen: which screen is shown, which input has focus, the login
//! buffers and the modal dialog. Key presses arrive as [`Action`]s and are
//! turned into controller calls here, so the render and event modules stay
//! free of session logic.
//!
//! The controller's confirmation gates map to [`Modal::Confirm`]: an
//! unconfirmed call that is refused opens the dialog, and accepting it
//! repeats the call with [`Gate::Confirmed`].

use std::path::{Path, PathBuf};

use crate::controller::{ControllerError, DirectoryPicker, Gate, SessionController};
use crate::device::PortEnumerator;
use crate::naming::NamingField;

/// Which top-level screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Main,
}

/// Focused input on the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginFocus {
    #[default]
    Username,
    Password,
}

/// Focusable inputs on the main screen, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainFocus {
    Field(NamingField),
    Folder,
}

impl MainFocus {
    const ORDER: [MainFocus; 7] = [
        Self::Field(NamingField::ExperimentType),
        Self::Field(NamingField::ModelType),
        Self::Field(NamingField::Year),
        Self::Field(NamingField::Experience),
        Self::Field(NamingField::Subject),
        Self::Field(NamingField::Trial),
        Self::Folder,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        let len = Self::ORDER.len();
        Self::ORDER[(self.index() + len - 1) % len]
    }
}

/// An action waiting for the user's yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirm {
    Overwrite(PathBuf),
    StopForLogout,
    StopForExit,
}

/// Dialog drawn over the current screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    None,
    /// Informational or error message; any dismiss key closes it.
    Notice { title: String, message: String },
    /// Yes/no question for a gated action.
    Confirm(PendingConfirm),
    /// Directory prompt with its edit buffer.
    FolderPrompt(String),
}

/// User intent decoded from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Type a character into the focused input
    Input(char),
    /// Delete the last character of the focused input
    Backspace,
    /// Focus the next input
    NextInput,
    /// Focus the previous input
    PreviousInput,
    /// Submit the login form or accept a dialog
    Submit,
    /// Dismiss a dialog or leave the application
    Cancel,
    /// Detect the device
    Detect,
    /// Prompt for the output folder
    Browse,
    /// Start logging
    Start,
    /// Stop logging
    Stop,
    /// Sign out
    Logout,
    /// Quit the application
    Quit,
}

/// Picker answering with the folder typed into the prompt.
struct PromptedFolder(Option<PathBuf>);

impl DirectoryPicker for PromptedFolder {
    fn pick(&mut self, _initial: &Path) -> Option<PathBuf> {
        self.0.take()
    }
}

/// TUI application state.
///
/// Not thread-safe; lives on the terminal thread with the controller.
pub struct App {
    controller: SessionController,
    ports: Box<dyn PortEnumerator>,
    screen: Screen,
    login_focus: LoginFocus,
    username: String,
    password: String,
    main_focus: MainFocus,
    modal: Modal,
    should_quit: bool,
}

impl App {
    /// Create the app on the login screen.
    ///
    /// `startup_warning` (e.g. an unreadable credential file) is shown
    /// immediately.
    #[must_use]
    pub fn new(
        controller: SessionController,
        ports: Box<dyn PortEnumerator>,
        startup_warning: Option<String>,
    ) -> Self {
        let modal = match startup_warning {
            Some(message) => Modal::Notice {
                title: "Warning".to_string(),
                message,
            },
            None => Modal::None,
        };
        Self {
            controller,
            ports,
            screen: Screen::Login,
            login_focus: LoginFocus::Username,
            username: String::new(),
            password: String::new(),
            main_focus: MainFocus::ORDER[0],
            modal,
            should_quit: false,
        }
    }

    #[must_use]
    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    #[must_use]
    pub fn login_focus(&self) -> LoginFocus {
        self.login_focus
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password length only; the text itself is never rendered.
    #[must_use]
    pub fn password_len(&self) -> usize {
        self.password.chars().count()
    }

    #[must_use]
    pub fn main_focus(&self) -> MainFocus {
        self.main_focus
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Apply reader updates; a failure notice opens a dialog.
    pub fn tick(&mut self) {
        self.controller.pump_events();
        if let Some(message) = self.controller.take_notice() {
            self.show_error(message);
        }
    }

    /// Handle one user action.
    pub fn handle_action(&mut self, action: Action) {
        if action == Action::Quit {
            self.request_exit();
            return;
        }
        match self.modal.clone() {
            Modal::None => match self.screen {
                Screen::Login => self.handle_login(action),
                Screen::Main => self.handle_main(action),
            },
            Modal::Notice { .. } => {
                if matches!(action, Action::Submit | Action::Cancel) {
                    self.modal = Modal::None;
                }
            }
            Modal::Confirm(pending) => match action {
                Action::Submit | Action::Input('y' | 'Y') => {
                    self.modal = Modal::None;
                    self.confirm(pending);
                }
                Action::Cancel | Action::Input('n' | 'N') => self.modal = Modal::None,
                _ => {}
            },
            Modal::FolderPrompt(buffer) => self.handle_folder_prompt(action, buffer),
        }
    }

    fn handle_login(&mut self, action: Action) {
        match action {
            Action::Input(c) => self.login_buffer().push(c),
            Action::Backspace => {
                self.login_buffer().pop();
            }
            Action::NextInput | Action::PreviousInput => {
                self.login_focus = match self.login_focus {
                    LoginFocus::Username => LoginFocus::Password,
                    LoginFocus::Password => LoginFocus::Username,
                };
            }
            Action::Submit => self.submit_login(),
            Action::Cancel => self.request_exit(),
            _ => {}
        }
    }

    fn login_buffer(&mut self) -> &mut String {
        match self.login_focus {
            LoginFocus::Username => &mut self.username,
            LoginFocus::Password => &mut self.password,
        }
    }

    fn submit_login(&mut self) {
        match self.controller.login(&self.username, &self.password) {
            Ok(identity) => {
                let message = format!("Welcome, {}!", identity.username());
                self.password.clear();
                self.enter_main();
                self.modal = Modal::Notice {
                    title: "Success".to_string(),
                    message,
                };
            }
            Err(e) => {
                if matches!(e, ControllerError::InvalidCredentials) {
                    self.password.clear();
                    self.login_focus = LoginFocus::Password;
                }
                self.show_error(e.to_string());
            }
        }
    }

    /// Switch to the main screen and try a silent detection.
    fn enter_main(&mut self) {
        self.screen = Screen::Main;
        self.main_focus = MainFocus::ORDER[0];
        if let Err(e) = self.controller.detect_device(self.ports.as_ref()) {
            log::debug!("Initial detection found nothing: {}", e);
        }
    }

    fn handle_main(&mut self, action: Action) {
        match action {
            Action::Input(c) => self.edit_focused(|value| value.push(c)),
            Action::Backspace => self.edit_focused(|value| {
                value.pop();
            }),
            Action::NextInput => self.main_focus = self.main_focus.next(),
            Action::PreviousInput => self.main_focus = self.main_focus.previous(),
            Action::Detect => {
                if let Err(e) = self.controller.detect_device(self.ports.as_ref()) {
                    self.show_error(e.to_string());
                }
            }
            Action::Browse => {
                let current = self.controller.output_folder().display().to_string();
                self.modal = Modal::FolderPrompt(current);
            }
            Action::Start => self.start(Gate::Unconfirmed),
            Action::Stop => self.controller.stop(),
            Action::Logout => self.logout(Gate::Unconfirmed),
            Action::Cancel => self.request_exit(),
            _ => {}
        }
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        match self.main_focus {
            MainFocus::Field(field) => {
                let mut value = self.controller.fields().get(field).to_string();
                edit(&mut value);
                self.controller.set_field(field, value);
            }
            MainFocus::Folder => {
                let mut value = self.controller.output_folder().display().to_string();
                edit(&mut value);
                self.controller.set_output_folder(value);
            }
        }
    }

    fn handle_folder_prompt(&mut self, action: Action, mut buffer: String) {
        match action {
            Action::Input(c) => {
                buffer.push(c);
                self.modal = Modal::FolderPrompt(buffer);
            }
            Action::Backspace => {
                buffer.pop();
                self.modal = Modal::FolderPrompt(buffer);
            }
            Action::Submit => {
                self.modal = Modal::None;
                let trimmed = buffer.trim();
                let choice = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
                self.controller.browse_folder(&mut PromptedFolder(choice));
            }
            Action::Cancel => self.modal = Modal::None,
            _ => {}
        }
    }

    fn start(&mut self, gate: Gate) {
        if !self.controller.start_enabled() {
            return;
        }
        if let Err(e) = self.controller.start(gate) {
            self.handle_refusal(e);
        }
    }

    fn logout(&mut self, gate: Gate) {
        match self.controller.logout(gate) {
            Ok(()) => {
                self.screen = Screen::Login;
                self.login_focus = LoginFocus::Username;
                self.username.clear();
                self.password.clear();
            }
            Err(e) => self.handle_refusal(e),
        }
    }

    /// Stop any session without asking and quit; used on external shutdown.
    pub fn force_exit(&mut self) {
        self.exit(Gate::Confirmed);
    }

    fn request_exit(&mut self) {
        self.exit(Gate::Unconfirmed);
    }

    fn exit(&mut self, gate: Gate) {
        match self.controller.exit(gate) {
            Ok(()) => self.should_quit = true,
            Err(ControllerError::ConfirmStopRunning) => {
                self.modal = Modal::Confirm(PendingConfirm::StopForExit);
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn confirm(&mut self, pending: PendingConfirm) {
        match pending {
            PendingConfirm::Overwrite(_) => self.start(Gate::Confirmed),
            PendingConfirm::StopForLogout => self.logout(Gate::Confirmed),
            PendingConfirm::StopForExit => self.exit(Gate::Confirmed),
        }
    }

    fn handle_refusal(&mut self, err: ControllerError) {
        match err {
            ControllerError::ConfirmOverwrite(path) => {
                self.modal = Modal::Confirm(PendingConfirm::Overwrite(path));
            }
            ControllerError::ConfirmStopRunning => {
                self.modal = Modal::Confirm(PendingConfirm::StopForLogout);
            }
            other => self.show_error(other.to_string()),
        }
    }

    fn show_error(&mut self, message: String) {
        self.modal = Modal::Notice {
            title: "Error".to_string(),
            message,
        };
    }
}
