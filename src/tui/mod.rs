//! Terminal User Interface module.
//!
//! Interactive front end for the session controller, using ratatui with the
//! crossterm backend.
//!
//! - [`app`]: screen, focus and dialog state around the controller
//! - [`events`]: key presses to [`Action`]s
//! - [`ui`]: rendering
//! - [`run`]: terminal setup and the main loop
//!
//! Data flows one way: key press, [`Action`], [`App`] update, render.

pub mod app;
pub mod events;
pub mod run;
pub mod theme;
pub mod ui;

pub use app::{Action, App, Modal, PendingConfirm, Screen};
pub use events::{map_key, EventError, EventHandler};
pub use run::{run_tui, TuiError};
pub use theme::Theme;
