//! LSP request/notification handlers.

mod code_action;
mod commands;
mod configuration;
mod documents;
mod initialize;
mod links;

pub use code_action::handle_code_action;
pub use commands::{Command, parse_command};
pub use configuration::handle_did_change_configuration;
pub use documents::{handle_did_change, handle_did_close, handle_did_open, handle_did_save};
pub use initialize::{handle_initialize, handle_initialized, handle_shutdown};
pub use links::handle_document_link;
