mod action;
mod backend;
mod errors;
mod event;
mod loading;
mod message;
mod primer;
mod records;
mod session;
mod slash_commands;
mod store;
mod textarea;
mod turn;

pub use action::*;
pub use backend::*;
pub use errors::*;
pub use event::*;
pub use loading::*;
pub use message::*;
pub use primer::*;
pub use records::*;
pub use session::*;
pub use slash_commands::*;
pub use store::*;
pub use textarea::*;
pub use turn::*;
