pub mod accounts;
pub mod actions;
mod app_state;
mod chat_view;
pub mod events;
pub mod identity;
mod scroll;
mod session_manager;
mod transcript_mirror;

pub use accounts::Accounts;
pub use app_state::*;
pub use chat_view::*;
pub use scroll::*;
pub use session_manager::*;
pub use transcript_mirror::*;
