pub mod context_menu;
pub mod messages;
pub mod shortcuts;

pub use context_menu::MenuEntry;
pub use messages::{Action, action_for_button};
pub use shortcuts::ShortcutManager;
