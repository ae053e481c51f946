mod coordinator;
mod format;
mod keys;
mod message_view;
mod model;
#[cfg(test)]
mod testing;
mod thread_view;

pub use coordinator::{AppCoordinator, BUILT_IN_LABELS};
pub use format::format_relative_date;
pub use keys::ViewKey;
pub use message_view::MessageView;
pub use model::{AppView, MessageRow, NavItem, ThreadRow};
pub use thread_view::ThreadView;
