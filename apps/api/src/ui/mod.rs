pub mod handlers;
pub mod session;
pub mod templates;

pub use session::FormSessions;
