//! Rule-based plant assistant ("Plant GPT") behind the chatbot routes.

pub mod intent;
pub mod reply;
pub mod session;

pub use intent::{detect_intent, Intent, IntentKind};
pub use reply::compose_reply;
pub use session::{ChatSessions, ChatTurn, Speaker};
