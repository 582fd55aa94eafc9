//! Pure transformations over [`Session`] values.
//!
//! The session map itself is owned by the runtime; request processing clones
//! a `Session` in, transforms it here, and writes it back.

use picoclaw_protocol::{Message, Session};

pub fn empty(key: impl Into<String>) -> Session {
    Session::new(key)
}

/// Append a message. Grows both the window and the all-time count.
pub fn add_message(mut session: Session, message: Message) -> Session {
    session.messages.push(message);
    session.message_count += 1;
    session
}

/// Fold all but the last `keep_last` messages into the summary.
///
/// `message_count` is untouched: summarization forgets text, not history.
pub fn summarize(mut session: Session, new_summary: &str, keep_last: usize) -> Session {
    let keep = keep_last.min(session.messages.len());
    session.messages = session.messages.split_off(session.messages.len() - keep);
    session.summary = if session.summary.is_empty() {
        new_summary.to_owned()
    } else {
        format!("{}\n\n{new_summary}", session.summary)
    };
    session
}

/// The message window handed to the model: the summary (when present) as a
/// leading system message, then the retained messages.
pub fn build_context(session: &Session) -> Vec<Message> {
    if session.summary.is_empty() {
        return session.messages.clone();
    }
    let mut context = Vec::with_capacity(session.messages.len() + 1);
    context.push(Message::system(format!(
        "Previous conversation summary:\n{}",
        session.summary
    )));
    context.extend(session.messages.iter().cloned());
    context
}

pub fn needs_summarization(session: &Session, max_messages: usize) -> bool {
    session.messages.len() > max_messages
}
