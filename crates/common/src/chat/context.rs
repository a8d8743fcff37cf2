//! Chat context assembly
//!
//! Turns the client's chat history into the exact message list sent to the
//! generative backend:
//! - a fixed two-turn persona preamble (framing + canned greeting)
//! - the seed turn shown by the UI is excluded, never duplicated
//! - whitespace-only turns are dropped
//! - a sliding window keeps the most recent turns
//! - client roles are mapped onto backend roles

use serde::{Deserialize, Serialize};

/// Persona framing, sent as the first user turn
pub const SYSTEM_INSTRUCTION: &str = "\
You are Sikh AI, a digital seva (service) dedicated to sharing the wisdom of Sikhi.

GUIDELINES:
1. Your answers must be rooted in the teachings of the Sri Guru Granth Sahib Ji.
2. When explaining concepts (like Seva, Simran, Hukam), try to include a relevant Gurbani quote or reference in English.
3. Be humble, respectful, and concise.
4. If you are asked a political or controversial question, steer the answer back to spiritual principles (Gurmat).
5. Maintain context of the ongoing conversation. If the user refers to \"he\", \"her\", or \"it\" from a previous message, infer the context correctly.

Now, please introduce yourself.";

/// Canned greeting, sent as the first model turn
pub const CANNED_GREETING: &str = "Waheguru Ji Ka Khalsa, Waheguru Ji Ki Fateh. I am Sikh AI. I am here to help you explore the wisdom of the Gurus. How can I serve you today?";

/// Greeting the chat page seeds its history with
pub const UI_SEED_GREETING: &str = "Waheguru Ji Ka Khalsa, Waheguru Ji Ki Fateh. How can I help you learn about Sikhism today?";

/// Default number of history turns forwarded upstream
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Role label used by the client
///
/// `ai`, `assistant` and `model` mark the persona; any other label is
/// treated as the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ChatRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
}

impl From<String> for ChatRole {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "ai" | "assistant" | "model" => ChatRole::Assistant,
            _ => ChatRole::User,
        }
    }
}

/// One turn of client-side chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,

    #[serde(default)]
    pub text: String,

    /// Marks the synthetic greeting the UI starts every conversation with
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub seed: bool,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: ChatRole::User, text: text.into(), seed: false }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, text: text.into(), seed: false }
    }

    /// The seed contract: tagged explicitly, or the first turn carrying one
    /// of the known greetings.
    pub fn is_seed(&self, index: usize) -> bool {
        if self.seed {
            return true;
        }
        let text = self.text.trim();
        index == 0 && (text == CANNED_GREETING || text == UI_SEED_GREETING)
    }
}

/// Role label used by the generative backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendRole {
    User,
    Model,
}

impl From<ChatRole> for BackendRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => BackendRole::User,
            ChatRole::Assistant => BackendRole::Model,
        }
    }
}

/// One message as the backend receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMessage {
    pub role: BackendRole,
    pub text: String,
}

impl BackendMessage {
    fn new(role: BackendRole, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }
}

/// Everything needed for one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    /// Preamble followed by the windowed history
    pub history: Vec<BackendMessage>,

    /// The new user message
    pub message: String,
}

impl ChatContext {
    /// The full ordered conversation: history, then the new message
    pub fn contents(&self) -> Vec<BackendMessage> {
        let mut contents = self.history.clone();
        contents.push(BackendMessage::new(BackendRole::User, self.message.clone()));
        contents
    }
}

/// The fixed persona preamble
pub fn persona_preamble() -> [BackendMessage; 2] {
    [
        BackendMessage::new(BackendRole::User, SYSTEM_INSTRUCTION),
        BackendMessage::new(BackendRole::Model, CANNED_GREETING),
    ]
}

/// Assemble the context for one chat request.
///
/// Filtering happens before the window is applied, so the window always holds
/// the `window` most recent non-empty turns.
pub fn assemble_context(message: &str, history: &[ChatTurn], window: usize) -> ChatContext {
    let kept: Vec<&ChatTurn> = history
        .iter()
        .enumerate()
        .filter(|(index, turn)| !turn.is_seed(*index))
        .map(|(_, turn)| turn)
        .filter(|turn| !turn.text.trim().is_empty())
        .collect();

    let skip = kept.len().saturating_sub(window);

    let mut assembled: Vec<BackendMessage> = persona_preamble().into();
    assembled.extend(
        kept.into_iter()
            .skip(skip)
            .map(|turn| BackendMessage::new(turn.role.into(), turn.text.clone())),
    );

    ChatContext {
        history: assembled,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatTurn::user(format!("question {}", i))
                } else {
                    ChatTurn::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_long_history_keeps_last_ten_after_preamble() {
        let history = alternating(25);
        let ctx = assemble_context("next", &history, DEFAULT_HISTORY_WINDOW);

        assert_eq!(ctx.history.len(), 2 + 10);
        assert_eq!(ctx.history[0].text, SYSTEM_INSTRUCTION);
        assert_eq!(ctx.history[1].text, CANNED_GREETING);

        let texts: Vec<&str> = ctx.history[2..].iter().map(|m| m.text.as_str()).collect();
        let expected: Vec<String> = history[15..].iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_counts_only_non_empty_turns() {
        let mut history = alternating(12);
        // Blank turns near the end must not eat into the window
        history.insert(11, ChatTurn::user("   "));
        history.insert(5, ChatTurn::assistant(""));

        let ctx = assemble_context("next", &history, 10);
        assert_eq!(ctx.history.len(), 12);
        assert!(ctx.history.iter().all(|m| !m.text.trim().is_empty()));
        assert_eq!(ctx.history[2].text, "question 2");
        assert_eq!(ctx.history.last().map(|m| m.text.as_str()), Some("answer 11"));
    }

    #[test]
    fn test_canned_greeting_first_is_excluded() {
        let history = vec![
            ChatTurn::assistant(CANNED_GREETING),
            ChatTurn::user("What is seva?"),
        ];
        let ctx = assemble_context("And simran?", &history, 10);

        let greetings = ctx.history.iter().filter(|m| m.text == CANNED_GREETING).count();
        assert_eq!(greetings, 1);
        assert_eq!(ctx.history.len(), 3);
    }

    #[test]
    fn test_ui_seed_greeting_is_excluded() {
        let history = vec![ChatTurn::assistant(UI_SEED_GREETING), ChatTurn::user("hello")];
        let ctx = assemble_context("hi", &history, 10);
        assert!(ctx.history.iter().all(|m| m.text != UI_SEED_GREETING));
    }

    #[test]
    fn test_tagged_seed_is_excluded_wherever_it_is() {
        let mut seed = ChatTurn::assistant("Welcome, a custom greeting");
        seed.seed = true;
        let history = vec![ChatTurn::user("hello"), seed];
        let ctx = assemble_context("hi", &history, 10);
        assert_eq!(ctx.history.len(), 3);
    }

    #[test]
    fn test_greeting_later_in_history_is_kept() {
        let history = vec![
            ChatTurn::user("say the greeting again"),
            ChatTurn::assistant(CANNED_GREETING),
        ];
        let ctx = assemble_context("thanks", &history, 10);
        assert_eq!(ctx.history.len(), 4);
    }

    #[test]
    fn test_roles_are_mapped() {
        let history = vec![ChatTurn::user("q"), ChatTurn::assistant("a")];
        let ctx = assemble_context("next", &history, 10);
        assert_eq!(ctx.history[2].role, BackendRole::User);
        assert_eq!(ctx.history[3].role, BackendRole::Model);

        let contents = ctx.contents();
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[4].role, BackendRole::User);
        assert_eq!(contents[4].text, "next");
    }

    #[test]
    fn test_client_role_labels() {
        let turns: Vec<ChatTurn> = serde_json::from_str(
            r#"[{"role":"user","text":"a"},{"role":"ai","text":"b"},{"role":"assistant","text":"c"}]"#,
        )
        .unwrap();
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[2].role, ChatRole::Assistant);
        assert!(!turns[0].seed);
    }

    #[test]
    fn test_unknown_role_labels_are_user() {
        let turns: Vec<ChatTurn> = serde_json::from_str(
            r#"[{"role":"system","text":"a"},{"role":"Model","text":"b"},{"role":"","text":"c"}]"#,
        )
        .unwrap();
        assert_eq!(turns[0].role, ChatRole::User);
        assert_eq!(turns[1].role, ChatRole::Assistant);
        assert_eq!(turns[2].role, ChatRole::User);

        let ctx = assemble_context("next", &turns, 10);
        assert_eq!(ctx.history[2].role, BackendRole::User);
        assert_eq!(ctx.history[3].role, BackendRole::Model);

        let label = serde_json::to_value(ChatRole::Assistant).unwrap();
        assert_eq!(label, "ai");
    }

    #[test]
    fn test_empty_history() {
        let ctx = assemble_context("hello", &[], 10);
        assert_eq!(ctx.history, persona_preamble().to_vec());
        assert_eq!(ctx.message, "hello");
    }
}
