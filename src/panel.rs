//! Chat panel state
//!
//! Front-end independent: owns the message list, the input buffer and the
//! busy flag, and drives one turn per send. The terminal REPL renders it.

use std::sync::Arc;

use crate::client::ConversationClient;
use crate::message::Message;

pub const TITLE: &str = "Ariba AI 助手";
pub const SUBTITLE: &str = "品类查询助手";
pub const WELCOME: &str = "欢迎使用 Ariba AI 助手";
pub const INTRO: &str = "我可以帮你查询采购品类。请描述你要采购的物品,我会为你推荐合适的品类编码。";
pub const LOADING: &str = "AI 正在思考...";
pub const INPUT_HINT: &str = "按 Enter 发送, Shift + Enter 换行";

/// Quick-fill prompts offered while the conversation is empty
pub const EXAMPLE_PROMPTS: [&str; 2] = ["我要采购办公桌椅", "注塑的塑料粒子"];

/// A key press the panel reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter { shift: bool },
    Char(char),
    Backspace,
}

/// What a key press asks the front end to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Send,
    Edited,
}

/// Result of a completed send
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: Message,
    /// Recommended category codes (empty unless the reply had a recommendation block)
    pub category_codes: Vec<String>,
    pub failed: bool,
}

/// Assistant-side text for a failed turn
pub fn error_reply(error: &str) -> String {
    let detail = if error.trim().is_empty() {
        "未知错误"
    } else {
        error
    };
    format!("抱歉,发送消息时出现错误: {}", detail)
}

/// Clears the busy flag when dropped
struct BusyGuard<'a>(&'a mut bool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct ChatPanel {
    client: Arc<ConversationClient>,
    messages: Vec<Message>,
    input: String,
    busy: bool,
}

impl ChatPanel {
    pub fn new(client: Arc<ConversationClient>) -> Self {
        Self {
            client,
            messages: Vec::new(),
            input: String::new(),
            busy: false,
        }
    }

    pub fn client(&self) -> &Arc<ConversationClient> {
        &self.client
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Fill the input with one of [`EXAMPLE_PROMPTS`]
    pub fn quick_fill(&mut self, index: usize) -> bool {
        match EXAMPLE_PROMPTS.get(index) {
            Some(prompt) => {
                self.input = prompt.to_string();
                true
            }
            None => false,
        }
    }

    /// Send is enabled only with non-blank input and no request outstanding
    pub fn can_send(&self) -> bool {
        !self.busy && !self.input.trim().is_empty()
    }

    /// Apply a key press to the input buffer. Plain Enter requests a send;
    /// Shift+Enter inserts a newline.
    pub fn handle_key(&mut self, key: Key) -> KeyAction {
        match key {
            Key::Enter { shift: false } => KeyAction::Send,
            Key::Enter { shift: true } => {
                self.input.push('\n');
                KeyAction::Edited
            }
            Key::Char(c) => {
                self.input.push(c);
                KeyAction::Edited
            }
            Key::Backspace => {
                self.input.pop();
                KeyAction::Edited
            }
        }
    }

    /// Run one turn with the current input. Returns `None` when sending is
    /// disabled. Failures become an assistant message. The busy flag is
    /// cleared on every path, including when this future is dropped early.
    pub async fn send(&mut self) -> Option<TurnOutcome> {
        if !self.can_send() {
            return None;
        }

        let Self {
            client,
            messages,
            input,
            busy,
        } = self;

        let user_message = Message::user(input.trim());
        let query = user_message.content.clone();
        messages.push(user_message);
        input.clear();
        *busy = true;
        let _busy = BusyGuard(busy);

        let outcome = match client.send_message(&query).await {
            Ok(response) => {
                let category_codes = if response.has_categories() {
                    let codes = response.category_codes();
                    tracing::info!(?codes, "Extracted category codes");
                    codes
                } else {
                    Vec::new()
                };
                TurnOutcome {
                    reply: Message::assistant(response.answer),
                    category_codes,
                    failed: false,
                }
            }
            Err(e) => {
                tracing::error!("Failed to send message: {}", e);
                TurnOutcome {
                    reply: Message::assistant(error_reply(&e.to_string())),
                    category_codes: Vec::new(),
                    failed: true,
                }
            }
        };

        messages.push(outcome.reply.clone());
        Some(outcome)
    }

    /// Drop every message and start a new conversation
    pub fn clear(&mut self) {
        self.messages.clear();
        self.client.reset_conversation();
    }
}
