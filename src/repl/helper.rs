//! Line-editor helper: slash-command completion, `/resume` completion from
//! the live session, and previews of the example questions

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::sync::Arc;

use crate::client::ConversationClient;
use crate::panel::EXAMPLE_PROMPTS;

/// Slash commands with a short description
pub const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("/help", "show commands"),
    ("/clear", "clear the conversation"),
    ("/id", "show conversation id"),
    ("/resume", "continue a conversation"),
    ("/config", "show endpoint and key"),
    ("/1", EXAMPLE_PROMPTS[0]),
    ("/2", EXAMPLE_PROMPTS[1]),
    ("/quit", "exit"),
    ("/exit", "exit"),
];

pub struct ChatHelper {
    client: Arc<ConversationClient>,
    history: HistoryHinter,
}

impl ChatHelper {
    pub fn new(client: Arc<ConversationClient>) -> Self {
        Self {
            client,
            history: HistoryHinter::new(),
        }
    }
}

/// Completion start and candidates for `line` with the cursor at `pos`
fn complete_line(line: &str, pos: usize, conversation_id: Option<&str>) -> (usize, Vec<Pair>) {
    if !line.starts_with('/') {
        return (pos, vec![]);
    }

    let head = &line[..pos];
    match head.split_once(' ') {
        // Still typing the command word
        None => {
            let candidates = SLASH_COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(head))
                .map(|(cmd, about)| Pair {
                    display: format!("{:<9} {}", cmd, about),
                    replacement: cmd.to_string(),
                })
                .collect();
            (0, candidates)
        }
        Some(("/resume", partial)) => {
            let start = pos - partial.len();
            let candidates = conversation_id
                .filter(|id| id.starts_with(partial.trim_start()))
                .map(|id| Pair {
                    display: id.to_string(),
                    replacement: id.to_string(),
                })
                .into_iter()
                .collect();
            (start, candidates)
        }
        Some(_) => (pos, vec![]),
    }
}

/// Inline preview after `/1` or `/2`
fn example_hint(line: &str) -> Option<String> {
    let index = match line {
        "/1" => 0,
        "/2" => 1,
        _ => return None,
    };
    EXAMPLE_PROMPTS
        .get(index)
        .map(|prompt| format!("  → {}", prompt))
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let conversation_id = self.client.get_conversation_id();
        Ok(complete_line(line, pos, conversation_id.as_deref()))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        if line.starts_with('/') {
            if pos == line.len() {
                example_hint(line)
            } else {
                None
            }
        } else {
            self.history.hint(line, pos, ctx)
        }
    }
}

impl Highlighter for ChatHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{}\x1b[0m", hint))
    }
}

impl Validator for ChatHelper {}

impl Helper for ChatHelper {}
