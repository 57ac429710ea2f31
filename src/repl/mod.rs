//! Interactive terminal panel
//!
//! Renders a [`ChatPanel`] with a readline-based interface:
//! - Enter sends, Alt+Enter / Shift+Enter (where the terminal reports it)
//!   inserts a newline, and a trailing `\` continues on the next line
//! - Command history and slash-command completion
//! - Loading indicator while a request is outstanding

pub mod colors;
mod helper;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Cmd, Editor, KeyCode, KeyEvent, Modifiers};
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::ConversationClient;
use crate::config::data_dir;
use crate::message::{Message, Role};
use crate::panel::{self, ChatPanel, TurnOutcome};

use colors::ansi::*;
use helper::ChatHelper;

/// REPL state
pub struct Repl {
    /// Readline editor with history and completion
    editor: Editor<ChatHelper, DefaultHistory>,
    panel: ChatPanel,
    /// History file path
    history_path: PathBuf,
}

/// Whether the loop should keep going after a command
enum Flow {
    Continue,
    Quit,
}

impl Repl {
    pub fn new(client: Arc<ConversationClient>) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ChatHelper::new(Arc::clone(&client))));
        editor.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), Cmd::Newline);
        editor.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::SHIFT), Cmd::Newline);

        Ok(Self {
            editor,
            panel: ChatPanel::new(client),
            history_path: data_dir().join("history"),
        })
    }

    /// Load command history
    fn load_history(&mut self) {
        if self.history_path.exists() {
            let _ = self.editor.load_history(&self.history_path);
        }
    }

    /// Save command history
    fn save_history(&mut self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = self.editor.save_history(&self.history_path);
    }

    /// Run the REPL loop
    pub async fn run(&mut self) -> Result<()> {
        self.load_history();

        println!("{}", render_header());
        if self.panel.is_empty() {
            println!("{}", render_empty_state());
        }

        loop {
            let Some(line) = self.read_input()? else {
                println!("Goodbye!");
                break;
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            self.editor.add_history_entry(line.as_str())?;

            if trimmed.starts_with('/') && !trimmed.contains('\n') {
                match self.handle_command(trimmed) {
                    Flow::Continue => continue,
                    Flow::Quit => break,
                }
            }

            self.panel.set_input(line);
            println!("{}", colors::status(panel::LOADING));
            if let Some(outcome) = self.panel.send().await {
                println!("{}", render_outcome(&outcome));
            }
        }

        self.save_history();
        Ok(())
    }

    /// Read one message, pre-filled with the panel's input buffer
    fn read_input(&mut self) -> Result<Option<String>> {
        let initial = self.panel_input();
        let first_line = match self.editor.readline_with_initial(&colors::prompt(), (&initial, "")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                return Ok(Some(String::new()));
            }
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => {
                eprintln!("{}", colors::error(&format!("Error: {:?}", err)));
                return Ok(None);
            }
        };

        if first_line.trim_end().ends_with('\\') {
            return self.read_continuation_lines(&first_line);
        }

        Ok(Some(first_line))
    }

    fn panel_input(&mut self) -> String {
        let input = self.panel.input().to_string();
        self.panel.set_input(String::new());
        input
    }

    /// Read continuation lines (ending with \)
    fn read_continuation_lines(&mut self, first_line: &str) -> Result<Option<String>> {
        let mut lines = vec![strip_continuation(first_line).to_string()];

        loop {
            match self.editor.readline(&colors::continuation_prompt()) {
                Ok(line) => {
                    if line.trim_end().ends_with('\\') {
                        lines.push(strip_continuation(&line).to_string());
                    } else {
                        lines.push(line);
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C (cancelled multi-line)");
                    return Ok(Some(String::new()));
                }
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => {
                    eprintln!("{}", colors::error(&format!("Error: {:?}", err)));
                    return Ok(None);
                }
            }
        }

        Ok(Some(lines.join("\n")))
    }

    /// Handle slash commands
    fn handle_command(&mut self, cmd: &str) -> Flow {
        let (command, arg) = match cmd.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (cmd, ""),
        };

        match command {
            "/help" => {
                println!("Commands:");
                println!("  /help           - Show this help");
                println!("  /clear          - Clear the conversation");
                println!("  /id             - Show the current conversation id");
                println!("  /resume <id>    - Continue a known conversation");
                println!("  /config         - Show endpoint and key");
                println!("  /1, /2          - Use an example question");
                println!("  /quit           - Exit");
            }
            "/clear" => {
                self.panel.clear();
                println!("{}", colors::success("Conversation cleared."));
                println!("{}", render_empty_state());
            }
            "/id" => match self.panel.client().get_conversation_id() {
                Some(id) => println!("Conversation: {}", id),
                None => println!("{}", colors::status("No active conversation.")),
            },
            "/resume" => {
                if arg.is_empty() {
                    println!("{}", colors::warning("Usage: /resume <conversation-id>"));
                } else {
                    self.panel.client().set_conversation_id(Some(arg.to_string()));
                    println!("Resuming conversation {}", arg);
                }
            }
            "/config" => {
                let config = self.panel.client().config();
                println!("{}", colors::banner_line("Endpoint", &config.endpoint));
                println!("{}", colors::banner_line("API key", &config.redacted_key()));
                println!("{}", colors::banner_line("User", self.panel.client().user()));
            }
            "/1" | "/2" => {
                let index = if command == "/1" { 0 } else { 1 };
                self.panel.quick_fill(index);
            }
            "/quit" | "/exit" => return Flow::Quit,
            _ => {
                println!("{}", colors::warning(&format!("Unknown command: {}", cmd)));
            }
        }
        Flow::Continue
    }
}

fn strip_continuation(line: &str) -> &str {
    let trimmed = line.trim_end();
    trimmed.strip_suffix('\\').unwrap_or(trimmed)
}

/// Title bar
pub fn render_header() -> String {
    format!(
        "{}\n{}\n{}",
        colors::banner_accent(panel::TITLE),
        colors::status(panel::SUBTITLE),
        colors::separator(50)
    )
}

/// Welcome text with the example questions
pub fn render_empty_state() -> String {
    let mut out = vec![
        colors::header(panel::WELCOME),
        panel::INTRO.to_string(),
        String::new(),
        "试试这些问题:".to_string(),
    ];
    for (i, prompt) in panel::EXAMPLE_PROMPTS.iter().enumerate() {
        out.push(format!("  /{}  {}", i + 1, prompt));
    }
    out.push(colors::status(panel::INPUT_HINT));
    out.join("\n")
}

/// One message with its author and local HH:MM time
pub fn render_message(message: &Message) -> String {
    let (label, is_user) = match message.role {
        Role::User => ("你", true),
        Role::Assistant => ("AI", false),
    };
    format!(
        "{} {}{}{}\n{}",
        colors::role_label(label, is_user),
        DIM,
        message.local_time(),
        RESET,
        message.content
    )
}

/// Reply plus any recommended category codes
pub fn render_outcome(outcome: &TurnOutcome) -> String {
    let mut out = if outcome.failed {
        format!("\n{}\n", colors::error(&render_message(&outcome.reply)))
    } else {
        format!("\n{}\n", render_message(&outcome.reply))
    };
    if !outcome.category_codes.is_empty() {
        let codes: Vec<String> = outcome
            .category_codes
            .iter()
            .map(|c| colors::category_code(c))
            .collect();
        out.push_str(&format!("{} {}\n", colors::status("品类编码:"), codes.join(", ")));
    }
    out
}

/// Entry point for the REPL
pub async fn run(client: Arc<ConversationClient>) -> Result<()> {
    let mut repl = Repl::new(client)?;
    repl.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_continuation() {
        assert_eq!(strip_continuation("line one \\"), "line one ");
        assert_eq!(strip_continuation("no slash"), "no slash");
    }

    #[test]
    fn test_render_empty_state_lists_examples() {
        let text = render_empty_state();
        assert!(text.contains("/1  我要采购办公桌椅"));
        assert!(text.contains("/2  注塑的塑料粒子"));
    }

    #[test]
    fn test_render_message_includes_time() {
        let msg = Message::assistant("你好");
        let text = render_message(&msg);
        assert!(text.contains(&msg.local_time()));
        assert!(text.ends_with("你好"));
    }

    #[test]
    fn test_render_outcome_shows_codes() {
        let outcome = TurnOutcome {
            reply: Message::assistant("🎯 推荐品类 品类编码：1000-04-09-01"),
            category_codes: vec!["1000-04-09-01".into()],
            failed: false,
        };
        let text = render_outcome(&outcome);
        assert!(text.contains("品类编码:"));
        assert!(text.contains("1000-04-09-01"));
    }
}
