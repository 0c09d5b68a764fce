//! Interactive loop.
//!
//! Stdin is read on its own task and fed through a channel, so lines typed
//! while a reply is streaming can be seen (and rejected) instead of queueing
//! up behind the session.

use std::io::Write;

use rill_session::{Chat, SessionHook, SessionState, Transport};
use rill_types::{Conversation, Observation, ObservationData, Role, SubmitRejected};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::render::{TYPING, label, render_log, render_transcript};

const HELP: &str = "\
Commands:
  /url <base>     set the server base URL
  /model <name>   set the model
  /clear          forget the conversation and the log
  /debug          toggle the observation log
  /log            print the observation log of the last reply
  /history        print the conversation
  /quit           exit
A line ending in \\ continues on the next line.";

/// One complete line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Url(String),
    Model(String),
    Clear,
    Debug,
    Log,
    History,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Send(input.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match (name, arg) {
            ("url", arg) if !arg.is_empty() => Self::Url(arg.to_string()),
            ("model", arg) if !arg.is_empty() => Self::Model(arg.to_string()),
            ("clear", _) => Self::Clear,
            ("debug", _) => Self::Debug,
            ("log", _) => Self::Log,
            ("history", _) => Self::History,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// Joins lines ending in `\` with a literal newline.
#[derive(Debug, Default)]
pub struct LineJoiner {
    pending: Option<String>,
}

impl LineJoiner {
    /// Feed one raw line. Returns the complete entry once a line without a
    /// trailing `\` arrives.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let (text, continues) = match line.strip_suffix('\\') {
            Some(head) => (head, true),
            None => (line, false),
        };
        let mut entry = match self.pending.take() {
            Some(mut acc) => {
                acc.push('\n');
                acc.push_str(text);
                acc
            }
            None => text.to_string(),
        };
        if continues {
            self.pending = Some(std::mem::take(&mut entry));
            return None;
        }
        Some(entry)
    }

    pub fn is_continuing(&self) -> bool {
        self.pending.is_some()
    }
}

/// Run the loop until `/quit` or end of input.
pub async fn run<T: Transport>(mut chat: Chat, transport: T, mut debug: bool) {
    let (tx, mut lines) = mpsc::unbounded_channel();
    tokio::spawn(read_stdin(tx));

    println!(
        "rill: chatting with {} at {} (/help for commands)",
        chat.config().model,
        chat.config().base_url
    );
    let mut joiner = LineJoiner::default();
    prompt(&joiner);

    while let Some(line) = lines.recv().await {
        let Some(entry) = joiner.push(&line) else {
            prompt(&joiner);
            continue;
        };

        match Command::parse(&entry) {
            Command::Quit => break,
            Command::Send(text) => {
                let mut hook = TerminalHook::new(&mut lines);
                match chat.submit(&transport, &text, &mut hook).await {
                    Ok(outcome) => {
                        let content = chat
                            .conversation()
                            .get(outcome.message_id)
                            .map_or("", |m| m.content.as_str());
                        hook.finish(content);
                        if debug {
                            print!("{}", render_log(chat.log()));
                        }
                    }
                    Err(SubmitRejected::EmptyInput) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
            Command::Url(url) => {
                chat.config_mut().base_url = url;
                println!("server: {}", chat.config().chat_url());
            }
            Command::Model(model) => {
                println!("model: {model}");
                chat.config_mut().model = model;
            }
            Command::Clear => {
                if chat.clear() {
                    println!("conversation cleared");
                } else {
                    eprintln!("{}", SubmitRejected::Busy);
                }
            }
            Command::Debug => {
                debug = !debug;
                println!("observation log {}", if debug { "on" } else { "off" });
                if debug {
                    print!("{}", render_log(chat.log()));
                }
            }
            Command::Log => print!("{}", render_log(chat.log())),
            Command::History => {
                print!("{}", render_transcript(chat.conversation(), chat.is_typing()));
            }
            Command::Help => println!("{HELP}"),
            Command::Unknown(cmd) => eprintln!("unknown command {cmd}; try /help"),
        }
        prompt(&joiner);
    }
}

async fn read_stdin(tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "stdin read failed");
                break;
            }
        }
    }
}

fn prompt(joiner: &LineJoiner) {
    print!("{}", if joiner.is_continuing() { ". " } else { "> " });
    let _ = std::io::stdout().flush();
}

/// Prints the reply as it streams and turns away input that arrives
/// meanwhile.
struct TerminalHook<'a> {
    input: &'a mut mpsc::UnboundedReceiver<String>,
    printed: usize,
    typing: bool,
}

impl<'a> TerminalHook<'a> {
    fn new(input: &'a mut mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            input,
            printed: 0,
            typing: false,
        }
    }

    fn reject_input(&mut self) {
        while let Ok(line) = self.input.try_recv() {
            eprintln!("\n(still streaming; ignored {line:?})");
        }
    }

    fn show(&mut self, content: &str) {
        let mut out = std::io::stdout().lock();
        if self.typing {
            let _ = write!(out, "\r\x1b[2K{}: ", label(Role::Assistant));
            self.typing = false;
        }
        if let Some(rest) = content.get(self.printed..) {
            let _ = write!(out, "{rest}");
        }
        self.printed = content.len();
        let _ = out.flush();
    }

    /// Print whatever the hook has not shown yet (an error annotation, say).
    fn finish(&mut self, content: &str) {
        self.show(content);
        println!();
    }
}

impl SessionHook for TerminalHook<'_> {
    fn on_observation(&mut self, observation: &Observation, conversation: &Conversation) {
        self.reject_input();
        if let ObservationData::Token { .. } = observation.data {
            if let Some(message) = conversation.in_flight() {
                self.show(&message.content);
            }
        }
    }

    fn on_state(&mut self, state: SessionState) {
        match state {
            SessionState::Sending => {
                print!("{}: {TYPING}", label(Role::Assistant));
                let _ = std::io::stdout().flush();
                self.typing = true;
            }
            SessionState::Completed | SessionState::Failed => self.reject_input(),
            SessionState::Idle | SessionState::Streaming => {}
        }
    }
}
