use std::path::PathBuf;

/// What one line of user input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplEvent {
    /// Plain text. Empty resubmits whatever is still in the input.
    Send(String),
    Attach(PathBuf),
    Detach,
    Status,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
Type a message and press Enter to send it.
  /attach <path>  stage a file; it is uploaded with the next send
  /detach         drop the staged file
  /status         show session ids and what is in flight
  /reset          start a new session
  /quit           exit
An empty line resends the last message that did not go through,
or uploads the staged file on its own.";

pub fn parse_line(line: &str) -> ReplEvent {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ReplEvent::Send(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "attach" | "a" if !arg.is_empty() => ReplEvent::Attach(PathBuf::from(arg)),
        "detach" => ReplEvent::Detach,
        "status" | "s" => ReplEvent::Status,
        "reset" => ReplEvent::Reset,
        "help" | "h" | "?" => ReplEvent::Help,
        "quit" | "q" | "exit" => ReplEvent::Quit,
        _ => ReplEvent::Unknown(trimmed.to_string()),
    }
}
