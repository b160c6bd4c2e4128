use crate::coordinator::{validate_target, ControllerError, UserAction, ViewState};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const USAGE: &str = "\
commands:
  connect <host:port>        connect to a peer (e.g. connect 192.168.0.101:9595)
  peers                      reload the known peer list
  file <path>                choose the file to send
  target <peer>              choose a listed peer to send to
  send [<peer> <path>]       send the chosen file (or the given one)
  accept | reject            answer the pending file offer
  status                     show the current state
  help                       show this message
  exit | quit                leave";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("file '{0}' does not exist")]
    FileNotFound(String),

    #[error(transparent)]
    Rejected(#[from] ControllerError),
}

/// One parsed line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Empty,
    Connect(String),
    Peers,
    File(PathBuf),
    Target(String),
    Send {
        target: Option<String>,
        file: Option<PathBuf>,
    },
    Accept,
    Reject,
    Status,
    Help,
    Exit,
}

impl ConsoleCommand {
    /// Translate into controller actions. A chosen file must exist locally.
    ///
    /// `send <peer> <path>` is refused as a whole when the peer is not listed
    /// in `view`, so it never falls back to the previously selected target.
    pub fn into_actions(self, view: &ViewState) -> Result<Vec<UserAction>, CommandError> {
        let actions = match self {
            ConsoleCommand::Connect(address) => vec![UserAction::Connect { address }],
            ConsoleCommand::Peers => vec![UserAction::RefreshPeers],
            ConsoleCommand::File(path) => vec![UserAction::ChooseFile(Some(existing_file(path)?))],
            ConsoleCommand::Target(target) => vec![UserAction::SelectTarget(target)],
            ConsoleCommand::Send { target, file } => {
                let mut actions = Vec::new();
                if let Some(target) = target {
                    validate_target(view, &target)?;
                    actions.push(UserAction::SelectTarget(target));
                }
                if let Some(file) = file {
                    actions.push(UserAction::ChooseFile(Some(existing_file(file)?)));
                }
                actions.push(UserAction::Send);
                actions
            }
            ConsoleCommand::Accept => vec![UserAction::Accept],
            ConsoleCommand::Reject => vec![UserAction::Reject],
            ConsoleCommand::Empty
            | ConsoleCommand::Status
            | ConsoleCommand::Help
            | ConsoleCommand::Exit => Vec::new(),
        };
        Ok(actions)
    }
}

pub fn parse_command(line: &str) -> Result<ConsoleCommand, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        // Empty input is passed through so the controller reports it.
        "connect" => ConsoleCommand::Connect(rest.to_string()),
        "peers" | "clients" => ConsoleCommand::Peers,
        "file" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("file <path>"));
            }
            ConsoleCommand::File(PathBuf::from(unquote(rest)))
        }
        "target" => ConsoleCommand::Target(rest.to_string()),
        "send" | "sendfile" => parse_send(rest)?,
        "accept" | "y" => ConsoleCommand::Accept,
        "reject" | "n" => ConsoleCommand::Reject,
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "exit" | "quit" => ConsoleCommand::Exit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

fn parse_send(rest: &str) -> Result<ConsoleCommand, CommandError> {
    if rest.is_empty() {
        return Ok(ConsoleCommand::Send {
            target: None,
            file: None,
        });
    }

    match rest.split_once(char::is_whitespace) {
        Some((target, path)) if !path.trim().is_empty() => Ok(ConsoleCommand::Send {
            target: Some(target.to_string()),
            file: Some(PathBuf::from(unquote(path.trim()))),
        }),
        _ => Err(CommandError::Usage("send [<peer> <path>]")),
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

fn existing_file(path: PathBuf) -> Result<PathBuf, CommandError> {
    if Path::new(&path).is_file() {
        Ok(path)
    } else {
        Err(CommandError::FileNotFound(path.display().to_string()))
    }
}
