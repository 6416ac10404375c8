use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

/// A line typed at the prompt.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Chat(String),
    Upload(Vec<String>),
    Template(String),
    Templates,
    Model(String),
    Models,
    MaxTokens(u32),
    Temperature(f32),
    Reset,
    Debug,
    Help,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument(&'static str),
    InvalidArgument(&'static str, String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(name) => {
                write!(f, "unknown command `/{name}`, try /help")
            }
            CommandError::MissingArgument(name) => {
                write!(f, "/{name} needs an argument")
            }
            CommandError::InvalidArgument(name, value) => {
                write!(f, "/{name} can't take `{value}`")
            }
        }
    }
}

impl StdError for CommandError {}

pub const HELP: &str = "\
/upload <glob>...     add files to the conversation
/template <name>      prefix the next message with a quick prompt
/templates            list quick prompts
/model <id>           switch model
/models               list models
/max-tokens <n>       set the reply token limit
/temperature <t>      set the sampling temperature
/reset                clear the conversation
/debug                dump the session state
/quit                 leave";

impl Command {
    /// Parses a trimmed, non-empty line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Chat(line.to_owned()));
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name {
            "upload" => {
                let patterns: Vec<_> =
                    arg.split_whitespace().map(str::to_owned).collect();
                if patterns.is_empty() {
                    return Err(CommandError::MissingArgument("upload"));
                }
                Command::Upload(patterns)
            }
            "template" => Command::Template(required("template", arg)?),
            "templates" => Command::Templates,
            "model" => Command::Model(required("model", arg)?),
            "models" => Command::Models,
            "max-tokens" => Command::MaxTokens(number("max-tokens", arg)?),
            "temperature" => Command::Temperature(number("temperature", arg)?),
            "reset" => Command::Reset,
            "debug" => Command::Debug,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name.to_owned())),
        };
        Ok(command)
    }
}

fn required(name: &'static str, arg: &str) -> Result<String, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument(name))
    } else {
        Ok(arg.to_owned())
    }
}

fn number<T: std::str::FromStr>(
    name: &'static str,
    arg: &str,
) -> Result<T, CommandError> {
    required(name, arg)?
        .parse()
        .map_err(|_| CommandError::InvalidArgument(name, arg.to_owned()))
}
