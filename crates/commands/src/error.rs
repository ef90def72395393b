use crate::reader::StringReader;
use std::fmt;
use thiserror::Error;

/// Number of characters of input shown before the cursor in error context.
const CONTEXT_AMOUNT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Expected quote to start a string")]
    ExpectedStartOfQuote,
    #[error("Unclosed quoted string")]
    ExpectedEndOfQuote,
    #[error("Invalid escape sequence '{0}' in quoted string")]
    InvalidEscape(char),
    #[error("Invalid bool, expected true or false but found '{0}'")]
    InvalidBool(String),
    #[error("Expected bool")]
    ExpectedBool,
    #[error("Invalid integer '{0}'")]
    InvalidInt(String),
    #[error("Expected integer")]
    ExpectedInt,
    #[error("Invalid long '{0}'")]
    InvalidLong(String),
    #[error("Expected long")]
    ExpectedLong,
    #[error("Invalid float '{0}'")]
    InvalidFloat(String),
    #[error("Expected float")]
    ExpectedFloat,
    #[error("Invalid double '{0}'")]
    InvalidDouble(String),
    #[error("Expected double")]
    ExpectedDouble,
    #[error("Expected '{0}'")]
    ExpectedSymbol(char),
    #[error("{kind} must not be less than {min}, found {found}")]
    TooLow {
        kind: &'static str,
        min: String,
        found: String,
    },
    #[error("{kind} must not be more than {max}, found {found}")]
    TooHigh {
        kind: &'static str,
        max: String,
        found: String,
    },
    #[error("Expected literal {0}")]
    LiteralIncorrect(String),
    #[error("Unknown command")]
    UnknownCommand,
    #[error("Incorrect argument for command")]
    UnknownArgument,
    #[error("Expected whitespace to end one argument, but found trailing data")]
    ExpectedArgumentSeparator,
    #[error("Incomplete command")]
    IncompleteCommand,
    #[error("Expected value or range of values")]
    BoundsEmpty,
    #[error("Min cannot be bigger than max")]
    BoundsSwapped,
    #[error("Only whole numbers allowed, not decimals")]
    BoundsIntsOnly,
    #[error("Expected a value for option '--{0}'")]
    OptionExpectedValue(String),
    #[error("Option '--{0}' was already specified")]
    OptionDuplicate(String),
    #[error("You do not have permission to use this command ({0})")]
    PermissionDenied(String),
    #[error("This command cannot be used from the console")]
    ConsoleDenied,
    #[error("You cannot use this command here")]
    RequirementNotMet,
    #[error("{0}")]
    Custom(String),
}

impl ErrorKind {
    pub fn create(self) -> CommandSyntaxError {
        CommandSyntaxError {
            kind: self,
            input: None,
            cursor: None,
        }
    }

    pub fn create_with_context(self, reader: &StringReader) -> CommandSyntaxError {
        CommandSyntaxError {
            kind: self,
            input: Some(reader.string().to_string()),
            cursor: Some(reader.cursor()),
        }
    }
}

/// A parse failure, optionally pinned to a position in the input it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSyntaxError {
    kind: ErrorKind,
    input: Option<String>,
    cursor: Option<usize>,
}

impl CommandSyntaxError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The tail of the input up to the cursor, followed by a `<--[HERE]` marker.
    pub fn context(&self) -> Option<String> {
        let (input, cursor) = (self.input.as_ref()?, self.cursor?);
        let cursor = cursor.min(input.len());
        let before = &input[..cursor];
        let shown: String = {
            let count = before.chars().count();
            if count > CONTEXT_AMOUNT {
                let tail: String = before.chars().skip(count - CONTEXT_AMOUNT).collect();
                format!("...{tail}")
            } else {
                before.to_string()
            }
        };
        Some(format!("{shown}<--[HERE]"))
    }
}

impl fmt::Display for CommandSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let (Some(context), Some(cursor)) = (self.context(), self.cursor) {
            write!(f, " at position {cursor}: {context}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommandSyntaxError {}

pub type SyntaxResult<T> = Result<T, CommandSyntaxError>;

/// An error type with a fixed message.
#[derive(Debug, Clone)]
pub struct SimpleErrorType {
    message: String,
}

impl SimpleErrorType {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn create(&self) -> CommandSyntaxError {
        ErrorKind::Custom(self.message.clone()).create()
    }

    pub fn create_with_context(&self, reader: &StringReader) -> CommandSyntaxError {
        ErrorKind::Custom(self.message.clone()).create_with_context(reader)
    }
}

/// An error type whose message embeds the offending token in place of `{}`.
#[derive(Debug, Clone)]
pub struct DynamicErrorType {
    template: String,
}

impl DynamicErrorType {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    fn render(&self, arg: &dyn fmt::Display) -> String {
        self.template.replacen("{}", &arg.to_string(), 1)
    }

    pub fn create(&self, arg: impl fmt::Display) -> CommandSyntaxError {
        ErrorKind::Custom(self.render(&arg)).create()
    }

    pub fn create_with_context(
        &self,
        reader: &StringReader,
        arg: impl fmt::Display,
    ) -> CommandSyntaxError {
        ErrorKind::Custom(self.render(&arg)).create_with_context(reader)
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },
    #[error("This command can only be executed from the console")]
    ConsoleOnly,
    #[error("This command can only be executed by players")]
    PlayerOnly,
    #[error("{0}")]
    Message(String),
}

#[derive(Debug, Error)]
pub enum InternalError {
    #[error(
        "Internal error: Argument '{name}' not found in context (command registration bug)"
    )]
    MissingArgument { name: String },
    #[error("Internal error: Argument '{name}' has wrong type, expected {expected} (command registration bug)")]
    WrongArgumentType { name: String, expected: String },
    #[error("Internal error (bug): {message}")]
    Message { message: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Syntax(#[from] CommandSyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl CommandError {
    pub fn runtime(message: impl Into<String>) -> Self {
        CommandError::Runtime(RuntimeError::Message(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommandError::Internal(InternalError::Message {
            message: message.into(),
        })
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_truncated_to_ten_characters() {
        let mut reader = StringReader::new("gamemode creativ");
        reader.set_cursor(16);
        let err = ErrorKind::UnknownArgument.create_with_context(&reader);
        assert_eq!(err.context().as_deref(), Some("...de creativ<--[HERE]"));
        assert_eq!(
            err.to_string(),
            "Incorrect argument for command at position 16: ...de creativ<--[HERE]"
        );
    }

    #[test]
    fn error_without_context_renders_message_only() {
        let err = SimpleErrorType::new("Range is empty").create();
        assert_eq!(err.to_string(), "Range is empty");
        assert_eq!(err.cursor(), None);
    }

    #[test]
    fn dynamic_error_embeds_token() {
        let kind = DynamicErrorType::new("invalid id: '{}'");
        let reader = StringReader::new("give stone");
        let err = kind.create_with_context(&reader, "stone");
        assert_eq!(err.message(), "invalid id: 'stone'");
        assert_eq!(err.cursor(), Some(0));
        assert_eq!(err.input(), Some("give stone"));
    }
}
