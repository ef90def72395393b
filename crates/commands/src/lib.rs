#![deny(rust_2018_idioms)]

pub mod argument;
pub mod arguments;
mod autocomplete;
pub mod bounds;
pub mod builder;
pub mod context;
mod dispatcher;
pub mod error;
mod executor;
pub mod node;
mod parser;
pub mod reader;
pub mod source;
pub mod suggestion;
mod usage;

pub use argument::{ArgumentType, ArgumentValue};
pub use autocomplete::{CommandFlags, DeclaredNode};
pub use bounds::{DoubleBounds, IntBounds, MinMaxBounds, WrappedMinMaxBounds};
pub use builder::{aliases, argument, literal, option, ArgumentBuilder};
pub use context::{CommandContext, CommandContextBuilder};
pub use dispatcher::{Ambiguity, CommandDispatcher};
pub use error::{
    CommandError, CommandResult, CommandSyntaxError, ErrorKind, InternalError, RuntimeError,
    SyntaxResult,
};
pub use node::{CommandTree, Denial, NodeId};
pub use parser::{BranchFailure, ParseResults};
pub use reader::StringReader;
pub use source::{CommandSource, ConsolePolicy};
pub use suggestion::{StringRange, Suggestion, SuggestionFuture, Suggestions, SuggestionsBuilder};
