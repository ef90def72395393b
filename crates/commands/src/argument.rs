//! The contract every argument type fulfils.
//!
//! Argument types are written against [`ArgumentType`], which has a concrete
//! output type. The tree stores them behind [`ErasedArgumentType`] so that
//! nodes of different types can live side by side; the parsed value is kept
//! as an [`ArgumentValue`] and recovered with
//! [`CommandContext::argument`](crate::context::CommandContext::argument).

use crate::context::CommandContext;
use crate::error::SyntaxResult;
use crate::reader::StringReader;
use crate::suggestion::{SuggestionFuture, Suggestions, SuggestionsBuilder};
use futures::future::{self, FutureExt};
use std::any::Any;
use std::sync::Arc;

pub type ArgumentValue = Arc<dyn Any + Send + Sync>;

pub trait ArgumentType<S>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Parses a value starting at the reader's cursor, leaving the cursor just
    /// past it. On failure the cursor position is unspecified; the parser
    /// restores it.
    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<Self::Output>;

    fn list_suggestions(
        &self,
        _context: &CommandContext<S>,
        _builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        future::ready(Suggestions::empty()).boxed()
    }

    /// Sample inputs this type accepts, used to detect ambiguous siblings.
    fn examples(&self) -> &'static [&'static str] {
        &[]
    }

    /// Identifier used when exporting the tree.
    fn parser_name(&self) -> &'static str;
}

/// Object safe view of an [`ArgumentType`].
pub trait ErasedArgumentType<S>: Send + Sync {
    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<ArgumentValue>;

    fn list_suggestions(
        &self,
        context: &CommandContext<S>,
        builder: SuggestionsBuilder,
    ) -> SuggestionFuture;

    fn examples(&self) -> &'static [&'static str];

    fn parser_name(&self) -> &'static str;
}

impl<S, T> ErasedArgumentType<S> for T
where
    T: ArgumentType<S>,
{
    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<ArgumentValue> {
        let value = ArgumentType::parse(self, reader)?;
        Ok(Arc::new(value))
    }

    fn list_suggestions(
        &self,
        context: &CommandContext<S>,
        builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        ArgumentType::list_suggestions(self, context, builder)
    }

    fn examples(&self) -> &'static [&'static str] {
        ArgumentType::examples(self)
    }

    fn parser_name(&self) -> &'static str {
        ArgumentType::parser_name(self)
    }
}
