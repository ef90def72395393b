//! Built-in argument types.

use crate::argument::ArgumentType;
use crate::bounds::{BoundValue, MinMaxBounds};
use crate::context::CommandContext;
use crate::error::{ErrorKind, SyntaxResult};
use crate::reader::StringReader;
use crate::suggestion::{SuggestionFuture, SuggestionsBuilder};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolArgument;

pub fn boolean() -> BoolArgument {
    BoolArgument
}

impl<S> ArgumentType<S> for BoolArgument {
    type Output = bool;

    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<bool> {
        reader.read_boolean()
    }

    fn list_suggestions(
        &self,
        _context: &CommandContext<S>,
        mut builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        builder.suggest_matching(["true", "false"]);
        builder.build_future()
    }

    fn examples(&self) -> &'static [&'static str] {
        &["true", "false"]
    }

    fn parser_name(&self) -> &'static str {
        "bool"
    }
}

macro_rules! numeric_argument {
    (
        $name:ident, $ty:ty, $read:ident, $kind:literal, $parser:literal,
        $ctor:ident, $ctor_min:ident, $ctor_between:ident, [$($example:literal),*]
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            min: $ty,
            max: $ty,
        }

        impl $name {
            pub fn minimum(&self) -> $ty {
                self.min
            }

            pub fn maximum(&self) -> $ty {
                self.max
            }
        }

        pub fn $ctor() -> $name {
            $ctor_between(<$ty>::MIN, <$ty>::MAX)
        }

        pub fn $ctor_min(min: $ty) -> $name {
            $ctor_between(min, <$ty>::MAX)
        }

        pub fn $ctor_between(min: $ty, max: $ty) -> $name {
            $name { min, max }
        }

        impl<S> ArgumentType<S> for $name {
            type Output = $ty;

            fn parse(&self, reader: &mut StringReader) -> SyntaxResult<$ty> {
                let start = reader.cursor();
                let value = reader.$read()?;
                if value < self.min {
                    reader.set_cursor(start);
                    return Err(ErrorKind::TooLow {
                        kind: $kind,
                        min: self.min.to_string(),
                        found: value.to_string(),
                    }
                    .create_with_context(reader));
                }
                if value > self.max {
                    reader.set_cursor(start);
                    return Err(ErrorKind::TooHigh {
                        kind: $kind,
                        max: self.max.to_string(),
                        found: value.to_string(),
                    }
                    .create_with_context(reader));
                }
                Ok(value)
            }

            fn examples(&self) -> &'static [&'static str] {
                &[$($example),*]
            }

            fn parser_name(&self) -> &'static str {
                $parser
            }
        }
    };
}

numeric_argument!(
    IntegerArgument, i32, read_int, "Integer", "integer",
    integer, integer_min, integer_between, ["0", "123", "-123"]
);
numeric_argument!(
    LongArgument, i64, read_long, "Long", "long",
    long, long_min, long_between, ["0", "123", "-123"]
);
numeric_argument!(
    FloatArgument, f32, read_float, "Float", "float",
    float, float_min, float_between, ["0", "1.2", ".5", "-1", "-.5", "-1234.56"]
);
numeric_argument!(
    DoubleArgument, f64, read_double, "Double", "double",
    double, double_min, double_between, ["0", "1.2", ".5", "-1", "-.5", "-1234.56"]
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// A single unquoted token.
    SingleWord,
    /// A single token, or a quoted string that may contain spaces.
    QuotablePhrase,
    /// Everything up to the end of the input.
    GreedyPhrase,
}

#[derive(Debug, Clone, Copy)]
pub struct StringArgument {
    kind: StringKind,
}

impl StringArgument {
    pub fn kind(&self) -> StringKind {
        self.kind
    }
}

pub fn word() -> StringArgument {
    StringArgument {
        kind: StringKind::SingleWord,
    }
}

pub fn string() -> StringArgument {
    StringArgument {
        kind: StringKind::QuotablePhrase,
    }
}

pub fn greedy_string() -> StringArgument {
    StringArgument {
        kind: StringKind::GreedyPhrase,
    }
}

impl<S> ArgumentType<S> for StringArgument {
    type Output = String;

    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<String> {
        match self.kind {
            StringKind::SingleWord => Ok(reader.read_unquoted_string()),
            StringKind::QuotablePhrase => reader.read_string(),
            StringKind::GreedyPhrase => {
                let text = reader.remaining().to_string();
                reader.set_cursor(reader.total_length());
                Ok(text)
            }
        }
    }

    fn examples(&self) -> &'static [&'static str] {
        match self.kind {
            StringKind::SingleWord => &["word", "words_with_underscores"],
            StringKind::QuotablePhrase => &["\"quoted phrase\"", "word", "\"\""],
            StringKind::GreedyPhrase => &["word", "words with spaces", "\"and symbols\""],
        }
    }

    fn parser_name(&self) -> &'static str {
        match self.kind {
            StringKind::SingleWord => "word",
            StringKind::QuotablePhrase => "string",
            StringKind::GreedyPhrase => "greedy_string",
        }
    }
}

/// A `min..max` range. See [`MinMaxBounds`] for the accepted forms.
pub struct RangeArgument<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for RangeArgument<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RangeArgument<T> {}

pub type IntRangeArgument = RangeArgument<i32>;
pub type FloatRangeArgument = RangeArgument<f64>;

pub fn int_range() -> IntRangeArgument {
    RangeArgument {
        _marker: PhantomData,
    }
}

pub fn float_range() -> FloatRangeArgument {
    RangeArgument {
        _marker: PhantomData,
    }
}

impl<S, T> ArgumentType<S> for RangeArgument<T>
where
    T: BoundValue + Send + Sync + 'static,
    T::Squared: Send + Sync + 'static,
{
    type Output = MinMaxBounds<T>;

    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<MinMaxBounds<T>> {
        MinMaxBounds::from_reader(reader)
    }

    fn examples(&self) -> &'static [&'static str] {
        if T::FLOATING_POINT {
            &["0..5.2", "0", "-5.4", "-100.76..", "..100"]
        } else {
            &["0..5", "0", "-5", "-100..", "..100"]
        }
    }

    fn parser_name(&self) -> &'static str {
        if T::FLOATING_POINT {
            "float_range"
        } else {
            "int_range"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::IntBounds;

    fn parse<A: ArgumentType<()>>(arg: &A, input: &str) -> (SyntaxResult<A::Output>, usize) {
        let mut reader = StringReader::new(input);
        let result = ArgumentType::<()>::parse(arg, &mut reader);
        (result, reader.cursor())
    }

    #[test]
    fn integer_limits() {
        let arg = integer_between(0, 10);
        assert_eq!(parse(&arg, "7 rest").0.unwrap(), 7);

        let (result, cursor) = parse(&arg, "-1");
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::TooLow {
                kind: "Integer",
                min: "0".to_string(),
                found: "-1".to_string()
            }
        );
        assert_eq!(err.cursor(), Some(0));
        assert_eq!(cursor, 0);

        let err = parse(&arg, "11").0.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TooHigh { .. }));
    }

    #[test]
    fn double_accepts_fractions() {
        assert_eq!(parse(&double(), "-1.25").0.unwrap(), -1.25);
        assert_eq!(parse(&float_min(0.5), "0.75").0.unwrap(), 0.75);
        assert!(parse(&long(), "x").0.is_err());
    }

    #[test]
    fn string_kinds() {
        assert_eq!(parse(&word(), "hello world").0.unwrap(), "hello");
        assert_eq!(parse(&string(), "\"hello world\" x").0.unwrap(), "hello world");
        let (result, cursor) = parse(&greedy_string(), "hello big world");
        assert_eq!(result.unwrap(), "hello big world");
        assert_eq!(cursor, 15);
    }

    #[test]
    fn boolean_parses() {
        assert!(parse(&boolean(), "true").0.unwrap());
        assert!(parse(&boolean(), "yes").0.is_err());
    }

    #[test]
    fn int_range_parses_bounds() {
        let (result, cursor) = parse(&int_range(), "5..10 x");
        assert_eq!(result.unwrap(), IntBounds::between(5, 10));
        assert_eq!(cursor, 5);
    }

    #[test]
    fn examples_are_valid_input() {
        for example in ArgumentType::<()>::examples(&int_range()) {
            assert!(parse(&int_range(), example).0.is_ok(), "{example}");
        }
        for example in ArgumentType::<()>::examples(&float_range()) {
            assert!(parse(&float_range(), example).0.is_ok(), "{example}");
        }
        for example in ArgumentType::<()>::examples(&double()) {
            assert!(parse(&double(), example).0.is_ok(), "{example}");
        }
    }
}
