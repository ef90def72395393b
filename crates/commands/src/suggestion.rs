use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexSet;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

pub type SuggestionFuture = BoxFuture<'static, Suggestions>;

/// Half open `[start, end)` byte range into a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StringRange {
    start: usize,
    end: usize,
}

impl StringRange {
    pub fn at(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn between(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn encompassing(a: StringRange, b: StringRange) -> Self {
        Self {
            start: a.start.min(b.start),
            end: a.end.max(b.end),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn get<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Two suggestions are equal when they insert the same text with the same
/// tooltip over the same range. The numeric sort key takes no part.
#[derive(Debug, Clone)]
pub struct Suggestion {
    range: StringRange,
    text: String,
    tooltip: Option<String>,
    /// Set for numeric suggestions, which sort by value instead of text.
    value: Option<i32>,
}

impl PartialEq for Suggestion {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range && self.text == other.text && self.tooltip == other.tooltip
    }
}

impl Eq for Suggestion {}

impl Hash for Suggestion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.range.hash(state);
        self.text.hash(state);
        self.tooltip.hash(state);
    }
}

impl Suggestion {
    pub fn new(range: StringRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
            tooltip: None,
            value: None,
        }
    }

    pub fn with_tooltip(
        range: StringRange,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> Self {
        Self {
            tooltip: Some(tooltip.into()),
            ..Self::new(range, text)
        }
    }

    pub fn integer(range: StringRange, value: i32, tooltip: Option<String>) -> Self {
        Self {
            range,
            text: value.to_string(),
            tooltip,
            value: Some(value),
        }
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    pub fn value(&self) -> Option<i32> {
        self.value
    }

    /// The command line with this suggestion substituted into its range.
    pub fn apply(&self, input: &str) -> String {
        if self.range.start == 0 && self.range.end == input.len() {
            return self.text.clone();
        }
        let mut result = String::with_capacity(input.len() + self.text.len());
        if self.range.start > 0 {
            result.push_str(&input[..self.range.start]);
        }
        result.push_str(&self.text);
        if self.range.end < input.len() {
            result.push_str(&input[self.range.end..]);
        }
        result
    }

    /// Widens the suggestion to `range`, padding the text with the parts of
    /// `command` the wider range now covers.
    pub fn expand(&self, command: &str, range: StringRange) -> Suggestion {
        if range == self.range {
            return self.clone();
        }
        let mut text = String::new();
        if range.start < self.range.start {
            text.push_str(&command[range.start..self.range.start]);
        }
        text.push_str(&self.text);
        if range.end > self.range.end {
            text.push_str(&command[self.range.end..range.end]);
        }
        Suggestion {
            range,
            text,
            tooltip: self.tooltip.clone(),
            value: None,
        }
    }

    pub fn compare(&self, other: &Suggestion) -> Ordering {
        match (self.value, other.value) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.text.cmp(&other.text),
        }
    }

    pub fn compare_ignore_case(&self, other: &Suggestion) -> Ordering {
        match (self.value, other.value) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self
                .text
                .to_lowercase()
                .cmp(&other.text.to_lowercase())
                .then_with(|| self.text.cmp(&other.text)),
        }
    }
}

/// A deduplicated, sorted set of suggestions sharing one range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestions {
    range: StringRange,
    list: Vec<Suggestion>,
}

impl Suggestions {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn range(&self) -> StringRange {
        self.range
    }

    pub fn list(&self) -> &[Suggestion] {
        &self.list
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.list.iter().map(Suggestion::text)
    }

    pub fn merge(command: &str, input: &[Suggestions]) -> Suggestions {
        match input {
            [] => Suggestions::empty(),
            [single] => single.clone(),
            _ => Self::create(
                command,
                input.iter().flat_map(|suggestions| suggestions.list.iter().cloned()),
            ),
        }
    }

    pub fn create(command: &str, suggestions: impl IntoIterator<Item = Suggestion>) -> Suggestions {
        let suggestions: Vec<Suggestion> = suggestions.into_iter().collect();
        let Some(first) = suggestions.first() else {
            return Suggestions::empty();
        };
        let range = suggestions
            .iter()
            .fold(first.range, |range, s| StringRange::encompassing(range, s.range));
        let unique: IndexSet<Suggestion> = suggestions
            .iter()
            .map(|suggestion| suggestion.expand(command, range))
            .collect();
        let mut list: Vec<Suggestion> = unique.into_iter().collect();
        list.sort_by(Suggestion::compare_ignore_case);
        Suggestions { range, list }
    }
}

/// Collects suggestions for the token starting at `start`.
#[derive(Debug, Clone)]
pub struct SuggestionsBuilder {
    input: String,
    input_lowercase: String,
    start: usize,
    result: Vec<Suggestion>,
}

impl SuggestionsBuilder {
    pub fn new(input: impl Into<String>, start: usize) -> Self {
        let input = input.into();
        let input_lowercase = input.to_lowercase();
        Self::with_lowercase(input, input_lowercase, start)
    }

    pub fn with_lowercase(input: String, input_lowercase: String, start: usize) -> Self {
        Self {
            input,
            input_lowercase,
            start,
            result: Vec::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn remaining(&self) -> &str {
        self.input.get(self.start..).unwrap_or_default()
    }

    pub fn remaining_lowercase(&self) -> &str {
        self.input_lowercase.get(self.start..).unwrap_or_default()
    }

    fn token_range(&self) -> StringRange {
        StringRange::between(self.start.min(self.input.len()), self.input.len())
    }

    pub fn suggest(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if text != self.remaining() {
            self.result.push(Suggestion::new(self.token_range(), text));
        }
        self
    }

    pub fn suggest_with_tooltip(
        &mut self,
        text: impl Into<String>,
        tooltip: impl Into<String>,
    ) -> &mut Self {
        let text = text.into();
        if text != self.remaining() {
            self.result
                .push(Suggestion::with_tooltip(self.token_range(), text, tooltip));
        }
        self
    }

    pub fn suggest_int(&mut self, value: i32) -> &mut Self {
        self.result
            .push(Suggestion::integer(self.token_range(), value, None));
        self
    }

    /// Suggests each candidate whose lowercase form starts with what has been
    /// typed so far.
    pub fn suggest_matching<I, T>(&mut self, candidates: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for candidate in candidates {
            let candidate = candidate.into();
            if candidate
                .to_lowercase()
                .starts_with(self.remaining_lowercase())
            {
                self.suggest(candidate);
            }
        }
        self
    }

    pub fn add(&mut self, other: SuggestionsBuilder) -> &mut Self {
        self.result.extend(other.result);
        self
    }

    pub fn create_offset(&self, start: usize) -> SuggestionsBuilder {
        Self::with_lowercase(self.input.clone(), self.input_lowercase.clone(), start)
    }

    pub fn restart(&self) -> SuggestionsBuilder {
        self.create_offset(self.start)
    }

    pub fn build(self) -> Suggestions {
        Suggestions::create(&self.input, self.result)
    }

    pub fn build_future(self) -> SuggestionFuture {
        future::ready(self.build()).boxed()
    }
}
