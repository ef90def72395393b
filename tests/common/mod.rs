#![allow(dead_code)]

use mcadmin_commands::arguments::int_range;
use mcadmin_commands::{
    ArgumentType, CommandContext, CommandDispatcher, CommandError, CommandResult, CommandSource,
    ErrorKind, IntBounds, StringReader, SuggestionFuture, SuggestionsBuilder, SyntaxResult,
    argument, literal,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct TestSource {
    pub name: String,
    pub permissions: Vec<String>,
    pub console: bool,
}

impl TestSource {
    pub fn player(name: &str, permissions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            console: false,
        }
    }

    pub fn console() -> Self {
        Self {
            name: "Console".to_string(),
            permissions: Vec::new(),
            console: true,
        }
    }
}

impl CommandSource for TestSource {
    fn has_permission(&self, permission: &str) -> bool {
        self.console || self.permissions.iter().any(|p| p == permission)
    }

    fn is_console(&self) -> bool {
        self.console
    }
}

pub const PLAYERS: [&str; 3] = ["Steve", "Stan", "Alex"];

/// A single word naming an online player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerArgument;

impl ArgumentType<TestSource> for PlayerArgument {
    type Output = String;

    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<String> {
        let name = reader.read_unquoted_string();
        if name.is_empty() {
            return Err(ErrorKind::Custom("Expected player".to_string()).create_with_context(reader));
        }
        Ok(name)
    }

    fn list_suggestions(
        &self,
        _context: &CommandContext<TestSource>,
        mut builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        builder.suggest_matching(PLAYERS);
        builder.build_future()
    }

    fn examples(&self) -> &'static [&'static str] {
        &["Steve", "Alex"]
    }

    fn parser_name(&self) -> &'static str {
        "player"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BanRecord {
    pub target: String,
    pub duration: Option<IntBounds>,
}

pub type Bans = Arc<Mutex<Vec<BanRecord>>>;

fn record_ban(bans: Bans) -> impl Fn(&CommandContext<TestSource>) -> CommandResult<()> + Send + Sync {
    move |ctx| {
        let target: String = ctx.argument("target")?;
        let duration = ctx.optional_argument::<IntBounds>("duration")?;
        bans.lock()
            .map_err(|_| CommandError::internal("poisoned"))?
            .push(BanRecord { target, duration });
        Ok(())
    }
}

/// `ban <target> [<duration>]`, gated on the `ban` permission.
pub fn ban_dispatcher() -> (CommandDispatcher<TestSource>, Bans) {
    let bans: Bans = Arc::default();
    let mut dispatcher = CommandDispatcher::new();
    dispatcher.register(
        literal("ban").requires_permission("ban").then(
            argument("target", PlayerArgument)
                .executes(record_ban(bans.clone()))
                .then(argument("duration", int_range()).executes(record_ban(bans.clone()))),
        ),
    );
    (dispatcher, bans)
}
