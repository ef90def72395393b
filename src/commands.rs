//! The administration commands offered by the console.

use crate::actor::Actor;
use crate::config::AdminConfig;
use crate::permissions::PlayerPermissionsCache;
use indexmap::IndexMap;
use itertools::Itertools;
use mcadmin_commands::arguments::{greedy_string, int_range, string};
use mcadmin_commands::error::SimpleErrorType;
use mcadmin_commands::{
    ArgumentType, CommandContext, CommandDispatcher, CommandError, CommandResult, CommandSource,
    ConsolePolicy, IntBounds, NodeId, RuntimeError, StringReader, SuggestionFuture,
    SuggestionsBuilder, SyntaxResult, aliases, argument, literal, option,
};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    const ALL: [GameMode; 4] = [
        GameMode::Survival,
        GameMode::Creative,
        GameMode::Adventure,
        GameMode::Spectator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::Survival => "survival",
            GameMode::Creative => "creative",
            GameMode::Adventure => "adventure",
            GameMode::Spectator => "spectator",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub permissions: Vec<String>,
    pub online: bool,
    pub gamemode: GameMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ban {
    pub by: String,
    pub reason: Option<String>,
    /// Length of the ban in days; unbounded when absent.
    pub duration: Option<IntBounds>,
}

#[derive(Debug)]
pub struct ServerState {
    pub players: IndexMap<String, PlayerRecord>,
    pub bans: IndexMap<String, Ban>,
    pub running: bool,
}

pub type SharedState = Arc<Mutex<ServerState>>;

impl ServerState {
    pub fn new(players: &IndexMap<String, Vec<String>>) -> Self {
        let players = players
            .iter()
            .map(|(name, permissions)| {
                let record = PlayerRecord {
                    permissions: permissions.clone(),
                    online: true,
                    gamemode: GameMode::default(),
                };
                (name.clone(), record)
            })
            .collect();
        Self {
            players,
            bans: IndexMap::new(),
            running: true,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// An actor for a known player, or one without any permissions.
    pub fn actor_for(&self, name: &str) -> Actor {
        let permissions = self
            .players
            .get(name)
            .map(|record| PlayerPermissionsCache::from_nodes(&record.permissions))
            .unwrap_or_default();
        Actor::player(name, permissions)
    }
}

fn lock(state: &SharedState) -> CommandResult<MutexGuard<'_, ServerState>> {
    state
        .lock()
        .map_err(|_| CommandError::internal("Server state lock poisoned"))
}

/// A player name, or `*` for every online player.
#[derive(Clone)]
pub struct PlayerArgument {
    state: SharedState,
}

pub fn player(state: &SharedState) -> PlayerArgument {
    PlayerArgument {
        state: state.clone(),
    }
}

impl ArgumentType<Actor> for PlayerArgument {
    type Output = String;

    fn parse(&self, reader: &mut StringReader) -> SyntaxResult<String> {
        if reader.peek() == Some('*') {
            reader.skip();
            return Ok("*".to_string());
        }
        let name = reader.read_unquoted_string();
        if name.is_empty() {
            return Err(SimpleErrorType::new("Expected player name").create_with_context(reader));
        }
        Ok(name)
    }

    fn list_suggestions(
        &self,
        _context: &CommandContext<Actor>,
        mut builder: SuggestionsBuilder,
    ) -> SuggestionFuture {
        if let Ok(state) = self.state.lock() {
            builder.suggest_matching(
                state
                    .players
                    .iter()
                    .filter(|(_, record)| record.online)
                    .map(|(name, _)| name.clone()),
            );
        }
        builder.build_future()
    }

    fn examples(&self) -> &'static [&'static str] {
        &["Steve", "*"]
    }

    fn parser_name(&self) -> &'static str {
        "player"
    }
}

/// Builds the dispatcher with every command registered and the aliases from
/// `config` installed.
pub fn build_dispatcher(state: SharedState, config: &AdminConfig) -> Arc<CommandDispatcher<Actor>> {
    Arc::new_cyclic(|this| {
        let mut dispatcher = CommandDispatcher::new();
        register_commands(&mut dispatcher, &state, this.clone());
        for (alias, replacement) in &config.command_aliases {
            dispatcher.add_custom_alias(alias.trim(), replacement.trim());
        }
        dispatcher
    })
}

pub fn register_commands(
    dispatcher: &mut CommandDispatcher<Actor>,
    state: &SharedState,
    this: Weak<CommandDispatcher<Actor>>,
) {
    dispatcher.register(
        literal("ban")
            .requires_permission("mcadmin.ban")
            .with_option(option("reason", string()))
            .then(
                argument("target", player(state))
                    .executes(ban(state.clone()))
                    .then(argument("duration", int_range()).executes(ban(state.clone()))),
            ),
    );

    let pardon_state = state.clone();
    dispatcher.register(
        literal("pardon").requires_permission("mcadmin.ban").then(
            argument("target", player(state)).executes(move |ctx| {
                let target: String = ctx.argument("target")?;
                let mut state = lock(&pardon_state)?;
                if state.bans.shift_remove(&target).is_none() {
                    return Err(RuntimeError::Message(format!("{target} is not banned")).into());
                }
                info!("{} pardoned {}", ctx.source().name(), target);
                ctx.source().reply(format!("Unbanned {target}"));
                Ok(())
            }),
        ),
    );

    let banlist_state = state.clone();
    dispatcher.register(
        literal("banlist")
            .requires_permission("mcadmin.ban")
            .executes(move |ctx: &CommandContext<Actor>| {
                let state = lock(&banlist_state)?;
                if state.bans.is_empty() {
                    ctx.source().reply("There are no bans");
                    return Ok(());
                }
                for (name, ban) in &state.bans {
                    let duration = ban
                        .duration
                        .map_or_else(|| "forever".to_string(), |days| format!("{days} days"));
                    let reason = ban.reason.as_deref().unwrap_or("no reason given");
                    ctx.source()
                        .reply(format!("{name}: {duration} by {} ({reason})", ban.by));
                }
                Ok(())
            }),
    );

    dispatcher.register(
        literal("kick").requires_permission("mcadmin.kick").then(
            argument("target", player(state))
                .executes(kick(state.clone()))
                .then(argument("reason", greedy_string()).executes(kick(state.clone()))),
        ),
    );

    let mut gamemode = aliases(["gamemode", "gm"]).requires_permission("mcadmin.gamemode");
    for mode in GameMode::ALL {
        gamemode = gamemode.then(
            literal(mode.name())
                .executes(set_gamemode(state.clone(), mode))
                .then(argument("target", player(state)).executes(set_gamemode(state.clone(), mode))),
        );
    }
    dispatcher.register(gamemode);

    let root = dispatcher.root();
    let execute = dispatcher.register(
        literal("execute")
            .requires_permission("mcadmin.execute")
            .then(literal("run").redirect(root)),
    );
    dispatcher.register(literal("execute").then(
        literal("as").then(argument("targets", player(state)).fork(execute, as_players(state.clone()))),
    ));

    dispatcher.register(
        literal("me")
            .console(ConsolePolicy::Denied)
            .then(argument("action", greedy_string()).executes(|ctx: &CommandContext<Actor>| {
                let action: String = ctx.argument("action")?;
                ctx.source().reply(format!("* {} {action}", ctx.source().name()));
                Ok(())
            })),
    );

    let perms_state = state.clone();
    dispatcher.register(
        literal("perms").requires_permission("mcadmin.perms").then(
            argument("target", player(state)).executes(move |ctx| {
                let target: String = ctx.argument("target")?;
                let state = lock(&perms_state)?;
                let record = state
                    .players
                    .get(&target)
                    .ok_or_else(|| RuntimeError::Message(format!("Unknown player {target}")))?;
                if record.permissions.is_empty() {
                    ctx.source().reply(format!("{target} has no permissions"));
                } else {
                    ctx.source()
                        .reply(format!("{target}: {}", record.permissions.iter().join(", ")));
                }
                Ok(())
            }),
        ),
    );

    let stop_state = state.clone();
    dispatcher.register(
        literal("stop")
            .requires(Actor::is_console)
            .executes(move |ctx| {
                lock(&stop_state)?.running = false;
                info!("Stop requested by {}", ctx.source().name());
                ctx.source().reply("Stopping");
                Ok(())
            }),
    );

    let help_all = this.clone();
    dispatcher.register(
        literal("help")
            .executes(move |ctx| help_overview(&help_all, ctx))
            .then(argument("command", greedy_string()).executes(move |ctx| help_command(&this, ctx))),
    );
}

fn ban(state: SharedState) -> impl Fn(&CommandContext<Actor>) -> CommandResult<()> + Send + Sync {
    move |ctx| {
        let target: String = ctx.argument("target")?;
        let duration = ctx.optional_argument::<IntBounds>("duration")?;
        let reason = ctx.optional_argument::<String>("reason")?;
        let mut state = lock(&state)?;
        if state.bans.contains_key(&target) {
            return Err(RuntimeError::Message(format!("{target} is already banned")).into());
        }
        if let Some(record) = state.players.get_mut(&target) {
            record.online = false;
        }
        let message = match duration {
            Some(days) => format!("Banned {target} for {days} days"),
            None => format!("Banned {target}"),
        };
        info!("{} banned {}", ctx.source().name(), target);
        state.bans.insert(
            target,
            Ban {
                by: ctx.source().name().to_string(),
                reason,
                duration,
            },
        );
        ctx.source().reply(message);
        Ok(())
    }
}

fn kick(state: SharedState) -> impl Fn(&CommandContext<Actor>) -> CommandResult<()> + Send + Sync {
    move |ctx| {
        let target: String = ctx.argument("target")?;
        let reason = ctx.optional_argument::<String>("reason")?;
        let mut state = lock(&state)?;
        match state.players.get_mut(&target) {
            Some(record) if record.online => record.online = false,
            _ => return Err(RuntimeError::Message(format!("{target} is not online")).into()),
        }
        match reason {
            Some(reason) => ctx.source().reply(format!("Kicked {target}: {reason}")),
            None => ctx.source().reply(format!("Kicked {target}")),
        }
        Ok(())
    }
}

fn set_gamemode(
    state: SharedState,
    mode: GameMode,
) -> impl Fn(&CommandContext<Actor>) -> CommandResult<()> + Send + Sync {
    move |ctx| {
        let target = match ctx.optional_argument::<String>("target")? {
            Some(target) => target,
            None if ctx.source().is_console() => return Err(RuntimeError::PlayerOnly.into()),
            None => ctx.source().name().to_string(),
        };
        let mut state = lock(&state)?;
        let record = state
            .players
            .get_mut(&target)
            .ok_or_else(|| RuntimeError::Message(format!("Unknown player {target}")))?;
        record.gamemode = mode;
        ctx.source()
            .reply(format!("Set {target}'s game mode to {}", mode.name()));
        Ok(())
    }
}

fn as_players(
    state: SharedState,
) -> impl Fn(&CommandContext<Actor>) -> CommandResult<Vec<Actor>> + Send + Sync {
    move |ctx| {
        let target: String = ctx.argument("targets")?;
        let outbox = ctx.source().outbox().clone();
        let state = lock(&state)?;
        let names: Vec<&String> = if target == "*" {
            state
                .players
                .iter()
                .filter(|(_, record)| record.online)
                .map(|(name, _)| name)
                .collect()
        } else if state.players.contains_key(&target) {
            vec![&target]
        } else {
            return Err(RuntimeError::Message(format!("Unknown player {target}")).into());
        };
        Ok(names
            .into_iter()
            .map(|name| state.actor_for(name).with_outbox(outbox.clone()))
            .collect())
    }
}

fn upgrade(this: &Weak<CommandDispatcher<Actor>>) -> CommandResult<Arc<CommandDispatcher<Actor>>> {
    this.upgrade()
        .ok_or_else(|| CommandError::internal("Command dispatcher dropped"))
}

fn help_overview(
    this: &Weak<CommandDispatcher<Actor>>,
    ctx: &CommandContext<Actor>,
) -> CommandResult<()> {
    let dispatcher = upgrade(this)?;
    let source = ctx.source();
    for usage in dispatcher.smart_usage(dispatcher.root(), source).values() {
        source.reply(format!("/{usage}"));
    }
    Ok(())
}

fn help_command(
    this: &Weak<CommandDispatcher<Actor>>,
    ctx: &CommandContext<Actor>,
) -> CommandResult<()> {
    let dispatcher = upgrade(this)?;
    let source = ctx.source();
    let command: String = ctx.argument("command")?;
    let path: Vec<&str> = command.split_whitespace().collect();
    let node = dispatcher
        .find_node(&path)
        .filter(|&node| is_visible(&dispatcher, node, &path, source))
        .ok_or_else(|| RuntimeError::Message(format!("Unknown command: {command}")))?;

    let prefix = path.join(" ");
    for usage in dispatcher.all_usage(node, source, true) {
        if usage.is_empty() {
            source.reply(format!("/{prefix}"));
        } else {
            source.reply(format!("/{prefix} {usage}"));
        }
    }
    let options = dispatcher.option_usage(node, source);
    if !options.is_empty() {
        source.reply(format!("Options: {}", options.join(" ")));
    }
    Ok(())
}

/// Whether every node on `path` is usable by `source`.
fn is_visible(
    dispatcher: &CommandDispatcher<Actor>,
    node: NodeId,
    path: &[&str],
    source: &Actor,
) -> bool {
    let tree = dispatcher.tree();
    let mut current = dispatcher.root();
    let mut console = ConsolePolicy::Inherit;
    for name in path {
        let Some(child) = tree[current].child(name) else {
            return false;
        };
        if !tree[child].can_use(source, console) {
            return false;
        }
        console = tree[child].console_policy().resolve(console);
        current = child;
    }
    current == node
}
