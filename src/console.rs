use crate::actor::Actor;
use mcadmin_commands::{
    CommandDispatcher, CommandError, CommandSyntaxError, ParseResults, SuggestionFuture,
};
use tracing::{debug, error};

/// Runs one line for `actor` and returns everything that should be shown to
/// them, replies first.
pub fn run_line(dispatcher: &CommandDispatcher<Actor>, actor: &Actor, line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    let command_line = dispatcher.expand_custom_aliases(line);
    debug!("{} issued command: {}", actor.name(), command_line);
    let parse = dispatcher.parse(command_line, actor.clone());
    let result = dispatcher.execute(&parse);

    let mut output = actor.outbox().drain();
    match result {
        Ok(_) => {}
        Err(CommandError::Syntax(err)) => {
            output.extend(describe_syntax_error(dispatcher, actor, &parse, &err));
        }
        Err(CommandError::Runtime(err)) => output.push(err.to_string()),
        Err(CommandError::Internal(err)) => {
            error!("Error executing '{}': {}", line, err);
            output.push("An internal error occurred while running this command".to_string());
        }
    }
    output
}

/// Completes the end of `line` for `actor`. Custom aliases are expanded
/// first, so suggestion ranges refer to the expanded line.
pub fn complete_line(
    dispatcher: &CommandDispatcher<Actor>,
    actor: &Actor,
    line: &str,
) -> SuggestionFuture {
    let command_line = dispatcher.expand_custom_aliases(line);
    let parse = dispatcher.parse(command_line, actor.clone());
    dispatcher.completion_suggestions(&parse)
}

fn describe_syntax_error(
    dispatcher: &CommandDispatcher<Actor>,
    actor: &Actor,
    parse: &ParseResults<Actor>,
    err: &CommandSyntaxError,
) -> Vec<String> {
    let mut lines = vec![err.to_string()];

    let Some(last) = parse.context().last_child().nodes().last() else {
        return lines;
    };
    let typed = parse
        .reader()
        .string()
        .get(..last.range().end())
        .unwrap_or_default();
    for usage in dispatcher.smart_usage(last.node(), actor).values() {
        lines.push(format!("Usage: /{typed} {usage}"));
    }
    if let Some(first) = parse.context().nodes().first() {
        let command = dispatcher.tree()[first.node()].name();
        lines.push(format!("Run /help {command} for more information."));
    }
    lines
}
