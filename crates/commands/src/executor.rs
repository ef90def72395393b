use crate::context::CommandContext;
use crate::dispatcher::CommandDispatcher;
use crate::error::{CommandResult, ErrorKind, SyntaxResult};
use crate::parser::ParseResults;
use crate::source::CommandSource;
use std::sync::Arc;
use tracing::debug;

impl<S: CommandSource> CommandDispatcher<S> {
    /// Turns a parse into a context ready to run, or the error explaining why
    /// it cannot run.
    pub fn resolve(&self, parse: &ParseResults<S>) -> SyntaxResult<CommandContext<S>> {
        if !parse.is_complete() {
            return Err(parse.failure());
        }
        if parse.context().last_child().command().is_none() {
            return Err(ErrorKind::IncompleteCommand.create_with_context(parse.reader()));
        }
        Ok(parse.context().build(parse.reader().shared_string()))
    }

    /// Runs a parsed command and returns how many times an executor ran
    /// successfully.
    ///
    /// Redirects run the rest of the command for every source their modifier
    /// produces. Inside a fork, failures are logged and skipped; anywhere else
    /// the first failure is returned.
    pub fn execute(&self, parse: &ParseResults<S>) -> CommandResult<usize> {
        let original = self.resolve(parse)?;
        debug!("Executing command '{}'", original.input());

        let mut successes = 0;
        let mut forked = false;
        let mut found_command = false;
        let mut contexts = vec![original];

        while !contexts.is_empty() {
            let mut next = Vec::new();
            for context in &contexts {
                if let Some(child) = context.child() {
                    forked |= context.is_forked();
                    if !child.has_nodes() {
                        continue;
                    }
                    found_command = true;
                    match context.redirect_modifier() {
                        None => next.push(child.copy_for(context.source().clone())),
                        Some(modifier) => match modifier(context) {
                            Ok(sources) => {
                                next.extend(sources.into_iter().map(|source| child.copy_for(source)))
                            }
                            Err(err) if forked => debug!("Forked redirect failed: {}", err),
                            Err(err) => return Err(err),
                        },
                    }
                } else if let Some(command) = context.command() {
                    found_command = true;
                    match command(context) {
                        Ok(()) => successes += 1,
                        Err(err) if forked => debug!("Forked command failed: {}", err),
                        Err(err) => return Err(err),
                    }
                }
            }
            contexts = next;
        }

        if !found_command {
            return Err(ErrorKind::UnknownCommand
                .create_with_context(parse.reader())
                .into());
        }
        Ok(successes)
    }

    /// Expands custom aliases, then parses and runs `input`.
    pub fn execute_input(&self, input: &str, source: S) -> CommandResult<usize> {
        let input: Arc<str> = self.expand_custom_aliases(input.trim()).into();
        let parse = self.parse(input, source);
        self.execute(&parse)
    }
}

#[cfg(test)]
mod tests {
    use crate::CommandContext;
    use crate::arguments::integer;
    use crate::builder::{argument, literal};
    use crate::dispatcher::CommandDispatcher;
    use crate::error::{CommandError, ErrorKind};
    use crate::source::CommandSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Source(u32);

    impl CommandSource for Source {
        fn has_permission(&self, _: &str) -> bool {
            true
        }

        fn is_console(&self) -> bool {
            false
        }
    }

    fn syntax_kind(err: CommandError) -> ErrorKind {
        match err {
            CommandError::Syntax(err) => err.kind().clone(),
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn runs_command_and_counts() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(literal("foo").then(argument("n", integer()).executes(
            move |ctx| {
                counter.fetch_add(ctx.argument::<i32>("n")? as usize, Ordering::SeqCst);
                Ok(())
            },
        )));
        assert_eq!(dispatcher.execute_input("foo 3", Source(0)).unwrap(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn incomplete_and_unknown() {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(literal("foo").then(literal("bar").executes(|_| Ok(()))));
        let err = dispatcher.execute_input("foo", Source(0)).unwrap_err();
        assert_eq!(syntax_kind(err), ErrorKind::IncompleteCommand);
        let err = dispatcher.execute_input("baz", Source(0)).unwrap_err();
        assert_eq!(syntax_kind(err), ErrorKind::UnknownCommand);
    }

    #[test]
    fn redirect_runs_target_with_same_source() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_command = seen.clone();
        let mut dispatcher = CommandDispatcher::new();
        let actual = dispatcher.register(literal("actual").executes(move |ctx: &CommandContext<Source>| {
            seen_by_command.store(ctx.source().0 as usize, Ordering::SeqCst);
            Ok(())
        }));
        let root = dispatcher.root();
        dispatcher.register(literal("redirected").redirect(root));
        assert_eq!(dispatcher.execute_input("redirected actual", Source(7)).unwrap(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
        assert!(dispatcher.find_node(&["actual"]) == Some(actual));
    }

    #[test]
    fn fork_runs_once_per_source_and_swallows_failures() {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(literal("check").executes(|ctx: &CommandContext<Source>| {
            if ctx.source().0 % 2 == 0 {
                Ok(())
            } else {
                Err(CommandError::runtime("odd"))
            }
        }));
        let root = dispatcher.root();
        dispatcher.register(
            literal("each").fork(root, |_| Ok(vec![Source(1), Source(2), Source(4)])),
        );
        assert_eq!(dispatcher.execute_input("each check", Source(0)).unwrap(), 2);
    }

    #[test]
    fn failure_outside_fork_propagates() {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(literal("fail").executes(|_| Err(CommandError::runtime("nope"))));
        let err = dispatcher.execute_input("fail", Source(0)).unwrap_err();
        assert!(matches!(err, CommandError::Runtime(_)));
    }
}
