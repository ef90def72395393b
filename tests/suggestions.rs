mod common;

use common::{PlayerArgument, TestSource, ban_dispatcher};
use mcadmin_commands::arguments::{integer, word};
use mcadmin_commands::{
    CommandContext, CommandDispatcher, CommandFlags, ConsolePolicy, StringRange, argument,
    literal, option,
};

fn texts(suggestions: &mcadmin_commands::Suggestions) -> Vec<&str> {
    suggestions.texts().collect()
}

#[tokio::test]
async fn suggests_players_for_partial_target() {
    let (dispatcher, _) = ban_dispatcher();
    let admin = TestSource::player("Admin", &["ban"]);

    let parse = dispatcher.parse("ban St", admin);
    let suggestions = dispatcher.completion_suggestions(&parse).await;
    assert_eq!(suggestions.range(), StringRange::between(4, 6));
    assert_eq!(texts(&suggestions), ["Stan", "Steve"]);
}

#[tokio::test]
async fn denied_branch_suggests_nothing() {
    let (dispatcher, _) = ban_dispatcher();
    let guest = TestSource::player("Guest", &[]);

    let parse = dispatcher.parse("ban St", guest.clone());
    assert!(dispatcher.completion_suggestions(&parse).await.is_empty());

    let parse = dispatcher.parse("b", guest);
    assert!(dispatcher.completion_suggestions(&parse).await.is_empty());
}

#[tokio::test]
async fn suggests_root_literals_by_prefix() {
    let (mut dispatcher, _) = ban_dispatcher();
    dispatcher.register(literal("banlist").executes(|_: &CommandContext<TestSource>| Ok(())));
    dispatcher.register(literal("kick").then(argument("target", PlayerArgument)));

    let parse = dispatcher.parse("BA", TestSource::console());
    let suggestions = dispatcher.completion_suggestions(&parse).await;
    assert_eq!(suggestions.range(), StringRange::between(0, 2));
    assert_eq!(texts(&suggestions), ["ban", "banlist"]);
}

#[tokio::test]
async fn suggests_unused_options() {
    let mut dispatcher = CommandDispatcher::<TestSource>::new();
    dispatcher.register(
        literal("give")
            .with_option(option("count", integer()))
            .with_option(option("reason", word()))
            .then(argument("target", PlayerArgument).executes(|_: &CommandContext<TestSource>| Ok(()))),
    );
    let console = TestSource::console();

    let parse = dispatcher.parse("give Steve -", console.clone());
    let suggestions = dispatcher.completion_suggestions(&parse).await;
    assert_eq!(texts(&suggestions), ["--count", "--reason"]);

    let parse = dispatcher.parse("give Steve --count 2 -", console);
    let suggestions = dispatcher.completion_suggestions(&parse).await;
    assert_eq!(texts(&suggestions), ["--reason"]);
}

#[tokio::test]
async fn suggestions_at_cursor_ignore_the_rest() {
    let (dispatcher, _) = ban_dispatcher();
    let admin = TestSource::player("Admin", &["ban"]);

    let parse = dispatcher.parse("ban Al 1..2", admin);
    let suggestions = dispatcher.completion_suggestions_at(&parse, 6).await;
    assert_eq!(suggestions.range(), StringRange::between(4, 6));
    assert_eq!(texts(&suggestions), ["Alex"]);
}

#[test]
fn declared_tree_hides_denied_branches() {
    let (mut dispatcher, _) = ban_dispatcher();
    dispatcher.register(
        literal("me")
            .console(ConsolePolicy::Denied)
            .then(argument("action", word()).executes(|_: &CommandContext<TestSource>| Ok(()))),
    );

    let guest = dispatcher.declare(&TestSource::player("Guest", &[]));
    let root = &guest[0];
    assert_eq!(root.flags(), CommandFlags::empty());
    let names: Vec<_> = root
        .children
        .iter()
        .filter_map(|&index| guest[index].name.as_deref())
        .collect();
    assert_eq!(names, ["me"]);

    let console = dispatcher.declare(&TestSource::console());
    let names: Vec<_> = console[0]
        .children
        .iter()
        .filter_map(|&index| console[index].name.as_deref())
        .collect();
    assert_eq!(names, ["ban"]);

    let ban = console
        .iter()
        .find(|node| node.name.as_deref() == Some("ban"))
        .unwrap();
    assert!(ban.flags().contains(CommandFlags::LITERAL));
    let target = &console[ban.children[0]];
    assert!(target.flags().contains(CommandFlags::ARGUMENT | CommandFlags::EXECUTABLE));
    assert_eq!(target.parser.as_deref(), Some("player"));
}
