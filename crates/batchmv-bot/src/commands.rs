#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Login,
    RenameAll,
    Cancel,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: BotCommand,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandDef {
    command: BotCommand,
    pattern: &'static str,
    description: &'static str,
}

const COMMAND_DEFS: &[CommandDef] = &[
    CommandDef {
        command: BotCommand::Start,
        pattern: "/start",
        description: "Show this help",
    },
    CommandDef {
        command: BotCommand::Login,
        pattern: "/login",
        description: "Connect your drive account",
    },
    CommandDef {
        command: BotCommand::RenameAll,
        pattern: "/rename_all",
        description: "Rename every item to <base>_N",
    },
    CommandDef {
        command: BotCommand::Cancel,
        pattern: "/cancel",
        description: "Abort a login in progress",
    },
    CommandDef {
        command: BotCommand::Logout,
        pattern: "/logout",
        description: "Drop the active drive session",
    },
];

/// Whether the text looks like a bot command at all. Command-shaped input is
/// never fed to the login flow, known or not.
pub fn is_command(text: &str) -> bool {
    text.trim().starts_with('/')
}

/// Parses a known command plus its whitespace-separated arguments.
/// A `@botname` mention suffix on the command token is accepted.
pub fn parse_command(text: &str) -> Option<ParsedCommand> {
    let mut tokens = text.split_whitespace();
    let first = tokens.next()?;
    let bare = first.split_once('@').map_or(first, |(bare, _)| bare);

    let def = COMMAND_DEFS.iter().find(|def| def.pattern == bare)?;
    Some(ParsedCommand {
        command: def.command,
        args: tokens.map(str::to_string).collect(),
    })
}

/// One line per command, used by the /start help text.
pub fn command_summary() -> String {
    COMMAND_DEFS
        .iter()
        .map(|def| format!("{} – {}", def.pattern, def.description))
        .collect::<Vec<_>>()
        .join("\n")
}
