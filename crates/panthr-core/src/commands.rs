//! Chat command table
//!
//! Every command the bot understands is a row in [`COMMANDS`]. Parsing maps
//! incoming text to a row plus its arguments; nothing is dispatched by name
//! at runtime.

/// What a command does once parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    CreateWallet,
    ImportWallet,
    ViewPrivateKey,
    SetLanguage,
    ToggleNotifications,
    /// Placeholder: replies with a fixed "coming soon" text
    ComingSoon(&'static str),
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    /// Minimum number of whitespace-separated arguments
    pub arity: usize,
    pub kind: CommandKind,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        usage: "/start",
        description: "Welcome message and bot information",
        arity: 0,
        kind: CommandKind::Start,
    },
    CommandSpec {
        name: "create_wallet",
        usage: "/create_wallet",
        description: "Create a new Aleo wallet",
        arity: 0,
        kind: CommandKind::CreateWallet,
    },
    CommandSpec {
        name: "import_wallet",
        usage: "/import_wallet <privateKey>",
        description: "Import an existing Aleo wallet",
        arity: 1,
        kind: CommandKind::ImportWallet,
    },
    CommandSpec {
        name: "view_private_key",
        usage: "/view_private_key",
        description: "Show the private key of your wallet",
        arity: 0,
        kind: CommandKind::ViewPrivateKey,
    },
    CommandSpec {
        name: "balance",
        usage: "/balance <address>",
        description: "Check the balance of an Aleo address (Coming soon)",
        arity: 1,
        kind: CommandKind::ComingSoon("Balance check"),
    },
    CommandSpec {
        name: "send_transaction",
        usage: "/send_transaction <fromPrivateKey> <toAddress> <amount>",
        description: "Send a transaction from one address to another (Coming soon)",
        arity: 3,
        kind: CommandKind::ComingSoon("Send transaction"),
    },
    CommandSpec {
        name: "transaction_history",
        usage: "/transaction_history <address>",
        description: "Get the transaction history of an Aleo address (Coming soon)",
        arity: 1,
        kind: CommandKind::ComingSoon("Transaction history"),
    },
    CommandSpec {
        name: "set_language",
        usage: "/set_language <languageCode>",
        description: "Set your preferred language for bot interactions",
        arity: 1,
        kind: CommandKind::SetLanguage,
    },
    CommandSpec {
        name: "toggle_notifications",
        usage: "/toggle_notifications",
        description: "Enable or disable notifications for your wallet",
        arity: 0,
        kind: CommandKind::ToggleNotifications,
    },
    CommandSpec {
        name: "price",
        usage: "/price",
        description: "Get the current price of Aleo tokens (Coming soon)",
        arity: 0,
        kind: CommandKind::ComingSoon("Price tracking"),
    },
    CommandSpec {
        name: "network_stats",
        usage: "/network_stats",
        description: "Display current Aleo network statistics (Coming soon)",
        arity: 0,
        kind: CommandKind::ComingSoon("Network stats"),
    },
    CommandSpec {
        name: "ai-aleo-learn",
        usage: "/ai-aleo-learn",
        description: "Learn about the Aleo network with an AI teaching machine (Coming soon)",
        arity: 0,
        kind: CommandKind::ComingSoon("AI Aleo Learn"),
    },
    CommandSpec {
        name: "help",
        usage: "/help",
        description: "Show this help message",
        arity: 0,
        kind: CommandKind::Help,
    },
];

/// Result of matching a chat message against the table
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed<'a> {
    Command { spec: &'static CommandSpec, args: Vec<&'a str> },
    /// Known command, too few arguments
    Usage(&'static CommandSpec),
    /// Starts with '/' but is not in the table
    Unknown(&'a str),
}

impl PartialEq for CommandSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CommandSpec {}

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// Parse `/name[@bot] args...`. Returns `None` for ordinary text.
pub fn parse(text: &str) -> Option<Parsed<'_>> {
    let rest = text.trim().strip_prefix('/')?;
    let mut words = rest.split_whitespace();
    let head = words.next()?;
    let name = head.split_once('@').map_or(head, |(name, _bot)| name);

    let Some(spec) = lookup(name) else {
        return Some(Parsed::Unknown(name));
    };
    let args: Vec<&str> = words.collect();
    if args.len() < spec.arity {
        return Some(Parsed::Usage(spec));
    }
    Some(Parsed::Command { spec, args })
}

/// `/help` text, rendered from the table
pub fn help_text() -> String {
    let mut text = String::from("Here are the commands you can use:\n");
    for spec in COMMANDS {
        text.push_str(&format!("{} - {}\n", spec.usage, spec.description));
    }
    text
}
