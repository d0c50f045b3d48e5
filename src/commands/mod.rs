// commands/mod.rs - Command Module Registry
// Declares all command modules and the static registry that slash registration,
// slash dispatch and the help text are generated from.

pub mod help;           // Help text built from the registry
pub mod like;           // Like request forwarding to the external API
pub mod reply;          // Reply model and rendering to serenity builders
pub mod setlikechannel; // Admin toggle for the like channel allow-list
pub mod slash;          // Slash command registration and dispatch

use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::channel::Message;

// ============================================================================
// INVOCATION CONTEXT
// ============================================================================

/// Who invoked a command, where, and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub author_id: u64,
    pub author_name: String,
    pub is_slash: bool,
    /// Prefix to show in usage hints: the text prefix, or `/` for slash commands
    pub prefix: String,
}

impl Invocation {
    pub fn from_message(msg: &Message, prefix: &str) -> Self {
        Invocation {
            guild_id: msg.guild_id.map(|id| id.0),
            channel_id: msg.channel_id.0,
            author_id: msg.author.id.0,
            author_name: msg.author.name.clone(),
            is_slash: false,
            prefix: prefix.to_string(),
        }
    }

    pub fn from_interaction(interaction: &ApplicationCommandInteraction) -> Self {
        Invocation {
            guild_id: interaction.guild_id.map(|id| id.0),
            channel_id: interaction.channel_id.0,
            author_id: interaction.user.id.0,
            author_name: interaction.user.name.clone(),
            is_slash: true,
            prefix: "/".to_string(),
        }
    }

    pub fn author_mention(&self) -> String {
        format!("<@{}>", self.author_id)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    TextChannel,
}

#[derive(Debug)]
pub struct CommandOption {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Arguments as shown in help, without prefix or command name
    pub usage: &'static str,
    pub admin_only: bool,
    pub options: &'static [CommandOption],
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "like",
        description: "Send likes to a Free Fire player.",
        usage: "<region> <uid>",
        admin_only: false,
        options: &[
            CommandOption {
                name: "region",
                description: "Region (e.g., ME, IND, BR, US)",
                kind: OptionKind::String,
                required: false,
            },
            CommandOption {
                name: "uid",
                description: "Player UID (numbers only, at least 6 digits)",
                kind: OptionKind::String,
                required: false,
            },
        ],
    },
    CommandSpec {
        name: "setlikechannel",
        description: "Allow or block the use of /like in a specific channel.",
        usage: "<#channel>",
        admin_only: true,
        options: &[CommandOption {
            name: "channel",
            description: "Channel to toggle access for /like command.",
            kind: OptionKind::TextChannel,
            required: true,
        }],
    },
    CommandSpec {
        name: "help",
        description: "Show the available commands.",
        usage: "",
        admin_only: false,
        options: &[],
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}
