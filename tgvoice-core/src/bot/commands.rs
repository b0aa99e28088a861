/// A slash command sent to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Voice,
    Current,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse `/name` or `/name@botname`. Returns `None` for text that is not
    /// a command; anything after the first word is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or_default();

        let command = match name.to_ascii_lowercase().as_str() {
            "start" => Self::Start,
            "voice" => Self::Voice,
            "current" => Self::Current,
            "help" => Self::Help,
            _ => Self::Unknown(name.to_string()),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub usage: String,
}

pub fn get_available_commands() -> Vec<CommandInfo> {
    vec![
        CommandInfo {
            name: "voice".to_string(),
            description: "Choose the voice used to read your text".to_string(),
            usage: "/voice".to_string(),
        },
        CommandInfo {
            name: "current".to_string(),
            description: "Show the voice currently in use".to_string(),
            usage: "/current".to_string(),
        },
        CommandInfo {
            name: "start".to_string(),
            description: "Show the voice picker".to_string(),
            usage: "/start".to_string(),
        },
        CommandInfo {
            name: "help".to_string(),
            description: "Show this help message".to_string(),
            usage: "/help".to_string(),
        },
    ]
}

pub fn help_text() -> String {
    let mut text =
        String::from("Send me any text and I will read it aloud.\n\nAvailable commands:\n");
    for command in get_available_commands() {
        text.push_str(&format!("{} - {}\n", command.usage, command.description));
    }
    text.trim_end().to_string()
}
