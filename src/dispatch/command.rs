//! Command token parsing.
//!
//! Turns `/name_sub@bot argument text` into a [`Command`]. Anything that is
//! not a well-formed command addressed to this bot is rejected with a
//! [`CommandError`], which the router treats as "not a command" and ignores.

use thiserror::Error;

/// Prefix that marks a message as a command.
pub const COMMAND_SIGIL: char = '/';

/// Delimiter between a command family and its embedded subcommand.
const SUBCOMMAND_DELIMITER: char = '_';

/// Why a text could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("text does not start with the command sigil")]
    MissingSigil,

    #[error("command name is empty")]
    EmptyName,

    #[error("command is addressed to @{0}")]
    ForeignBot(String),
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lower-cased command name including any subcommand suffix (`trrem_42`).
    pub name: String,
    /// The `@botname` suffix, as written.
    pub bot_mention: Option<String>,
    /// Part of the name after the first `_`, if any.
    pub subcommand: Option<String>,
    /// Remainder of the message after the command token, trimmed.
    pub argument: String,
}

impl Command {
    /// Parse `text` as a command for the bot named `bot_username`.
    ///
    /// `bot_username` is compared case-insensitively and may carry a leading `@`.
    pub fn parse(text: &str, bot_username: &str) -> Result<Self, CommandError> {
        let body = text
            .strip_prefix(COMMAND_SIGIL)
            .ok_or(CommandError::MissingSigil)?;

        let (token, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };

        let (raw_name, bot_mention) = match token.split_once('@') {
            Some((name, mention)) if !mention.is_empty() => (name, Some(mention.to_string())),
            Some((name, _)) => (name, None),
            None => (token, None),
        };

        if raw_name.is_empty() {
            return Err(CommandError::EmptyName);
        }

        if let Some(mention) = &bot_mention {
            let own = bot_username.trim_start_matches('@');
            if !mention.eq_ignore_ascii_case(own) {
                return Err(CommandError::ForeignBot(mention.clone()));
            }
        }

        let name = raw_name.to_lowercase();
        let subcommand = name
            .split_once(SUBCOMMAND_DELIMITER)
            .map(|(_, sub)| sub.to_string())
            .filter(|sub| !sub.is_empty());

        Ok(Self {
            name,
            bot_mention,
            subcommand,
            argument: rest.trim().to_string(),
        })
    }

    /// Cheap check used by the classifier before full parsing.
    pub fn looks_like_command(text: &str) -> bool {
        text.starts_with(COMMAND_SIGIL)
    }

    /// Whether the command carries a usable name.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }

    /// Name without the subcommand suffix (`trrem` for `trrem_42`).
    pub fn family(&self) -> &str {
        match self.name.split_once(SUBCOMMAND_DELIMITER) {
            Some((family, _)) => family,
            None => &self.name,
        }
    }

    /// Subcommand parsed as an integer id, as used by `/trrem_42` style commands.
    pub fn subcommand_id(&self) -> Option<i64> {
        self.subcommand.as_deref().and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_mention_and_argument() {
        let cmd = Command::parse("/ME@WardenBot  some  args ", "wardenbot").unwrap();
        assert_eq!(cmd.name, "me");
        assert_eq!(cmd.bot_mention.as_deref(), Some("WardenBot"));
        assert_eq!(cmd.argument, "some  args");
        assert!(cmd.subcommand.is_none());
        assert!(cmd.is_valid());
    }

    #[test]
    fn mention_is_kept_verbatim() {
        let cmd = Command::parse("/raid@bot 12", "BOT").unwrap();
        assert_eq!(cmd.bot_mention.as_deref(), Some("bot"));
    }

    #[test]
    fn rejects_foreign_bot() {
        let err = Command::parse("/me@otherbot", "wardenbot").unwrap_err();
        assert_eq!(err, CommandError::ForeignBot("otherbot".into()));
    }

    #[test]
    fn accepts_username_with_at_prefix() {
        assert!(Command::parse("/me@WardenBot", "@wardenbot").is_ok());
    }

    #[test]
    fn extracts_subcommand() {
        let cmd = Command::parse("/trrem_42", "bot").unwrap();
        assert_eq!(cmd.name, "trrem_42");
        assert_eq!(cmd.family(), "trrem");
        assert_eq!(cmd.subcommand.as_deref(), Some("42"));
        assert_eq!(cmd.subcommand_id(), Some(42));
    }

    #[test]
    fn trailing_delimiter_has_no_subcommand() {
        let cmd = Command::parse("/chat_", "bot").unwrap();
        assert_eq!(cmd.family(), "chat");
        assert!(cmd.subcommand.is_none());
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(Command::parse("me", "bot"), Err(CommandError::MissingSigil));
        assert_eq!(Command::parse("/", "bot"), Err(CommandError::EmptyName));
        assert_eq!(Command::parse("/ hello", "bot"), Err(CommandError::EmptyName));
        assert_eq!(Command::parse("/@bot", "bot"), Err(CommandError::EmptyName));
    }

    #[test]
    fn empty_mention_is_ignored() {
        let cmd = Command::parse("/start@ go", "bot").unwrap();
        assert_eq!(cmd.name, "start");
        assert!(cmd.bot_mention.is_none());
        assert_eq!(cmd.argument, "go");
    }

    #[test]
    fn multiline_argument() {
        let cmd = Command::parse("/trigger hello\nworld", "bot").unwrap();
        assert_eq!(cmd.name, "trigger");
        assert_eq!(cmd.argument, "hello\nworld");
    }
}
