//! Trigger content parser.
//!
//! - Tags: `{exact}`, `{case}`, `{admin}`, `{pin}`, `{reply}` in the
//!   `/trigger` argument switch matching and delivery options.
//! - Fillings: `{username}`, `{mention}`, `{chat_name}`, ... in a trigger
//!   answer are replaced with values of the matching message. Unknown
//!   `{placeholder}` tokens are removed.

use crate::dispatch::Sender;

/// Options of a trigger set through tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerTags {
    /// Match the whole message only
    pub exact: bool,
    /// Match case-sensitively
    pub case_sensitive: bool,
    /// Only admins set the trigger off
    pub admin_only: bool,
    /// Pin the answer
    pub pin: bool,
    /// Answer as a reply to the matching message
    pub reply: bool,
}

/// Strip tags from `input`, returning the clean text and the tags found.
pub fn parse_tags(input: &str) -> (String, TriggerTags) {
    let mut tags = TriggerTags::default();
    let mut text = input.to_string();

    for (tag, flag) in [
        ("{exact}", &mut tags.exact),
        ("{case}", &mut tags.case_sensitive),
        ("{admin}", &mut tags.admin_only),
        ("{pin}", &mut tags.pin),
        ("{reply}", &mut tags.reply),
    ] {
        if text.contains(tag) {
            *flag = true;
            text = text.replace(tag, "");
        }
    }

    (text.trim().to_string(), tags)
}

/// Values available to trigger answers.
#[derive(Debug, Clone, Default)]
pub struct Fillings<'a> {
    pub sender: Option<&'a Sender>,
    pub chat_id: i64,
    pub chat_name: &'a str,
}

/// Apply fillings (placeholders) to text. Unknown placeholders are dropped.
///
/// Fillings:
/// - `{username}` - @username or first name
/// - `{user_id}` - Telegram user ID
/// - `{first_name}` / `{last_name}` / `{full_name}`
/// - `{mention}` - HTML link to the user
/// - `{chat_id}` / `{chat_name}`
pub fn apply_fillings(text: &str, fillings: &Fillings<'_>) -> String {
    let (user_id, first, last, username) = match fillings.sender {
        Some(sender) => (
            sender.id.to_string(),
            sender.first_name.as_str(),
            sender.last_name.as_deref().unwrap_or(""),
            sender
                .username
                .as_ref()
                .map(|u| format!("@{}", u))
                .unwrap_or_else(|| html_escape(&sender.first_name)),
        ),
        None => (String::new(), "", "", String::new()),
    };
    let full_name = if last.is_empty() {
        first.to_string()
    } else {
        format!("{} {}", first, last)
    };
    let mention = match fillings.sender {
        Some(sender) => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            sender.id,
            html_escape(first)
        ),
        None => String::new(),
    };

    let first = html_escape(first);
    let last = html_escape(last);
    let full_name = html_escape(&full_name);
    let chat_id = fillings.chat_id.to_string();
    let chat_name = html_escape(fillings.chat_name);

    // Single pass: substituted values are never scanned again.
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((before, name, after)) = next_placeholder(rest) {
        result.push_str(before);
        result.push_str(match name {
            "username" => username.as_str(),
            "user_id" => user_id.as_str(),
            "first_name" => first.as_str(),
            "last_name" => last.as_str(),
            "full_name" => full_name.as_str(),
            "mention" => mention.as_str(),
            "chat_id" => chat_id.as_str(),
            "chat_name" => chat_name.as_str(),
            _ => "",
        });
        rest = after;
    }
    result.push_str(rest);
    result
}

/// First `{name}` token (letters, digits and `_` only) in `text`, as the text
/// before it, the name and the text after it.
fn next_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let open = from + offset;
        let after = &text[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with('}') {
            return Some((&text[..open], &after[..name_len], &after[name_len + 1..]));
        }
        from = open + 1;
    }
    None
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> Sender {
        Sender {
            id: 42,
            username: Some("rad_roach".into()),
            first_name: "Rad".into(),
            last_name: Some("<Roach>".into()),
        }
    }

    #[test]
    fn test_parse_tags() {
        let (text, tags) = parse_tags("{exact} hello {pin} world {reply}");
        assert!(tags.exact);
        assert!(tags.pin);
        assert!(tags.reply);
        assert!(!tags.admin_only);
        assert!(!tags.case_sensitive);
        assert_eq!(text, "hello  world");
    }

    #[test]
    fn test_fillings() {
        let sender = sender();
        let fillings = Fillings {
            sender: Some(&sender),
            chat_id: -100,
            chat_name: "Vault & Co",
        };
        let out = apply_fillings(
            "{username} {user_id} {full_name} {chat_id} {chat_name} {mention}",
            &fillings,
        );
        assert_eq!(
            out,
            "@rad_roach 42 Rad &lt;Roach&gt; -100 Vault &amp; Co <a href=\"tg://user?id=42\">Rad</a>"
        );
    }

    #[test]
    fn test_unknown_placeholders_removed() {
        let out = apply_fillings("hi {first_name}{unknown} {x_1}!", &Fillings::default());
        assert_eq!(out, "hi  !");
        assert!(!out.contains('{'));
    }

    #[test]
    fn test_non_placeholder_braces_kept() {
        let none = Fillings::default();
        assert_eq!(apply_fillings("{not a tag}", &none), "{not a tag}");
        assert_eq!(apply_fillings("{{x}}", &none), "{}");
        assert_eq!(apply_fillings("a {} b {", &none), "a {} b {");
    }

    #[test]
    fn test_filled_values_are_not_expanded_again() {
        let sender = Sender {
            id: 7,
            username: None,
            first_name: "{chat_id}".into(),
            last_name: Some("{x}".into()),
        };
        let fillings = Fillings {
            sender: Some(&sender),
            chat_id: -100,
            chat_name: "{user_id}",
        };
        let out = apply_fillings("{first_name} {last_name} / {username} in {chat_name}", &fillings);
        assert_eq!(out, "{chat_id} {x} / {chat_id} in {user_id}");
    }
}
