//! Pip-Boy profile parser.
//!
//! The game bot answers `/me` with a profile like:
//!
//! ```text
//! 👤Vault Boy
//! ├❤️Здоровье: 152/152
//! ├⚔️Урон: 120
//! ├🛡Броня: 34
//! ...
//! ```
//!
//! A forward of that message is how players register and update their stats.

use crate::database::PlayerStats;

/// Minimum number of recognised stat lines for a text to count as a profile.
const MIN_STATS: usize = 4;

const NICKNAME_MARK: &str = "👤";

/// Parsed profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipBoy {
    pub nickname: String,
    pub stats: PlayerStats,
}

/// Parse a forwarded profile. `None` if the text does not look like one.
pub fn parse_pipboy(text: &str) -> Option<PipBoy> {
    let mut nickname = None;
    let mut stats = PlayerStats::default();
    let mut found = 0;

    for line in text.lines() {
        if nickname.is_none() {
            if let Some((_, rest)) = line.split_once(NICKNAME_MARK) {
                let name = rest.trim();
                if !name.is_empty() {
                    nickname = Some(name.to_string());
                }
                continue;
            }
        }

        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some(value) = leading_number(value) else {
            continue;
        };

        let slot = if label.contains("Здоровье") {
            &mut stats.health
        } else if label.contains("Урон") {
            &mut stats.damage
        } else if label.contains("Броня") {
            &mut stats.armor
        } else if label.contains("Сила") {
            &mut stats.strength
        } else if label.contains("Меткость") {
            &mut stats.accuracy
        } else if label.contains("Харизма") {
            &mut stats.charisma
        } else if label.contains("Ловкость") {
            &mut stats.agility
        } else if label.contains("Выносливость") {
            &mut stats.stamina
        } else {
            continue;
        };
        *slot = value;
        found += 1;
    }

    if found < MIN_STATS {
        return None;
    }
    nickname.map(|nickname| PipBoy { nickname, stats })
}

/// First run of digits, e.g. `152` in ` 152/152`.
fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "📟Пип-бой 3000 v1.0\n\
        👤Vault Boy\n\
        ├🤟 Группировка\n\
        ├❤️Здоровье: 152/160\n\
        ├⚔️Урон: 120\n\
        ├🛡Броня: 34\n\
        ├💪Сила: 110\n\
        ├🎯Меткость: 40\n\
        ├🗣Харизма: 22\n\
        ├🤸Ловкость: 48\n\
        ├🔋Выносливость: 10/10";

    #[test]
    fn parses_full_profile() {
        let pipboy = parse_pipboy(PROFILE).unwrap();
        assert_eq!(pipboy.nickname, "Vault Boy");
        assert_eq!(pipboy.stats.health, 152);
        assert_eq!(pipboy.stats.damage, 120);
        assert_eq!(pipboy.stats.armor, 34);
        assert_eq!(pipboy.stats.strength, 110);
        assert_eq!(pipboy.stats.accuracy, 40);
        assert_eq!(pipboy.stats.charisma, 22);
        assert_eq!(pipboy.stats.agility, 48);
        assert_eq!(pipboy.stats.stamina, 10);
    }

    #[test]
    fn rejects_plain_text() {
        assert!(parse_pipboy("hello there").is_none());
        assert!(parse_pipboy("👤Someone\n├❤️Здоровье: 10").is_none());
    }

    #[test]
    fn requires_nickname() {
        let no_name = PROFILE.replace("👤Vault Boy\n", "");
        assert!(parse_pipboy(&no_name).is_none());
    }
}
