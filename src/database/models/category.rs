use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Expense categories. Stored as their `as_str` name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Food,
    Transport,
    Lodging,
    Activities,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Lodging,
        Category::Activities,
        Category::Shopping,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Lodging => "Lodging",
            Self::Activities => "Activities",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// Next/previous category, wrapping. Used by pickers.
    pub fn cycle(&self, delta: i32) -> Category {
        let pos = Self::ALL.iter().position(|c| c == self).unwrap_or(0) as i32;
        let len = Self::ALL.len() as i32;
        Self::ALL[(pos + delta).rem_euclid(len) as usize]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown category '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("lodging".parse::<Category>(), Ok(Category::Lodging));
        assert_eq!(" FOOD ".parse::<Category>(), Ok(Category::Food));
        assert!("Fuel".parse::<Category>().is_err());
    }

    #[test]
    fn cycle_wraps_both_ways() {
        assert_eq!(Category::Food.cycle(-1), Category::Other);
        assert_eq!(Category::Other.cycle(1), Category::Food);
        assert_eq!(Category::Food.cycle(2), Category::Lodging);
    }

    #[test]
    fn defaults_to_food() {
        assert_eq!(Category::default(), Category::Food);
    }
}
