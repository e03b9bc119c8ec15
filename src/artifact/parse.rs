//! Numeric and glyph parsing of recognized text.

use regex::Regex;

/// Matches the first number, with an optional fraction and percent sign.
const FLOAT_PATTERN: &str = r"\d+(?:\.\d+)?%?";
const INT_PATTERN: &str = r"\d+";

/// Highest level an artifact can reach.
pub const MAX_LEVEL: u32 = 20;
pub const MAX_STAR: usize = 5;

pub struct NumberParser {
    float: Regex,
    int: Regex,
}

impl NumberParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            float: Regex::new(FLOAT_PATTERN)?,
            int: Regex::new(INT_PATTERN)?,
        })
    }

    /// First number in `text`; `,` and `，` are thousands separators and a
    /// trailing `%` divides by 100.
    pub fn parse_float(&self, text: &str) -> Option<f64> {
        let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '，')).collect();
        let token = self.float.find(&cleaned)?.as_str();
        match token.strip_suffix('%') {
            Some(number) => number.parse::<f64>().ok().map(|v| v / 100.0),
            None => token.parse().ok(),
        }
    }

    /// First run of digits after dropping `,`, `，` and `.`.
    pub fn parse_int(&self, text: &str) -> Option<u32> {
        let cleaned: String = text
            .chars()
            .filter(|c| !matches!(c, ',' | '，' | '.'))
            .collect();
        self.int.find(&cleaned)?.as_str().parse().ok()
    }

    /// Enhancement level, 0 to 20.
    pub fn parse_level(&self, text: &str) -> Option<u8> {
        self.parse_int(text)
            .filter(|&level| level <= MAX_LEVEL)
            .map(|level| level as u8)
    }
}

/// Rarity from the number of rating glyphs, 1 to 5.
pub fn count_stars(text: &str, glyph: char) -> Option<u8> {
    let count = text.chars().filter(|&c| c == glyph).count();
    (1..=MAX_STAR).contains(&count).then_some(count as u8)
}
