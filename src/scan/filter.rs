//! Rarity/level window requested by the caller.

use crate::artifact::parse::{MAX_LEVEL, MAX_STAR};
use crate::artifact::record::rank;
use crate::error::ScanError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanFilter {
    pub min_star: u8,
    pub max_star: u8,
    pub min_level: u8,
    pub max_level: u8,
}

impl ScanFilter {
    /// Validates raw bounds: stars within 0..=5, levels within 0..=20, min ≤ max.
    pub fn new(
        min_star: i32,
        max_star: i32,
        min_level: i32,
        max_level: i32,
    ) -> Result<Self, ScanError> {
        let star_range = 0..=MAX_STAR as i32;
        let level_range = 0..=MAX_LEVEL as i32;

        if !star_range.contains(&min_star) || !star_range.contains(&max_star) {
            return Err(ScanError::InvalidParameters(format!(
                "star bounds {}..={} outside 0..=5",
                min_star, max_star
            )));
        }
        if !level_range.contains(&min_level) || !level_range.contains(&max_level) {
            return Err(ScanError::InvalidParameters(format!(
                "level bounds {}..={} outside 0..=20",
                min_level, max_level
            )));
        }
        if min_star > max_star || min_level > max_level {
            return Err(ScanError::InvalidParameters(format!(
                "inverted bounds: star {}..={}, level {}..={}",
                min_star, max_star, min_level, max_level
            )));
        }

        Ok(Self {
            min_star: min_star as u8,
            max_star: max_star as u8,
            min_level: min_level as u8,
            max_level: max_level as u8,
        })
    }

    pub fn contains(&self, star: u8, level: u8) -> bool {
        (self.min_star..=self.max_star).contains(&star)
            && (self.min_level..=self.max_level).contains(&level)
    }

    /// Lowest rank the filter accepts. Anything ranked below it ends the scan.
    pub fn floor(&self) -> u32 {
        rank(self.min_star, self.min_level)
    }

    /// Whether any accepted (star, level) has a rank within `[last, first]`.
    pub fn intersects(&self, first: u32, last: u32) -> bool {
        (self.min_star..=self.max_star).any(|star| {
            (self.min_level..=self.max_level).any(|level| {
                let r = rank(star, level);
                last <= r && r <= first
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(ScanFilter::new(4, 5, 0, 20).is_ok());
        assert!(ScanFilter::new(0, 0, 0, 0).is_ok());
        assert!(ScanFilter::new(6, 5, 0, 20).is_err());
        assert!(ScanFilter::new(5, 6, 0, 20).is_err());
        assert!(ScanFilter::new(5, 4, 0, 20).is_err());
        assert!(ScanFilter::new(4, 5, 10, 9).is_err());
        assert!(ScanFilter::new(4, 5, -1, 20).is_err());
        assert!(ScanFilter::new(4, 5, 0, 21).is_err());
    }

    #[test]
    fn test_contains_and_floor() {
        let f = ScanFilter::new(4, 5, 16, 20).unwrap();
        assert!(f.contains(5, 20));
        assert!(f.contains(4, 16));
        assert!(!f.contains(4, 15));
        assert!(!f.contains(3, 20));
        assert_eq!(f.floor(), 416);
    }

    #[test]
    fn test_intersects() {
        let five = ScanFilter::new(5, 5, 0, 20).unwrap();
        assert!(five.intersects(520, 518));
        assert!(five.intersects(515, 410));
        assert!(!five.intersects(410, 312));
        assert!(five.intersects(520, 0));

        let three = ScanFilter::new(3, 3, 0, 20).unwrap();
        assert!(!three.intersects(520, 518));
        assert!(three.intersects(408, 312));

        // level window leaves gaps between rarities
        let maxed = ScanFilter::new(4, 5, 20, 20).unwrap();
        assert!(!maxed.intersects(519, 500));
        assert!(maxed.intersects(520, 519));
    }
}
