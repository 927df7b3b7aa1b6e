//! Fruit catalog
//!
//! Eight kinds in strictly increasing size. Merging two of the same kind
//! produces the next one; two of the largest simply vanish.

use serde::{Deserialize, Serialize};

use crate::physics::CollisionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FruitKind {
    Grape = 1,
    Mandarin = 2,
    Apple = 3,
    Pear = 4,
    Peach = 5,
    Pineapple = 6,
    Melon = 7,
    Watermelon = 8,
}

impl FruitKind {
    /// Every kind, smallest first
    pub const ALL: [FruitKind; 8] = [
        FruitKind::Grape,
        FruitKind::Mandarin,
        FruitKind::Apple,
        FruitKind::Pear,
        FruitKind::Peach,
        FruitKind::Pineapple,
        FruitKind::Melon,
        FruitKind::Watermelon,
    ];

    pub const COUNT: usize = Self::ALL.len();
    pub const SMALLEST: FruitKind = FruitKind::Grape;
    pub const LARGEST: FruitKind = FruitKind::Watermelon;

    /// Catalog id (1-based, also the collision type)
    #[inline]
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1..=8 => Some(Self::ALL[(id - 1) as usize]),
            _ => None,
        }
    }

    /// Zero-based position in [`FruitKind::ALL`]
    #[inline]
    pub fn rank(self) -> usize {
        self as usize - 1
    }

    /// The kind two of these merge into
    pub fn successor(self) -> Option<Self> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    pub fn is_largest(self) -> bool {
        self == Self::LARGEST
    }

    /// Merges of these kinds get the big merge cue
    pub fn is_big(self) -> bool {
        matches!(self, FruitKind::Melon | FruitKind::Watermelon)
    }

    /// Score for merging a pair of this kind
    pub fn points(self) -> u32 {
        match self {
            FruitKind::Grape => 10,
            FruitKind::Mandarin => 20,
            FruitKind::Apple => 60,
            FruitKind::Pear => 70,
            FruitKind::Peach => 80,
            FruitKind::Pineapple => 90,
            FruitKind::Melon => 100,
            FruitKind::Watermelon => 110,
        }
    }

    #[inline]
    pub fn collision_type(self) -> CollisionType {
        self.id()
    }

    pub fn name(self) -> &'static str {
        match self {
            FruitKind::Grape => "grape",
            FruitKind::Mandarin => "mandarin",
            FruitKind::Apple => "apple",
            FruitKind::Pear => "pear",
            FruitKind::Peach => "peach",
            FruitKind::Pineapple => "pineapple",
            FruitKind::Melon => "melon",
            FruitKind::Watermelon => "watermelon",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_chain() {
        let mut kind = FruitKind::SMALLEST;
        let mut steps = 0;
        while let Some(next) = kind.successor() {
            assert!(next > kind);
            kind = next;
            steps += 1;
        }
        assert_eq!(kind, FruitKind::LARGEST);
        assert_eq!(steps, FruitKind::COUNT - 1);
        assert_eq!(FruitKind::Watermelon.successor(), None);
    }

    #[test]
    fn test_ids_roundtrip_and_reject_out_of_range() {
        for kind in FruitKind::ALL {
            assert_eq!(FruitKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(FruitKind::from_id(0), None);
        assert_eq!(FruitKind::from_id(9), None);
    }

    #[test]
    fn test_points_increase_with_size() {
        for pair in FruitKind::ALL.windows(2) {
            assert!(pair[1].points() > pair[0].points());
        }
        assert_eq!(FruitKind::Grape.points(), 10);
        assert_eq!(FruitKind::Watermelon.points(), 110);
    }

    #[test]
    fn test_big_kinds() {
        let big: Vec<_> = FruitKind::ALL.into_iter().filter(|k| k.is_big()).collect();
        assert_eq!(big, vec![FruitKind::Melon, FruitKind::Watermelon]);
    }
}
