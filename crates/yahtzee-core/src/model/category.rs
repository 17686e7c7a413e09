use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    Ones = 0,
    Twos = 1,
    Threes = 2,
    Fours = 3,
    Fives = 4,
    Sixes = 5,
    ThreeOfAKind = 6,
    FourOfAKind = 7,
    FullHouse = 8,
    SmallStraight = 9,
    LargeStraight = 10,
    Yahtzee = 11,
    Chance = 12,
}

impl Category {
    pub const COUNT: usize = 13;

    pub const ALL: [Category; 13] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
        Category::ThreeOfAKind,
        Category::FourOfAKind,
        Category::FullHouse,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yahtzee,
        Category::Chance,
    ];

    pub const UPPER: [Category; 6] = [
        Category::Ones,
        Category::Twos,
        Category::Threes,
        Category::Fours,
        Category::Fives,
        Category::Sixes,
    ];

    pub const LOWER: [Category; 7] = [
        Category::ThreeOfAKind,
        Category::FourOfAKind,
        Category::FullHouse,
        Category::SmallStraight,
        Category::LargeStraight,
        Category::Yahtzee,
        Category::Chance,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Face value scored by an upper-section category.
    pub const fn upper_face(self) -> Option<u8> {
        match self {
            Category::Ones => Some(1),
            Category::Twos => Some(2),
            Category::Threes => Some(3),
            Category::Fours => Some(4),
            Category::Fives => Some(5),
            Category::Sixes => Some(6),
            _ => None,
        }
    }

    pub const fn is_upper(self) -> bool {
        self.upper_face().is_some()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Ones => "Ones",
            Category::Twos => "Twos",
            Category::Threes => "Threes",
            Category::Fours => "Fours",
            Category::Fives => "Fives",
            Category::Sixes => "Sixes",
            Category::ThreeOfAKind => "ThreeOfAKind",
            Category::FourOfAKind => "FourOfAKind",
            Category::FullHouse => "FullHouse",
            Category::SmallStraight => "SmallStraight",
            Category::LargeStraight => "LargeStraight",
            Category::Yahtzee => "Yahtzee",
            Category::Chance => "Chance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let category = match normalized.as_str() {
            "ones" | "aces" => Category::Ones,
            "twos" => Category::Twos,
            "threes" => Category::Threes,
            "fours" => Category::Fours,
            "fives" => Category::Fives,
            "sixes" => Category::Sixes,
            "threeofakind" | "3k" => Category::ThreeOfAKind,
            "fourofakind" | "4k" => Category::FourOfAKind,
            "fullhouse" | "fh" => Category::FullHouse,
            "smallstraight" | "ss" => Category::SmallStraight,
            "largestraight" | "ls" => Category::LargeStraight,
            "yahtzee" => Category::Yahtzee,
            "chance" => Category::Chance,
            _ => return Err(UnknownCategory(value.to_string())),
        };
        Ok(category)
    }
}

/// Set of categories packed into the low 13 bits of a `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CategorySet(u16);

impl CategorySet {
    const MASK: u16 = (1u16 << Category::COUNT) - 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, category: Category) -> bool {
        self.0 & (1u16 << category.index()) != 0
    }

    pub fn insert(&mut self, category: Category) -> bool {
        let had = self.contains(category);
        self.0 |= 1u16 << category.index();
        !had
    }

    pub fn remove(&mut self, category: Category) -> bool {
        let had = self.contains(category);
        self.0 &= !(1u16 << category.index());
        had
    }

    pub const fn without(self, category: Category) -> Self {
        Self(self.0 & !(1u16 << category.index()))
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// First member in enumeration order.
    pub fn first(self) -> Option<Category> {
        self.iter().next()
    }

    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL
            .into_iter()
            .filter(move |category| self.contains(*category))
    }

    pub fn upper_len(self) -> usize {
        Category::UPPER
            .iter()
            .filter(|category| self.contains(**category))
            .count()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Category::as_str).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

impl Serialize for CategorySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for CategorySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let categories = Vec::<Category>::deserialize(deserializer)?;
        Ok(categories.into_iter().collect())
    }
}
