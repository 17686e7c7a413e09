use crate::model::category::Category;
use crate::model::hand::Hand;

pub const FULL_HOUSE_POINTS: u32 = 25;
pub const SMALL_STRAIGHT_POINTS: u32 = 30;
pub const LARGE_STRAIGHT_POINTS: u32 = 40;
pub const YAHTZEE_POINTS: u32 = 50;

const SMALL_STRAIGHTS: [[u8; 4]; 3] = [[1, 2, 3, 4], [2, 3, 4, 5], [3, 4, 5, 6]];
const LARGE_STRAIGHTS: [[u8; 5]; 2] = [[1, 2, 3, 4, 5], [2, 3, 4, 5, 6]];

/// Points `hand` earns when written into `category`.
pub fn score(hand: &Hand, category: Category) -> u32 {
    let counts = hand.face_counts();
    let has_count = |n: u8| counts[1..].contains(&n);
    let of_a_kind = hand.max_of_a_kind();

    match category {
        Category::Ones
        | Category::Twos
        | Category::Threes
        | Category::Fours
        | Category::Fives
        | Category::Sixes => {
            let face = category.upper_face().unwrap_or(0);
            u32::from(counts[face as usize]) * u32::from(face)
        }
        Category::ThreeOfAKind => {
            if of_a_kind >= 3 {
                hand.sum()
            } else {
                0
            }
        }
        Category::FourOfAKind => {
            if of_a_kind >= 4 {
                hand.sum()
            } else {
                0
            }
        }
        Category::FullHouse => {
            if (has_count(3) && has_count(2)) || has_count(5) {
                FULL_HOUSE_POINTS
            } else {
                0
            }
        }
        Category::SmallStraight => {
            if SMALL_STRAIGHTS.iter().any(|run| covers(hand, run)) {
                SMALL_STRAIGHT_POINTS
            } else {
                0
            }
        }
        Category::LargeStraight => {
            if LARGE_STRAIGHTS.iter().any(|run| covers(hand, run)) {
                LARGE_STRAIGHT_POINTS
            } else {
                0
            }
        }
        Category::Yahtzee => {
            if has_count(5) {
                YAHTZEE_POINTS
            } else {
                0
            }
        }
        Category::Chance => hand.sum(),
    }
}

fn covers(hand: &Hand, run: &[u8]) -> bool {
    run.iter().all(|&face| hand.contains_face(face))
}

#[cfg(test)]
mod tests {
    use super::score;
    use crate::model::category::Category;
    use crate::model::hand::Hand;

    fn hand(dice: [u8; 5]) -> Hand {
        Hand::new(dice).unwrap()
    }

    #[test]
    fn upper_section_counts_matching_faces() {
        let h = hand([1, 3, 3, 3, 6]);
        assert_eq!(score(&h, Category::Ones), 1);
        assert_eq!(score(&h, Category::Twos), 0);
        assert_eq!(score(&h, Category::Threes), 9);
        assert_eq!(score(&h, Category::Sixes), 6);
    }

    #[test]
    fn kinds_sum_all_dice() {
        let h = hand([4, 4, 4, 2, 1]);
        assert_eq!(score(&h, Category::ThreeOfAKind), 15);
        assert_eq!(score(&h, Category::FourOfAKind), 0);
        let quad = hand([5, 5, 5, 5, 2]);
        assert_eq!(score(&quad, Category::ThreeOfAKind), 22);
        assert_eq!(score(&quad, Category::FourOfAKind), 22);
    }

    #[test]
    fn full_house_accepts_five_of_a_kind() {
        assert_eq!(score(&hand([2, 2, 3, 3, 3]), Category::FullHouse), 25);
        assert_eq!(score(&hand([4, 4, 4, 4, 4]), Category::FullHouse), 25);
        assert_eq!(score(&hand([4, 4, 4, 4, 4]), Category::Yahtzee), 50);
        assert_eq!(score(&hand([2, 2, 3, 3, 4]), Category::FullHouse), 0);
        assert_eq!(score(&hand([2, 3, 3, 3, 3]), Category::FullHouse), 0);
    }

    #[test]
    fn small_straight_with_duplicate() {
        let h = hand([1, 2, 2, 3, 4]);
        assert_eq!(score(&h, Category::SmallStraight), 30);
        assert_eq!(score(&h, Category::LargeStraight), 0);
        assert_eq!(score(&hand([3, 4, 5, 6, 6]), Category::SmallStraight), 30);
        assert_eq!(score(&hand([1, 2, 3, 5, 6]), Category::SmallStraight), 0);
    }

    #[test]
    fn large_straight_implies_small() {
        let h = hand([2, 3, 4, 5, 6]);
        assert_eq!(score(&h, Category::LargeStraight), 40);
        assert_eq!(score(&h, Category::SmallStraight), 30);
        assert_eq!(score(&hand([1, 2, 3, 4, 6]), Category::LargeStraight), 0);
    }

    #[test]
    fn chance_is_plain_sum() {
        for dice in [[1, 1, 1, 1, 1], [6, 6, 6, 6, 6], [1, 2, 3, 4, 6]] {
            let h = hand(dice);
            let sum: u32 = dice.iter().map(|&d| d as u32).sum();
            assert_eq!(score(&h, Category::Chance), sum);
        }
    }
}
