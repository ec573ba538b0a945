//! Turn sequencing.
//!
//! Speaking order is strictly monotonic: the floor moves from one slot to
//! the next and never back. The computation here is pure; the controller
//! guards it against concurrent advances.

/// Where the floor goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The participant at this index takes the floor.
    Speaker { index: usize },
    /// Every slot has spoken; the debate concludes.
    Exhausted,
}

/// Computes the turn after `current` in a roster of `total` participants.
/// `None` means no one has spoken yet, so the first slot is next.
pub fn next_turn(current: Option<usize>, total: usize) -> Turn {
    let next = current.map_or(0, |index| index + 1);
    if next < total {
        Turn::Speaker { index: next }
    } else {
        Turn::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_turn_is_slot_zero() {
        assert_eq!(next_turn(None, 6), Turn::Speaker { index: 0 });
    }

    #[test]
    fn test_turns_increment_by_one() {
        for i in 0..7 {
            assert_eq!(next_turn(Some(i), 8), Turn::Speaker { index: i + 1 });
        }
    }

    #[test]
    fn test_exhausted_past_last_slot() {
        assert_eq!(next_turn(Some(5), 6), Turn::Exhausted);
        assert_eq!(next_turn(Some(9), 6), Turn::Exhausted);
    }

    #[test]
    fn test_empty_roster_exhausts_immediately() {
        assert_eq!(next_turn(None, 0), Turn::Exhausted);
    }

    #[test]
    fn test_full_roster_walk() {
        // N participants take exactly N turns, then the next advance ends it.
        let total = 8;
        let mut current = None;
        let mut taken = 0;
        loop {
            match next_turn(current, total) {
                Turn::Speaker { index } => {
                    assert_eq!(index, current.map_or(0, |i: usize| i + 1));
                    current = Some(index);
                    taken += 1;
                }
                Turn::Exhausted => break,
            }
        }
        assert_eq!(taken, total);
    }
}
