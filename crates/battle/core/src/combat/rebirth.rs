use crate::rng::RandomSource;

/// Inputs of a rebirth roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebirthRoll {
    pub base_amount: i32,
    /// Chance in percent; values above 100 raise more than the stack lost.
    pub percentage: i32,
    /// At least one creature rises regardless of rolls.
    pub guaranteed: bool,
}

/// Number of creatures rising from a destroyed stack.
///
/// `floor(base * pct / 100)` rise outright. The fractional part is settled by
/// one `[0, 99]` roll for each of the `base - ceil(count * 100 / pct)` remainder
/// slots; a slot succeeds when the roll is below the percentage.
pub fn rebirth_count(roll: RebirthRoll, rng: &mut dyn RandomSource) -> i32 {
    if roll.percentage <= 0 || roll.base_amount <= 0 {
        return if roll.guaranteed { 1 } else { 0 };
    }

    let base = i64::from(roll.base_amount);
    let pct = i64::from(roll.percentage);
    let mut count = base * pct / 100;

    let covered = (count * 100 + pct - 1) / pct;
    let slots = (base - covered).max(0);
    for _ in 0..slots {
        if pct > rng.roll_percent() {
            count += 1;
        }
    }

    if roll.guaranteed {
        count = count.max(1);
    }
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRandom;

    fn roll(base_amount: i32, percentage: i32) -> RebirthRoll {
        RebirthRoll {
            base_amount,
            percentage,
            guaranteed: false,
        }
    }

    #[test]
    fn exact_multiple_needs_no_rolls() {
        let mut rng = ScriptedRandom::new([]);
        assert_eq!(rebirth_count(roll(10, 20), &mut rng), 2);
        assert_eq!(rebirth_count(roll(10, 100), &mut rng), 10);
    }

    #[test]
    fn remainder_slots_use_one_roll_each() {
        let mut rng = ScriptedRandom::new([10, 50]);
        assert_eq!(rebirth_count(roll(7, 20), &mut rng), 2);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn roll_equal_to_percentage_fails() {
        let mut rng = ScriptedRandom::constant(20);
        assert_eq!(rebirth_count(roll(7, 20), &mut rng), 1);
    }

    #[test]
    fn tiny_percentage_stays_finite() {
        let mut rng = ScriptedRandom::constant(0);
        assert_eq!(rebirth_count(roll(3, 1), &mut rng), 3);
        let mut rng = ScriptedRandom::constant(99);
        assert_eq!(rebirth_count(roll(3, 1), &mut rng), 0);
    }

    #[test]
    fn guaranteed_applies_without_percentage() {
        let mut rng = ScriptedRandom::constant(99);
        let guaranteed = RebirthRoll {
            guaranteed: true,
            ..roll(5, 0)
        };
        assert_eq!(rebirth_count(guaranteed, &mut rng), 1);
        assert_eq!(rebirth_count(roll(5, 0), &mut rng), 0);
    }

    #[test]
    fn over_hundred_percent_multiplies() {
        let mut rng = ScriptedRandom::constant(99);
        assert_eq!(rebirth_count(roll(4, 150), &mut rng), 6);
    }
}
