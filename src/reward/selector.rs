//! Weighted random selection.

use crate::random::RandomSource;

/// Anything with a selection weight.
pub trait Weighted {
    /// Relative weight. Non-positive or non-finite weights are never picked.
    fn weight(&self) -> f64;
}

/// Pick one item with probability proportional to its weight.
///
/// Returns `None` when no item has a usable weight. Items are scanned in
/// order; if rounding leaves the draw unspent, the last eligible item wins.
pub fn pick<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    T: Weighted,
    R: RandomSource + ?Sized,
{
    let eligible: Vec<&T> = items
        .iter()
        .filter(|item| {
            let w = item.weight();
            w.is_finite() && w > 0.0
        })
        .collect();

    let last = *eligible.last()?;
    let total: f64 = eligible.iter().map(|item| item.weight()).sum();

    let mut remainder = rng.next_f64() * total;
    for item in eligible.iter().copied() {
        remainder -= item.weight();
        if remainder <= 0.0 {
            return Some(item);
        }
    }

    Some(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::testing::ScriptedRandom;
    use crate::random::SeededRandom;

    #[derive(Debug, PartialEq)]
    struct Item(&'static str, f64);

    impl Weighted for Item {
        fn weight(&self) -> f64 {
            self.1
        }
    }

    #[test]
    fn test_empty_returns_none() {
        let items: Vec<Item> = Vec::new();
        let mut rng = ScriptedRandom::new(&[0.5]);
        assert!(pick(&items, &mut rng).is_none());
        assert_eq!(rng.taken, 0);
    }

    #[test]
    fn test_all_zero_weights_returns_none() {
        let items = vec![Item("a", 0.0), Item("b", -1.0), Item("c", f64::NAN)];
        let mut rng = ScriptedRandom::new(&[0.5]);
        assert!(pick(&items, &mut rng).is_none());
    }

    #[test]
    fn test_draw_walks_cumulative_weights() {
        let items = vec![Item("a", 1.0), Item("b", 3.0)];

        // 0.2 * 4 = 0.8 -> a
        let mut rng = ScriptedRandom::new(&[0.2]);
        assert_eq!(pick(&items, &mut rng).unwrap().0, "a");

        // 0.5 * 4 = 2.0 -> b
        let mut rng = ScriptedRandom::new(&[0.5]);
        assert_eq!(pick(&items, &mut rng).unwrap().0, "b");
    }

    #[test]
    fn test_boundary_goes_to_earlier_item() {
        let items = vec![Item("a", 1.0), Item("b", 1.0)];
        // 0.5 * 2 = 1.0, remainder hits exactly 0 at "a"
        let mut rng = ScriptedRandom::new(&[0.5]);
        assert_eq!(pick(&items, &mut rng).unwrap().0, "a");
    }

    #[test]
    fn test_excluded_items_never_chosen() {
        let items = vec![Item("zero", 0.0), Item("only", 2.0), Item("neg", -3.0)];
        let mut rng = SeededRandom::new(9);
        for _ in 0..100 {
            assert_eq!(pick(&items, &mut rng).unwrap().0, "only");
        }
    }

    #[test]
    fn test_zero_draw_picks_first() {
        let items = vec![Item("a", 1.0), Item("b", 1.0)];
        let mut rng = ScriptedRandom::new(&[0.0]);
        assert_eq!(pick(&items, &mut rng).unwrap().0, "a");
    }

    #[test]
    fn test_distribution_follows_weights() {
        let items = vec![Item("rare", 1.0), Item("common", 9.0)];
        let mut rng = SeededRandom::new(1234);
        let common = (0..10_000)
            .filter(|_| pick(&items, &mut rng).unwrap().0 == "common")
            .count();
        assert!((8_500..9_500).contains(&common), "common picked {common} times");
    }
}
