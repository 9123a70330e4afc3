use rand::seq::IndexedRandom;
use rand::Rng;

use crate::practice::catalog::StrategyId;

/// Roulette-wheel selection over weighted strategies.
///
/// Draws uniformly in `[0, total)` and returns the first strategy whose
/// cumulative weight exceeds the draw. All-zero weights fall back to a
/// uniform pick; an empty candidate list yields `None`.
pub fn select_strategy<R: Rng + ?Sized>(
    rng: &mut R,
    weighted: &[(StrategyId, f64)],
) -> Option<StrategyId> {
    if weighted.is_empty() {
        return None;
    }

    let total: f64 = weighted
        .iter()
        .map(|(_, w)| if w.is_finite() { w.max(0.0) } else { 0.0 })
        .sum();

    if total <= 0.0 {
        return weighted.choose(rng).map(|(id, _)| *id);
    }

    let draw = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (id, weight) in weighted {
        if !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        if draw < cumulative {
            return Some(*id);
        }
    }

    // Floating-point accumulation can leave the draw a hair past the last
    // slice; it belongs to the last positive-weight strategy.
    weighted
        .iter()
        .rev()
        .find(|(_, w)| w.is_finite() && *w > 0.0)
        .map(|(id, _)| *id)
}
