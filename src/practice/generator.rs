//! Strategy-shaped problem synthesis.
//!
//! Every strategy has its own rule that forces the operands into the pattern
//! the strategy teaches (a ones digit near a ten, a fixed factor, an exact
//! quotient, ...). The number range only steers the draw; when the two
//! conflict the structural pattern wins, so operands may sit slightly
//! outside a very narrow configured range.

use chrono::Utc;
use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::practice::catalog::{ScalingRule, StrategyId};
use crate::practice::types::{DifficultyLevel, NumberRange, NumberRangeConfig, Operation, Problem};

const ONES_DIGITS: [i64; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];
const NEAR_NEXT_TEN: [i64; 3] = [7, 8, 9];
const JUST_PAST_TEN: [i64; 3] = [1, 2, 3];
const MAX_DOUBLES_GAP: i64 = 2;
const MAX_NEAR_SQUARE_OFFSET: i64 = 3;
const MAX_COUNT_UP_GAP: i64 = 12;

/// Generates a problem that exercises `strategy`.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    strategy: StrategyId,
    difficulty: DifficultyLevel,
    ranges: &NumberRangeConfig,
) -> Problem {
    let operation = strategy.operation();
    let band = ranges.for_operation(operation).banded(difficulty);

    let operands = match strategy {
        StrategyId::AdditionBridgingTens => addition_bridging_tens(rng, band),
        StrategyId::AdditionDoubles => addition_doubles(rng, band),
        StrategyId::AdditionBreakingApart => addition_breaking_apart(rng, band),
        StrategyId::AdditionMakingTens => addition_making_tens(rng, band),
        StrategyId::SubtractionBridgingTens => subtraction_bridging_tens(rng, band),
        StrategyId::SubtractionCountingUp => subtraction_counting_up(rng, band),
        StrategyId::SubtractionCompensation => subtraction_compensation(rng, band),
        StrategyId::SubtractionBreakingApart => subtraction_breaking_apart(rng, band),
        StrategyId::MultiplicationBreakingApart => multiplication_breaking_apart(rng, band),
        StrategyId::MultiplicationNearSquares => multiplication_near_squares(rng, band),
        StrategyId::MultiplicationTimes5 | StrategyId::MultiplicationTimes9 => {
            fixed_factor(rng, band, strategy.scaling())
        }
        StrategyId::DivisionFactFamily => division_fact_family(rng, band),
        StrategyId::DivisionHalving => division_from_table(rng, band, strategy.scaling()),
        StrategyId::DivisionEstimation => division_estimation(rng, band),
    };

    tracing::debug!(
        strategy = %strategy,
        a = operands[0],
        b = operands[1],
        "generated problem"
    );
    build_problem(Some(strategy), operation, operands, difficulty)
}

/// Plain two-operand problem for an operation, used when a strategy key is
/// not in the catalog. Keeps the non-negative and exact-division guarantees.
pub fn generate_generic<R: Rng + ?Sized>(
    rng: &mut R,
    operation: Operation,
    difficulty: DifficultyLevel,
    ranges: &NumberRangeConfig,
) -> Problem {
    let band = ranges.for_operation(operation).banded(difficulty);
    let operands = match operation {
        Operation::Addition | Operation::Multiplication => {
            [draw(rng, band.min, band.max), draw(rng, band.min, band.max)]
        }
        Operation::Subtraction => {
            let a = draw(rng, band.min, band.max);
            let b = draw(rng, band.min, band.max);
            [a.max(b), a.min(b)]
        }
        Operation::Division => {
            let divisor = draw(rng, band.min.max(1), band.max.max(1));
            let quotient = draw(rng, band.min, band.max);
            [divisor * quotient, divisor]
        }
    };
    build_problem(None, operation, operands, difficulty)
}

fn build_problem(
    strategy: Option<StrategyId>,
    operation: Operation,
    operands: [i64; 2],
    difficulty: DifficultyLevel,
) -> Problem {
    let [a, b] = operands;
    debug_assert!(a >= 0 && b >= 0, "negative operand {a}, {b}");
    debug_assert!(operation != Operation::Division || b != 0, "zero divisor");
    debug_assert!(operation != Operation::Subtraction || a >= b, "negative difference");

    Problem {
        id: Uuid::new_v4().to_string(),
        operation_type: operation,
        operands,
        correct_answer: operation.apply(a, b),
        intended_strategy: strategy,
        difficulty,
        time_spent: 0,
        attempted_at: Utc::now(),
        user_answer: None,
        is_correct: None,
        completed_at: None,
    }
}

// ==================== Draw helpers ====================

fn draw<R: Rng + ?Sized>(rng: &mut R, lo: i64, hi: i64) -> i64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    rng.random_range(lo..=hi)
}

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[i64]) -> i64 {
    values.choose(rng).copied().unwrap_or(0)
}

fn maybe_swap<R: Rng + ?Sized>(rng: &mut R, operands: [i64; 2]) -> [i64; 2] {
    if rng.random::<bool>() {
        [operands[1], operands[0]]
    } else {
        operands
    }
}

/// Number near `range` whose ones digit is one of `digits`.
fn with_ones_digit<R: Rng + ?Sized>(rng: &mut R, range: NumberRange, digits: &[i64]) -> i64 {
    let digit = pick(rng, digits);
    let tens = draw(rng, range.min / 10, range.max / 10);
    let mut n = tens * 10 + digit;
    if n > range.max && n >= 10 {
        n -= 10;
    } else if n < range.min && n + 10 <= range.max {
        n += 10;
    }
    n
}

/// Two-digit number (10..=99) with a non-trivial ones digit (2..=9).
fn two_digit<R: Rng + ?Sized>(rng: &mut R, range: NumberRange) -> i64 {
    let lo = (range.min / 10).clamp(1, 9);
    let hi = (range.max / 10).clamp(1, 9);
    draw(rng, lo, hi) * 10 + draw(rng, 2, 9)
}

// ==================== Addition ====================

fn addition_bridging_tens<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let a = with_ones_digit(rng, band, &NEAR_NEXT_TEN);
    // the other ones digit must carry the sum past the next ten
    let needed = 10 - a % 10;
    let b = with_ones_digit(rng, band, &ONES_DIGITS[(needed - 1) as usize..]);
    maybe_swap(rng, [a, b])
}

fn addition_doubles<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let x = draw(rng, band.min, band.max);
    let gap = draw(rng, 1, MAX_DOUBLES_GAP);
    maybe_swap(rng, [x, x + gap])
}

fn addition_breaking_apart<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let a = two_digit(rng, band);
    let b = draw(rng, band.min, band.max);
    maybe_swap(rng, [a, b])
}

fn addition_making_tens<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let digit = draw(rng, 1, 9);
    let a = with_ones_digit(rng, band, &[digit]);
    let b = with_ones_digit(rng, band, &[10 - digit]);
    maybe_swap(rng, [a, b])
}

// ==================== Subtraction ====================

fn subtraction_bridging_tens<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let range = NumberRange::new(band.min.max(11), band.max.max(21));
    let minuend = with_ones_digit(rng, range, &JUST_PAST_TEN);
    let ones = minuend % 10;
    // borrow across the ten: subtrahend ones digit exceeds the minuend's,
    // and its tens stay strictly below so the difference is positive
    let tens = draw(rng, 0, minuend / 10 - 1);
    let subtrahend = tens * 10 + draw(rng, ones + 1, 9);
    [minuend, subtrahend]
}

fn subtraction_counting_up<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let subtrahend = draw(rng, band.min, band.max);
    let gap = draw(rng, 1, MAX_COUNT_UP_GAP);
    [subtrahend + gap, subtrahend]
}

fn subtraction_compensation<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let subtrahend = with_ones_digit(rng, band, &NEAR_NEXT_TEN);
    let minuend = draw(rng, subtrahend + 1, band.max.max(subtrahend + 10));
    [minuend, subtrahend]
}

fn subtraction_breaking_apart<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let subtrahend = two_digit(rng, band);
    let minuend = draw(rng, subtrahend + 1, band.max.max(subtrahend + 10));
    [minuend, subtrahend]
}

// ==================== Multiplication ====================

fn multiplication_breaking_apart<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let a = two_digit(rng, band);
    let b = draw(rng, band.min.clamp(2, 9), band.max.clamp(2, 9));
    maybe_swap(rng, [a, b])
}

fn multiplication_near_squares<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let floor = MAX_NEAR_SQUARE_OFFSET + 1;
    let base = draw(rng, band.min.max(floor), band.max.max(floor));
    let offset = draw(rng, 1, MAX_NEAR_SQUARE_OFFSET);
    maybe_swap(rng, [base - offset, base + offset])
}

fn fixed_factor<R: Rng + ?Sized>(rng: &mut R, band: NumberRange, rule: ScalingRule) -> [i64; 2] {
    let factor = match rule {
        ScalingRule::FixedFactor(factor) => factor,
        _ => draw(rng, band.min, band.max),
    };
    let other = draw(rng, band.min, band.max);
    maybe_swap(rng, [factor, other])
}

// ==================== Division ====================

fn divisor_and_quotient<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> (i64, i64) {
    let divisor = draw(rng, band.min.max(2), band.max.max(2));
    let quotient = draw(rng, band.min.max(1), band.max.max(1));
    (divisor, quotient)
}

fn division_fact_family<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let (divisor, quotient) = divisor_and_quotient(rng, band);
    [divisor * quotient, divisor]
}

fn division_from_table<R: Rng + ?Sized>(rng: &mut R, band: NumberRange, rule: ScalingRule) -> [i64; 2] {
    let divisor = match rule {
        ScalingRule::DivisorTable(table) => pick(rng, table).max(1),
        _ => draw(rng, band.min.max(2), band.max.max(2)),
    };
    let quotient = draw(rng, band.min.max(1), band.max.max(1));
    [divisor * quotient, divisor]
}

fn division_estimation<R: Rng + ?Sized>(rng: &mut R, band: NumberRange) -> [i64; 2] {
    let (divisor, quotient) = divisor_and_quotient(rng, band);
    let remainder = draw(rng, 1, divisor - 1);
    [divisor * quotient + remainder, divisor]
}
