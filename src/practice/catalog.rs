use serde::{Deserialize, Serialize};

use crate::practice::types::Operation;

/// How a strategy's operands respond to the difficulty band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingRule {
    /// Both operands are drawn from the banded range.
    BandedOperands,
    /// One factor is fixed; only the other follows the band.
    FixedFactor(i64),
    /// Divisor comes from a fixed table, quotient follows the band.
    DivisorTable(&'static [i64]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrategyId {
    AdditionBridgingTens,
    AdditionDoubles,
    AdditionBreakingApart,
    AdditionMakingTens,
    SubtractionBridgingTens,
    SubtractionCountingUp,
    SubtractionCompensation,
    SubtractionBreakingApart,
    MultiplicationBreakingApart,
    MultiplicationNearSquares,
    MultiplicationTimes5,
    MultiplicationTimes9,
    DivisionFactFamily,
    DivisionHalving,
    DivisionEstimation,
}

pub const HALVING_DIVISORS: &[i64] = &[2, 4, 8];

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub id: StrategyId,
    pub operation: Operation,
    pub scaling: ScalingRule,
    pub label: &'static str,
}

pub const CATALOG: [CatalogEntry; 15] = [
    entry(StrategyId::AdditionBridgingTens, Operation::Addition, ScalingRule::BandedOperands, "Bridging to 10s"),
    entry(StrategyId::AdditionDoubles, Operation::Addition, ScalingRule::BandedOperands, "Near doubles"),
    entry(StrategyId::AdditionBreakingApart, Operation::Addition, ScalingRule::BandedOperands, "Breaking apart"),
    entry(StrategyId::AdditionMakingTens, Operation::Addition, ScalingRule::BandedOperands, "Making tens"),
    entry(StrategyId::SubtractionBridgingTens, Operation::Subtraction, ScalingRule::BandedOperands, "Bridging back through 10s"),
    entry(StrategyId::SubtractionCountingUp, Operation::Subtraction, ScalingRule::BandedOperands, "Counting up"),
    entry(StrategyId::SubtractionCompensation, Operation::Subtraction, ScalingRule::BandedOperands, "Compensation"),
    entry(StrategyId::SubtractionBreakingApart, Operation::Subtraction, ScalingRule::BandedOperands, "Breaking apart"),
    entry(StrategyId::MultiplicationBreakingApart, Operation::Multiplication, ScalingRule::BandedOperands, "Breaking apart"),
    entry(StrategyId::MultiplicationNearSquares, Operation::Multiplication, ScalingRule::BandedOperands, "Near squares"),
    entry(StrategyId::MultiplicationTimes5, Operation::Multiplication, ScalingRule::FixedFactor(5), "Times 5"),
    entry(StrategyId::MultiplicationTimes9, Operation::Multiplication, ScalingRule::FixedFactor(9), "Times 9"),
    entry(StrategyId::DivisionFactFamily, Operation::Division, ScalingRule::BandedOperands, "Fact families"),
    entry(StrategyId::DivisionHalving, Operation::Division, ScalingRule::DivisorTable(HALVING_DIVISORS), "Repeated halving"),
    entry(StrategyId::DivisionEstimation, Operation::Division, ScalingRule::BandedOperands, "Estimate and adjust"),
];

const fn entry(
    id: StrategyId,
    operation: Operation,
    scaling: ScalingRule,
    label: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        id,
        operation,
        scaling,
        label,
    }
}

impl StrategyId {
    pub const ALL: [StrategyId; 15] = [
        Self::AdditionBridgingTens,
        Self::AdditionDoubles,
        Self::AdditionBreakingApart,
        Self::AdditionMakingTens,
        Self::SubtractionBridgingTens,
        Self::SubtractionCountingUp,
        Self::SubtractionCompensation,
        Self::SubtractionBreakingApart,
        Self::MultiplicationBreakingApart,
        Self::MultiplicationNearSquares,
        Self::MultiplicationTimes5,
        Self::MultiplicationTimes9,
        Self::DivisionFactFamily,
        Self::DivisionHalving,
        Self::DivisionEstimation,
    ];

    pub fn entry(&self) -> &'static CatalogEntry {
        // CATALOG is declared in the same order as ALL.
        &CATALOG[*self as usize]
    }

    pub fn operation(&self) -> Operation {
        self.entry().operation
    }

    pub fn scaling(&self) -> ScalingRule {
        self.entry().scaling
    }

    pub fn label(&self) -> &'static str {
        self.entry().label
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdditionBridgingTens => "AdditionBridgingTens",
            Self::AdditionDoubles => "AdditionDoubles",
            Self::AdditionBreakingApart => "AdditionBreakingApart",
            Self::AdditionMakingTens => "AdditionMakingTens",
            Self::SubtractionBridgingTens => "SubtractionBridgingTens",
            Self::SubtractionCountingUp => "SubtractionCountingUp",
            Self::SubtractionCompensation => "SubtractionCompensation",
            Self::SubtractionBreakingApart => "SubtractionBreakingApart",
            Self::MultiplicationBreakingApart => "MultiplicationBreakingApart",
            Self::MultiplicationNearSquares => "MultiplicationNearSquares",
            Self::MultiplicationTimes5 => "MultiplicationTimes5",
            Self::MultiplicationTimes9 => "MultiplicationTimes9",
            Self::DivisionFactFamily => "DivisionFactFamily",
            Self::DivisionHalving => "DivisionHalving",
            Self::DivisionEstimation => "DivisionEstimation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == s.trim())
    }

    pub fn for_operation(operation: Operation) -> impl Iterator<Item = StrategyId> {
        Self::ALL
            .into_iter()
            .filter(move |id| id.operation() == operation)
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving a textual strategy key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKey {
    Known(StrategyId),
    /// Not in the catalog, but the key's prefix names an operation.
    Unknown(Operation),
    Unresolvable,
}

impl StrategyKey {
    pub fn resolve(key: &str) -> Self {
        if let Some(id) = StrategyId::parse(key) {
            return Self::Known(id);
        }
        let lower = key.trim().to_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| lower.starts_with(op.as_str()))
            .map(Self::Unknown)
            .unwrap_or(Self::Unresolvable)
    }
}
