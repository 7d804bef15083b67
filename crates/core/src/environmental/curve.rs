//! Piecewise-linear GHG reduction curve.
//!
//! | t CO2e/yr    | score      |
//! |--------------|------------|
//! | 0            | 0          |
//! | (0, 10)      | 0 → 40     |
//! | [10, 50)     | 40 → 70    |
//! | [50, 100)    | 70 → 100   |
//! | ≥ 100        | 100        |

use rust_decimal::{Decimal, RoundingStrategy};

/// Curve breakpoints as (tonnes, score).
const BREAKPOINTS: [(i64, i64); 4] = [(0, 0), (10, 40), (50, 70), (100, 100)];

/// Maps annual GHG reduction to a 0–100 environmental score, two decimals.
#[must_use]
pub fn environmental_score(ghg_reduction_tonnes: Decimal) -> Decimal {
    if ghg_reduction_tonnes <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    for pair in BREAKPOINTS.windows(2) {
        let (x0, y0) = (Decimal::from(pair[0].0), Decimal::from(pair[0].1));
        let (x1, y1) = (Decimal::from(pair[1].0), Decimal::from(pair[1].1));
        if ghg_reduction_tonnes < x1 {
            let score = y0 + (ghg_reduction_tonnes - x0) / (x1 - x0) * (y1 - y0);
            return score.round_dp(2);
        }
    }
    Decimal::ONE_HUNDRED
}

/// Converts an environmental score to the 0–10 criterion scale, rounding halves away from zero.
#[must_use]
pub fn criterion_score(environmental_score: Decimal) -> Decimal {
    (environmental_score / Decimal::TEN)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::TEN)
}
