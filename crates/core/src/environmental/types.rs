//! Green upgrade and environmental impact types.

use keystone_shared::types::{CriterionId, GreenUpgradeId, ProjectId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle of a green upgrade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreenUpgradeStatus {
    /// Planned.
    Planned,
    /// Under construction.
    InProgress,
    /// Installed.
    Completed,
    /// Dropped. Excluded from impact totals.
    Cancelled,
}

impl GreenUpgradeStatus {
    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses the canonical string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether the upgrade's savings count toward the project's impact.
    #[must_use]
    pub const fn counts_toward_impact(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A planned or installed energy, water or emissions improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenUpgrade {
    /// Upgrade ID.
    pub id: GreenUpgradeId,
    /// Project the upgrade belongs to.
    pub project_id: ProjectId,
    /// Short description.
    pub name: String,
    /// Status.
    pub status: GreenUpgradeStatus,
    /// Annual energy savings, kWh.
    pub energy_savings_kwh: Decimal,
    /// Annual water savings, gallons.
    pub water_savings_gallons: Decimal,
    /// Annual GHG reduction, tonnes CO2e.
    pub ghg_reduction_tonnes: Decimal,
}

/// Aggregated savings of a project's non-cancelled green upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
    /// Project.
    pub project_id: ProjectId,
    /// Upgrades counted.
    pub upgrade_count: usize,
    /// Annual energy savings, kWh.
    pub total_energy_savings_kwh: Decimal,
    /// Annual water savings, gallons.
    pub total_water_savings_gallons: Decimal,
    /// Annual GHG reduction, tonnes CO2e.
    pub total_ghg_reduction_tonnes: Decimal,
    /// Score on the 0–100 curve.
    pub environmental_score: Decimal,
}

impl EnvironmentalImpact {
    /// Impact of a project with no counted upgrades.
    #[must_use]
    pub const fn empty(project_id: ProjectId) -> Self {
        Self {
            project_id,
            upgrade_count: 0,
            total_energy_savings_kwh: Decimal::ZERO,
            total_water_savings_gallons: Decimal::ZERO,
            total_ghg_reduction_tonnes: Decimal::ZERO,
            environmental_score: Decimal::ZERO,
        }
    }
}

/// Outcome of scoring a project's environmental criterion automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScoreResult {
    /// Project.
    pub project_id: ProjectId,
    /// Environmental criterion the score was written to.
    pub criteria_id: CriterionId,
    /// Aggregated impact.
    pub impact: EnvironmentalImpact,
    /// Score written on the 0–10 scale.
    pub criterion_score: Decimal,
}
