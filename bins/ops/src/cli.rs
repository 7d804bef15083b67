//! Command definitions and handlers.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use keystone_core::audit::{AuditActivity, AuditTrail};
use keystone_core::budget::BudgetAllocationEngine;
use keystone_core::criteria::CriteriaRegistry;
use keystone_core::environmental::EnvironmentalImpactScorer;
use keystone_core::ranking::{RankingQuery, RankingService};
use keystone_core::scoring::ScoringEngine;
use keystone_db::PgStore;
use keystone_shared::AppConfig;
use keystone_shared::types::{Actor, BudgetCycleId, ProjectId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Keystone operator tasks.
#[derive(Parser, Debug)]
#[command(name = "keystone")]
#[command(
    version,
    about = "Operator tasks for capital project prioritization and budgeting",
    after_help = "\
Examples:
  keystone recalculate-rankings --top 20     Rebuild the ranking cache
  keystone budget-summary <CYCLE_ID>         Year-by-year totals for a cycle
  keystone check-weights                     Verify active weights sum to 100
  keystone recent-activity --format json     Audit feed as JSON"
)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable
    Text,
    /// Pretty JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recompute every composite score and replace the ranking cache
    RecalculateRankings {
        /// Rows to print after the rebuild
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Read the cached ranking
    Rankings {
        /// Inclusive lower bound on the composite score
        #[arg(long)]
        min_score: Option<Decimal>,
        /// Inclusive upper bound on the composite score
        #[arg(long)]
        max_score: Option<Decimal>,
        /// Maximum rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show whether the ranking cache is stale
    ScoringStatus,

    /// Year-by-year allocation totals for a budget cycle
    BudgetSummary {
        /// Budget cycle ID
        cycle: BudgetCycleId,
    },

    /// Create or reactivate the environmental criterion
    ProvisionEnvironmental,

    /// Score a project's environmental criterion from its green upgrades
    AutoScoreEnvironmental {
        /// Project ID
        project: ProjectId,
    },

    /// Install the default criteria set on an empty registry
    SeedDefaultCriteria,

    /// Verify that active weights sum to 100; exits non-zero otherwise
    CheckWeights,

    /// Latest criteria and scoring changes
    RecentActivity {
        /// Maximum rows (capped at 500)
        #[arg(long)]
        limit: Option<u64>,
    },
}

/// Runs a parsed command.
pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let db = keystone_db::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let store = Arc::new(PgStore::new(db));
    let registry = CriteriaRegistry::new(Arc::clone(&store), config.prioritization.clone());
    let format = cli.format;

    match cli.command {
        Commands::RecalculateRankings { top } => {
            let snapshot = RankingService::new(Arc::clone(&store))
                .calculate_all_project_scores()
                .await?;
            info!(ranked = snapshot.entries.len(), "Ranking cache rebuilt");
            let shown: Vec<_> = snapshot.entries.into_iter().take(top).collect();
            emit(format, &shown, |entries| {
                for entry in entries {
                    println!("{:>4}  {:>6}  {}", entry.rank, entry.composite_score, entry.project_id);
                }
            })
        }
        Commands::Rankings {
            min_score,
            max_score,
            limit,
        } => {
            let query = RankingQuery {
                min_score,
                max_score,
                limit,
            };
            let entries = RankingService::new(Arc::clone(&store))
                .get_ranked_projects(&query)
                .await?;
            emit(format, &entries, |entries| {
                for entry in entries {
                    println!("{:>4}  {:>6}  {}", entry.rank, entry.composite_score, entry.project_id);
                }
            })
        }
        Commands::ScoringStatus => {
            let status = RankingService::new(Arc::clone(&store)).get_scoring_status().await?;
            emit(format, &status, |status| {
                println!("ranked projects: {}", status.ranked_projects);
                match status.last_calculated_at {
                    Some(at) => println!("last calculated: {at}"),
                    None => println!("last calculated: never"),
                }
                println!("stale: {}", status.is_stale);
            })
        }
        Commands::BudgetSummary { cycle } => {
            let summary = BudgetAllocationEngine::new(Arc::clone(&store), config.budget.clone())
                .get_budget_summary_by_year(cycle)
                .await?;
            emit(format, &summary, |summary| {
                println!(
                    "total {}  allocated {}  remaining {}",
                    summary.total_budget, summary.total_allocated, summary.remaining_budget
                );
                for year in &summary.years {
                    let cap = year.constraint.map_or_else(|| "-".to_string(), |c| c.to_string());
                    let flag = if year.over_constraint { "  OVER" } else { "" };
                    println!(
                        "{}  {:>14}  base {:>14}  cap {:>14}{flag}",
                        year.year, year.allocated, year.base_year_amount, cap
                    );
                }
            })
        }
        Commands::ProvisionEnvironmental => {
            let criterion = registry.ensure_environmental_criteria().await?;
            emit(format, &criterion, |c| {
                println!("{} ({})  weight {}", c.name, c.id, c.weight);
            })
        }
        Commands::AutoScoreEnvironmental { project } => {
            let scorer = EnvironmentalImpactScorer::new(
                Arc::clone(&store),
                registry.clone(),
                ScoringEngine::new(Arc::clone(&store)),
            );
            let result = scorer.auto_score_project_environmental(project).await?;
            emit(format, &result, |r| {
                println!(
                    "{}: {} upgrade(s), {} t CO2e/yr, environmental score {}, criterion score {}",
                    r.project_id,
                    r.impact.upgrade_count,
                    r.impact.total_ghg_reduction_tonnes,
                    r.impact.environmental_score,
                    r.criterion_score
                );
            })
        }
        Commands::SeedDefaultCriteria => {
            let created = registry.seed_default_criteria(&Actor::system()).await?;
            emit(format, &created, |created| {
                if created.is_empty() {
                    println!("criteria already present; nothing seeded");
                }
                for c in created {
                    println!("{:<28} {:>6}", c.name, c.weight);
                }
            })
        }
        Commands::CheckWeights => {
            let validation = registry.validate_weights().await?;
            emit(format, &validation, |v| {
                println!("{} active criteria, total weight {}", v.active_count, v.total);
            })?;
            if !validation.is_valid {
                bail!("active weights sum to {}, expected 100", validation.total);
            }
            Ok(())
        }
        Commands::RecentActivity { limit } => {
            let activity = AuditTrail::new(Arc::clone(&store), config.prioritization.recent_activity_limit)
                .get_recent_audit_activity(limit)
                .await?;
            emit(format, &activity, |rows| {
                for row in rows {
                    println!("{}", describe_activity(row));
                }
            })
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn describe_activity(activity: &AuditActivity) -> String {
    match activity {
        AuditActivity::Criteria(entry) => format!(
            "{}  criteria {}  {}  by {}",
            entry.changed_at,
            entry.criteria_id,
            entry.action.as_str(),
            entry.changed_by
        ),
        AuditActivity::Scoring(entry) => format!(
            "{}  project {}  criteria {}  {}  by {}",
            entry.changed_at,
            entry.project_id,
            entry.criteria_id,
            entry.action.as_str(),
            entry.changed_by
        ),
    }
}
