//! Prioritization and capital budget schema.
//!
//! Enumerations are stored as text with CHECK constraints and parsed into
//! domain enums when rows are read.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: REVISION COUNTERS
        // ============================================================
        db.execute_unprepared(DATA_REVISIONS_SQL).await?;

        // ============================================================
        // PART 2: CRITERIA & SCORING
        // ============================================================
        db.execute_unprepared(MODEL_VERSIONS_SQL).await?;
        db.execute_unprepared(CRITERIA_SQL).await?;
        db.execute_unprepared(PROJECT_SCORES_SQL).await?;
        db.execute_unprepared(RANKING_CACHE_SQL).await?;

        // ============================================================
        // PART 3: AUDIT LOGS (append-only)
        // ============================================================
        db.execute_unprepared(AUDIT_SQL).await?;

        // ============================================================
        // PART 4: CAPITAL BUDGETS
        // ============================================================
        db.execute_unprepared(BUDGET_SQL).await?;

        // ============================================================
        // PART 5: GREEN UPGRADES
        // ============================================================
        db.execute_unprepared(GREEN_UPGRADES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const DATA_REVISIONS_SQL: &str = r"
-- Single row of counters bumped by every criteria and score commit.
-- The ranking_* columns record the revision the ranking cache was built from.
CREATE TABLE data_revisions (
    id SMALLINT PRIMARY KEY CHECK (id = 1),
    criteria_revision BIGINT NOT NULL DEFAULT 0,
    score_revision BIGINT NOT NULL DEFAULT 0,
    ranking_criteria_revision BIGINT,
    ranking_score_revision BIGINT,
    ranking_calculated_at TIMESTAMPTZ
);

INSERT INTO data_revisions (id) VALUES (1);
";

const MODEL_VERSIONS_SQL: &str = r"
CREATE TABLE model_versions (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    description TEXT,
    is_active BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- At most one live version
CREATE UNIQUE INDEX idx_model_versions_active ON model_versions(is_active) WHERE is_active;
";

const CRITERIA_SQL: &str = r"
CREATE TABLE criteria (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    description TEXT,
    category VARCHAR(32) NOT NULL CHECK (category IN (
        'risk', 'strategic', 'compliance', 'financial', 'operational', 'environmental'
    )),
    weight NUMERIC(5, 2) NOT NULL CHECK (weight >= 0 AND weight <= 100),
    scoring_guideline TEXT,
    lifecycle VARCHAR(32) NOT NULL DEFAULT 'active' CHECK (lifecycle IN (
        'active', 'inactive', 'permanently_deleted'
    )),
    display_order INTEGER NOT NULL,
    model_version_id UUID REFERENCES model_versions(id) ON DELETE SET NULL,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Names are unique among active criteria, ignoring case and padding
CREATE UNIQUE INDEX idx_criteria_active_name
    ON criteria(lower(btrim(name))) WHERE lifecycle = 'active';

CREATE INDEX idx_criteria_display ON criteria(display_order, name) WHERE lifecycle <> 'permanently_deleted';
";

const PROJECT_SCORES_SQL: &str = r"
CREATE TABLE project_scores (
    project_id UUID NOT NULL,
    criteria_id UUID NOT NULL REFERENCES criteria(id) ON DELETE CASCADE,
    score NUMERIC NOT NULL CHECK (score >= 0 AND score <= 10),
    justification TEXT,
    status VARCHAR(16) NOT NULL DEFAULT 'draft' CHECK (status IN ('draft', 'submitted', 'locked')),
    scored_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (project_id, criteria_id)
);

CREATE INDEX idx_project_scores_criteria ON project_scores(criteria_id);
";

const RANKING_CACHE_SQL: &str = r"
CREATE TABLE ranking_cache (
    project_id UUID PRIMARY KEY,
    composite_score NUMERIC(5, 2) NOT NULL CHECK (composite_score >= 0 AND composite_score <= 100),
    rank INTEGER NOT NULL UNIQUE CHECK (rank >= 1),
    scored_criteria INTEGER NOT NULL CHECK (scored_criteria >= 0)
);
";

const AUDIT_SQL: &str = r"
CREATE TABLE criteria_audit_log (
    id UUID PRIMARY KEY,
    criteria_id UUID NOT NULL,
    action VARCHAR(32) NOT NULL,
    old_name VARCHAR(200),
    new_name VARCHAR(200),
    old_weight NUMERIC(5, 2),
    new_weight NUMERIC(5, 2),
    old_lifecycle VARCHAR(32),
    new_lifecycle VARCHAR(32),
    changed_by UUID NOT NULL,
    changed_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_criteria_audit_criterion ON criteria_audit_log(criteria_id, changed_at DESC);
CREATE INDEX idx_criteria_audit_recent ON criteria_audit_log(changed_at DESC);

CREATE TABLE scoring_audit_log (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL,
    criteria_id UUID NOT NULL,
    action VARCHAR(32) NOT NULL,
    old_score NUMERIC,
    new_score NUMERIC,
    old_justification TEXT,
    new_justification TEXT,
    old_status VARCHAR(16),
    new_status VARCHAR(16),
    changed_by UUID NOT NULL,
    changed_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_scoring_audit_project ON scoring_audit_log(project_id, changed_at DESC);
CREATE INDEX idx_scoring_audit_recent ON scoring_audit_log(changed_at DESC);

-- Audit rows are never rewritten
CREATE OR REPLACE FUNCTION prevent_audit_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'audit log rows are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_criteria_audit_append_only
    BEFORE UPDATE OR DELETE ON criteria_audit_log
    FOR EACH ROW EXECUTE FUNCTION prevent_audit_mutation();

CREATE TRIGGER trg_scoring_audit_append_only
    BEFORE UPDATE OR DELETE ON scoring_audit_log
    FOR EACH ROW EXECUTE FUNCTION prevent_audit_mutation();
";

const BUDGET_SQL: &str = r"
CREATE TABLE budget_cycles (
    id UUID PRIMARY KEY,
    name VARCHAR(200) NOT NULL,
    description TEXT,
    start_year INTEGER NOT NULL,
    duration_years INTEGER NOT NULL CHECK (duration_years BETWEEN 1 AND 30),
    end_year INTEGER NOT NULL,
    total_budget NUMERIC(15, 2) NOT NULL CHECK (total_budget >= 0),
    inflation_rate NUMERIC(5, 2) NOT NULL DEFAULT 0 CHECK (inflation_rate BETWEEN 0 AND 20),
    escalation_rate NUMERIC(5, 2) NOT NULL DEFAULT 0 CHECK (escalation_rate BETWEEN 0 AND 20),
    funding_constraints JSONB NOT NULL DEFAULT '[]'::jsonb,
    status VARCHAR(16) NOT NULL DEFAULT 'planning' CHECK (status IN (
        'planning', 'approved', 'active', 'completed', 'archived'
    )),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_cycle_end_year CHECK (end_year = start_year + duration_years - 1)
);

CREATE INDEX idx_budget_cycles_start ON budget_cycles(start_year DESC);

CREATE TABLE budget_allocations (
    id UUID PRIMARY KEY,
    cycle_id UUID NOT NULL REFERENCES budget_cycles(id) ON DELETE CASCADE,
    project_id UUID NOT NULL,
    year INTEGER NOT NULL,
    allocated_amount NUMERIC(15, 2) NOT NULL CHECK (allocated_amount >= 0),
    priority INTEGER CHECK (priority >= 0),
    justification TEXT,
    status VARCHAR(16) NOT NULL DEFAULT 'proposed' CHECK (status IN (
        'proposed', 'approved', 'funded', 'completed'
    )),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_budget_allocations_cycle_year ON budget_allocations(cycle_id, year);
CREATE INDEX idx_budget_allocations_project ON budget_allocations(project_id);
";

const GREEN_UPGRADES_SQL: &str = r"
-- Maintained by the facilities platform; read-only here
CREATE TABLE green_upgrades (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    status VARCHAR(16) NOT NULL CHECK (status IN ('planned', 'in_progress', 'completed', 'cancelled')),
    energy_savings_kwh NUMERIC(14, 2) NOT NULL DEFAULT 0,
    water_savings_gallons NUMERIC(14, 2) NOT NULL DEFAULT 0,
    ghg_reduction_tonnes NUMERIC(12, 3) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_green_upgrades_project ON green_upgrades(project_id);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS green_upgrades CASCADE;
DROP TABLE IF EXISTS budget_allocations CASCADE;
DROP TABLE IF EXISTS budget_cycles CASCADE;
DROP TABLE IF EXISTS scoring_audit_log CASCADE;
DROP TABLE IF EXISTS criteria_audit_log CASCADE;
DROP FUNCTION IF EXISTS prevent_audit_mutation() CASCADE;
DROP TABLE IF EXISTS ranking_cache CASCADE;
DROP TABLE IF EXISTS project_scores CASCADE;
DROP TABLE IF EXISTS criteria CASCADE;
DROP TABLE IF EXISTS model_versions CASCADE;
DROP TABLE IF EXISTS data_revisions CASCADE;
";
