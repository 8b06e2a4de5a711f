use super::EvalStore;
use crate::config::is_valid_schema_name;
use crate::model::{
    EvalResult, EvalRun, NewRun, RunKind, RunStatus, RunSummary, TestCase,
};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    pub conn: Arc<Mutex<Connection>>,
    schema: String,
}

impl Store {
    /// Opens the database file. For any schema other than `main` the file is
    /// attached under that name and every table is qualified with it.
    pub fn open(path: &Path, schema: &str) -> anyhow::Result<Self> {
        check_schema(schema)?;
        let conn = if schema == "main" {
            Connection::open(path).context("failed to open sqlite db")?
        } else {
            let conn = Connection::open_in_memory().context("failed to open sqlite db")?;
            let file = path.to_string_lossy();
            conn.execute(&format!("ATTACH DATABASE ?1 AS {}", schema), params![file])
                .with_context(|| format!("failed to attach {} as {}", path.display(), schema))?;
            conn
        };
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: schema.to_string(),
        })
    }

    pub fn memory(schema: &str) -> anyhow::Result<Self> {
        check_schema(schema)?;
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        if schema != "main" {
            conn.execute(&format!("ATTACH DATABASE ':memory:' AS {}", schema), [])?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: schema.to_string(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(&super::schema::ddl_for(&self.schema))?;
        Ok(())
    }

    fn t(&self, table: &str) -> String {
        format!("{}.{}", self.schema, table)
    }

    /// Inserts or replaces a golden test case (seeding).
    pub fn upsert_test_case(&self, tc: &TestCase) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {}(id, label, payer_id, profile_json, policy_criteria,
                    expected_sections_json, known_sources_json, active, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    label=excluded.label,
                    payer_id=excluded.payer_id,
                    profile_json=excluded.profile_json,
                    policy_criteria=excluded.policy_criteria,
                    expected_sections_json=excluded.expected_sections_json,
                    known_sources_json=excluded.known_sources_json,
                    active=excluded.active,
                    updated_at=excluded.updated_at",
                self.t("test_cases")
            ),
            params![
                tc.id,
                tc.label,
                tc.payer_id,
                serde_json::to_string(&tc.profile)?,
                tc.policy_criteria,
                serde_json::to_string(&tc.expected_sections)?,
                serde_json::to_string(&tc.known_sources)?,
                tc.active,
                now_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_runs(&self, limit: u32) -> anyhow::Result<Vec<EvalRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, kind, model, config_json, status, summary_json, created_at, completed_at
             FROM {} ORDER BY id DESC LIMIT ?1",
            self.t("runs")
        ))?;
        let rows = stmt.query_map(params![limit], run_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn get_run(&self, run_id: i64) -> anyhow::Result<Option<EvalRun>> {
        let conn = self.conn.lock().unwrap();
        let run = conn
            .query_row(
                &format!(
                    "SELECT id, name, kind, model, config_json, status, summary_json, created_at, completed_at
                     FROM {} WHERE id = ?1",
                    self.t("runs")
                ),
                params![run_id],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    pub fn results_for_run(&self, run_id: i64) -> anyhow::Result<Vec<EvalResult>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, run_id, test_case_id, generated_text, latency_ms,
                    coverage_score, accuracy_score, format_score, completeness_score,
                    judge_score, judge_rationale, judge_model, details_json
             FROM {} WHERE run_id = ?1 ORDER BY id",
            self.t("results")
        ))?;
        let rows = stmt.query_map(params![run_id], |row| {
            let details: Option<String> = row.get(12)?;
            let details: serde_json::Value = details
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or(serde_json::Value::Null);

            Ok(EvalResult {
                id: Some(row.get(0)?),
                run_id: row.get(1)?,
                test_case_id: row.get(2)?,
                generated_text: row.get(3)?,
                latency_ms: row.get::<_, Option<i64>>(4)?.map(|v| v.max(0) as u64),
                coverage: row.get(5)?,
                accuracy: row.get(6)?,
                format: row.get(7)?,
                completeness: row.get(8)?,
                judge_score: row.get(9)?,
                judge_rationale: row.get(10)?,
                judge_model: row.get(11)?,
                safety: details
                    .get("safety")
                    .and_then(|v| serde_json::from_value(v.clone()).ok()),
                breakdown: details
                    .get("breakdown")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default(),
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn count_test_cases(&self) -> anyhow::Result<(u64, u64)> {
        let conn = self.conn.lock().unwrap();
        let (total, active): (i64, Option<i64>) = conn.query_row(
            &format!("SELECT count(*), sum(active) FROM {}", self.t("test_cases")),
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok((total as u64, active.unwrap_or(0) as u64))
    }
}

impl EvalStore for Store {
    fn active_test_cases(&self) -> anyhow::Result<Vec<TestCase>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, label, payer_id, profile_json, policy_criteria,
                    expected_sections_json, known_sources_json, active
             FROM {} WHERE active = 1 ORDER BY id",
            self.t("test_cases")
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, bool>(7)?,
            ))
        })?;

        let mut out = Vec::new();
        for r in rows {
            let (id, label, payer_id, profile, criteria, sections, sources, active) = r?;
            out.push(TestCase {
                profile: serde_json::from_str(&profile)
                    .with_context(|| format!("test case {}: bad profile_json", id))?,
                expected_sections: serde_json::from_str(&sections)
                    .with_context(|| format!("test case {}: bad expected_sections_json", id))?,
                known_sources: serde_json::from_str(&sources).unwrap_or_default(),
                id,
                label,
                payer_id,
                policy_criteria: criteria,
                active,
            });
        }
        Ok(out)
    }

    fn create_run(&self, run: &NewRun) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {}(name, kind, model, config_json, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                self.t("runs")
            ),
            params![
                run.name,
                run.kind.as_str(),
                run.model,
                serde_json::to_string(&run.config_snapshot)?,
                RunStatus::Running.as_str(),
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_result(&self, result: &EvalResult) -> anyhow::Result<i64> {
        let details = serde_json::json!({
            "safety": result.safety,
            "breakdown": result.breakdown,
        });
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {}(run_id, test_case_id, generated_text, latency_ms,
                    coverage_score, accuracy_score, format_score, completeness_score,
                    judge_score, judge_rationale, judge_model, details_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                self.t("results")
            ),
            params![
                result.run_id,
                result.test_case_id,
                result.generated_text,
                result.latency_ms.map(|v| v as i64),
                result.coverage,
                result.accuracy,
                result.format,
                result.completeness,
                result.judge_score,
                result.judge_rationale,
                result.judge_model,
                serde_json::to_string(&details)?,
                now_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn complete_run(&self, run_id: i64, summary: &RunSummary) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET status = ?1, summary_json = ?2, completed_at = ?3
                 WHERE id = ?4 AND status = ?5",
                self.t("runs")
            ),
            params![
                RunStatus::Completed.as_str(),
                serde_json::to_string(summary)?,
                now_rfc3339(),
                run_id,
                RunStatus::Running.as_str(),
            ],
        )?;
        if changed != 1 {
            anyhow::bail!("run {} is missing or already completed", run_id);
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<EvalRun> {
    let kind: String = row.get(2)?;
    let config_json: String = row.get(4)?;
    let status: String = row.get(5)?;
    let summary_json: Option<String> = row.get(6)?;

    let config_snapshot = serde_json::from_str(&config_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(EvalRun {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: RunKind::parse(&kind).unwrap_or_default(),
        model: row.get(3)?,
        config_snapshot,
        status: RunStatus::parse(&status),
        summary: summary_json.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

fn check_schema(schema: &str) -> anyhow::Result<()> {
    if !is_valid_schema_name(schema) {
        anyhow::bail!("invalid schema name '{}'", schema);
    }
    Ok(())
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
