/// Table definitions. `{schema}` is replaced with the validated schema name.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS {schema}.test_cases (
  id TEXT PRIMARY KEY,
  label TEXT NOT NULL,
  payer_id TEXT NOT NULL,
  profile_json TEXT NOT NULL,
  policy_criteria TEXT,
  expected_sections_json TEXT NOT NULL,
  known_sources_json TEXT NOT NULL DEFAULT '[]',
  active INTEGER NOT NULL DEFAULT 1,
  updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {schema}.runs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  kind TEXT NOT NULL,
  model TEXT NOT NULL,
  config_json TEXT NOT NULL,
  status TEXT NOT NULL,
  summary_json TEXT,
  created_at TEXT NOT NULL,
  completed_at TEXT
);

CREATE TABLE IF NOT EXISTS {schema}.results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id INTEGER NOT NULL REFERENCES runs(id),
  test_case_id TEXT NOT NULL,
  generated_text TEXT NOT NULL,
  latency_ms INTEGER,
  coverage_score REAL,
  accuracy_score REAL,
  format_score REAL,
  completeness_score REAL,
  judge_score INTEGER,
  judge_rationale TEXT,
  judge_model TEXT,
  details_json TEXT,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS {schema}.idx_results_run ON results(run_id);
"#;

pub fn ddl_for(schema: &str) -> String {
    DDL.replace("{schema}", schema)
}
