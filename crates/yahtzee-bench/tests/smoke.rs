use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tempfile::tempdir;
use yahtzee_bench::config::BenchmarkConfig;
use yahtzee_bench::tournament::{GameRunner, RunSummary};

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
games:
  seed: 4242
  count: 2
agents:
  - name: "baseline"
    strength: "standard"
  - name: "pro"
    strength: "pro"
  - name: "pro_2"
    strength: "pro"
report:
  dir: "{dir}"
baseline: "baseline"
"#,
        dir = output_dir.join("report").display(),
    );

    let cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_in(dir: &Path) -> RunSummary {
    let config = load_config(dir);
    let paths = config.report_paths();
    GameRunner::new(config, paths).run().expect("run completes")
}

/// Digest of the game rows with wall-clock timing stripped.
fn rows_digest(path: &Path) -> String {
    let rows = fs::read_to_string(path).expect("games file readable");
    let mut hasher = Sha256::new();
    for row in rows.lines() {
        let mut value: serde_json::Value = serde_json::from_str(row).expect("row is JSON");
        if let Some(fields) = value.as_object_mut() {
            fields.remove("ms_per_turn");
        }
        hasher.update(value.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[test]
fn bench_smoke_test_is_reproducible() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let first = run_in(first_dir.path());
    let second = run_in(second_dir.path());

    assert_eq!(first.games_played, 2);
    assert_eq!(first.agents, 3);
    assert_eq!(first.rows_written, 6);
    assert!(first.plot_path.is_none());
    assert!(!first_dir.path().join("report").join("telemetry.jsonl").exists());

    assert_eq!(
        rows_digest(&first.games_path),
        rows_digest(&second.games_path),
        "same seed must produce the same JSONL rows"
    );

    let summary = fs::read_to_string(&first.summary_path).expect("summary markdown readable");
    assert!(summary.contains("| baseline | standard | 2 |"));
    assert!(summary.contains("| pro_2 | pro | 2 |"));
    assert!(summary.contains("| Chance |"));
}

#[test]
fn rows_carry_complete_scorecards() {
    let dir = tempdir().expect("temp dir");
    let summary = run_in(dir.path());

    let jsonl = fs::read_to_string(&summary.games_path).expect("jsonl readable");
    for line in jsonl.lines() {
        let row: serde_json::Value = serde_json::from_str(line).expect("row decodes");
        let card = &row["scorecard"];
        assert_eq!(card["recorded"].as_object().map(|m| m.len()), Some(13));
        assert_eq!(card["open"].as_array().map(|a| a.len()), Some(0));
        assert_eq!(row["total"], card["total"]);
        let bonus = card["upper_bonus"].as_u64().expect("bonus is a number");
        assert_eq!(row["upper_bonus"].as_bool(), Some(bonus == 35));
    }
}
