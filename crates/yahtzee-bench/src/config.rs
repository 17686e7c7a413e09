//! YAML run description: which bots play, how many seeded games, and where the
//! report lands.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::Level;
use yahtzee_bot::Strength;

pub const GAMES_FILE: &str = "games.jsonl";
pub const SUMMARY_FILE: &str = "summary.md";
pub const PLOT_FILE: &str = "totals.png";
pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

const DEFAULT_LATENCY_BUDGET_MS: u64 = 250;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    pub agents: Vec<AgentConfig>,
    pub report: ReportConfig,
    /// Agent every other agent is compared against; the first agent when unset.
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GamesConfig {
    #[serde(default)]
    pub seed: u64,
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "Strength::from_env")]
    pub strength: Strength,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Output directory; `{run_id}` is substituted.
    pub dir: String,
    #[serde(default)]
    pub plot: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub structured: bool,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub turn_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            structured: false,
            level: default_level(),
            turn_details: false,
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Concrete report locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub dir: PathBuf,
    pub games: PathBuf,
    pub summary: PathBuf,
    pub plot: Option<PathBuf>,
    pub telemetry: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: impl Into<PathBuf>, plot: bool) -> Self {
        let dir = dir.into();
        Self {
            games: dir.join(GAMES_FILE),
            summary: dir.join(SUMMARY_FILE),
            plot: plot.then(|| dir.join(PLOT_FILE)),
            telemetry: dir.join(TELEMETRY_FILE),
            dir,
        }
    }
}

impl BenchmarkConfig {
    /// Reads and validates a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: BenchmarkConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        config
            .validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_identifier(&self.run_id) {
            return Err(ValidationError::RunId(self.run_id.clone()));
        }
        if self.games.count == 0 {
            return Err(ValidationError::NoGames);
        }
        if self.agents.is_empty() {
            return Err(ValidationError::NoAgents);
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            if !is_identifier(&agent.name) {
                return Err(ValidationError::AgentName(agent.name.clone()));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(ValidationError::DuplicateAgent(agent.name.clone()));
            }
        }

        if let Some(baseline) = &self.baseline
            && !names.contains(baseline.as_str())
        {
            return Err(ValidationError::UnknownBaseline(baseline.clone()));
        }
        if self.latency_budget_ms == 0 {
            return Err(ValidationError::ZeroLatencyBudget);
        }
        if self.report.dir.trim().is_empty() {
            return Err(ValidationError::EmptyReportDir);
        }
        if self.logging.level.trim().parse::<Level>().is_err() {
            return Err(ValidationError::Level(self.logging.level.clone()));
        }
        Ok(())
    }

    pub fn baseline(&self) -> Option<&str> {
        self.baseline
            .as_deref()
            .or_else(|| self.agents.first().map(|agent| agent.name.as_str()))
    }

    pub fn report_paths(&self) -> ReportPaths {
        ReportPaths::in_dir(
            self.report.dir.replace("{run_id}", &self.run_id),
            self.report.plot,
        )
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("run_id '{0}' must be non-empty ASCII letters, digits, '.', '_' or '-'")]
    RunId(String),
    #[error("games.count must be at least 1")]
    NoGames,
    #[error("at least one agent is required")]
    NoAgents,
    #[error("agent name '{0}' must be non-empty ASCII letters, digits, '.', '_' or '-'")]
    AgentName(String),
    #[error("agent '{0}' is listed more than once")]
    DuplicateAgent(String),
    #[error("baseline '{0}' does not name a configured agent")]
    UnknownBaseline(String),
    #[error("latency_budget_ms must be greater than zero")]
    ZeroLatencyBudget,
    #[error("report.dir must not be empty")]
    EmptyReportDir,
    #[error("logging.level '{0}' is not a tracing level")]
    Level(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const LADDER: &str = r#"
run_id: "ladder_01"
games:
  seed: 123
  count: 40
agents:
  - name: "standard"
    strength: "standard"
  - name: "pro"
    strength: "pro"
report:
  dir: "bench/out/{run_id}"
baseline: "standard"
logging:
  structured: true
  level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    #[test]
    fn ladder_config_validates_and_resolves_paths() {
        let cfg = parse(LADDER);
        cfg.validate().expect("valid");

        assert_eq!(cfg.games.seed, 123);
        assert_eq!(cfg.agents[1].strength, Strength::Pro);
        assert_eq!(cfg.latency_budget_ms, 250);
        assert_eq!(cfg.logging.level(), Level::DEBUG);
        assert_eq!(cfg.baseline(), Some("standard"));

        let paths = cfg.report_paths();
        let dir = PathBuf::from("bench/out/ladder_01");
        assert_eq!(paths.dir, dir);
        assert_eq!(paths.games, dir.join("games.jsonl"));
        assert_eq!(paths.telemetry, dir.join("telemetry.jsonl"));
        assert_eq!(paths.plot, None);
    }

    #[test]
    fn plot_flag_adds_chart_path() {
        let yaml = LADDER.replace(
            "  dir: \"bench/out/{run_id}\"",
            "  dir: \"out\"\n  plot: true",
        );
        let paths = parse(&yaml).report_paths();
        assert_eq!(paths.plot, Some(PathBuf::from("out").join("totals.png")));
    }

    #[test]
    fn strength_aliases_parse() {
        let yaml = LADDER
            .replace("strength: \"pro\"", "strength: \"dynamic\"")
            .replace("strength: \"standard\"", "strength: \"static\"");
        let cfg = parse(&yaml);
        assert_eq!(cfg.agents[0].strength, Strength::Standard);
        assert_eq!(cfg.agents[1].strength, Strength::Pro);
    }

    #[test]
    fn unknown_fields_and_strengths_fail_to_parse() {
        let bad_strength = LADDER.replace("strength: \"pro\"", "strength: \"grandmaster\"");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&bad_strength).is_err());

        let stray = LADDER.replace("baseline:", "seats: 4\nbaseline:");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&stray).is_err());
    }

    #[test]
    fn baseline_defaults_to_first_agent() {
        let cfg = parse(&LADDER.replace("baseline: \"standard\"\n", ""));
        cfg.validate().expect("valid");
        assert_eq!(cfg.baseline(), Some("standard"));
    }

    #[test]
    fn many_agents_are_allowed() {
        let extra = "  - name: \"a\"\n  - name: \"b\"\n  - name: \"c\"\n  - name: \"d\"\nreport:";
        let cfg = parse(&LADDER.replace("report:", extra));
        assert_eq!(cfg.agents.len(), 6);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn validation_names_the_offending_field() {
        let cases = [
            (
                LADDER.replace("ladder_01", "ladder 01"),
                ValidationError::RunId("ladder 01".to_string()),
            ),
            (LADDER.replace("count: 40", "count: 0"), ValidationError::NoGames),
            (
                LADDER.replace("name: \"pro\"", "name: \"standard\""),
                ValidationError::DuplicateAgent("standard".to_string()),
            ),
            (
                LADDER.replace("baseline: \"standard\"", "baseline: \"ghost\""),
                ValidationError::UnknownBaseline("ghost".to_string()),
            ),
            (
                LADDER.replace("level: \"debug\"", "level: \"chatty\""),
                ValidationError::Level("chatty".to_string()),
            ),
            (
                LADDER.replace("baseline:", "latency_budget_ms: 0\nbaseline:"),
                ValidationError::ZeroLatencyBudget,
            ),
        ];
        for (yaml, expected) in cases {
            assert_eq!(parse(&yaml).validate(), Err(expected));
        }
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = BenchmarkConfig::from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("exist.yaml"));
    }
}
