//! Turns finished games into per-agent score statistics, a per-category breakdown
//! and paired comparisons against the baseline agent.

use std::fs;
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use statrs::statistics::Statistics;
use thiserror::Error;
use yahtzee_bot::Strength;
use yahtzee_core::model::category::Category;

use crate::config::BenchmarkConfig;
use crate::tournament::GameOutcome;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("no agents configured")]
    NoAgents,
    #[error("game {game} has no result for agent '{agent}'")]
    MissingAgent { game: usize, agent: String },
    #[error("game {game} reports unconfigured agent '{agent}'")]
    UnknownAgent { game: usize, agent: String },
    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("drawing totals chart: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    run_id: String,
    baseline: usize,
    latency_budget_ms: u64,
    tallies: Vec<AgentTally>,
}

struct AgentTally {
    name: String,
    strength: Strength,
    totals: Vec<f64>,
    wins: usize,
    bonuses: usize,
    yahtzees: u32,
    thinking_ms: f64,
    turns: u32,
    categories: [CategoryTally; Category::COUNT],
}

#[derive(Debug, Clone, Copy, Default)]
struct CategoryTally {
    points: u64,
    scratches: u32,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline_name = config.baseline().ok_or(AnalyticsError::NoAgents)?;
        let baseline = config
            .agents
            .iter()
            .position(|agent| agent.name == baseline_name)
            .ok_or(AnalyticsError::NoAgents)?;

        let tallies = config
            .agents
            .iter()
            .map(|agent| AgentTally {
                name: agent.name.clone(),
                strength: agent.strength,
                totals: Vec::new(),
                wins: 0,
                bonuses: 0,
                yahtzees: 0,
                thinking_ms: 0.0,
                turns: 0,
                categories: [CategoryTally::default(); Category::COUNT],
            })
            .collect();

        Ok(Self {
            run_id: config.run_id.clone(),
            baseline,
            latency_budget_ms: config.latency_budget_ms,
            tallies,
        })
    }

    /// Adds one game. Every configured agent must appear exactly once.
    pub fn record_game(
        &mut self,
        game: usize,
        outcome: &GameOutcome,
    ) -> Result<(), AnalyticsError> {
        if let Some(stray) = outcome
            .results
            .iter()
            .find(|result| self.tallies.iter().all(|tally| tally.name != result.agent_name))
        {
            return Err(AnalyticsError::UnknownAgent {
                game,
                agent: stray.agent_name.clone(),
            });
        }

        let mut ordered = Vec::with_capacity(self.tallies.len());
        for tally in &self.tallies {
            let result = outcome
                .results
                .iter()
                .find(|result| result.agent_name == tally.name)
                .ok_or_else(|| AnalyticsError::MissingAgent {
                    game,
                    agent: tally.name.clone(),
                })?;
            ordered.push(result);
        }

        let best = ordered.iter().map(|result| result.total).max().unwrap_or(0);
        for (tally, result) in self.tallies.iter_mut().zip(ordered) {
            tally.totals.push(f64::from(result.total));
            tally.wins += usize::from(result.total == best);
            tally.bonuses += usize::from(result.upper_bonus);
            tally.yahtzees += result.yahtzees;
            tally.thinking_ms += result.thinking_ms;
            tally.turns += result.turns;
            for (category, &points) in &result.snapshot.recorded {
                let slot = &mut tally.categories[category.index()];
                slot.points += u64::from(points);
                if points == 0 {
                    slot.scratches += 1;
                }
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let baseline = &self.tallies[self.baseline];
        let agents = self
            .tallies
            .iter()
            .enumerate()
            .map(|(index, tally)| {
                let versus_baseline = (index != self.baseline).then(|| {
                    let diffs: Vec<f64> = tally
                        .totals
                        .iter()
                        .zip(&baseline.totals)
                        .map(|(own, base)| own - base)
                        .collect();
                    PairedComparison::from_diffs(&diffs)
                });
                tally.report(self.latency_budget_ms, versus_baseline)
            })
            .collect();

        AnalyticsSummary {
            run_id: self.run_id,
            baseline: baseline.name.clone(),
            latency_budget_ms: self.latency_budget_ms,
            agents,
        }
    }
}

impl AgentTally {
    fn report(&self, budget_ms: u64, versus_baseline: Option<PairedComparison>) -> AgentReport {
        let games = self.totals.len();
        let per_game = |count: f64| if games == 0 { 0.0 } else { count / games as f64 };
        let (mean_total, std_dev, ci95) = describe(&self.totals);
        let ms_per_turn = if self.turns == 0 {
            0.0
        } else {
            self.thinking_ms / f64::from(self.turns)
        };

        AgentReport {
            name: self.name.clone(),
            strength: self.strength,
            games,
            mean_total,
            std_dev,
            ci95,
            win_rate: per_game(self.wins as f64),
            bonus_rate: per_game(self.bonuses as f64),
            yahtzees_per_game: per_game(f64::from(self.yahtzees)),
            ms_per_turn,
            over_budget: ms_per_turn > budget_ms as f64,
            versus_baseline,
            categories: Category::ALL
                .iter()
                .map(|&category| {
                    let slot = self.categories[category.index()];
                    CategoryReport {
                        category,
                        mean_points: per_game(slot.points as f64),
                        scratch_rate: per_game(f64::from(slot.scratches)),
                    }
                })
                .collect(),
        }
    }
}

/// Mean, sample standard deviation and a Student-t 95% interval for the mean.
fn describe(totals: &[f64]) -> (f64, f64, (f64, f64)) {
    match totals {
        [] => (0.0, 0.0, (0.0, 0.0)),
        [only] => (*only, 0.0, (*only, *only)),
        _ => {
            let n = totals.len() as f64;
            let mean = totals.iter().mean();
            let std_dev = totals.iter().std_dev();
            let t = StudentsT::new(0.0, 1.0, n - 1.0)
                .map(|dist| dist.inverse_cdf(0.975))
                .unwrap_or(1.96);
            let half_width = t * std_dev / n.sqrt();
            (mean, std_dev, (mean - half_width, mean + half_width))
        }
    }
}

/// Per-game total differences against the baseline. Agents share opening hands, so
/// games pair up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedComparison {
    pub mean_delta: f64,
    /// Games where the totals differed.
    pub decisive_games: usize,
    pub p_value: f64,
}

impl PairedComparison {
    fn from_diffs(diffs: &[f64]) -> Self {
        let mean_delta = if diffs.is_empty() { 0.0 } else { diffs.iter().mean() };
        let (p_value, decisive_games) = signed_rank_test(diffs);
        Self {
            mean_delta,
            decisive_games,
            p_value,
        }
    }
}

/// Two-sided Wilcoxon signed-rank test with mid-ranks for ties, the tie variance
/// correction and a continuity correction. Returns the p-value and the number of
/// non-zero differences.
fn signed_rank_test(diffs: &[f64]) -> (f64, usize) {
    let mut nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let count = nonzero.len();
    if count == 0 {
        return (1.0, 0);
    }
    nonzero.sort_by(|a, b| a.abs().total_cmp(&b.abs()));

    let mut positive_ranks = 0.0;
    let mut tie_term = 0.0;
    let mut below = 0usize;
    for group in nonzero.chunk_by(|a, b| a.abs() == b.abs()) {
        let size = group.len() as f64;
        let mid_rank = below as f64 + (size + 1.0) / 2.0;
        let positives = group.iter().filter(|d| **d > 0.0).count() as f64;
        positive_ranks += mid_rank * positives;
        tie_term += size.powi(3) - size;
        below += group.len();
    }

    let n = count as f64;
    let expected = n * (n + 1.0) / 4.0;
    let variance = n * (n + 1.0) * (2.0 * n + 1.0) / 24.0 - tie_term / 48.0;
    if variance <= 0.0 {
        return (1.0, count);
    }

    let z = ((positive_ranks - expected).abs() - 0.5).max(0.0) / variance.sqrt();
    let p = Normal::new(0.0, 1.0)
        .map(|normal| 2.0 * (1.0 - normal.cdf(z)))
        .unwrap_or(1.0);
    (p.clamp(0.0, 1.0), count)
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub baseline: String,
    pub latency_budget_ms: u64,
    pub agents: Vec<AgentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub strength: Strength,
    pub games: usize,
    pub mean_total: f64,
    pub std_dev: f64,
    pub ci95: (f64, f64),
    pub win_rate: f64,
    pub bonus_rate: f64,
    pub yahtzees_per_game: f64,
    pub ms_per_turn: f64,
    pub over_budget: bool,
    pub versus_baseline: Option<PairedComparison>,
    pub categories: Vec<CategoryReport>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub mean_points: f64,
    /// Share of games where the category was filled with zero.
    pub scratch_rate: f64,
}

impl AnalyticsSummary {
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Yahtzee bench `{}`\n\nBaseline `{}`; thinking budget {} ms per turn.\n\n",
            self.run_id, self.baseline, self.latency_budget_ms
        );

        out.push_str("| Agent | Strength | Games | Mean | 95% CI | Std dev | Δ baseline | p | ");
        out.push_str("Win % | Bonus % | Yahtzees/game | ms/turn |\n");
        out.push_str(&"|---".repeat(12));
        out.push_str("|\n");
        for agent in &self.agents {
            let (delta, p) = match &agent.versus_baseline {
                Some(cmp) => (format!("{:+.2}", cmp.mean_delta), format!("{:.3}", cmp.p_value)),
                None => ("-".to_string(), "-".to_string()),
            };
            let over = if agent.over_budget { " (over)" } else { "" };
            out.push_str(&format!(
                "| {} | {} | {} | {:.2} | [{:.2}, {:.2}] | {:.2} | {delta} | {p} | ",
                agent.name,
                agent.strength,
                agent.games,
                agent.mean_total,
                agent.ci95.0,
                agent.ci95.1,
                agent.std_dev,
            ));
            out.push_str(&format!(
                "{:.1} | {:.1} | {:.3} | {:.2}{over} |\n",
                agent.win_rate * 100.0,
                agent.bonus_rate * 100.0,
                agent.yahtzees_per_game,
                agent.ms_per_turn,
            ));
        }

        out.push_str("\n## Mean points per category (scratch %)\n\n| Category |");
        for agent in &self.agents {
            out.push_str(&format!(" {} |", agent.name));
        }
        out.push('\n');
        out.push_str(&"|---".repeat(self.agents.len() + 1));
        out.push_str("|\n");
        for category in Category::ALL {
            out.push_str(&format!("| {category} |"));
            for agent in &self.agents {
                let cell = &agent.categories[category.index()];
                out.push_str(&format!(
                    " {:.2} ({:.0}%) |",
                    cell.mean_points,
                    cell.scratch_rate * 100.0
                ));
            }
            out.push('\n');
        }
        out
    }

    pub fn write_markdown(&self, path: &Path) -> Result<(), AnalyticsError> {
        fs::write(path, self.to_markdown()).map_err(|source| AnalyticsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Mean total per agent with its 95% interval as an error bar.
    pub fn render_plot(&self, path: &Path) -> Result<(), AnalyticsError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| AnalyticsError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let agents = &self.agents;
        silenced(|| draw_totals(path, agents))
            .unwrap_or_else(|| Err("chart backend panicked (no font support?)".to_string()))
            .map_err(AnalyticsError::Plot)
    }
}

fn draw_totals(path: &Path, agents: &[AgentReport]) -> Result<(), String> {
    let low = agents.iter().map(|a| a.ci95.0).fold(f64::INFINITY, f64::min);
    let high = agents.iter().map(|a| a.ci95.1).fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return Err("nothing to draw".to_string());
    }
    let pad = ((high - low) * 0.15).max(5.0);
    let slots = agents.len() as f64;

    let root = BitMapBackend::new(path, (640, 400)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| e.to_string())?;
    let mut chart = ChartBuilder::on(&root)
        .margin(16)
        .x_label_area_size(36)
        .y_label_area_size(52)
        .build_cartesian_2d(-0.5..slots - 0.5, (low - pad)..(high + pad))
        .map_err(|e| e.to_string())?;

    let label = |x: &f64| {
        let slot = x.round();
        if (x - slot).abs() > 1e-6 || slot < 0.0 {
            return String::new();
        }
        agents
            .get(slot as usize)
            .map(|agent| agent.name.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(agents.len())
        .x_label_formatter(&label)
        .y_desc("mean total, 95% CI")
        .draw()
        .map_err(|e| e.to_string())?;

    chart
        .draw_series(agents.iter().enumerate().map(|(slot, agent)| {
            ErrorBar::new_vertical(
                slot as f64,
                agent.ci95.0,
                agent.mean_total,
                agent.ci95.1,
                BLUE.filled(),
                14,
            )
        }))
        .map_err(|e| e.to_string())?;
    chart
        .draw_series(agents.iter().enumerate().map(|(slot, agent)| {
            Circle::new((slot as f64, agent.mean_total), 4, BLACK.filled())
        }))
        .map_err(|e| e.to_string())?;

    root.present().map_err(|e| e.to_string())
}

/// Runs `draw` with the panic hook muted; `None` when it panicked.
fn silenced<T>(draw: impl FnOnce() -> T + UnwindSafe) -> Option<T> {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(draw).ok();
    panic::set_hook(hook);
    result
}
