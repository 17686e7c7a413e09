mod streams;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};
use yahtzee_bot::{SimulatedTurn, SolverError, Strength, TurnSimulator};
use yahtzee_core::dice::{RngDice, roll_hand};
use yahtzee_core::game::serialization::ScoreCardSnapshot;
use yahtzee_core::model::category::Category;
use yahtzee_core::model::hand::Hand;
use yahtzee_core::model::score::YAHTZEE_POINTS;
use yahtzee_core::model::scorecard::{ScoreCard, ScoreCardError};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{BenchmarkConfig, ReportPaths};

use streams::DiceStreams;

/// Plays full games for every configured agent and writes the report.
pub struct GameRunner {
    config: BenchmarkConfig,
    paths: ReportPaths,
    simulator: TurnSimulator<'static>,
}

/// What a finished run produced.
pub struct RunSummary {
    pub games_played: usize,
    pub agents: usize,
    pub rows_written: usize,
    pub games_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

impl GameRunner {
    pub fn new(config: BenchmarkConfig, paths: ReportPaths) -> Self {
        Self {
            config,
            paths,
            simulator: TurnSimulator::global(),
        }
    }

    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        fs::create_dir_all(&self.paths.dir)?;
        event!(
            target: "yahtzee_bench::run",
            Level::INFO,
            run_id = %self.config.run_id,
            games = self.config.games.count as u64,
            agents = self.config.agents.len() as u64,
            seed = self.config.games.seed,
        );

        let mut games = BufWriter::new(File::create(&self.paths.games)?);
        let mut seeds = StdRng::seed_from_u64(self.config.games.seed);
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        let mut rows_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = seeds.next_u64();
            let outcome = self.play_game(game_index, game_seed)?;
            analytics.record_game(game_index, &outcome)?;
            for result in &outcome.results {
                let row = GameRow::new(&self.config.run_id, game_index, game_seed, result);
                serde_json::to_writer(&mut games, &row)?;
                games.write_all(b"\n")?;
                rows_written += 1;
            }
        }
        games.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.paths.summary)?;
        let plot_path = self.paths.plot.as_ref().and_then(|path| {
            match summary.render_plot(path) {
                Ok(()) => Some(path.clone()),
                Err(err) => {
                    event!(target: "yahtzee_bench::run", Level::WARN, error = %err);
                    eprintln!("WARN: {err}");
                    None
                }
            }
        });

        Ok(RunSummary {
            games_played: self.config.games.count,
            agents: self.config.agents.len(),
            rows_written,
            games_path: self.paths.games.clone(),
            summary_path: self.paths.summary.clone(),
            plot_path,
        })
    }

    /// Every agent faces the same opening hand each turn and rerolls from its own stream.
    fn play_game(&self, game_index: usize, game_seed: u64) -> Result<GameOutcome, RunnerError> {
        let streams = DiceStreams::new(game_seed, self.config.agents.len());
        let mut openings = streams.openings();
        let mut players: Vec<Player> = self
            .config
            .agents
            .iter()
            .zip(streams.rerolls())
            .map(|(agent, dice)| Player::new(agent.name.clone(), agent.strength, dice))
            .collect();

        for turn_index in 0..Category::COUNT {
            let start = roll_hand(&mut openings);
            for player in &mut players {
                let (turn, points) = player.take_turn(&self.simulator, start)?;
                if self.config.logging.structured {
                    let at = TurnIndex {
                        game: game_index,
                        turn: turn_index,
                    };
                    log_turn(&self.config.run_id, at, player, start, &turn, points);
                }
            }
        }

        Ok(GameOutcome {
            results: players.into_iter().map(Player::finish).collect(),
        })
    }
}

struct Player {
    name: String,
    strength: Strength,
    card: ScoreCard,
    dice: RngDice<StdRng>,
    yahtzees: u32,
    thinking: Duration,
    turns: u32,
}

impl Player {
    fn new(name: String, strength: Strength, dice: RngDice<StdRng>) -> Self {
        Self {
            name,
            strength,
            card: ScoreCard::new(),
            dice,
            yahtzees: 0,
            thinking: Duration::ZERO,
            turns: 0,
        }
    }

    fn take_turn(
        &mut self,
        simulator: &TurnSimulator<'_>,
        start: Hand,
    ) -> Result<(SimulatedTurn, u32), RunnerError> {
        let open = self.card.open_categories();
        let begin = Instant::now();
        let turn =
            simulator.simulate_turn(start, open, &self.card, self.strength, &mut self.dice)?;
        self.thinking += begin.elapsed();
        self.turns += 1;

        let points = self.card.record_hand(&turn.final_hand, turn.category)?;
        if turn.category == Category::Yahtzee && points == YAHTZEE_POINTS {
            self.yahtzees += 1;
        }
        Ok((turn, points))
    }

    fn finish(self) -> AgentResult {
        AgentResult {
            total: self.card.total(),
            upper_bonus: self.card.upper_bonus() > 0,
            snapshot: ScoreCardSnapshot::capture(&self.card),
            agent_name: self.name,
            strength: self.strength,
            yahtzees: self.yahtzees,
            turns: self.turns,
            thinking_ms: self.thinking.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone, Copy)]
struct TurnIndex {
    game: usize,
    turn: usize,
}

fn log_turn(
    run_id: &str,
    at: TurnIndex,
    player: &Player,
    start: Hand,
    turn: &SimulatedTurn,
    points: u32,
) {
    if !tracing::enabled!(target: "yahtzee_bench::turn", Level::INFO) {
        return;
    }
    let rerolls_used = turn.history.iter().filter(|step| !step.keep.keeps_all()).count();
    event!(
        target: "yahtzee_bench::turn",
        Level::INFO,
        run_id,
        game_index = at.game as u64,
        turn_index = at.turn as u64,
        agent = %player.name,
        start = %start,
        final_hand = %turn.final_hand,
        category = %turn.category,
        points,
        rerolls_used = rerolls_used as u64,
    );
}

pub struct GameOutcome {
    pub results: Vec<AgentResult>,
}

/// One agent's finished card for a game.
pub struct AgentResult {
    pub agent_name: String,
    pub strength: Strength,
    pub total: u32,
    pub upper_bonus: bool,
    pub yahtzees: u32,
    pub snapshot: ScoreCardSnapshot,
    pub turns: u32,
    pub thinking_ms: f64,
}

impl AgentResult {
    pub fn ms_per_turn(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.thinking_ms / f64::from(self.turns)
        }
    }
}

#[derive(Serialize)]
struct GameRow<'a> {
    run_id: &'a str,
    game: usize,
    game_seed: u64,
    agent: &'a str,
    strength: Strength,
    total: u32,
    upper_bonus: bool,
    yahtzees: u32,
    ms_per_turn: f64,
    scorecard: &'a ScoreCardSnapshot,
}

impl<'a> GameRow<'a> {
    fn new(run_id: &'a str, game: usize, game_seed: u64, result: &'a AgentResult) -> Self {
        Self {
            run_id,
            game,
            game_seed,
            agent: &result.agent_name,
            strength: result.strength,
            total: result.total,
            upper_bonus: result.upper_bonus,
            yahtzees: result.yahtzees,
            ms_per_turn: result.ms_per_turn(),
            scorecard: &result.snapshot,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("writing the report: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding a game row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("bot could not play a turn: {0}")]
    Solver(#[from] SolverError),
    #[error("scorecard rejected a turn: {0}")]
    Score(#[from] ScoreCardError),
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}
