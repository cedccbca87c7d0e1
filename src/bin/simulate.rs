use anyhow::Context;
use clap::Parser;
use packman_chase_engine::config::{init_tracing, SimConfig};
use packman_chase_engine::constants::{CELL_SIZE, TICK_MS};
use packman_chase_engine::engine::{GameEngine, GameEngineOptions};
use packman_chase_engine::maze::Maze;
use packman_chase_engine::rng::{RandomSource, Rng};
use packman_chase_engine::types::{
    Direction, GameOverReason, PlayerView, RuntimeEvent, Snapshot,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Chance that the autopilot keeps going straight through an intersection.
const KEEP_STRAIGHT_CHANCE: f32 = 0.6;
const AUTOPILOT_SEED_SALT: u32 = 0x9e37_79b9;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// JSON file with gameplay tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    minutes: u32,
    seed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunOutcome {
    Caught,
    Cleared,
    TimeLimit,
    Failed,
}

impl From<GameOverReason> for RunOutcome {
    fn from(reason: GameOverReason) -> Self {
        match reason {
            GameOverReason::Caught => Self::Caught,
            GameOverReason::Cleared => Self::Cleared,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    minutes: u32,
    outcome: RunOutcome,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: u32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: usize,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: usize,
    #[serde(rename = "huntersEaten")]
    hunters_eaten: usize,
    #[serde(rename = "modeChanges")]
    mode_changes: usize,
    #[serde(rename = "remainingCollectibles")]
    remaining_collectibles: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "bestScore")]
    best_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Values carried between ticks to catch regressions.
#[derive(Clone, Copy, Debug)]
struct Observed {
    score: u32,
    collectibles: usize,
    game_over: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = match cli.config.as_ref() {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({ "minutes": scenario.minutes }),
        );
        let scenario_run = run_scenario(&scenario, &config)
            .with_context(|| format!("running scenario {}", scenario.name))?;

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "durationMs": scenario_run.result.duration_ms,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!("{}", serde_json::to_string(&scenario_run.result)?);
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        outcome_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "bestScore": summary.best_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
    Ok(())
}

fn run_scenario(scenario: &Scenario, config: &SimConfig) -> anyhow::Result<ScenarioRunResult> {
    let mut engine = GameEngine::new(GameEngineOptions {
        seed: scenario.seed,
        config: config.clone(),
        high_score: 0,
    })?;
    let mut autopilot = Rng::new(scenario.seed ^ AUTOPILOT_SEED_SALT);
    let tick_limit = u64::from(scenario.minutes) * 60_000 / TICK_MS;

    let mut dots_eaten = 0;
    let mut pellets_eaten = 0;
    let mut hunters_eaten = 0;
    let mut mode_changes = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut outcome = RunOutcome::TimeLimit;
    let mut last_tick = 0u64;

    let initial = engine.build_snapshot(false);
    let mut observed = observe(&initial);
    let mut player = initial.player;

    while !engine.is_ended() && last_tick < tick_limit {
        if let Some(dir) = choose_autopilot_direction(engine.maze(), &player, &mut autopilot) {
            engine.set_direction(Some(dir));
        }
        if let Err(error) = engine.step(TICK_MS) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                last_tick,
                format!("tick failed: {error}"),
            );
            outcome = RunOutcome::Failed;
            break;
        }

        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        for message in collect_snapshot_anomalies(engine.maze(), &snapshot, &observed) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        observed = observe(&snapshot);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::Chomp { count } => dots_eaten += count,
                RuntimeEvent::PowerPelletCollected { .. } => pellets_eaten += 1,
                RuntimeEvent::HunterEaten { .. } => hunters_eaten += 1,
                RuntimeEvent::ModeChanged { .. } => mode_changes += 1,
                _ => {}
            }
        }
        player = snapshot.player;
    }

    if let Some(reason) = engine.end_reason() {
        outcome = reason.into();
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            minutes: scenario.minutes,
            outcome,
            duration_ms: engine.clock_ms(),
            score: engine.score(),
            dots_eaten,
            pellets_eaten,
            hunters_eaten,
            mode_changes,
            remaining_collectibles: engine.remaining_collectibles(),
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    })
}

/// Picks a new heading when the player sits exactly on a cell. Keeps going
/// straight most of the time and only reverses in dead ends.
fn choose_autopilot_direction(
    maze: &Maze,
    player: &PlayerView,
    rng: &mut dyn RandomSource,
) -> Option<Direction> {
    if player.x % CELL_SIZE != 0.0 || player.y % CELL_SIZE != 0.0 {
        return None;
    }
    let cx = (player.x / CELL_SIZE).floor() as i32;
    let cy = (player.y / CELL_SIZE).floor() as i32;
    let open: Vec<Direction> = Direction::PROBE_ORDER
        .into_iter()
        .filter(|dir| {
            let (dx, dy) = dir.cell_delta();
            maze.is_open_cell(cx + dx, cy + dy)
        })
        .collect();
    if open.is_empty() {
        return None;
    }

    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| !dir.is_reverse_of(player.dir))
        .collect();
    let choices = if forward.is_empty() { open } else { forward };
    if choices.contains(&player.dir) && rng.bool(KEEP_STRAIGHT_CHANCE) {
        return None;
    }
    let index = rng.int(0, choices.len() as i32 - 1) as usize;
    choices.get(index).copied()
}

fn observe(snapshot: &Snapshot) -> Observed {
    Observed {
        score: snapshot.score,
        collectibles: snapshot.dots.len() + snapshot.power_pellets.len(),
        game_over: snapshot.game_over,
    }
}

fn collect_snapshot_anomalies(maze: &Maze, snapshot: &Snapshot, previous: &Observed) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < previous.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            previous.score, snapshot.score
        ));
    }
    let collectibles = snapshot.dots.len() + snapshot.power_pellets.len();
    if collectibles > previous.collectibles {
        anomalies.push(format!(
            "collectibles grew: {} -> {}",
            previous.collectibles, collectibles
        ));
    }
    if previous.game_over && snapshot.score != previous.score {
        anomalies.push("score changed after game over".to_string());
    }
    if snapshot.high_score < snapshot.score {
        anomalies.push(format!(
            "high score {} below score {}",
            snapshot.high_score, snapshot.score
        ));
    }

    if let Some(message) = agent_position_anomaly(maze, "player", snapshot.player.x, snapshot.player.y, false) {
        anomalies.push(message);
    }
    for hunter in &snapshot.hunters {
        if let Some(message) = agent_position_anomaly(maze, &hunter.id, hunter.x, hunter.y, true) {
            anomalies.push(message);
        }
    }
    anomalies
}

fn agent_position_anomaly(maze: &Maze, id: &str, x: f32, y: f32, may_use_gate: bool) -> Option<String> {
    if !x.is_finite() || !y.is_finite() {
        return Some(format!("non-finite position: {id} ({x}, {y})"));
    }
    let cx = ((x + CELL_SIZE / 2.0) / CELL_SIZE).floor() as i32;
    let cy = ((y + CELL_SIZE / 2.0) / CELL_SIZE).floor() as i32;
    if !maze.is_wall(cx, cy) {
        return None;
    }
    if may_use_gate && maze.in_gate(cx, cx, cy, cy) {
        return None;
    }
    Some(format!("agent inside wall: {id} at cell ({cx}, {cy})"))
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));

    if cli.single || cli.minutes.is_some() {
        return vec![Scenario {
            name: "custom".to_string(),
            minutes: cli.minutes.unwrap_or(3).clamp(1, 10),
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            minutes: 2,
            seed,
        },
        Scenario {
            name: "long-run".to_string(),
            minutes: 5,
            seed: normalize_seed(seed as u64 + 1),
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let total_duration_ms: u64 = scenarios.iter().map(|scenario| scenario.duration_ms).sum();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    let best_score = scenarios
        .iter()
        .map(|scenario| scenario.score)
        .max()
        .unwrap_or(0);
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        best_score,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => tracing::error!(%error, event, "structured log did not serialize"),
    }
}

fn outcome_key(outcome: RunOutcome) -> String {
    match outcome {
        RunOutcome::Caught => "caught",
        RunOutcome::Cleared => "cleared",
        RunOutcome::TimeLimit => "time_limit",
        RunOutcome::Failed => "failed",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
