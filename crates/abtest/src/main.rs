//! abtest CLI
//!
//! Rank the demo characters with a simulated judge, check that saved state
//! reproduces the ranking, and show leaderboards from saved state files.

use abtest::{
    kendall_tau, AbTestConfig, BackendKind, NoisyJudge, RankingReport, SimulationOutcome,
    TestingEngine,
};
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Minimum Kendall tau between the rankings before and after a reload
const RELOAD_TAU_THRESHOLD: f64 = 0.9;

fn print_usage() {
    println!("abtest - adaptive pairwise ranking");
    println!();
    println!("Usage:");
    println!("  abtest simulate [--backend B] [--rounds N] [--seed S] [--config FILE] [--save FILE]");
    println!("  abtest validate [--backend B] [--rounds N] [--seed S] [--config FILE]");
    println!("  abtest leaderboard <state.json> [--backend B]");
    println!();
    println!("Backends:");
    println!("  elo       - Elo with a fixed K-factor (default)");
    println!("  gaussian  - Gaussian skill belief with shrinking uncertainty");
    println!();
    println!("Examples:");
    println!("  abtest simulate --backend gaussian --rounds 500");
    println!("  abtest validate --seed 7");
}

/// Demo population with known true skills
fn demo_skills() -> Vec<(String, f64)> {
    [
        ("Goblin", 10.0),
        ("Knight", 20.0),
        ("Wizard", 30.0),
        ("Rogue", 40.0),
        ("Bard", 50.0),
        ("Dragon", 60.0),
    ]
    .into_iter()
    .map(|(name, skill)| (name.to_string(), skill))
    .collect()
}

/// Options shared by the subcommands
struct Options {
    config: AbTestConfig,
    save: Option<PathBuf>,
    positional: Vec<String>,
}

fn flag_value(args: &[String], i: usize) -> Result<&str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", args[i]))
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut config_path = None;
    let mut backend = None;
    let mut rounds = None;
    let mut seed = None;
    let mut save = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(flag_value(args, i)?));
                i += 1;
            }
            "--backend" | "-b" => {
                let kind = flag_value(args, i)?.parse::<BackendKind>();
                backend = Some(kind.map_err(anyhow::Error::msg)?);
                i += 1;
            }
            "--rounds" | "-r" => {
                rounds = Some(flag_value(args, i)?.parse::<usize>().context("invalid --rounds")?);
                i += 1;
            }
            "--seed" | "-s" => {
                seed = Some(flag_value(args, i)?.parse::<u64>().context("invalid --seed")?);
                i += 1;
            }
            "--save" => {
                save = Some(PathBuf::from(flag_value(args, i)?));
                i += 1;
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => AbTestConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AbTestConfig::default(),
    };
    if let Some(kind) = backend {
        config.backend.kind = kind;
    }
    if let Some(rounds) = rounds {
        config.simulation.rounds = rounds;
    }
    if seed.is_some() {
        config.simulation.seed = seed;
    }

    Ok(Options {
        config,
        save,
        positional,
    })
}

fn new_judge(config: &AbTestConfig, skills: &[(String, f64)], seed_offset: u64) -> Result<NoisyJudge> {
    let seed = config.simulation.seed.map(|s| s.wrapping_add(seed_offset));
    NoisyJudge::new(skills, config.simulation.noise, seed)
        .with_context(|| format!("invalid judge noise {}", config.simulation.noise))
}

fn run_phase(
    engine: &mut TestingEngine,
    judge: &mut NoisyJudge,
    rounds: usize,
) -> Result<SimulationOutcome> {
    let outcome = engine.run_simulation(|a, b| judge.resolve(a, b), rounds)?;
    match outcome.converged_at {
        Some(round) => println!("Converged at round {}", round),
        None => println!("Round budget of {} exhausted", rounds),
    }
    Ok(outcome)
}

fn run_simulate(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = &options.config;
    let skills = demo_skills();

    let mut engine = config.build_engine();
    for (name, _) in &skills {
        engine.add_element(name)?;
    }

    println!(
        "=== Simulate: {} elements, backend {}, up to {} rounds ===",
        skills.len(),
        engine.scoring().name(),
        config.simulation.rounds
    );
    let mut judge = new_judge(config, &skills, 0)?;
    run_phase(&mut engine, &mut judge, config.simulation.rounds)?;

    RankingReport::from_engine(engine.scoring().name(), &engine)
        .with_ground_truth(&skills)
        .print_report();

    if let Some(path) = options.save {
        engine
            .save_to_file(&path)
            .with_context(|| format!("failed to save state to {}", path.display()))?;
        println!("State saved to {}", path.display());
    }
    Ok(())
}

fn run_validate(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = &options.config;
    let skills = demo_skills();
    let rounds = config.simulation.rounds;

    let mut first = config.build_engine();
    for (name, _) in &skills {
        first.add_element(name)?;
    }
    let backend = first.scoring().name().to_string();

    println!("=== Validate: {} ===", backend);
    let mut judge = new_judge(config, &skills, 0)?;
    run_phase(&mut first, &mut judge, rounds)?;
    let phase1 = RankingReport::from_engine(&format!("{} phase 1", backend), &first)
        .with_ground_truth(&skills);
    phase1.print_report();

    let path = env::temp_dir().join(format!("abtest_{}_state.json", backend));
    first
        .save_to_file(&path)
        .with_context(|| format!("failed to save state to {}", path.display()))?;

    let mut second = TestingEngine::load_from_file(&path, config.backend.build())
        .with_context(|| format!("failed to reload state from {}", path.display()))?
        .with_convergence(config.convergence)
        .with_check_interval(config.simulation.check_interval);
    let mut judge = new_judge(config, &skills, 1)?;
    run_phase(&mut second, &mut judge, rounds)?;
    let phase2 = RankingReport::from_engine(&format!("{} phase 2", backend), &second)
        .with_ground_truth(&skills);
    phase2.print_report();

    let tau = kendall_tau(&phase1.names()[..], &phase2.names()[..]).unwrap_or(0.0);
    println!("Kendall tau after reload: {:.2}", tau);
    if tau <= RELOAD_TAU_THRESHOLD {
        bail!("{} ranking diverged after reload (tau {:.2})", backend, tau);
    }
    println!("Validation passed.");
    Ok(())
}

fn run_leaderboard(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let Some(path) = options.positional.first() else {
        bail!("leaderboard requires a state file");
    };

    let engine = TestingEngine::load_from_file(path, options.config.backend.build())
        .with_context(|| format!("failed to load state from {}", path))?;
    RankingReport::from_engine("Leaderboard", &engine).print_report();
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "simulate" | "sim" => run_simulate(&args[2..]),
        "validate" => run_validate(&args[2..]),
        "leaderboard" => run_leaderboard(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
