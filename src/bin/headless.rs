use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use set_arbiter::config::{GameConfig, load_config, load_config_auto};
use set_arbiter::defaults;
use set_arbiter::engine::GameSession;
use set_arbiter::events::GameEvent;
use set_arbiter::logging;
use set_arbiter::rules::FeatureRules;
use simplelog::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "headless", about = "Run a set game between computer players")]
struct Args {
	/// Game config file; defaults to the first game.toml found
	#[arg(short, long, env = "SET_ARBITER_CONFIG")]
	config: Option<PathBuf>,

	#[arg(long)]
	computer_players: Option<usize>,

	#[arg(long)]
	seed: Option<u64>,

	#[arg(long)]
	timeout_ms: Option<u64>,

	/// Stop the game after this many seconds
	#[arg(long)]
	max_seconds: Option<u64>,

	/// Print every event as a JSON line
	#[arg(long)]
	json: bool,

	#[arg(long, default_value = "logs")]
	log_dir: PathBuf,
}

fn load(args: &Args) -> Result<GameConfig, String> {
	let mut config = match &args.config {
		Some(path) => load_config(path),
		None => load_config_auto(),
	}
	.map_err(|e| e.to_string())?;

	if let Some(n) = args.computer_players {
		config.computer_players = n;
	}
	if args.seed.is_some() {
		config.seed = args.seed;
	}
	if let Some(ms) = args.timeout_ms {
		config.turn_timeout_ms = ms;
		config.turn_timeout_warning_ms = config.turn_timeout_warning_ms.min(ms);
	}
	config.human_players = 0;
	config.validate().map_err(|e| e.to_string())?;
	Ok(config)
}

fn main() {
	let args = Args::parse();
	defaults::ensure_config();

	let config = match load(&args) {
		Ok(c) => c,
		Err(e) => {
			eprintln!("{}", e);
			std::process::exit(2);
		}
	};

	match logging::init(&args.log_dir, LevelFilter::Debug) {
		Ok(path) => eprintln!("Logging to {}", path.display()),
		Err(e) => eprintln!("Logging disabled: {}", e),
	}

	let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
	let rules = Arc::new(FeatureRules::new(config.feature_count, config.feature_size as u32));

	let (mut session, handle) = GameSession::new(config, rules, runtime.handle().clone());
	session.add_computer_players();

	let game = thread::spawn(move || session.run());

	if let Some(secs) = args.max_seconds {
		let stop_signal = Arc::clone(&handle.stop_signal);
		thread::spawn(move || {
			thread::sleep(Duration::from_secs(secs));
			stop_signal.send_replace(true);
		});
	}

	let mut points = 0;
	let mut penalties = 0;
	let mut reshuffles = 0;

	while let Ok(event) = handle.event_rx.recv() {
		if args.json {
			if let Ok(line) = serde_json::to_string(&event) {
				println!("{}", line);
			}
		}

		match &event {
			GameEvent::GameStarted { players, slots, deck_size } => {
				if !args.json {
					println!("[GAME] {} players, {} slots, {} cards", players.len(), slots, deck_size);
				}
			}
			GameEvent::ClaimResolved { player, slots, outcome } => {
				match outcome {
					set_arbiter::engine::ClaimOutcome::Point => points += 1,
					set_arbiter::engine::ClaimOutcome::Penalty => penalties += 1,
					_ => {}
				}
				if !args.json {
					println!("  [CLAIM] {} {:?} -> {:?}", player, slots, outcome);
				}
			}
			GameEvent::TableReshuffled { deck_size } => {
				reshuffles += 1;
				if !args.json {
					println!("  [RESHUFFLE] deck back to {}", deck_size);
				}
			}
			GameEvent::GameEnded { reason, winners } => {
				if !args.json {
					let names: Vec<String> = winners.iter().map(|w| w.to_string()).collect();
					println!("\n[GAME OVER] {:?}, winners: {}", reason, names.join(", "));
				}
				break;
			}
			_ => {}
		}
	}

	match game.join() {
		Ok(summary) => {
			if !args.json {
				println!("\n=== Summary ===");
				for (i, score) in summary.scores.iter().enumerate() {
					println!("  P{}: {}", i, score);
				}
				println!("Points: {}  Penalties: {}  Reshuffles: {}", points, penalties, reshuffles);
			}
		}
		Err(_) => {
			eprintln!("dealer thread panicked");
			std::process::exit(1);
		}
	}
}
