//! Pocket Arcade native runner
//!
//! Plays a mini-game headlessly with a simple autopilot and logs how it went. The browser
//! build enters through `platform::web` instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::Parser;

    use pocket_arcade::consts::FRAME_MS;
    use pocket_arcade::session::boxed_synth;
    use pocket_arcade::sim::lane::{EntityView, LANES};
    use pocket_arcade::sim::maze::{self, Cell, Grid, Pos};
    use pocket_arcade::sim::{
        AttackKind, Avoidance, BrawlView, ChaseView, Direction, FighterAction, GameKind,
        GamePhase, InputLatch, MazeView, RunnerView, Snapshot,
    };
    use pocket_arcade::{Callbacks, NullSink, Session, Tuning};

    #[derive(Parser, Debug)]
    #[command(name = "pocket-arcade", about = "Run a mini-game headlessly with an autopilot")]
    struct Cli {
        /// Game to run (maze, chase, dodger, collector, brawl). Runs all when omitted.
        #[arg(long)]
        game: Option<GameKind>,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Simulated seconds per game
        #[arg(long, default_value_t = 120.0)]
        seconds: f64,
        /// JSON file overriding the balance tables
        #[arg(long)]
        tuning: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    }

    /// Give up after this many retries
    const MAX_RETRIES: u32 = 3;

    pub fn run() -> ExitCode {
        let cli = Cli::parse();
        let level = if cli.verbose { "debug" } else { "info" };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

        let tuning = match load_tuning(cli.tuning.as_ref()) {
            Ok(t) => t,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        };

        let games = match cli.game {
            Some(kind) => vec![kind],
            None => GameKind::ALL.to_vec(),
        };
        for kind in games {
            play(kind, &tuning, cli.seed, cli.seconds);
        }
        ExitCode::SUCCESS
    }

    fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning, String> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let tuning = Tuning::from_json(&json).map_err(|e| format!("{}: {}", path.display(), e))?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    fn play(kind: GameKind, tuning: &Tuning, seed: u64, seconds: f64) {
        let host = Callbacks::new(
            |n| log::debug!("+{} points", n),
            || log::debug!("host notified of exit"),
        );
        let mut session = Session::mount(kind, tuning, seed, host, boxed_synth(NullSink));
        let latch = session.input_handle();
        let frames = (seconds * 1000.0 / f64::from(FRAME_MS)).ceil() as u64;
        let mut retries = 0;
        let mut now = 0.0;

        for _ in 0..frames {
            let snapshot = session.snapshot();
            match snapshot.phase() {
                GamePhase::Won => break,
                GamePhase::Lost if retries >= MAX_RETRIES => break,
                GamePhase::Lost => {
                    retries += 1;
                    log::info!("{}: lost, retry {}/{}", kind, retries, MAX_RETRIES);
                    session.proceed();
                }
                _ => steer(&snapshot, &mut latch.borrow_mut(), tuning),
            }
            session.frame(now);
            now += f64::from(FRAME_MS);
        }

        log::info!(
            "{}: {:?} after {:.1}s simulated, {} ticks, {} points",
            kind,
            session.phase(),
            now / 1000.0,
            session.ticks(),
            session.points()
        );
        if let Some(message) = session.last_message() {
            log::info!("{}: last banner \"{}\"", kind, message);
        }
        session.exit();
    }

    fn steer(snapshot: &Snapshot, latch: &mut InputLatch, tuning: &Tuning) {
        match snapshot {
            Snapshot::Maze(v) => steer_maze(v, latch),
            Snapshot::Chase(v) => steer_chase(v, latch),
            Snapshot::Runner(v) => steer_runner(v, latch, tuning),
            Snapshot::Brawl(v) => steer_brawl(v, latch),
        }
    }

    fn first_step(grid: &Grid, from: Pos, to: Pos, passable: impl Fn(Cell) -> bool) -> Option<Direction> {
        let path = maze::shortest_path(grid, from, to, passable)?;
        path.get(1).and_then(|next| from.direction_to(*next))
    }

    fn steer_maze(v: &MazeView, latch: &mut InputLatch) {
        match v.phase {
            GamePhase::LevelComplete => latch.confirm(),
            GamePhase::Playing => {
                let coin = (v.coins_collected < v.coins_required)
                    .then(|| v.grid.find(Cell::Coin))
                    .flatten();
                let dir = match coin {
                    Some(coin) => first_step(&v.grid, v.actor, coin, Cell::is_open),
                    None => v
                        .grid
                        .find(Cell::Goal)
                        .and_then(|goal| first_step(&v.grid, v.actor, goal, |c| c != Cell::Wall)),
                };
                if let Some(dir) = dir {
                    latch.press(dir);
                }
            }
            _ => {}
        }
    }

    fn steer_chase(v: &ChaseView, latch: &mut InputLatch) {
        if v.phase != GamePhase::Playing {
            return;
        }
        let target = v
            .items
            .iter()
            .min_by_key(|i| i.pos.manhattan(v.actor))
            .map(|i| i.pos);
        if let Some(dir) = target.and_then(|t| first_step(&v.grid, v.actor, t, Cell::is_open)) {
            latch.press(dir);
        }
    }

    fn steer_runner(v: &RunnerView, latch: &mut InputLatch, tuning: &Tuning) {
        match v.phase {
            GamePhase::Intro => {
                latch.confirm();
                return;
            }
            GamePhase::Math => {
                if let Some(level) = tuning.collector.levels.get(v.level) {
                    latch.answer(level.answer);
                }
                return;
            }
            GamePhase::Playing => {}
            _ => return,
        }

        let lane_cfg = match v.kind {
            GameKind::Collector => &tuning.collector.lane,
            _ => &tuning.dodger.lane,
        };
        let near = |e: &&EntityView| {
            let ahead = lane_cfg.player_depth - e.depth;
            e.avoid.is_some() && (0.0..=25.0).contains(&ahead)
        };
        let threat = v.entities.iter().filter(near).find(|e| e.lane == v.lane);
        let Some(threat) = threat else {
            return;
        };
        // Jump and duck only last a moment, so wait until the obstacle is close
        let close = lane_cfg.player_depth - threat.depth < 15.0;
        match threat.avoid {
            Some(Avoidance::Jump) if close => latch.jump(),
            Some(Avoidance::Duck) if close => latch.duck(),
            Some(Avoidance::Dodge) => {
                let blocked: Vec<i8> = v.entities.iter().filter(near).map(|e| e.lane).collect();
                let free = LANES
                    .into_iter()
                    .filter(|l| (l - v.lane).abs() == 1)
                    .find(|l| !blocked.contains(l));
                match free {
                    Some(l) if l < v.lane => latch.press(Direction::Left),
                    Some(_) => latch.press(Direction::Right),
                    None => {}
                }
            }
            _ => {}
        }
    }

    fn steer_brawl(v: &BrawlView, latch: &mut InputLatch) {
        latch.release_all();
        if v.phase != GamePhase::Playing {
            return;
        }
        let dx = v.enemy.pos.x - v.player.pos.x;
        if v.enemy.action == FighterAction::Attacking {
            latch.attack(AttackKind::Guard);
        } else if dx.abs() > 70.0 {
            latch.press(if dx > 0.0 { Direction::Right } else { Direction::Left });
        } else {
            latch.attack(AttackKind::Quick);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
