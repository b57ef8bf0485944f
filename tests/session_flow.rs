use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pocket_arcade::consts::FRAME_MS;
use pocket_arcade::session::boxed_synth;
use pocket_arcade::sim::lane::EntityKind;
use pocket_arcade::sim::maze::{self, Cell as Tile};
use pocket_arcade::sim::{Avoidance, GameKind, GamePhase, RunnerGame, Snapshot};
use pocket_arcade::{Callbacks, Host, NullSink, Session, Tuning};

#[derive(Default)]
struct RecordingHost {
    points: Vec<u32>,
    exits: u32,
}

impl Host for RecordingHost {
    fn add_points(&mut self, amount: u32) {
        self.points.push(amount);
    }

    fn on_exit(&mut self) {
        self.exits += 1;
    }
}

/// Feed frames until at least one sim tick has run
fn step_once<H: Host>(session: &mut Session<H>, now: &mut f64) {
    let before = session.ticks();
    while session.ticks() == before {
        *now += f64::from(FRAME_MS);
        session.frame(*now);
    }
}

/// Run `frames` display frames, continuing the clock from `*now`
fn run_frames<H: Host>(session: &mut Session<H>, now: &mut f64, frames: usize) {
    for _ in 0..frames {
        *now += f64::from(FRAME_MS);
        session.frame(*now);
    }
}

#[test]
fn test_maze_walkthrough_awards_level_points_once() {
    let mut session = Session::mount(
        GameKind::Maze,
        &Tuning::default(),
        42,
        RecordingHost::default(),
        boxed_synth(NullSink),
    );
    let Snapshot::Maze(view) = session.snapshot() else {
        panic!("expected a maze snapshot");
    };
    let goal = view.grid.find(Tile::Goal).expect("goal");
    let path = maze::shortest_path(&view.grid, view.actor, goal, Tile::is_open).expect("path");

    let latch = session.input_handle();
    let mut now = 0.0;
    for pair in path.windows(2) {
        latch
            .borrow_mut()
            .press(pair[0].direction_to(pair[1]).expect("adjacent"));
        step_once(&mut session, &mut now);
        latch.borrow_mut().release_all();
    }

    assert_eq!(session.phase(), GamePhase::LevelComplete);
    assert_eq!(session.host().points, vec![30]);

    session.proceed();
    step_once(&mut session, &mut now);
    assert_eq!(session.phase(), GamePhase::Playing);
    let Snapshot::Maze(view) = session.snapshot() else {
        panic!("expected a maze snapshot");
    };
    assert_eq!(view.level, 1);
    assert_eq!(session.host().points, vec![30]);
}

#[test]
fn test_low_obstacle_hits_idle_runner_once() {
    let mut tuning = Tuning::default();
    tuning.dodger.lane.spawn_gap = 1.0e9;
    let mut game = RunnerGame::endurance(tuning.dodger.clone(), tuning.projection.clone(), 7);
    game.spawn_at(
        0,
        0.0,
        EntityKind::Obstacle {
            avoid: Avoidance::Jump,
        },
        "Low wall",
    );
    let mut session = Session::with_game(
        Box::new(game),
        RecordingHost::default(),
        boxed_synth(NullSink),
    );

    let mut now = 0.0;
    run_frames(&mut session, &mut now, 60 * 4);
    let Snapshot::Runner(view) = session.snapshot() else {
        panic!("expected a runner snapshot");
    };
    assert_eq!(view.resource, 75.0);
    assert_eq!(view.phase, GamePhase::Playing);
    assert!(view.entities.is_empty());
}

#[test]
fn test_collector_math_gate_and_deferred_intro() {
    let tuning = Tuning::default();
    let answer = tuning.collector.levels[0].answer;
    let mut game = RunnerGame::collector(tuning.collector.clone(), tuning.projection.clone(), 5);
    game.phase = GamePhase::Playing;
    game.score = tuning.collector.levels[0].goal;
    let mut session = Session::with_game(
        Box::new(game),
        RecordingHost::default(),
        boxed_synth(NullSink),
    );

    let mut now = 0.0;
    step_once(&mut session, &mut now);
    assert_eq!(session.phase(), GamePhase::Math);

    session.answer(answer + 1);
    step_once(&mut session, &mut now);
    assert_eq!(session.phase(), GamePhase::Math);
    assert!(session.host().points.is_empty());

    session.answer(answer);
    step_once(&mut session, &mut now);
    assert_eq!(session.phase(), GamePhase::LevelComplete);
    assert_eq!(session.host().points, vec![20]);

    // 1.5 s later the next level's banner is up
    run_frames(&mut session, &mut now, 100);
    assert_eq!(session.phase(), GamePhase::Intro);
    let Snapshot::Runner(view) = session.snapshot() else {
        panic!("expected a runner snapshot");
    };
    assert_eq!(view.level, 1);
}

#[test]
fn test_exit_stops_everything() {
    let points = Rc::new(RefCell::new(Vec::new()));
    let exits = Rc::new(Cell::new(0));
    let host = {
        let points = Rc::clone(&points);
        let exits = Rc::clone(&exits);
        Callbacks::new(
            move |n| points.borrow_mut().push(n),
            move || exits.set(exits.get() + 1),
        )
    };
    let tuning = Tuning::default();
    let answer = tuning.collector.levels[0].answer;
    let mut game = RunnerGame::collector(tuning.collector.clone(), tuning.projection.clone(), 5);
    game.phase = GamePhase::Playing;
    game.score = 10_000;
    let mut session = Session::with_game(Box::new(game), host, boxed_synth(NullSink));

    let mut now = 0.0;
    step_once(&mut session, &mut now);
    session.answer(answer);
    step_once(&mut session, &mut now);
    assert_eq!(session.phase(), GamePhase::LevelComplete);
    let pending = session.timers().ids();
    assert_eq!(pending.len(), 1);

    session.exit();
    session.exit();
    assert_eq!(exits.get(), 1);

    // The deferred advance never lands
    assert!(!session.fire_timer(pending[0]));
    run_frames(&mut session, &mut now, 200);
    assert_eq!(session.phase(), GamePhase::LevelComplete);
    assert_eq!(*points.borrow(), vec![20]);
    assert!(!session.is_alive());
}

#[test]
fn test_every_game_survives_a_minute_idle() {
    let tuning = Tuning::default();
    for kind in GameKind::ALL {
        let mut session = Session::mount(
            kind,
            &tuning,
            11,
            RecordingHost::default(),
            boxed_synth(NullSink),
        );
        let mut now = 0.0;
        run_frames(&mut session, &mut now, 60 * 60);
        let json = serde_json::to_string(&session.snapshot()).expect("snapshot serializes");
        assert!(json.contains(kind_tag(kind)));
        session.exit();
        assert_eq!(session.host().exits, 1);
    }
}

fn kind_tag(kind: GameKind) -> &'static str {
    match kind {
        GameKind::Maze => "\"game\":\"maze\"",
        GameKind::Chase => "\"game\":\"chase\"",
        GameKind::Dodger | GameKind::Collector => "\"game\":\"runner\"",
        GameKind::Brawl => "\"game\":\"brawl\"",
    }
}
