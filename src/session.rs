//! Host-facing session: one mounted mini-game plus everything it owns
//!
//! The session runs the fixed-substep loop, routes game events to the host and the synth,
//! and keeps the deferred transitions and input listeners it created. After [`Session::exit`]
//! nothing it owns can reach the game or the host again.

use std::cell::RefCell;
use std::rc::Rc;

use crate::audio::{AudioSink, ToneSynth};
use crate::consts::{FRAME_DT_CLAMP_MS, MAX_SUBSTEPS, SIM_DT_MS};
use crate::sim::{GameEvent, GameKind, GamePhase, InputLatch, MiniGame, Snapshot, Transition};
use crate::tuning::Tuning;

/// What the surrounding application provides
pub trait Host {
    /// Called once per scoring event
    fn add_points(&mut self, amount: u32);
    /// Called once when the session closes
    fn on_exit(&mut self);
}

/// [`Host`] from a pair of closures
pub struct Callbacks<P, E> {
    add_points: P,
    on_exit: E,
}

impl<P: FnMut(u32), E: FnMut()> Callbacks<P, E> {
    pub fn new(add_points: P, on_exit: E) -> Self {
        Self {
            add_points,
            on_exit,
        }
    }
}

impl<P: FnMut(u32), E: FnMut()> Host for Callbacks<P, E> {
    fn add_points(&mut self, amount: u32) {
        (self.add_points)(amount)
    }

    fn on_exit(&mut self) {
        (self.on_exit)()
    }
}

/// A host call recorded by [`HostQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    AddPoints(u32),
    Exit,
}

/// [`Host`] that records calls for delivery after the session borrow ends.
/// Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct HostQueue {
    calls: Rc<RefCell<Vec<HostCall>>>,
}

impl HostQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded since the last take, oldest first
    pub fn take(&self) -> Vec<HostCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }
}

impl Host for HostQueue {
    fn add_points(&mut self, amount: u32) {
        self.calls.borrow_mut().push(HostCall::AddPoints(amount));
    }

    fn on_exit(&mut self) {
        self.calls.borrow_mut().push(HostCall::Exit);
    }
}

pub type TimerId = u64;

#[derive(Debug, Clone, Copy)]
struct Timer {
    id: TimerId,
    due_ms: f64,
    transition: Transition,
}

/// Deferred transitions keyed by id, on the session's sim clock
#[derive(Debug, Default)]
pub struct Timers {
    next_id: TimerId,
    pending: Vec<Timer>,
}

impl Timers {
    pub fn schedule(&mut self, now_ms: f64, delay_ms: u32, transition: Transition) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        self.pending.push(Timer {
            id,
            due_ms: now_ms + f64::from(delay_ms),
            transition,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.take(id).is_some()
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Cancelled {} pending timers", self.pending.len());
        }
        self.pending.clear();
    }

    fn take(&mut self, id: TimerId) -> Option<Transition> {
        let i = self.pending.iter().position(|t| t.id == id)?;
        Some(self.pending.remove(i).transition)
    }

    /// Remove every timer due at `now_ms`, earliest first
    pub fn due(&mut self, now_ms: f64) -> Vec<(TimerId, Transition)> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|t| t.due_ms <= now_ms);
        self.pending = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        due.into_iter().map(|t| (t.id, t.transition)).collect()
    }

    pub fn ids(&self) -> Vec<TimerId> {
        self.pending.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Runs its release action exactly once, on [`ListenerGuard::release`] or drop
pub struct ListenerGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.run();
    }
}

pub struct Session<H: Host> {
    game: Box<dyn MiniGame>,
    host: H,
    synth: ToneSynth,
    input: Rc<RefCell<InputLatch>>,
    timers: Timers,
    listeners: Vec<ListenerGuard>,
    alive: bool,
    last_frame_ms: Option<f64>,
    accumulator_ms: f32,
    clock_ms: f64,
    ticks: u64,
    points: u64,
    last_message: Option<String>,
}

impl<H: Host> Session<H> {
    /// Build the requested game and start it
    pub fn mount(kind: GameKind, tuning: &Tuning, seed: u64, host: H, synth: ToneSynth) -> Self {
        log::info!("Mounting {} (seed {})", kind, seed);
        Self::with_game(crate::sim::new_game(kind, tuning, seed), host, synth)
    }

    pub fn with_game(game: Box<dyn MiniGame>, host: H, synth: ToneSynth) -> Self {
        Self {
            game,
            host,
            synth,
            input: Rc::new(RefCell::new(InputLatch::new())),
            timers: Timers::default(),
            listeners: Vec::new(),
            alive: true,
            last_frame_ms: None,
            accumulator_ms: 0.0,
            clock_ms: 0.0,
            ticks: 0,
            points: 0,
            last_message: None,
        }
    }

    /// Shared latch for input listeners
    pub fn input_handle(&self) -> Rc<RefCell<InputLatch>> {
        Rc::clone(&self.input)
    }

    /// Keep a listener registration alive until exit. Refused (and released) after exit.
    pub fn attach_listener(&mut self, guard: ListenerGuard) {
        if self.alive {
            self.listeners.push(guard);
        } else {
            guard.release();
        }
    }

    /// Advance by the wall-clock gap since the previous frame
    pub fn frame(&mut self, now_ms: f64) {
        if !self.alive {
            return;
        }
        let dt = match self.last_frame_ms {
            Some(prev) => ((now_ms - prev) as f32).clamp(0.0, FRAME_DT_CLAMP_MS),
            None => SIM_DT_MS,
        };
        self.last_frame_ms = Some(now_ms);
        self.accumulator_ms += dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator_ms >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            let input = self.input.borrow().snapshot();
            self.game.step(&input, SIM_DT_MS, &mut events);
            // Clear one-shot inputs after processing
            self.input.borrow_mut().clear_one_shots();

            self.accumulator_ms -= SIM_DT_MS;
            self.clock_ms += f64::from(SIM_DT_MS);
            self.ticks += 1;
            substeps += 1;
            self.dispatch(&mut events);
        }
        self.accumulator_ms = self.accumulator_ms.min(SIM_DT_MS);

        for (id, transition) in self.timers.due(self.clock_ms) {
            log::debug!("Timer {} fired: {:?}", id, transition);
            self.game.apply(transition, &mut events);
            self.dispatch(&mut events);
        }
    }

    /// Fire one pending timer now. No-op once exited or when the timer is gone.
    pub fn fire_timer(&mut self, id: TimerId) -> bool {
        if !self.alive {
            return false;
        }
        let Some(transition) = self.timers.take(id) else {
            log::debug!("Stale timer {}", id);
            return false;
        };
        let mut events = Vec::new();
        self.game.apply(transition, &mut events);
        self.dispatch(&mut events);
        true
    }

    fn dispatch(&mut self, events: &mut Vec<GameEvent>) {
        for event in events.drain(..) {
            match event {
                GameEvent::Sound(effect) => self.synth.play(effect),
                GameEvent::AwardPoints(amount) => {
                    self.points += u64::from(amount);
                    self.host.add_points(amount);
                }
                GameEvent::PhaseChanged { from, to } => {
                    log::debug!("{}: {:?} -> {:?}", self.game.kind(), from, to);
                }
                GameEvent::Message(text) => {
                    log::info!("{}", text);
                    self.last_message = Some(text);
                }
                GameEvent::Schedule {
                    delay_ms,
                    transition,
                } => {
                    self.timers.schedule(self.clock_ms, delay_ms, transition);
                }
                GameEvent::Degraded {
                    feature,
                    requested,
                    placed,
                } => {
                    log::warn!(
                        "{}: generated {} of {} {}",
                        self.game.kind(),
                        placed,
                        requested,
                        feature
                    );
                }
            }
        }
    }

    /// Host "continue" / "retry" button
    pub fn proceed(&mut self) {
        if self.alive {
            self.synth.resume();
            self.input.borrow_mut().confirm();
        }
    }

    pub fn answer(&mut self, value: i64) {
        if self.alive {
            self.input.borrow_mut().answer(value);
        }
    }

    pub fn pause(&mut self) {
        if self.alive {
            self.input.borrow_mut().pause();
        }
    }

    /// Restart from the first level. Pending transitions are dropped.
    pub fn reset(&mut self) {
        if !self.alive {
            return;
        }
        self.timers.cancel_all();
        let mut events = Vec::new();
        self.game.reset(&mut events);
        self.dispatch(&mut events);
    }

    /// Tear down. Safe to call any number of times; only the first does anything.
    pub fn exit(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.timers.cancel_all();
        let released = self.listeners.len();
        self.listeners.clear();
        log::info!(
            "Session closed after {} ticks, {} points, {} listeners released",
            self.ticks,
            self.points,
            released
        );
        self.host.on_exit();
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    pub fn kind(&self) -> GameKind {
        self.game.kind()
    }

    pub fn phase(&self) -> GamePhase {
        self.game.phase()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sum of every `add_points` call so far
    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Volume and mute controls
    pub fn synth_mut(&mut self) -> &mut ToneSynth {
        &mut self.synth
    }
}

/// Boxed synth helper for callers that don't care about the sink type
pub fn boxed_synth(sink: impl AudioSink + 'static) -> ToneSynth {
    ToneSynth::new(Box::new(sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullSink;
    use crate::sim::ChaseGame;
    use crate::tuning::ChaseTuning;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        points: Vec<u32>,
        exits: u32,
    }

    impl Host for Recorder {
        fn add_points(&mut self, amount: u32) {
            self.points.push(amount);
        }

        fn on_exit(&mut self) {
            self.exits += 1;
        }
    }

    /// Chase level with no food left: clears on the first tick
    fn cleared_chase() -> Session<Recorder> {
        let mut game = ChaseGame::new(ChaseTuning::default(), 1);
        game.pursuers.clear();
        game.items.clear();
        Session::with_game(Box::new(game), Recorder::default(), boxed_synth(NullSink))
    }

    #[test]
    fn test_timers_fire_in_order() {
        let mut timers = Timers::default();
        let late = timers.schedule(0.0, 200, Transition::NextLevel);
        let early = timers.schedule(0.0, 100, Transition::NextLevel);
        assert!(timers.due(50.0).is_empty());
        let fired: Vec<_> = timers.due(250.0).into_iter().map(|(id, _)| id).collect();
        assert_eq!(fired, vec![early, late]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_timer_cancel() {
        let mut timers = Timers::default();
        let id = timers.schedule(0.0, 10, Transition::NextLevel);
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.due(100.0).is_empty());
    }

    #[test]
    fn test_listener_guard_releases_once() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let guard = ListenerGuard::new(move || c.set(c.get() + 1));
        guard.release();
        assert_eq!(count.get(), 1);

        let c = Rc::clone(&count);
        drop(ListenerGuard::new(move || c.set(c.get() + 1)));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_frame_gap_is_clamped() {
        let mut session = cleared_chase();
        session.frame(0.0);
        assert_eq!(session.ticks(), 1);
        // A 10 s stall feeds at most 100 ms (about six ticks) into the loop
        session.frame(10_000.0);
        assert!((6..=7).contains(&session.ticks()));
    }

    #[test]
    fn test_deferred_advance_fires_on_sim_clock() {
        let mut session = cleared_chase();
        session.frame(0.0);
        assert_eq!(session.phase(), GamePhase::LevelComplete);
        assert_eq!(session.host().points, vec![20]);
        assert_eq!(session.timers().len(), 1);

        let mut now = 0.0;
        while session.phase() == GamePhase::LevelComplete && now < 2000.0 {
            now += 1000.0 / 60.0;
            session.frame(now);
        }
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(session.timers().is_empty());
        assert!(now >= 1000.0);
    }

    #[test]
    fn test_exit_is_idempotent() {
        let mut session = cleared_chase();
        let released = Rc::new(Cell::new(0));
        let r = Rc::clone(&released);
        session.attach_listener(ListenerGuard::new(move || r.set(r.get() + 1)));

        session.frame(0.0);
        let pending = session.timers().ids();
        assert_eq!(pending.len(), 1);

        session.exit();
        session.exit();
        assert_eq!(session.host().exits, 1);
        assert_eq!(released.get(), 1);
        assert!(session.timers().is_empty());

        // Late callbacks find nothing to act on
        assert!(!session.fire_timer(pending[0]));
        let ticks = session.ticks();
        session.frame(5000.0);
        session.proceed();
        session.reset();
        assert_eq!(session.ticks(), ticks);
        assert_eq!(session.phase(), GamePhase::LevelComplete);
        assert_eq!(session.host().points, vec![20]);
    }

    #[test]
    fn test_listener_after_exit_is_released() {
        let mut session = cleared_chase();
        session.exit();
        let released = Rc::new(Cell::new(false));
        let r = Rc::clone(&released);
        session.attach_listener(ListenerGuard::new(move || r.set(true)));
        assert!(released.get());
    }

    #[test]
    fn test_stale_timer_is_noop() {
        let mut session = cleared_chase();
        session.frame(0.0);
        let id = session.timers().ids()[0];
        assert!(session.fire_timer(id));
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(!session.fire_timer(id));
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_callbacks_host() {
        let total = Rc::new(Cell::new(0u32));
        let t = Rc::clone(&total);
        let mut host = Callbacks::new(move |n| t.set(t.get() + n), || {});
        host.add_points(5);
        host.add_points(7);
        host.on_exit();
        assert_eq!(total.get(), 12);
    }

    #[test]
    fn test_queued_host_calls_can_reenter_the_session() {
        let queue = HostQueue::new();
        let mut game = ChaseGame::new(ChaseTuning::default(), 1);
        game.pursuers.clear();
        game.items.clear();
        let shared = Rc::new(RefCell::new(Session::with_game(
            Box::new(game),
            queue.clone(),
            boxed_synth(NullSink),
        )));

        shared.borrow_mut().frame(0.0);
        shared.borrow_mut().exit();

        let calls = queue.take();
        assert_eq!(calls, vec![HostCall::AddPoints(20), HostCall::Exit]);
        for call in calls {
            // What a page callback may do while handling the call
            assert!(shared.try_borrow_mut().is_ok());
            if call == HostCall::Exit {
                assert!(!shared.borrow().is_alive());
                shared.borrow_mut().exit();
            }
        }
        assert!(queue.take().is_empty());
    }

    #[test]
    fn test_input_latched_between_frames() {
        let mut session = Session::mount(
            GameKind::Collector,
            &Tuning::default(),
            3,
            Recorder::default(),
            boxed_synth(NullSink),
        );
        assert_eq!(session.phase(), GamePhase::Intro);
        session.input_handle().borrow_mut().key_down("Enter");
        session.frame(0.0);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(!session.input_handle().borrow().snapshot().confirm);
    }
}
