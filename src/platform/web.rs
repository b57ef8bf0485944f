//! JavaScript entry points
//!
//! `WebArcade` owns one session. Every DOM listener it registers is held by a
//! [`ListenerGuard`] inside that session and removed on exit. Host callbacks are queued
//! and handed to the page after the session borrow is released.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventTarget, KeyboardEvent, VisibilityState};

use crate::audio::{AudioSink, ToneSynth, WebAudioSink};
use crate::session::{HostCall, HostQueue, ListenerGuard, Session};
use crate::settings::Settings;
use crate::sim::{AttackKind, Direction, GameKind, GamePhase, InputLatch};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
}

/// Page callbacks, called only while no session borrow is held so they may re-enter
struct PageCallbacks {
    add_points: js_sys::Function,
    on_exit: js_sys::Function,
}

impl PageCallbacks {
    fn deliver(&self, outbox: &HostQueue) {
        loop {
            let calls = outbox.take();
            if calls.is_empty() {
                return;
            }
            for call in calls {
                let result = match call {
                    HostCall::AddPoints(amount) => {
                        self.add_points.call1(&JsValue::NULL, &JsValue::from(amount))
                    }
                    HostCall::Exit => self.on_exit.call0(&JsValue::NULL),
                };
                if let Err(e) = result {
                    log::warn!("{:?} callback threw: {:?}", call, e);
                }
            }
        }
    }
}

type SharedSession = Rc<RefCell<Session<HostQueue>>>;

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Register `handler` for `name` on `target`; removal is owned by the session
fn listen(
    session: &SharedSession,
    target: EventTarget,
    name: &'static str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    let guard = ListenerGuard::new(move || {
        let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        log::debug!("Removed {} listener", name);
    });
    session.borrow_mut().attach_listener(guard);
    Ok(())
}

fn pause_if_playing(session: &Weak<RefCell<Session<HostQueue>>>, latch: &RefCell<InputLatch>, why: &str) {
    let Some(session) = session.upgrade() else {
        return;
    };
    let Ok(s) = session.try_borrow() else {
        return;
    };
    if s.phase() == GamePhase::Playing {
        latch.borrow_mut().pause();
        log::info!("Auto-paused ({})", why);
    }
}

#[wasm_bindgen]
pub struct WebArcade {
    session: SharedSession,
    outbox: HostQueue,
    page: PageCallbacks,
    settings: Settings,
}

#[wasm_bindgen]
impl WebArcade {
    /// Mount `game` ("maze", "chase", "dodger", "collector", "brawl")
    #[wasm_bindgen(constructor)]
    pub fn mount(
        game: &str,
        seed: u32,
        add_points: js_sys::Function,
        on_exit: js_sys::Function,
        tuning_json: Option<String>,
    ) -> Result<WebArcade, JsValue> {
        let kind: GameKind = game.parse().map_err(|e: String| JsValue::from_str(&e))?;
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json).map_err(js_err)?,
            None => Tuning::default(),
        };
        let settings = Settings::load();
        let sink: Box<dyn AudioSink> = Box::new(WebAudioSink::new());
        let synth = ToneSynth::from_settings(sink, &settings);
        let outbox = HostQueue::new();
        let session = Rc::new(RefCell::new(Session::mount(
            kind,
            &tuning,
            u64::from(seed),
            outbox.clone(),
            synth,
        )));

        let arcade = WebArcade {
            session,
            outbox,
            page: PageCallbacks {
                add_points,
                on_exit,
            },
            settings,
        };
        arcade.attach_keyboard()?;
        arcade.attach_auto_pause()?;
        Ok(arcade)
    }

    fn attach_keyboard(&self) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
        let document = window.document().ok_or_else(|| js_err("no document"))?;
        let latch = self.session.borrow().input_handle();

        {
            let latch = Rc::clone(&latch);
            listen(&self.session, document.clone().into(), "keydown", move |event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                    if latch.borrow_mut().key_down(&key.key()) {
                        event.prevent_default();
                    }
                }
            })?;
        }
        listen(&self.session, document.into(), "keyup", move |event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                latch.borrow_mut().key_up(&key.key());
            }
        })
    }

    fn attach_auto_pause(&self) -> Result<(), JsValue> {
        if !self.settings.auto_pause {
            return Ok(());
        }
        let window = web_sys::window().ok_or_else(|| js_err("no window"))?;
        let document = window.document().ok_or_else(|| js_err("no document"))?;
        let latch = self.session.borrow().input_handle();

        // Visibility change (tab switch, minimize)
        {
            let latch = Rc::clone(&latch);
            let weak = Rc::downgrade(&self.session);
            let doc = document.clone();
            listen(&self.session, document.into(), "visibilitychange", move |_| {
                if doc.visibility_state() == VisibilityState::Hidden {
                    pause_if_playing(&weak, &latch, "tab hidden");
                }
            })?;
        }

        // Window blur (click outside)
        let weak = Rc::downgrade(&self.session);
        listen(&self.session, window.into(), "blur", move |_| {
            pause_if_playing(&weak, &latch, "window blur");
        })
    }

    /// Run `f` on the session, then hand queued host calls to the page.
    /// A call made from inside one of those callbacks while the session is busy is dropped.
    fn with_session<T>(&self, f: impl FnOnce(&mut Session<HostQueue>) -> T) -> Option<T> {
        let out = match self.session.try_borrow_mut() {
            Ok(mut session) => Some(f(&mut *session)),
            Err(_) => {
                log::debug!("Session busy, call ignored");
                None
            }
        };
        self.page.deliver(&self.outbox);
        out
    }

    fn with_latch(&self, f: impl FnOnce(&mut InputLatch)) {
        let latch = self.with_session(|s| s.input_handle());
        if let Some(latch) = latch {
            if let Ok(mut latch) = latch.try_borrow_mut() {
                f(&mut *latch);
            }
        }
    }

    /// Drive from requestAnimationFrame
    pub fn frame(&self, now_ms: f64) {
        self.with_session(|s| s.frame(now_ms));
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        let snapshot = self.session.try_borrow().map_err(js_err)?.snapshot();
        serde_json::to_string(&snapshot).map_err(js_err)
    }

    pub fn answer(&self, value: i32) {
        self.with_session(|s| s.answer(i64::from(value)));
    }

    pub fn proceed(&self) {
        self.with_session(|s| s.proceed());
    }

    pub fn pause(&self) {
        self.with_session(|s| s.pause());
    }

    pub fn reset(&self) {
        self.with_session(|s| s.reset());
    }

    /// On-screen pad: "up", "down", "left", "right"
    pub fn press(&self, dir: &str) -> Result<(), JsValue> {
        let dir: Direction = dir.parse().map_err(|e: String| JsValue::from_str(&e))?;
        self.with_latch(|l| l.press(dir));
        Ok(())
    }

    /// On-screen pad lifted
    pub fn release(&self) {
        self.with_latch(|l| l.release_all());
    }

    pub fn jump(&self) {
        self.with_latch(|l| l.jump());
    }

    pub fn duck(&self) {
        self.with_latch(|l| l.duck());
    }

    /// "quick", "guard" or "heavy"
    pub fn attack(&self, kind: &str) -> Result<(), JsValue> {
        let kind: AttackKind = kind.parse().map_err(|e: String| JsValue::from_str(&e))?;
        self.with_latch(|l| l.attack(kind));
        Ok(())
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, master: f32, sfx: f32) {
        self.settings.master_volume = master.clamp(0.0, 1.0);
        self.settings.sfx_volume = sfx.clamp(0.0, 1.0);
        self.store_settings();
    }

    #[wasm_bindgen(js_name = setMuted)]
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.store_settings();
    }

    fn store_settings(&self) {
        let settings = self.settings.clone();
        self.with_session(|s| s.synth_mut().apply_settings(&settings));
        self.settings.save();
    }

    /// Safe to call any number of times, including from `onExit`
    pub fn exit(&self) {
        self.with_session(|s| s.exit());
    }

    #[wasm_bindgen(js_name = isAlive)]
    pub fn is_alive(&self) -> bool {
        self.session.try_borrow().is_ok_and(|s| s.is_alive())
    }
}
