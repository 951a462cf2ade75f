pub mod game;
pub mod utils;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::js_sys::Function;

pub use game::{
    Catalog, CatalogError, Deferred, GameEvent, GamePhase, GameState, HostView, IntegrityError,
    Millis, ObjectCard, PlayerView, Resolution, RuleEngine, ScheduledTask, TaskId, Team,
    Timeline, TimerUrgency, Verdict, Winner, CELEBRATION_MS, MAX_ROUNDS, SETTLE_DELAY_MS,
    TURN_DURATION_SECS,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: serde::Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(engine: &RuleEngine, events: Vec<GameEvent>) -> Result<String, JsValue> {
    serde_json::to_string(&engine.resolution(events)).map_err(serde_to_js_error)
}

fn catalog_from_js(catalog: JsValue) -> Result<Catalog, JsValue> {
    if catalog.is_undefined() || catalog.is_null() {
        return Ok(Catalog::builtin());
    }
    let cards: Vec<ObjectCard> = from_value(catalog).map_err(JsValue::from)?;
    Catalog::new(cards).map_err(to_js_error)
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::GameFinished {
                score_a,
                score_b,
                winner,
            } => utils::log(&format!(
                "game finished: team A {score_a}, team B {score_b}, winner {winner:?}"
            )),
            GameEvent::GameReset => utils::log("game reset"),
            _ => {}
        }
    }
}

struct Host {
    engine: RuleEngine,
    on_change: Option<Function>,
}

type SharedHost = Rc<RefCell<Host>>;

/// 为引擎新排入的每个延迟任务挂一个浏览器定时器。
fn arm_timers(host: &SharedHost) {
    let (tasks, now) = {
        let mut guard = host.borrow_mut();
        let tasks = guard.engine.take_scheduled();
        (tasks, guard.engine.now())
    };
    for task in tasks {
        let delay = u32::try_from(task.due_at.saturating_sub(now)).unwrap_or(u32::MAX);
        let host = Rc::clone(host);
        spawn_local(async move {
            TimeoutFuture::new(delay).await;
            fire_task(&host, task.id);
        });
    }
}

fn fire_task(host: &SharedHost, id: TaskId) {
    let (json, callback) = {
        let mut guard = match host.try_borrow_mut() {
            Ok(guard) => guard,
            Err(_) => {
                utils::warn(&format!("deferred task {id} fired while the engine was busy"));
                return;
            }
        };
        let events = guard.engine.run_task(id);
        // 重置后残留的定时器会落到这里。
        if events.is_empty() {
            return;
        }
        log_events(&events);
        (
            make_resolution_json(&guard.engine, events),
            guard.on_change.clone(),
        )
    };

    arm_timers(host);

    if let (Ok(json), Some(callback)) = (json, callback) {
        if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            utils::warn(&format!("on_change callback failed: {err:?}"));
        }
    }
}

#[wasm_bindgen]
pub struct GameEngine {
    host: SharedHost,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(catalog_json: Option<String>) -> Result<GameEngine, JsValue> {
        let catalog = match catalog_json {
            Some(json) => Catalog::from_json(&json).map_err(|error| {
                utils::warn(&format!("rejected catalog: {error}"));
                to_js_error(error)
            })?,
            None => Catalog::builtin(),
        };
        utils::log(&format!("secret object game ready with {} cards", catalog.len()));
        Ok(GameEngine {
            host: Rc::new(RefCell::new(Host {
                engine: RuleEngine::new(catalog),
                on_change: None,
            })),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.host.borrow().engine.state()).map_err(serde_to_js_error)
    }

    pub fn player_view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.borrow().engine.state().player_view())
            .map_err(serde_to_js_error)
    }

    pub fn host_view_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.borrow().engine.state().host_view())
            .map_err(serde_to_js_error)
    }

    /// 未结束时返回 `null`。
    pub fn winner_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.host.borrow().engine.winner()).map_err(serde_to_js_error)
    }

    pub fn pending_tasks(&self) -> usize {
        self.host.borrow().engine.pending_tasks()
    }

    /// 定时器驱动的状态变化（结算、庆祝结束）发生后，以结果 JSON 调用该函数。
    pub fn set_on_change(&self, callback: Option<Function>) {
        self.host.borrow_mut().on_change = callback;
    }

    pub fn advance_turn(&self, award_point: bool) -> Result<String, JsValue> {
        self.apply(|engine| engine.advance_turn(award_point))
    }

    pub fn yes(&self) -> Result<String, JsValue> {
        self.apply(|engine| engine.answer(Verdict::Correct))
    }

    pub fn no(&self) -> Result<String, JsValue> {
        self.apply(|engine| engine.answer(Verdict::Incorrect))
    }

    pub fn skip(&self) -> Result<String, JsValue> {
        self.apply(|engine| engine.answer(Verdict::Skipped))
    }

    pub fn tick(&self) -> Result<String, JsValue> {
        self.apply(RuleEngine::tick)
    }

    pub fn reset(&self) -> Result<String, JsValue> {
        self.apply(RuleEngine::reset)
    }
}

impl GameEngine {
    fn apply<F>(&self, action: F) -> Result<String, JsValue>
    where
        F: FnOnce(&mut RuleEngine) -> Vec<GameEvent>,
    {
        let json = {
            let mut guard = self.host.borrow_mut();
            let events = action(&mut guard.engine);
            log_events(&events);
            make_resolution_json(&guard.engine, events)?
        };
        arm_timers(&self.host);
        Ok(json)
    }
}

/// 返回内置的 20 张物品卡。
#[wasm_bindgen(js_name = "defaultCatalog")]
pub fn default_catalog() -> Result<JsValue, JsValue> {
    to_value(Catalog::builtin().cards()).map_err(JsValue::from)
}

/// 校验物品目录，返回卡牌数量。
#[wasm_bindgen(js_name = "validateCatalog")]
pub fn validate_catalog(catalog: JsValue) -> Result<usize, JsValue> {
    catalog_from_js(catalog).map(|catalog| catalog.len())
}

/// 用给定目录（缺省为内置目录）创建一个全新的游戏状态。
#[wasm_bindgen(js_name = "createGameState")]
pub fn create_game_state(catalog: JsValue) -> Result<JsValue, JsValue> {
    let catalog = catalog_from_js(catalog)?;
    let engine = RuleEngine::new(catalog);
    to_value(engine.state()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state.integrity_check().map_err(|error| {
        to_value(&error)
            .unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
    })
}
