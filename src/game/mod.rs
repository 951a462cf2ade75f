//! 游戏核心逻辑模块（物品目录、状态机、延迟任务、规则引擎）。

pub mod catalog;
pub mod rules;
pub mod schedule;
pub mod state;

pub use catalog::{Catalog, CatalogError, ObjectCard};
pub use rules::{Resolution, RuleEngine};
pub use schedule::{Deferred, Millis, ScheduledTask, TaskId, Timeline};
pub use state::{
    GameEvent,
    GamePhase,
    GameState,
    HostView,
    IntegrityError,
    PlayerView,
    Team,
    TimerUrgency,
    Verdict,
    Winner,
    CELEBRATION_MS,
    MAX_ROUNDS,
    SETTLE_DELAY_MS,
    TURN_DURATION_SECS,
};
