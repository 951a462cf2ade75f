use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use super::{
    catalog::Catalog,
    schedule::{Deferred, Millis, ScheduledTask, TaskId, Timeline},
    state::{GameEvent, GameState, Verdict, Winner, CELEBRATION_MS, SETTLE_DELAY_MS},
};

/// 一次操作的结果：操作后的状态快照与产生的事件。
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl Resolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let winner = state.winner();
        Self {
            state,
            events,
            winner,
        }
    }
}

/// 游戏推进引擎：持有状态、洗牌用的随机源和延迟任务时间线。
///
/// 所有非法调用（锁定期间、已结束后）都是静默的空操作，返回空事件列表。
pub struct RuleEngine {
    catalog: Catalog,
    state: GameState,
    timeline: Timeline,
    scheduled: Vec<ScheduledTask>,
    rng: SmallRng,
}

impl RuleEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_rng(catalog, SmallRng::from_entropy())
    }

    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self::with_rng(catalog, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(catalog: Catalog, mut rng: SmallRng) -> Self {
        let state = GameState::new(catalog.shuffled(&mut rng));
        Self {
            catalog,
            state,
            timeline: Timeline::new(),
            scheduled: Vec::new(),
            rng,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn winner(&self) -> Option<Winner> {
        self.state.winner()
    }

    pub fn resolution(&self, events: Vec<GameEvent>) -> Resolution {
        Resolution::new(self.state.clone(), events)
    }

    pub fn now(&self) -> Millis {
        self.timeline.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.timeline.len()
    }

    /// 取出自上次调用以来新排入的延迟任务，供宿主为每个任务挂一个真实定时器。
    pub fn take_scheduled(&mut self) -> Vec<ScheduledTask> {
        std::mem::take(&mut self.scheduled)
    }

    pub fn advance_turn(&mut self, award_point: bool) -> Vec<GameEvent> {
        let verdict = if award_point {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        self.answer(verdict)
    }

    pub fn answer(&mut self, verdict: Verdict) -> Vec<GameEvent> {
        if !self.state.accepts_input() {
            return Vec::new();
        }
        let events = self.state.lock_turn(verdict);
        self.schedule(Deferred::SettleTurn, SETTLE_DELAY_MS);
        events
    }

    /// 外部时钟每秒调用一次。倒计时为零时按超时处理。
    pub fn tick(&mut self) -> Vec<GameEvent> {
        if !self.state.accepts_input() {
            return Vec::new();
        }
        match self.state.count_down() {
            Some(event) => vec![event],
            None => self.answer(Verdict::TimedOut),
        }
    }

    pub fn reset(&mut self) -> Vec<GameEvent> {
        self.timeline.cancel_all();
        self.scheduled.clear();
        self.state = GameState::new(self.catalog.shuffled(&mut self.rng));
        vec![GameEvent::GameReset]
    }

    /// 推进逻辑时钟，按到期顺序执行窗口内的全部延迟任务。
    pub fn advance_time(&mut self, elapsed: Millis) -> Vec<GameEvent> {
        let until = self.timeline.now().saturating_add(elapsed);
        let mut events = Vec::new();
        while let Some(task) = self.timeline.pop_due(until) {
            self.timeline.advance_to(task.due_at);
            events.extend(self.execute(task.kind));
        }
        self.timeline.advance_to(until);
        events
    }

    /// 立即执行指定任务；已取消或已执行的任务为空操作。
    pub fn run_task(&mut self, id: TaskId) -> Vec<GameEvent> {
        match self.timeline.take(id) {
            Some(task) => {
                self.timeline.advance_to(task.due_at);
                self.execute(task.kind)
            }
            None => Vec::new(),
        }
    }

    fn schedule(&mut self, kind: Deferred, delay: Millis) {
        let task = self.timeline.schedule(kind, delay);
        self.scheduled.push(task);
    }

    fn execute(&mut self, kind: Deferred) -> Vec<GameEvent> {
        match kind {
            Deferred::SettleTurn => {
                let events = self.state.settle_turn();
                if self.state.celebrate {
                    self.schedule(Deferred::ClearCelebration, CELEBRATION_MS);
                }
                events
            }
            Deferred::ClearCelebration => self.state.clear_celebration().into_iter().collect(),
        }
    }
}
