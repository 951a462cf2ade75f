use serde::{Deserialize, Serialize};

use super::catalog::ObjectCard;
use super::schedule::Millis;

pub const MAX_ROUNDS: u32 = 10;
pub const TURN_DURATION_SECS: u32 = 20;
pub const SETTLE_DELAY_MS: Millis = 300;
pub const CELEBRATION_MS: Millis = 3_000;

const WARNING_AT_SECS: u32 = 12;
const CRITICAL_AT_SECS: u32 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

/// 游戏阶段。`Finished` 在重置前为终态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Winner {
    Team(Team),
    Tie,
}

/// 一回合的结束方式。`Incorrect` 与 `Skipped` 对状态的影响完全相同。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    Skipped,
    TimedOut,
}

impl Verdict {
    pub fn awards_point(self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// 倒计时紧迫程度，供前端选择配色。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerUrgency {
    Calm,
    Warning,
    Critical,
}

impl TimerUrgency {
    pub fn from_remaining(remaining: u32) -> Self {
        if remaining <= CRITICAL_AT_SECS {
            TimerUrgency::Critical
        } else if remaining <= WARNING_AT_SECS {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Calm
        }
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    TurnLocked {
        team: Team,
        verdict: Verdict,
    },
    PointAwarded {
        team: Team,
        score: u32,
    },
    CountdownTicked {
        remaining: u32,
    },
    TurnStarted {
        team: Team,
        round: u32,
        cursor: usize,
    },
    RoundCompleted {
        round: u32,
    },
    GameFinished {
        score_a: u32,
        score_b: u32,
        winner: Winner,
    },
    CelebrationEnded,
    GameReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    EmptyPlayOrder,
    CursorOutOfRange { cursor: usize, len: usize },
    RoundOutOfRange { round: u32 },
    CountdownOutOfRange { value: u32 },
    CelebrationWhilePlaying,
}

/// 游戏整体状态，只由规则引擎修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub phase: GamePhase,
    pub current_team: Team,
    pub score_a: u32,
    pub score_b: u32,
    pub current_round: u32,
    pub play_order: Vec<ObjectCard>,
    pub cursor: usize,
    pub countdown: u32,
    #[serde(default)]
    pub transitioning: bool,
    #[serde(default)]
    pub celebrate: bool,
}

impl GameState {
    pub fn new(play_order: Vec<ObjectCard>) -> Self {
        Self {
            phase: GamePhase::Playing,
            current_team: Team::A,
            score_a: 0,
            score_b: 0,
            current_round: 1,
            play_order,
            cursor: 0,
            countdown: TURN_DURATION_SECS,
            transitioning: false,
            celebrate: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Finished
    }

    /// 可以接受计分或推进回合的操作。
    pub fn accepts_input(&self) -> bool {
        self.phase == GamePhase::Playing && !self.transitioning
    }

    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::A => self.score_a,
            Team::B => self.score_b,
        }
    }

    pub fn current_object(&self) -> Option<&ObjectCard> {
        self.play_order.get(self.cursor)
    }

    pub fn winner(&self) -> Option<Winner> {
        if !self.is_finished() {
            return None;
        }
        let winner = if self.score_a > self.score_b {
            Winner::Team(Team::A)
        } else if self.score_b > self.score_a {
            Winner::Team(Team::B)
        } else {
            Winner::Tie
        };
        Some(winner)
    }

    pub fn timer_urgency(&self) -> TimerUrgency {
        TimerUrgency::from_remaining(self.countdown)
    }

    pub fn countdown_ratio(&self) -> f32 {
        (self.countdown.min(TURN_DURATION_SECS) as f32) / (TURN_DURATION_SECS as f32)
    }

    /// 锁定当前回合并按裁定计分。调用方负责检查 `accepts_input`。
    pub fn lock_turn(&mut self, verdict: Verdict) -> Vec<GameEvent> {
        self.transitioning = true;
        let team = self.current_team;
        let mut events = vec![GameEvent::TurnLocked { team, verdict }];
        if verdict.awards_point() {
            let score = self.award_point(team);
            events.push(GameEvent::PointAwarded { team, score });
        }
        events
    }

    fn award_point(&mut self, team: Team) -> u32 {
        let score = match team {
            Team::A => &mut self.score_a,
            Team::B => &mut self.score_b,
        };
        *score = score.saturating_add(1);
        *score
    }

    /// 结算延迟结束后的状态推进。
    pub fn settle_turn(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let finished_team = self.current_team;

        self.current_team = finished_team.other();
        self.cursor = (self.cursor + 1) % self.play_order.len().max(1);

        if finished_team == Team::B {
            events.push(GameEvent::RoundCompleted {
                round: self.current_round,
            });
            self.current_round += 1;
            if self.current_round > MAX_ROUNDS {
                self.phase = GamePhase::Finished;
                self.celebrate = true;
            }
        }

        self.countdown = TURN_DURATION_SECS;
        self.transitioning = false;

        match self.winner() {
            Some(winner) => events.push(GameEvent::GameFinished {
                score_a: self.score_a,
                score_b: self.score_b,
                winner,
            }),
            None => events.push(GameEvent::TurnStarted {
                team: self.current_team,
                round: self.current_round,
                cursor: self.cursor,
            }),
        }
        events
    }

    /// 倒计时减一；已到零时返回 `None`，由调用方按超时处理。
    pub fn count_down(&mut self) -> Option<GameEvent> {
        if self.countdown == 0 {
            return None;
        }
        self.countdown -= 1;
        Some(GameEvent::CountdownTicked {
            remaining: self.countdown,
        })
    }

    pub fn clear_celebration(&mut self) -> Option<GameEvent> {
        if !self.celebrate {
            return None;
        }
        self.celebrate = false;
        Some(GameEvent::CelebrationEnded)
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let len = self.play_order.len();
        if len == 0 {
            return Err(IntegrityError::EmptyPlayOrder);
        }
        if self.cursor >= len {
            return Err(IntegrityError::CursorOutOfRange {
                cursor: self.cursor,
                len,
            });
        }
        let round_ok = match self.phase {
            GamePhase::Playing => (1..=MAX_ROUNDS).contains(&self.current_round),
            GamePhase::Finished => self.current_round == MAX_ROUNDS + 1,
        };
        if !round_ok {
            return Err(IntegrityError::RoundOutOfRange {
                round: self.current_round,
            });
        }
        if self.countdown > TURN_DURATION_SECS {
            return Err(IntegrityError::CountdownOutOfRange {
                value: self.countdown,
            });
        }
        if self.celebrate && self.phase == GamePhase::Playing {
            return Err(IntegrityError::CelebrationWhilePlaying);
        }
        Ok(())
    }

    pub fn player_view(&self) -> PlayerView {
        PlayerView {
            phase: self.phase,
            current_team: self.current_team,
            score_a: self.score_a,
            score_b: self.score_b,
            current_round: self.current_round.min(MAX_ROUNDS),
            max_rounds: MAX_ROUNDS,
            countdown: self.countdown,
            countdown_ratio: self.countdown_ratio(),
            urgency: self.timer_urgency(),
            image_ref: self.current_object().map(|card| card.image_ref.clone()),
            transitioning: self.transitioning,
            celebrate: self.celebrate,
            winner: self.winner(),
        }
    }

    pub fn host_view(&self) -> HostView {
        HostView {
            view: self.player_view(),
            answer: self.current_object().map(|card| card.title.clone()),
        }
    }
}

/// 玩家可见的渲染数据，不含答案。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlayerView {
    pub phase: GamePhase,
    pub current_team: Team,
    pub score_a: u32,
    pub score_b: u32,
    pub current_round: u32,
    pub max_rounds: u32,
    pub countdown: u32,
    pub countdown_ratio: f32,
    pub urgency: TimerUrgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub transitioning: bool,
    pub celebrate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

/// 主持人视图：在玩家视图之外附带答案。
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HostView {
    #[serde(flatten)]
    pub view: PlayerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}
