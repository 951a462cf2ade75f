use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// 延迟任务标识，整个时间线生命周期内不复用。
pub type TaskId = u64;

/// 逻辑时钟，单位毫秒。
pub type Millis = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Deferred {
    /// 结算延迟结束：切换队伍、推进游标与回合。
    SettleTurn,
    /// 结束庆祝效果。
    ClearCelebration,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub kind: Deferred,
    pub due_at: Millis,
}

#[derive(Debug, Clone)]
struct QueueItem {
    task: ScheduledTask,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.task.id == other.task.id
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    // BinaryHeap 是大顶堆：到期越早、编号越小的排在堆顶。
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .task
            .due_at
            .cmp(&self.task.due_at)
            .then_with(|| other.task.id.cmp(&self.task.id))
    }
}

/// 按到期时间排序的延迟任务队列，附带单调递增的逻辑时钟。
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    now: Millis,
    next_id: TaskId,
    heap: BinaryHeap<QueueItem>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Never moves the clock backwards.
    pub fn advance_to(&mut self, time: Millis) {
        self.now = self.now.max(time);
    }

    pub fn schedule(&mut self, kind: Deferred, delay: Millis) -> ScheduledTask {
        self.next_id += 1;
        let task = ScheduledTask {
            id: self.next_id,
            kind,
            due_at: self.now.saturating_add(delay),
        };
        self.heap.push(QueueItem { task });
        task
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.heap.peek().map(|item| item.task.due_at)
    }

    pub fn pop_due(&mut self, until: Millis) -> Option<ScheduledTask> {
        if self.next_due()? > until {
            return None;
        }
        self.heap.pop().map(|item| item.task)
    }

    pub fn take(&mut self, id: TaskId) -> Option<ScheduledTask> {
        let mut found = None;
        self.heap.retain(|item| {
            if item.task.id == id {
                found = Some(item.task);
                false
            } else {
                true
            }
        });
        found
    }

    pub fn is_pending(&self, kind: Deferred) -> bool {
        self.heap.iter().any(|item| item.task.kind == kind)
    }

    /// 取消全部待执行任务，返回被取消的数量。
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.heap.len();
        self.heap.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
