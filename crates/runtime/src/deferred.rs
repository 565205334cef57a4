//! Timer queue for deferred work owned by a map instance.
//!
//! Key properties:
//! - Total ordering on `(due, id)`; equal deadlines run in scheduling order.
//! - Every task is cancellable on its own, and all tasks of one owner can be
//!   cancelled together when that owner goes away.
//! - The queue never runs anything itself. Callers pop due tasks and must
//!   still check that the owner is alive before acting.

use foundation::ids::InstanceId;
use foundation::time::Time;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    owner: InstanceId,
    due: Time,
    payload: T,
}

#[derive(Debug)]
pub struct DueTask<T> {
    pub id: TaskId,
    pub owner: InstanceId,
    pub payload: T,
}

#[derive(Debug)]
pub struct DeferredQueue<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn schedule(&mut self, owner: InstanceId, due: Time, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push(Entry {
            id,
            owner,
            due,
            payload,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drops every task owned by `owner`; returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: InstanceId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.owner != owner);
        before - self.entries.len()
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<Time> {
        self.entries
            .iter()
            .map(|e| e.due)
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// Pops the earliest task whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Time) -> Option<DueTask<T>> {
        let mut best: Option<usize> = None;
        for (idx, e) in self.entries.iter().enumerate() {
            if e.due.0 > now.0 {
                continue;
            }
            match best {
                None => best = Some(idx),
                Some(b) => {
                    let cur = &self.entries[b];
                    if e.due.0.total_cmp(&cur.due.0).then(e.id.cmp(&cur.id)).is_lt() {
                        best = Some(idx);
                    }
                }
            }
        }

        let entry = self.entries.remove(best?);
        Some(DueTask {
            id: entry.id,
            owner: entry.owner,
            payload: entry.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DeferredQueue;
    use foundation::ids::InstanceId;
    use foundation::time::Time;

    #[test]
    fn pops_only_due_tasks_in_deadline_order() {
        let owner = InstanceId::next();
        let mut q = DeferredQueue::new();
        q.schedule(owner, Time(200.0), "late");
        q.schedule(owner, Time(100.0), "early");

        assert!(q.pop_due(Time(50.0)).is_none());
        assert_eq!(q.next_due(), Some(Time(100.0)));
        assert_eq!(q.pop_due(Time(250.0)).unwrap().payload, "early");
        assert_eq!(q.pop_due(Time(250.0)).unwrap().payload, "late");
        assert!(q.is_empty());
    }

    #[test]
    fn equal_deadlines_run_in_scheduling_order() {
        let owner = InstanceId::next();
        let mut q = DeferredQueue::new();
        q.schedule(owner, Time(10.0), "a");
        q.schedule(owner, Time(10.0), "b");
        assert_eq!(q.pop_due(Time(10.0)).unwrap().payload, "a");
        assert_eq!(q.pop_due(Time(10.0)).unwrap().payload, "b");
    }

    #[test]
    fn cancel_single_and_by_owner() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        let mut q = DeferredQueue::new();
        let t = q.schedule(a, Time(0.0), 1);
        q.schedule(a, Time(0.0), 2);
        q.schedule(b, Time(0.0), 3);

        assert!(q.cancel(t));
        assert!(!q.cancel(t));
        assert_eq!(q.cancel_owner(a), 1);
        let left = q.pop_due(Time(0.0)).unwrap();
        assert_eq!((left.owner, left.payload), (b, 3));
    }
}
