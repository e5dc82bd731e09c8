//! Single-flight guard for structural operations.
//!
//! Sort, column switch/remove and filter each run the full
//! freeze → mutate → re-render → unfreeze sequence. At most one sequence is
//! in flight per grid; requests that arrive meanwhile queue behind it and
//! are told when their turn has finished.

use std::collections::VecDeque;

use futures::channel::oneshot;

use crate::error::Result;
use crate::types::SortOrder;

/// A structural operation, addressed by column id so it stays meaningful
/// while it waits behind another one that reorders columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralOp {
    Sort { column: String, order: SortOrder },
    Switch { a: String, b: String },
    Remove { column: String },
    Filter,
}

/// How a structural request was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Ran to completion on this call.
    Completed,
    /// Waited behind another operation, then ran to completion.
    Queued,
    /// Refused by policy (e.g. sorting in tree view).
    Skipped,
}

/// Outcome delivered to a waiting caller: the error message on failure.
pub type Outcome = std::result::Result<(), String>;

/// Result of claiming the guard
#[derive(Debug)]
pub enum Claim {
    /// The caller owns the flight and must run its operation.
    Owner,
    /// The operation was queued; the receiver fires once it has run.
    Waiting(oneshot::Receiver<Outcome>),
}

/// A queued operation and everyone waiting on it
#[derive(Debug)]
pub struct Queued {
    pub op: StructuralOp,
    waiters: Vec<oneshot::Sender<Outcome>>,
}

impl Queued {
    /// Report `result` to every waiter.
    pub fn finish(self, result: &Result<()>) {
        let outcome: Outcome = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(e.to_string()),
        };
        for waiter in self.waiters {
            // A waiter that stopped listening has nothing left to learn.
            let _ = waiter.send(outcome.clone());
        }
    }
}

#[derive(Debug, Default)]
pub enum FlightGuard {
    #[default]
    Idle,
    Busy { queue: VecDeque<Queued> },
}

impl FlightGuard {
    pub fn is_busy(&self) -> bool {
        matches!(self, FlightGuard::Busy { .. })
    }

    /// Claim the guard for `op`, or queue `op` behind the flight.
    ///
    /// A queued filter replaces any filter already waiting, since it reads
    /// the latest filter inputs anyway; the older filter's waiters move to
    /// the replacement.
    pub fn begin(&mut self, op: StructuralOp) -> Claim {
        match self {
            FlightGuard::Idle => {
                *self = FlightGuard::Busy {
                    queue: VecDeque::new(),
                };
                Claim::Owner
            }
            FlightGuard::Busy { queue } => {
                let (sender, receiver) = oneshot::channel();
                let mut waiters = Vec::new();
                if op == StructuralOp::Filter {
                    if let Some(pos) = queue.iter().position(|q| q.op == StructuralOp::Filter) {
                        if let Some(older) = queue.remove(pos) {
                            waiters = older.waiters;
                        }
                    }
                }
                waiters.push(sender);
                queue.push_back(Queued { op, waiters });
                Claim::Waiting(receiver)
            }
        }
    }

    /// Next queued operation for the flight owner; releases the guard when
    /// the queue is empty.
    pub fn next(&mut self) -> Option<Queued> {
        let next = match self {
            FlightGuard::Idle => None,
            FlightGuard::Busy { queue } => queue.pop_front(),
        };
        if next.is_none() {
            *self = FlightGuard::Idle;
        }
        next
    }

    pub fn queued(&self) -> usize {
        match self {
            FlightGuard::Idle => 0,
            FlightGuard::Busy { queue } => queue.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::error::GridError;

    fn sort(column: &str) -> StructuralOp {
        StructuralOp::Sort {
            column: column.into(),
            order: SortOrder::Asc,
        }
    }

    fn waiting(claim: Claim) -> oneshot::Receiver<Outcome> {
        match claim {
            Claim::Waiting(receiver) => receiver,
            Claim::Owner => panic!("expected the operation to queue"),
        }
    }

    #[test]
    fn test_second_op_queues_behind_first() {
        let mut guard = FlightGuard::default();
        assert!(matches!(guard.begin(sort("name")), Claim::Owner));
        let mut done = waiting(guard.begin(sort("office")));
        assert!(guard.is_busy());
        assert_eq!(done.try_recv().unwrap(), None);

        let next = guard.next().unwrap();
        assert_eq!(next.op, sort("office"));
        assert_eq!(done.try_recv().unwrap(), None);
        next.finish(&Ok(()));
        assert_eq!(done.try_recv().unwrap(), Some(Ok(())));

        assert!(guard.next().is_none());
        assert!(!guard.is_busy());
    }

    #[test]
    fn test_queued_failure_reaches_waiter() {
        let mut guard = FlightGuard::default();
        guard.begin(sort("name"));
        let mut done = waiting(guard.begin(sort("gone")));
        guard.next().unwrap().finish(&Err(GridError::Destroyed));
        assert_eq!(
            done.try_recv().unwrap(),
            Some(Err("Grid has been destroyed".to_string()))
        );
    }

    #[test]
    fn test_queued_filter_is_coalesced() {
        let mut guard = FlightGuard::default();
        guard.begin(sort("name"));
        let mut older = waiting(guard.begin(StructuralOp::Filter));
        guard.begin(sort("office"));
        let mut newer = waiting(guard.begin(StructuralOp::Filter));
        assert_eq!(guard.queued(), 2);
        assert_eq!(guard.next().unwrap().op, sort("office"));

        let filter = guard.next().unwrap();
        assert_eq!(filter.op, StructuralOp::Filter);
        filter.finish(&Ok(()));
        assert_eq!(older.try_recv().unwrap(), Some(Ok(())));
        assert_eq!(newer.try_recv().unwrap(), Some(Ok(())));
    }
}
