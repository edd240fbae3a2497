//! Dual-tree traversal split across a coordinator and a group of workers.
//!
//! The coordinator walks the top few dual levels itself, running base cases and pruning as the
//! single-process traverser would. Once it reaches the dispatch depth it ships each surviving
//! node pair, as two detached subtrees plus a fresh copy of the rule, to the worker named by the
//! pair's path identifier. It then waits for every dispatched worker, in worker order, and
//! merges their results into its own rule.
//!
//! Distinct pairs only map to distinct workers when the recursion above the dispatch depth is
//! fully balanced (every step a dual step, every node internal) and the number of workers is a
//! power of four. Anything else is reported as [`Error::DispatchTarget`] or
//! [`Error::DuplicateDispatch`].

pub mod path;
pub mod transport;
pub mod wire;
pub mod worker;

use log::{info, warn};
use std::time::Duration;

use crate::bound::Bound;
use crate::error::Error;
use crate::node::NodeRef;
use crate::rule::{Rule, TaskRule};
use crate::statistic::Statistic;
use crate::traversal::TraversalStats;

use path::{dispatch_depth, target_for};
use transport::{PendingReply, WorkerTransport};
use wire::{Frame, MessageKind, ResultBundle, TaskBundle};

/// What a finished distributed traversal did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalReport {
    /// Workers that were given a task, in dispatch order.
    pub dispatched: Vec<usize>,
    /// Workers released without a task.
    pub released: Vec<usize>,
    /// Work done by the coordinator above the dispatch depth.
    pub local: TraversalStats,
}

pub struct DistributedTraversal<'r, R, T> {
    rule: &'r mut R,
    transport: T,
    result_timeout: Option<Duration>,
    pending: Vec<Option<PendingReply>>,
}

impl<'r, R, T: WorkerTransport> DistributedTraversal<'r, R, T> {

    pub fn new(rule: &'r mut R, transport: T) -> Self {
        Self {
            rule,
            transport,
            result_timeout: None,
            pending: Vec::new(),
        }
    }

    /// Bound on how long the join barrier waits for each worker. `None` waits indefinitely.
    pub fn with_result_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.result_timeout = timeout;
        self
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub async fn traverse<B, S>(
        &mut self,
        query: NodeRef<'_, B, S>,
        reference: NodeRef<'_, B, S>,
    ) -> Result<TraversalReport, Error>
    where
        B: Bound,
        S: Statistic,
        R: TaskRule<B, S>,
    {
        let workers = self.transport.num_workers();
        if workers == 0 {
            return Err(Error::NoWorkers);
        }

        let depth = dispatch_depth(workers);
        info!("{} workers, dispatching at level {}", workers, depth);

        self.pending = (0..workers).map(|_| None).collect();
        let mut report = TraversalReport::default();

        if let Err(e) = self.master_traverse(query, reference, 0, depth, &mut report) {
            self.abandon();
            return Err(e);
        }

        for worker in 1..=workers {
            if self.pending[worker - 1].is_none() {
                self.transport.release(worker)?;
                report.released.push(worker);
            }
        }

        info!("waiting on {} results", report.dispatched.len());

        let pending = std::mem::take(&mut self.pending);
        let mut bundles: Vec<ResultBundle<<R as Rule<B, S>>::Results>> = Vec::with_capacity(report.dispatched.len());
        for (i, slot) in pending.into_iter().enumerate() {
            let reply = match slot {
                None => continue,
                Some(x) => x,
            };
            let frame = self.wait(i + 1, reply).await?;
            if frame.worker != i + 1 {
                return Err(Error::Frame(format!("reply for worker {} came from worker {}", i + 1, frame.worker)));
            }
            bundles.push(frame.into_results()?);
        }

        info!("received all results, merging");
        for bundle in bundles {
            bundle.merge_into::<B, S, R>(self.rule);
        }

        Ok(report)
    }

    async fn wait(&self, worker: usize, reply: PendingReply) -> Result<Frame, Error> {
        match self.result_timeout {
            None => reply.wait(worker).await,
            Some(limit) => match tokio::time::timeout(limit, reply.wait(worker)).await {
                Err(_) => Err(Error::WorkerTimeout(worker)),
                Ok(x) => x,
            },
        }
    }

    /// Releases the workers that were not given a task after a failed dispatch.
    fn abandon(&mut self) {

        let pending = std::mem::take(&mut self.pending);
        for (i, slot) in pending.iter().enumerate() {
            if slot.is_none() {
                if let Err(e) = self.transport.release(i + 1) {
                    warn!("could not release worker {}: {}", i + 1, e);
                }
            }
        }
    }

    fn master_traverse<B, S>(
        &mut self,
        query: NodeRef<'_, B, S>,
        reference: NodeRef<'_, B, S>,
        level: usize,
        depth: usize,
        report: &mut TraversalReport,
    ) -> Result<(), Error>
    where
        B: Bound,
        S: Statistic,
        R: TaskRule<B, S>,
    {
        if level >= depth {
            return self.dispatch(query, reference, report);
        }

        report.local.visited += 1;
        report.local.scores += 1;

        if self.rule.score(query, reference).is_prune() {
            report.local.prunes += 1;
            return Ok(());
        }

        for q in query.points() {
            for r in reference.points() {
                self.rule.base_case(q, r);
                report.local.base_cases += 1;
            }
        }

        match (query.left().zip(query.right()), reference.left().zip(reference.right())) {
            (Some((ql, qr)), Some((rl, rr))) => {
                self.master_traverse(ql, rl, level + 1, depth, report)?;
                self.master_traverse(ql, rr, level + 1, depth, report)?;
                self.master_traverse(qr, rl, level + 1, depth, report)?;
                self.master_traverse(qr, rr, level + 1, depth, report)?;
            }
            (Some((ql, qr)), None) => {
                self.master_traverse(ql, reference, level + 1, depth, report)?;
                self.master_traverse(qr, reference, level + 1, depth, report)?;
            }
            (None, Some((rl, rr))) => {
                self.master_traverse(query, rl, level + 1, depth, report)?;
                self.master_traverse(query, rr, level + 1, depth, report)?;
            }
            (None, None) => {}
        }

        Ok(())
    }

    fn dispatch<B, S>(
        &mut self,
        query: NodeRef<'_, B, S>,
        reference: NodeRef<'_, B, S>,
        report: &mut TraversalReport,
    ) -> Result<(), Error>
    where
        B: Bound,
        S: Statistic,
        R: TaskRule<B, S>,
    {
        let workers = self.pending.len();
        let target = target_for(query, reference);

        if target == 0 || target > workers {
            return Err(Error::DispatchTarget { target, workers });
        }
        if self.pending[target - 1].is_some() {
            return Err(Error::DuplicateDispatch { target });
        }

        let bundle = TaskBundle {
            path: target,
            rule: <R as TaskRule<B, S>>::task_rule(self.rule),
            query: query.tree().subtree_archive(query.id(), 0)?,
            reference: reference.tree().subtree_archive(reference.id(), 0)?,
        };
        let frame = Frame::encode(MessageKind::Task, target, &bundle)?;

        info!("sending {:?} x {:?} to worker {}", query, reference, target);
        let reply = self.transport.dispatch(target, frame)?;

        self.pending[target - 1] = Some(reply);
        report.dispatched.push(target);

        Ok(())
    }
}
