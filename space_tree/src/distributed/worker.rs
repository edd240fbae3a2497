//! Worker side of a distributed traversal.
//!
//! A worker receives exactly one frame. A task frame is run to completion and answered with a
//! result frame (or a failure frame); a release frame ends the worker without a reply.

use log::{info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::bound::Bound;
use crate::distributed::transport::{PendingReply, WorkerTransport};
use crate::distributed::wire::{Frame, MessageKind, ResultBundle, TaskBundle};
use crate::error::Error;
use crate::rule::TaskRule;
use crate::statistic::Statistic;
use crate::traversal::DualTreeTraverser;
use crate::tree::Tree;

/// Runs the task in `frame` as worker `worker` and returns the reply frame.
///
/// Never fails: anything that goes wrong is reported back as a failure frame.
pub fn run_task<B, S, R>(worker: usize, frame: &[u8]) -> Frame
where
    B: Bound,
    S: Statistic,
    R: TaskRule<B, S>,
{
    match execute::<B, S, R>(worker, frame) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("worker {} failed: {}", worker, e);
            Frame::failure(worker, &e.to_string())
        }
    }
}

fn execute<B, S, R>(worker: usize, frame: &[u8]) -> Result<Frame, Error>
where
    B: Bound,
    S: Statistic,
    R: TaskRule<B, S>,
{
    let frame = Frame::from_bytes(frame)?;

    if frame.kind != MessageKind::Task {
        return Err(Error::Frame(format!("worker {} expected a task, got {:?}", worker, frame.kind)));
    }

    let bundle: TaskBundle<R, B, S> = frame.decode()?;
    info!("worker {} has received task {}", worker, bundle.path);

    let query: Tree<B, S> = Tree::from_archive(bundle.query)?;
    let reference: Tree<B, S> = Tree::from_archive(bundle.reference)?;

    let mut rule = bundle.rule;
    let mut traverser = DualTreeTraverser::new(&mut rule);
    traverser.traverse(query.root(), reference.root());
    let stats = traverser.stats();

    info!(
        "worker {} is sending results ({} base cases, {} prunes)",
        worker, stats.base_cases, stats.prunes
    );

    Frame::encode(MessageKind::Result, worker, &ResultBundle::new(rule.into_results()))
}

struct Envelope {
    frame: Vec<u8>,
    reply: Option<oneshot::Sender<Result<Vec<u8>, Error>>>,
}

/// A group of in-process workers, each a tokio task fed through its own bounded queue.
///
/// Must be created inside a tokio runtime. Traversals run on the blocking pool.
pub struct LocalWorkers {
    inboxes: Vec<mpsc::Sender<Envelope>>,
    handles: Vec<JoinHandle<()>>,
}

impl LocalWorkers {

    pub fn spawn<B, S, R>(num_workers: usize) -> Self
    where
        B: Bound + 'static,
        S: Statistic + 'static,
        R: TaskRule<B, S>,
    {
        let mut inboxes: Vec<mpsc::Sender<Envelope>> = Vec::with_capacity(num_workers);
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(num_workers);

        for worker in 1..=num_workers {
            let (sender, receiver) = mpsc::channel::<Envelope>(1);
            inboxes.push(sender);
            handles.push(tokio::spawn(serve_one::<B, S, R>(worker, receiver)));
        }

        Self { inboxes, handles }
    }

    /// Closes every queue and waits for all workers to exit.
    pub async fn shutdown(self) -> Result<(), Error> {

        drop(self.inboxes);
        for handle in self.handles {
            handle.await.map_err(|e| Error::Transport(e.to_string()))?;
        }

        Ok(())
    }

    fn inbox(&self, worker: usize) -> Result<&mpsc::Sender<Envelope>, Error> {
        match worker.checked_sub(1).and_then(|i| self.inboxes.get(i)) {
            None => Err(Error::DispatchTarget {
                target: worker,
                workers: self.inboxes.len(),
            }),
            Some(x) => Ok(x),
        }
    }
}

impl WorkerTransport for LocalWorkers {

    fn num_workers(&self) -> usize {
        self.inboxes.len()
    }

    fn dispatch(&mut self, worker: usize, frame: Frame) -> Result<PendingReply, Error> {

        let (sender, reply) = PendingReply::channel();
        let envelope = Envelope {
            frame: frame.to_bytes(),
            reply: Some(sender),
        };

        self.inbox(worker)?
            .try_send(envelope)
            .map_err(|e| Error::Transport(format!("worker {} cannot take a task: {}", worker, e)))?;

        Ok(reply)
    }

    fn release(&mut self, worker: usize) -> Result<(), Error> {

        let envelope = Envelope {
            frame: Frame::release(worker).to_bytes(),
            reply: None,
        };

        self.inbox(worker)?
            .try_send(envelope)
            .map_err(|e| Error::Transport(format!("worker {} cannot be released: {}", worker, e)))
    }
}

async fn serve_one<B, S, R>(worker: usize, mut inbox: mpsc::Receiver<Envelope>)
where
    B: Bound + 'static,
    S: Statistic + 'static,
    R: TaskRule<B, S>,
{
    info!("worker {} is waiting for a message", worker);

    let envelope = match inbox.recv().await {
        None => return,
        Some(x) => x,
    };

    let reply = match envelope.reply {
        None => {
            info!("worker {} released", worker);
            return;
        }
        Some(x) => x,
    };

    let frame = envelope.frame;
    let outcome = tokio::task::spawn_blocking(move || run_task::<B, S, R>(worker, &frame).to_bytes()).await;

    //a panicking rule surfaces as a worker failure
    let outcome = outcome.map_err(|e| Error::Worker {
        worker,
        message: e.to_string(),
    });

    if reply.send(outcome).is_err() {
        warn!("coordinator stopped waiting for worker {}", worker);
    }
}
