//! The seam between the coordinator and wherever its workers run.

use tokio::sync::oneshot;

use crate::distributed::wire::Frame;
use crate::error::Error;

/// Reply slot of one dispatched task. Resolves once the worker has answered.
#[derive(Debug)]
pub struct PendingReply {
    receiver: oneshot::Receiver<Result<Vec<u8>, Error>>,
}

impl PendingReply {

    /// A reply slot and the sender that fills it.
    pub fn channel() -> (oneshot::Sender<Result<Vec<u8>, Error>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// Waits for the reply frame of `worker`.
    ///
    /// A sender dropped without replying is reported as [`Error::WorkerLost`].
    pub async fn wait(self, worker: usize) -> Result<Frame, Error> {
        match self.receiver.await {
            Err(_) => Err(Error::WorkerLost(worker)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(bytes)) => Frame::from_bytes(&bytes),
        }
    }
}

/// Workers are numbered `1..=num_workers()`; `0` is the coordinator.
pub trait WorkerTransport {

    fn num_workers(&self) -> usize;

    /// Hands `frame` to `worker` without waiting for it to be processed.
    fn dispatch(&mut self, worker: usize, frame: Frame) -> Result<PendingReply, Error>;

    /// Tells a worker that no task is coming.
    fn release(&mut self, worker: usize) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::wire::MessageKind;

    #[tokio::test]
    async fn reply_slot_outcomes() {

        let (sender, reply) = PendingReply::channel();
        sender.send(Ok(Frame::encode(MessageKind::Result, 1, &5u64).unwrap().to_bytes())).unwrap();
        let frame = reply.wait(1).await.unwrap();
        assert_eq!(frame.decode::<u64>().unwrap(), 5);

        let (sender, reply) = PendingReply::channel();
        drop(sender);
        assert!(matches!(reply.wait(3).await, Err(Error::WorkerLost(3))));

        let (sender, reply) = PendingReply::channel();
        sender.send(Err(Error::Transport("connection refused".to_string()))).unwrap();
        assert!(matches!(reply.wait(2).await, Err(Error::Transport(_))));
    }
}
