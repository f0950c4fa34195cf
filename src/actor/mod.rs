//! Single-writer state owner: the only thread that ever touches the local [Node].
//!
//! Every caller, whether a connection handler or the local front-end, hands a
//! closure over to the worker thread and blocks until it ran. Operations run one
//! at a time in the order they were submitted, so their effects on the store
//! never interleave.

use std::thread::{self, ThreadId};

use flume::{Receiver, Sender};
use tracing::{debug, info};

use crate::common::Node;

type Operation = Box<dyn FnOnce(&mut Node) + Send>;

#[derive(Debug, Clone)]
/// Handle to the worker thread owning a [Node].
///
/// Cloning is cheap, all clones submit to the same mailbox. The worker exits
/// once the last handle is dropped.
pub struct StateOwner {
    sender: Sender<Operation>,
    worker: ThreadId,
}

impl StateOwner {
    /// Moves `node` into a new worker thread and returns a handle to it.
    pub fn spawn(node: Node) -> std::io::Result<StateOwner> {
        let (sender, receiver) = flume::unbounded::<Operation>();

        let handle = thread::Builder::new()
            .name("chord-state-owner".to_string())
            .spawn(move || run(node, receiver))?;

        Ok(StateOwner {
            sender,
            worker: handle.thread().id(),
        })
    }

    /// Runs `operation` on the worker thread and blocks until it returns.
    ///
    /// Must not be called from within another operation, that would wait on
    /// the very thread that is running it. Such calls return
    /// [StateOwnerError::Reentrant].
    pub fn submit<T, F>(&self, operation: F) -> Result<T, StateOwnerError>
    where
        F: FnOnce(&mut Node) -> T + Send + 'static,
        T: Send + 'static,
    {
        let receiver = self.enqueue(operation)?;

        receiver.recv().map_err(|_| StateOwnerError::Stopped)
    }

    /// Async version of [StateOwner::submit].
    #[cfg(feature = "async")]
    pub async fn submit_async<T, F>(&self, operation: F) -> Result<T, StateOwnerError>
    where
        F: FnOnce(&mut Node) -> T + Send + 'static,
        T: Send + 'static,
    {
        let receiver = self.enqueue(operation)?;

        receiver
            .recv_async()
            .await
            .map_err(|_| StateOwnerError::Stopped)
    }

    fn enqueue<T, F>(&self, operation: F) -> Result<Receiver<T>, StateOwnerError>
    where
        F: FnOnce(&mut Node) -> T + Send + 'static,
        T: Send + 'static,
    {
        if thread::current().id() == self.worker {
            return Err(StateOwnerError::Reentrant);
        }

        let (sender, receiver) = flume::bounded::<T>(1);

        self.sender
            .send(Box::new(move |node: &mut Node| {
                let _ = sender.send(operation(node));
            }))
            .map_err(|_| StateOwnerError::Stopped)?;

        Ok(receiver)
    }
}

fn run(mut node: Node, receiver: Receiver<Operation>) {
    info!(address = node.address(), id = %node.id(), "State owner started");

    for operation in receiver.iter() {
        operation(&mut node);
    }

    debug!("State owner thread was shutdown after Drop.");
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOwnerError {
    #[error("State owner thread is not running")]
    Stopped,

    #[error("Operation submitted from within another operation")]
    Reentrant,
}
