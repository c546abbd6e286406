/// Background Connection Module
///
/// Runs a `ConnectionManager` on its own thread so that slow driver calls do
/// not block an interactive caller. Requests are executed one at a time in
/// the order they were submitted, which keeps connect, list and read in the
/// same sequence as the synchronous API.

use crate::core::db::connection::{ConnectOutcome, ConnectionManager, ReadOutcome};
use crate::core::{AccviewError, Result};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// An operation for the background connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    SetPath(PathBuf),
    Connect,
    ListTables,
    ReadTable(String),
    Disconnect,
}

/// The reply to a `Request`, one variant per request kind.
#[derive(Debug)]
pub enum Reply {
    PathSet,
    Connect(Result<ConnectOutcome>),
    Tables(Result<Vec<String>>),
    Table(Result<ReadOutcome>),
    Disconnected,
}

type Job = (Request, mpsc::Sender<Reply>);

/// Handle for a reply that may not have arrived yet.
#[derive(Debug)]
pub struct PendingReply {
    receiver: mpsc::Receiver<Reply>,
}

impl PendingReply {
    /// Blocks until the reply arrives.
    ///
    /// # Errors
    ///
    /// `AccviewError::Command` if the worker thread has gone away.
    pub fn wait(self) -> Result<Reply> {
        self.receiver
            .recv()
            .map_err(|_| AccviewError::Command("background connection stopped".to_string()))
    }

    /// Receives the reply with a timeout
    pub fn recv_timeout(&self, timeout: Duration) -> std::result::Result<Reply, mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Attempts to receive the reply without blocking
    pub fn try_recv(&self) -> std::result::Result<Reply, mpsc::TryRecvError> {
        self.receiver.try_recv()
    }
}

/// A connection manager owned by a dedicated worker thread.
#[derive(Debug)]
pub struct BackgroundConnection {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl BackgroundConnection {
    /// Moves `manager` onto a new worker thread.
    pub fn spawn(mut manager: ConnectionManager) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();

        let worker = thread::spawn(move || {
            for (request, reply_to) in receiver {
                debug!(?request, "background request");
                let reply = execute(&mut manager, request);
                // The caller may have dropped its PendingReply; that is not an error.
                let _ = reply_to.send(reply);
            }
            debug!("background connection stopped");
        });

        BackgroundConnection {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queues a request behind every request submitted before it.
    ///
    /// # Errors
    ///
    /// `AccviewError::Command` if the worker thread has gone away.
    pub fn submit(&self, request: Request) -> Result<PendingReply> {
        let (reply_to, receiver) = mpsc::channel();
        self.sender
            .as_ref()
            .ok_or_else(|| AccviewError::Command("background connection stopped".to_string()))?
            .send((request, reply_to))
            .map_err(|_| AccviewError::Command("background connection stopped".to_string()))?;
        Ok(PendingReply { receiver })
    }

    /// Submits a request and waits for its reply.
    pub fn call(&self, request: Request) -> Result<Reply> {
        self.submit(request)?.wait()
    }
}

impl Drop for BackgroundConnection {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once queued jobs finish.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn execute(manager: &mut ConnectionManager, request: Request) -> Reply {
    match request {
        Request::SetPath(path) => {
            manager.set_path(path);
            Reply::PathSet
        }
        Request::Connect => Reply::Connect(manager.connect()),
        Request::ListTables => Reply::Tables(manager.list_tables()),
        Request::ReadTable(name) => Reply::Table(manager.read_table(&name)),
        Request::Disconnect => {
            manager.disconnect();
            Reply::Disconnected
        }
    }
}
