//! Serialized access to the single SQLite connection.
//!
//! The connection lives on a dedicated worker thread, isolated from the
//! async runtime. Callers submit closures through a bounded FIFO queue and
//! await the result on a oneshot channel:
//! - exactly one operation touches the connection at any time
//! - operations run in submission order
//! - an operation whose caller went away before it reached the front of the
//!   queue is dropped without touching the connection
//!
//! Normal `read`/`write` operations are refused until a `bootstrap`
//! operation (the migration) has succeeded.

use rusqlite::Connection;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

use crate::error::DatabaseError;

/// How an operation intends to use the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    /// Schema bootstrap; allowed before the schema is ready.
    Bootstrap,
}

type Task = Box<dyn FnOnce(&mut Session) + Send + 'static>;

enum Command {
    Run(Task),
    Shutdown(oneshot::Sender<()>),
}

/// State owned by the worker thread.
struct Session {
    connection: Connection,
    ready: bool,
}

impl Session {
    fn run<T>(
        &mut self,
        access: Access,
        operation: impl FnOnce(&mut Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        match access {
            Access::Bootstrap => {
                let result = operation(&mut self.connection);
                if result.is_ok() {
                    self.ready = true;
                }
                result
            }
            _ if !self.ready => Err(DatabaseError::SchemaNotReady),
            _ => operation(&mut self.connection),
        }
    }
}

/// Handle to the worker thread that owns the connection.
#[derive(Debug)]
pub struct Channel {
    sender: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl Channel {
    /// Move `connection` onto a new worker thread named `label`.
    ///
    /// `queue_size` bounds the number of operations waiting for the
    /// connection; further submissions wait for room.
    pub fn spawn(connection: Connection, label: &str, queue_size: usize) -> Result<Self, DatabaseError> {
        let (sender, receiver) = mpsc::channel(queue_size.max(1));
        let session = Session {
            connection,
            ready: false,
        };
        let worker = std::thread::Builder::new()
            .name(label.to_owned())
            .spawn(move || worker_loop(receiver, session))
            .map_err(|e| DatabaseError::open(label, e))?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// Run a non-mutating operation.
    pub async fn read<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        self.submit(Access::Read, move |conn| operation(&*conn)).await
    }

    /// Run a mutating operation. Each statement it executes commits on its
    /// own unless the operation opens a transaction itself.
    pub async fn write<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        self.submit(Access::Write, operation).await
    }

    /// Run the schema bootstrap. Its success unlocks `read` and `write`.
    pub async fn bootstrap<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        self.submit(Access::Bootstrap, operation).await
    }

    async fn submit<T, F>(&self, access: Access, operation: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let task: Task = Box::new(move |session: &mut Session| {
            if reply.is_closed() {
                tracing::trace!(?access, "Dropping abandoned database operation");
                return;
            }
            let _ = reply.send(session.run(access, operation));
        });

        self.sender
            .send(Command::Run(task))
            .await
            .map_err(|_| DatabaseError::ChannelClosed)?;
        response.await.map_err(|_| DatabaseError::ChannelClosed)?
    }

    /// Finish the queued operations, close the connection and join the worker.
    pub async fn shutdown(mut self) -> Result<(), DatabaseError> {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Command::Shutdown(ack)).await.is_ok() {
            let _ = done.await;
        }
        match self.worker.take() {
            Some(worker) => tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_err(|_| DatabaseError::WorkerPanicked)?
                .map_err(|_| DatabaseError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

fn worker_loop(mut receiver: mpsc::Receiver<Command>, mut session: Session) {
    tracing::debug!("Database worker started");
    while let Some(command) = receiver.blocking_recv() {
        match command {
            Command::Run(task) => task(&mut session),
            Command::Shutdown(ack) => {
                receiver.close();
                // Operations queued before the shutdown still run.
                while let Ok(Command::Run(task)) = receiver.try_recv() {
                    task(&mut session);
                }
                drop(session);
                let _ = ack.send(());
                tracing::debug!("Database worker stopped");
                return;
            }
        }
    }
    tracing::debug!("Database worker stopped (all handles dropped)");
}
