use crate::logger::ActivityLog;
use crate::worker::worker_task;
use crate::{SignCommand, SignUpdate};
use pdf_sign::PageRasterizer;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendError, TryRecvError};
use tokio::task::JoinHandle;

/// A running signing worker, the channel ends a host talks to it through,
/// and the activity log its handlers report into
pub struct SignWorker {
    command_tx: mpsc::UnboundedSender<SignCommand>,
    update_rx: mpsc::UnboundedReceiver<SignUpdate>,
    activity: ActivityLog,
    task: JoinHandle<()>,
}

impl SignWorker {
    /// Install `activity` as the global logger, then spawn the worker on
    /// `tokio_handle`.
    ///
    /// Fails without spawning if a global logger is already installed.
    pub fn spawn(
        tokio_handle: &tokio::runtime::Handle,
        rasterizer: Arc<dyn PageRasterizer>,
        activity: ActivityLog,
    ) -> Result<Self, log::SetLoggerError> {
        activity.clone().init()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let task = tokio_handle.spawn(worker_task(rasterizer, command_rx, update_tx));
        log::debug!("Signing worker started");

        Ok(Self {
            command_tx,
            update_rx,
            activity,
            task,
        })
    }

    pub fn send(&self, command: SignCommand) -> Result<(), SendError<SignCommand>> {
        self.command_tx.send(command)
    }

    /// Wait for the next update; `None` once the worker has exited
    pub async fn recv(&mut self) -> Option<SignUpdate> {
        self.update_rx.recv().await
    }

    /// Next pending update without waiting, for hosts polling once per frame
    pub fn try_recv(&mut self) -> Result<SignUpdate, TryRecvError> {
        self.update_rx.try_recv()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Most recent activity message, e.g. for a status line
    pub fn latest_activity(&self) -> Option<String> {
        self.activity.latest_message()
    }

    /// Close the command channel and wait for the worker to finish what is queued
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        drop(self.command_tx);
        self.task.await
    }
}
