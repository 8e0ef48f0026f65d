//! Launcher - starts the dispatcher loop as a background task

use tokio::task::JoinHandle;
use tracing::{info, instrument};

use contracts::{AnalyzerTransport, BufferStore};

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;

/// Starts at most one dispatcher
///
/// The second `launch` call on the same launcher is rejected with `AlreadyRunning`
/// instead of starting a competing loop.
#[derive(Debug, Default)]
pub struct Launcher {
    running: bool,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `dispatcher.run()` on the tokio runtime and return immediately
    #[instrument(name = "dispatcher_launch", skip(self, dispatcher))]
    pub fn launch<S, T>(
        &mut self,
        dispatcher: Dispatcher<S, T>,
    ) -> Result<JoinHandle<Result<(), DispatcherError>>, DispatcherError>
    where
        S: BufferStore + Send + Sync + 'static,
        T: AnalyzerTransport + Send + 'static,
    {
        if self.running {
            return Err(DispatcherError::AlreadyRunning);
        }
        self.running = true;

        info!("Launching dispatcher");
        Ok(tokio::spawn(dispatcher.run()))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
