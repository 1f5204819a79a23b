use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use dispatch_core::CadState;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    pub cad: Arc<Mutex<CadState>>,
    pub config: Arc<ConsoleConfig>,
}

impl AppState {
    pub fn new(cad: CadState, config: ConsoleConfig) -> Self {
        Self {
            cad: Arc::new(Mutex::new(cad)),
            config: Arc::new(config),
        }
    }

    /// Runs `f` with the console state locked.
    pub fn with_cad<T>(
        &self,
        f: impl FnOnce(&mut CadState) -> Result<T, ConsoleError>,
    ) -> Result<T, ConsoleError> {
        let mut guard = self.cad.lock().map_err(|_| ConsoleError::StatePoisoned)?;
        f(&mut guard)
    }
}
