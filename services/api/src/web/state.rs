//! services/api/src/web/state.rs
//!
//! Defines the shared application state handed to every handler.

use crate::config::Config;
use rango_core::ports::{DatabaseService, SessionStore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds the state around one adapter that serves both ports.
    pub fn with_backend<B>(backend: Arc<B>, config: Arc<Config>) -> Self
    where
        B: DatabaseService + SessionStore + 'static,
    {
        Self {
            db: backend.clone(),
            sessions: backend,
            config,
        }
    }
}
