use std::sync::Arc;

use super::{NormalConfig, Session, SessionConfig, SessionSnapshot};
use crate::blocklist::BlockList;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::hosts::Blocker;
use crate::notify::Notifier;

/// Owns the block list and at most one live session.
///
/// Edits to the block list are refused while a session is live, and refused
/// with [`SessionError::StrictLocked`] while a strict session is active.
/// The Normal duration last started with is kept until that session ends,
/// then falls back to the default.
pub struct SessionController {
    block_list: BlockList,
    normal: NormalConfig,
    session: Option<Session>,
    blocker: Arc<dyn Blocker>,
    notifier: Arc<dyn Notifier>,
}

impl SessionController {
    pub fn new(blocker: Arc<dyn Blocker>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            block_list: BlockList::new(),
            normal: NormalConfig::default(),
            session: None,
            blocker,
            notifier,
        }
    }

    pub fn with_block_list(mut self, block_list: BlockList) -> Self {
        self.block_list = block_list;
        self
    }

    pub fn block_list(&self) -> &BlockList {
        &self.block_list
    }

    /// Duration a Normal session is configured with.
    pub fn normal_config(&self) -> NormalConfig {
        self.normal
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// Add a site; `Ok(false)` when it was already listed.
    pub fn add_site(&mut self, raw: &str) -> Result<bool, SessionError> {
        self.ensure_editable()?;
        Ok(self.block_list.add(raw)?)
    }

    pub fn remove_site(&mut self, index: usize) -> Result<String, SessionError> {
        self.ensure_editable()?;
        Ok(self.block_list.remove(index)?)
    }

    pub async fn start(&mut self, config: SessionConfig) -> Result<Vec<SessionEvent>, SessionError> {
        if let Some(live) = self.session.as_ref().filter(|s| !s.is_idle()) {
            return Err(SessionError::AlreadyRunning(live.mode()));
        }
        if self.block_list.is_empty() {
            return Err(SessionError::EmptyBlockList);
        }

        let mut session = Session::new(config, self.blocker.clone(), self.notifier.clone());
        let events = session.start(self.block_list.domains()).await?;
        if let SessionConfig::Normal(normal) = config {
            self.normal = normal;
        }
        self.session = Some(session);
        Ok(events)
    }

    pub async fn confirm(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let events = self.live_mut()?.confirm().await?;
        self.reap();
        Ok(events)
    }

    pub fn cancel(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let events = self.live_mut()?.cancel()?;
        self.reap();
        Ok(events)
    }

    pub async fn stop(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let events = self.live_mut()?.stop().await?;
        self.reap();
        Ok(events)
    }

    /// Apply a tick reported by [`SessionController::wait_for_tick`]; see
    /// [`Session::tick`].
    pub async fn tick(&mut self) -> Vec<SessionEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let events = session.tick().await;
        self.reap();
        events
    }

    /// Wait for the live session's next tick; `None` once nothing is counting.
    pub async fn next_tick(&mut self) -> Option<Vec<SessionEvent>> {
        let events = self.session.as_mut()?.next_tick().await;
        self.reap();
        events
    }

    /// See [`Session::wait_for_tick`].
    pub async fn wait_for_tick(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => session.wait_for_tick().await,
            None => false,
        }
    }

    fn live_mut(&mut self) -> Result<&mut Session, SessionError> {
        self.session
            .as_mut()
            .filter(|s| !s.is_idle())
            .ok_or(SessionError::NotRunning)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match &self.session {
            Some(s) if s.locks_block_list() => Err(SessionError::StrictLocked),
            Some(s) if !s.is_idle() => Err(SessionError::SessionActive),
            _ => Ok(()),
        }
    }

    fn reap(&mut self) {
        let Some(ended) = self.session.as_ref().filter(|s| s.is_idle()) else {
            return;
        };
        if let SessionConfig::Normal(_) = ended.config() {
            self.normal = NormalConfig::default();
        }
        self.session = None;
    }
}
