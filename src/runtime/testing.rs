//! Mock implementations for testing
//!
//! These mocks enable turn-level testing without real I/O.

use super::traits::*;
use crate::state_machine::{ConversationState, UserIdentity};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-memory storage
// ============================================================================

/// Storage keeping serialized blobs in memory, with failure injection
#[derive(Default)]
pub struct MemoryStorage {
    states: Mutex<HashMap<String, String>>,
    identities: Mutex<HashMap<String, String>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    state_loads: AtomicUsize,
    state_saves: AtomicUsize,
    identity_saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load fail
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent save fail
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Store a state directly, bypassing the counters
    pub fn put_state(&self, key: &str, state: &ConversationState) {
        let json = serde_json::to_string(state).unwrap();
        self.states.lock().unwrap().insert(key.to_string(), json);
    }

    pub fn put_identity(&self, key: &str, identity: &UserIdentity) {
        let json = serde_json::to_string(identity).unwrap();
        self.identities.lock().unwrap().insert(key.to_string(), json);
    }

    pub fn state(&self, key: &str) -> Option<ConversationState> {
        self.state_json(key)
            .map(|json| serde_json::from_str(&json).unwrap())
    }

    pub fn state_json(&self, key: &str) -> Option<String> {
        self.states.lock().unwrap().get(key).cloned()
    }

    pub fn identity(&self, key: &str) -> Option<UserIdentity> {
        self.identities
            .lock()
            .unwrap()
            .get(key)
            .map(|json| serde_json::from_str(json).unwrap())
    }

    pub fn state_loads(&self) -> usize {
        self.state_loads.load(Ordering::SeqCst)
    }

    pub fn state_saves(&self) -> usize {
        self.state_saves.load(Ordering::SeqCst)
    }

    pub fn identity_saves(&self) -> usize {
        self.identity_saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStorage {
    async fn load_state(&self, key: &str) -> Result<ConversationState, String> {
        self.state_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err("injected load failure".to_string());
        }
        match self.states.lock().unwrap().get(key) {
            Some(json) => serde_json::from_str(json).map_err(|e| e.to_string()),
            None => Ok(ConversationState::default()),
        }
    }

    async fn save_state(&self, key: &str, state: &ConversationState) -> Result<(), String> {
        self.state_saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err("injected save failure".to_string());
        }
        let json = serde_json::to_string(state).map_err(|e| e.to_string())?;
        self.states.lock().unwrap().insert(key.to_string(), json);
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for MemoryStorage {
    async fn load_identity(&self, key: &str) -> Result<UserIdentity, String> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err("injected load failure".to_string());
        }
        match self.identities.lock().unwrap().get(key) {
            Some(json) => serde_json::from_str(json).map_err(|e| e.to_string()),
            None => Ok(UserIdentity::default()),
        }
    }

    async fn save_identity(&self, key: &str, identity: &UserIdentity) -> Result<(), String> {
        self.identity_saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err("injected save failure".to_string());
        }
        let json = serde_json::to_string(identity).map_err(|e| e.to_string())?;
        self.identities.lock().unwrap().insert(key.to_string(), json);
        Ok(())
    }
}

// ============================================================================
// Deterministic references and clock
// ============================================================================

/// Order references `TEST-0001`, `TEST-0002`, ...
#[derive(Default)]
pub struct SequentialReferences {
    next: AtomicU64,
}

impl OrderReferences for SequentialReferences {
    fn next_reference(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("TEST-{n:04}")
    }
}

/// Clock frozen at one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    /// Sunday 2026-10-18
    pub fn sunday() -> Self {
        Self(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
