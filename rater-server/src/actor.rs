//! The engine actor.
//!
//! A single task owns the [`DecisionEngine`] and, through it, the mark
//! store. Transports and the expiry scheduler talk to it over a channel,
//! which serializes every record, count, and purge: an acknowledged mark is
//! always visible to later counts, and purges interleave with requests at
//! whole-message granularity.

use anyhow::Result;
use rater::{DecisionEngine, MemoryStore, Verdict};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};

/// Message types for the engine actor
pub enum EngineMessage {
    Decide {
        line: String,
        response_tx: oneshot::Sender<Verdict>,
    },
    Purge {
        response_tx: oneshot::Sender<Result<usize>>,
    },
}

/// Handle to communicate with the engine actor
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineMessage>,
}

impl EngineHandle {
    /// Decide one request line.
    pub async fn decide(&self, line: String) -> Result<Verdict> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(EngineMessage::Decide { line, response_tx })
            .await
            .map_err(|_| anyhow::anyhow!("Engine actor has shut down"))?;

        response_rx
            .await
            .map_err(|_| anyhow::anyhow!("Engine actor dropped response channel"))
    }

    /// Expire marks older than the actor's retention horizon.
    ///
    /// Returns the number of marks removed.
    pub async fn purge(&self) -> Result<usize> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(EngineMessage::Purge { response_tx })
            .await
            .map_err(|_| anyhow::anyhow!("Engine actor has shut down"))?;

        response_rx
            .await
            .map_err(|_| anyhow::anyhow!("Engine actor dropped response channel"))?
    }
}

/// The engine actor
pub struct EngineActor;

impl EngineActor {
    /// Spawn the actor that owns the decision engine.
    ///
    /// `retention` is the global horizon applied by purge requests; it must
    /// be at least as large as the largest configured window for counts to
    /// be correct over the full window.
    pub fn spawn(
        buffer_size: usize,
        engine: DecisionEngine<MemoryStore>,
        retention: Duration,
    ) -> EngineHandle {
        let (tx, rx) = mpsc::channel(buffer_size);

        tokio::spawn(async move {
            run_actor(rx, engine, retention).await;
        });

        EngineHandle { tx }
    }
}

async fn run_actor(
    mut rx: mpsc::Receiver<EngineMessage>,
    mut engine: DecisionEngine<MemoryStore>,
    retention: Duration,
) {
    while let Some(msg) = rx.recv().await {
        match msg {
            EngineMessage::Decide { line, response_tx } => {
                let verdict = engine.decide(&line, SystemTime::now());
                // Ignore send errors - receiver may have gone away
                let _ = response_tx.send(verdict);
            }
            EngineMessage::Purge { response_tx } => {
                let result = engine
                    .purge_older_than(retention, SystemTime::now())
                    .map_err(|e| anyhow::anyhow!("purge failed: {e}"));
                let _ = response_tx.send(result);
            }
        }
    }

    tracing::info!("Engine actor shutting down");
}
