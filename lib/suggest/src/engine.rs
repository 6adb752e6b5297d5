//! The suggestion engine task.
//!
//! The engine re-ranks on every selection change and publishes the top
//! suggestions over a watch channel. Ranking runs off the engine loop,
//! so a selection change arriving mid-rank supersedes the in-flight
//! request; results from a superseded rank are discarded rather than
//! flashing outdated chips. When the ranker fails, the engine silently
//! substitutes the generic fallback list, filtered against the canvas.

use crate::config::SuggestConfig;
use crate::ranker::{SuggestionContext, SuggestionRanker, filter_and_sort};
use crate::table::Candidate;
use agentflow_core::SuggestionId;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// A suggestion chip shown next to the selected node.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// Identifier for dismissal.
    pub id: SuggestionId,
    /// The suggested follow-up node.
    pub candidate: Candidate,
}

enum EngineMsg {
    Context(Option<SuggestionContext>),
    Dismiss(SuggestionId),
    DismissAll,
    Shutdown,
}

/// Handle to a running suggestion engine.
pub struct SuggestionHandle {
    tx: mpsc::UnboundedSender<EngineMsg>,
    suggestions_rx: watch::Receiver<Vec<Suggestion>>,
    task: JoinHandle<()>,
}

impl SuggestionHandle {
    /// Announces a selection change. `None` clears the selection and
    /// the suggestions with it.
    pub fn context_changed(&self, context: Option<SuggestionContext>) {
        self.send(EngineMsg::Context(context));
    }

    /// Dismisses a single suggestion.
    pub fn dismiss(&self, id: SuggestionId) {
        self.send(EngineMsg::Dismiss(id));
    }

    /// Dismisses all current suggestions.
    pub fn dismiss_all(&self) {
        self.send(EngineMsg::DismissAll);
    }

    /// Returns a watch receiver for the suggestion list.
    #[must_use]
    pub fn suggestions(&self) -> watch::Receiver<Vec<Suggestion>> {
        self.suggestions_rx.clone()
    }

    /// Returns the current suggestion list.
    #[must_use]
    pub fn current_suggestions(&self) -> Vec<Suggestion> {
        self.suggestions_rx.borrow().clone()
    }

    /// Stops the engine task.
    pub async fn shutdown(self) {
        let _ = self.tx.send(EngineMsg::Shutdown);
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "suggestion engine ended abnormally");
        }
    }

    fn send(&self, msg: EngineMsg) {
        if self.tx.send(msg).is_err() {
            tracing::warn!("suggestion engine has stopped; dropping message");
        }
    }
}

/// The background ranking loop.
pub struct SuggestionEngine {
    ranker: Arc<dyn SuggestionRanker>,
    fallback: Vec<Candidate>,
    config: SuggestConfig,
    suggestions_tx: watch::Sender<Vec<Suggestion>>,
}

impl SuggestionEngine {
    /// Spawns the engine task and returns its handle. `fallback` is the
    /// candidate list substituted when the ranker fails.
    #[must_use]
    pub fn spawn(
        ranker: Arc<dyn SuggestionRanker>,
        fallback: Vec<Candidate>,
        config: SuggestConfig,
    ) -> SuggestionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (suggestions_tx, suggestions_rx) = watch::channel(Vec::new());
        let engine = Self {
            ranker,
            fallback,
            config,
            suggestions_tx,
        };
        let task = tokio::spawn(engine.run(rx));
        SuggestionHandle {
            tx,
            suggestions_rx,
            task,
        }
    }

    async fn run(self, mut rx: mpsc::UnboundedReceiver<EngineMsg>) {
        // Bumped on every selection change; a rank result only lands if
        // its generation is still current.
        let mut generation: u64 = 0;
        let mut in_flight: Option<(u64, JoinHandle<Vec<Candidate>>)> = None;

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(EngineMsg::Context(Some(context))) => {
                        generation += 1;
                        self.suggestions_tx.send_replace(Vec::new());
                        let ranker = Arc::clone(&self.ranker);
                        let fallback = self.fallback.clone();
                        let task = tokio::spawn(async move {
                            match ranker.rank(&context).await {
                                Ok(candidates) => candidates,
                                Err(err) => {
                                    tracing::debug!(
                                        error = %err,
                                        "suggestion ranking failed; substituting fallback candidates"
                                    );
                                    filter_and_sort(&fallback, &context.present)
                                }
                            }
                        });
                        in_flight = Some((generation, task));
                    }
                    Some(EngineMsg::Context(None)) => {
                        generation += 1;
                        in_flight = None;
                        self.suggestions_tx.send_replace(Vec::new());
                    }
                    Some(EngineMsg::Dismiss(id)) => {
                        self.suggestions_tx.send_modify(|suggestions| {
                            suggestions.retain(|suggestion| suggestion.id != id);
                        });
                    }
                    Some(EngineMsg::DismissAll) => {
                        // Dismissal also suppresses any rank still in
                        // flight; only the next selection change brings
                        // suggestions back.
                        generation += 1;
                        in_flight = None;
                        self.suggestions_tx.send_replace(Vec::new());
                    }
                    Some(EngineMsg::Shutdown) | None => break,
                },
                (rank_generation, mut candidates) = join_rank(&mut in_flight) => {
                    in_flight = None;
                    if rank_generation != generation {
                        tracing::debug!("discarding superseded suggestion ranking");
                        continue;
                    }
                    candidates.truncate(self.config.top_k);
                    let suggestions = candidates
                        .into_iter()
                        .map(|candidate| Suggestion {
                            id: SuggestionId::new(),
                            candidate,
                        })
                        .collect();
                    self.suggestions_tx.send_replace(suggestions);
                }
            }
        }
    }
}

async fn join_rank(
    in_flight: &mut Option<(u64, JoinHandle<Vec<Candidate>>)>,
) -> (u64, Vec<Candidate>) {
    match in_flight.as_mut() {
        Some((generation, task)) => {
            let generation = *generation;
            let candidates = match task.await {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(error = %err, "ranking task ended abnormally");
                    Vec::new()
                }
            };
            (generation, candidates)
        }
        None => std::future::pending().await,
    }
}
