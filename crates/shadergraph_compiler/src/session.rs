// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debounced compile session for interactive editing.
//!
//! The editor submits a graph on every change. Only the newest submission
//! is compiled, once no further change has arrived for the debounce window.

use crate::compiler::{CompileRequest, CompileResponse, ShaderCompiler};
use crate::config::SessionConfig;
use crate::graph::Graph;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters for a compile session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Graphs submitted
    pub submitted: u64,
    /// Compiles performed
    pub compiled: u64,
    /// Submissions replaced before they were compiled
    pub superseded: u64,
    /// Wall time of the last compile
    pub last_duration: Option<Duration>,
}

/// A compile that ran
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Submission number this response belongs to
    pub generation: u64,
    /// Compiler response
    pub response: CompileResponse,
}

#[derive(Debug)]
struct Pending {
    request: CompileRequest,
    generation: u64,
    submitted_at: Instant,
}

/// Latest-wins compile queue
pub struct CompileSession<'r> {
    compiler: ShaderCompiler<'r>,
    debounce: Duration,
    pending: Option<Pending>,
    generation: u64,
    stats: Arc<RwLock<SessionStats>>,
}

impl<'r> CompileSession<'r> {
    /// Create a session
    pub fn new(compiler: ShaderCompiler<'r>, config: SessionConfig) -> Self {
        Self {
            compiler,
            debounce: config.debounce(),
            pending: None,
            generation: 0,
            stats: Arc::new(RwLock::new(SessionStats::default())),
        }
    }

    /// Set the debounce window
    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Queue a graph, replacing any queued one. Returns its generation.
    pub fn submit(&mut self, graph: Graph) -> u64 {
        self.submit_at(graph, Instant::now())
    }

    /// Queue a graph as of `now`
    pub fn submit_at(&mut self, graph: Graph, now: Instant) -> u64 {
        self.generation += 1;
        let request = CompileRequest {
            graph,
            language: self.compiler.options().language,
            optimize: self.compiler.options().optimize,
        };
        let replaced = self.pending.replace(Pending {
            request,
            generation: self.generation,
            submitted_at: now,
        });

        let mut stats = self.stats.write();
        stats.submitted += 1;
        if let Some(old) = replaced {
            stats.superseded += 1;
            tracing::trace!(generation = old.generation, "superseded pending compile");
        }
        self.generation
    }

    /// Whether a graph is waiting
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Compile the queued graph if the debounce window has passed
    pub fn poll(&mut self) -> Option<SessionOutcome> {
        self.poll_at(Instant::now())
    }

    /// Compile the queued graph if the debounce window has passed as of `now`
    pub fn poll_at(&mut self, now: Instant) -> Option<SessionOutcome> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.submitted_at) >= self.debounce);
        if ready {
            self.flush()
        } else {
            None
        }
    }

    /// Compile the queued graph immediately
    pub fn flush(&mut self) -> Option<SessionOutcome> {
        let pending = self.pending.take()?;
        let response = self.compiler.compile_request(&pending.request);

        {
            let mut stats = self.stats.write();
            stats.compiled += 1;
            stats.last_duration = Some(Duration::from_secs_f64(response.total_time_ms / 1000.0));
        }
        tracing::debug!(
            generation = pending.generation,
            success = response.success,
            time_ms = response.total_time_ms,
            "session compile finished"
        );

        Some(SessionOutcome {
            generation: pending.generation,
            response,
        })
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Shared handle to the counters
    pub fn stats_handle(&self) -> Arc<RwLock<SessionStats>> {
        Arc::clone(&self.stats)
    }
}
