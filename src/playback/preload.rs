use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::audio::buffer::{AudioBuffer, decode_narration};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::NarrationAudio;

/// Preload counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreloadStats {
    /// `preload` calls.
    pub requests: u64,
    /// `take` calls answered from the cache.
    pub hits: u64,
    /// `take` calls that found nothing for the index.
    pub misses: u64,
    /// Background decodes that failed.
    pub failures: u64,
    /// Completions discarded because their request was superseded.
    pub stale: u64,
}

#[derive(Debug)]
struct Completion {
    ticket: u64,
    index: usize,
    source: Arc<Vec<u8>>,
    result: ReelResult<AudioBuffer>,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    ticket: u64,
    index: usize,
}

#[derive(Debug)]
struct Ready {
    index: usize,
    source: Arc<Vec<u8>>,
    buffer: AudioBuffer,
}

/// Single-entry cache of the next scene's decoded narration.
///
/// Decodes run on a small rayon pool. Each request carries a ticket; a completion whose ticket
/// is not the current one was superseded (overwritten or invalidated) and is dropped unused.
pub struct PreloadCache {
    sample_rate: u32,
    pool: rayon::ThreadPool,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    next_ticket: u64,
    pending: Option<Pending>,
    ready: Option<Ready>,
    stats: PreloadStats,
}

impl std::fmt::Debug for PreloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadCache")
            .field("sample_rate", &self.sample_rate)
            .field("pending", &self.pending)
            .field("ready", &self.ready.as_ref().map(|r| r.index))
            .field("stats", &self.stats)
            .finish()
    }
}

impl PreloadCache {
    /// Create a cache decoding to `sample_rate` on `threads` workers (default 1).
    pub fn new(sample_rate: u32, threads: Option<usize>) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::validation("preload sample rate must be > 0"));
        }
        let pool = build_thread_pool(threads)?;
        let (tx, rx) = channel();
        Ok(Self {
            sample_rate,
            pool,
            tx,
            rx,
            next_ticket: 1,
            pending: None,
            ready: None,
            stats: PreloadStats::default(),
        })
    }

    /// Counters.
    pub fn stats(&self) -> PreloadStats {
        self.stats
    }

    /// Index of the decode currently in flight, if any.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending.map(|p| p.index)
    }

    /// Index of the ready entry, if any.
    pub fn ready_index(&self) -> Option<usize> {
        self.ready.as_ref().map(|r| r.index)
    }

    /// Start decoding `narration` for scene `index`, replacing whatever was cached or pending.
    ///
    /// A scene without narration clears the cache and schedules nothing.
    pub fn preload(&mut self, index: usize, narration: Option<&NarrationAudio>) {
        self.stats.requests += 1;
        self.ready = None;
        self.pending = None;
        let Some(payload) = narration.cloned() else {
            return;
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(Pending { ticket, index });

        let tx = self.tx.clone();
        let sample_rate = self.sample_rate;
        self.pool.spawn(move || {
            let result = decode_narration(&payload, sample_rate);
            // The cache may be gone already; nothing to report to.
            let _ = tx.send(Completion {
                ticket,
                index,
                source: Arc::clone(&payload.bytes),
                result,
            });
        });
        tracing::debug!(index, ticket, "preload scheduled");
    }

    /// Apply every completion that has already arrived. Never blocks.
    pub fn poll(&mut self) {
        while let Ok(c) = self.rx.try_recv() {
            self.apply(c);
        }
    }

    fn apply(&mut self, c: Completion) {
        match self.pending {
            Some(p) if p.ticket == c.ticket => {
                self.pending = None;
                match c.result {
                    Ok(buffer) => {
                        self.ready = Some(Ready {
                            index: c.index,
                            source: c.source,
                            buffer,
                        })
                    }
                    Err(err) => {
                        self.stats.failures += 1;
                        tracing::warn!(index = c.index, %err, "preload decode failed");
                    }
                }
            }
            _ => {
                self.stats.stale += 1;
                tracing::debug!(index = c.index, ticket = c.ticket, "stale preload dropped");
            }
        }
    }

    /// Take the decoded buffer for `index`.
    ///
    /// Waits for an in-flight decode of the same index; returns `None` when the cache holds
    /// nothing for `index`, in which case the caller decodes synchronously.
    pub fn take(&mut self, index: usize) -> Option<AudioBuffer> {
        self.take_inner(index, None)
    }

    /// Like [`PreloadCache::take`], but also requires the entry to have been decoded from
    /// `payload`. Guards against the list being reordered or re-voiced after the preload.
    pub fn take_matching(&mut self, index: usize, payload: &NarrationAudio) -> Option<AudioBuffer> {
        self.take_inner(index, Some(&payload.bytes))
    }

    fn take_inner(&mut self, index: usize, source: Option<&Arc<Vec<u8>>>) -> Option<AudioBuffer> {
        self.poll();
        while self.pending.is_some_and(|p| p.index == index) {
            match self.rx.recv() {
                Ok(c) => self.apply(c),
                Err(_) => self.pending = None,
            }
        }

        match self.ready.take() {
            Some(r) if r.index == index => {
                if source.is_some_and(|src| !Arc::ptr_eq(src, &r.source)) {
                    self.stats.stale += 1;
                    self.stats.misses += 1;
                    tracing::debug!(index, "preloaded narration no longer matches scene");
                    return None;
                }
                self.stats.hits += 1;
                Some(r.buffer)
            }
            other => {
                self.ready = other;
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Drop the ready entry and abandon any pending decode; it completes unused.
    pub fn invalidate(&mut self) {
        if self.ready.is_some() || self.pending.is_some() {
            tracing::debug!(
                ready = ?self.ready_index(),
                pending = ?self.pending_index(),
                "preload invalidated"
            );
        }
        self.ready = None;
        self.pending = None;
    }
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "preload 'threads' must be >= 1 when set",
        ));
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(1))
        .thread_name(|i| format!("reel-preload-{i}"))
        .build()
        .map_err(|e| ReelError::Other(anyhow::anyhow!("failed to build preload pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/playback/preload.rs"]
mod tests;
