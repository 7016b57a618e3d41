//! Adaptive codec that detects the framing discipline in use.
//!
//! [`AutoFrameCodec`] wraps an ordered candidate list. Each decode pass runs
//! every candidate against a local copy of the view, scores the results
//! (frames decoded, bytes consumed, unconsumed remainder), applies the
//! winner to the real view, and queues the winner's frames. A candidate that
//! keeps winning consecutive passes gets locked in, after which all decodes
//! are delegated to it with no further scoring.
//!
//! # Example
//!
//! ```
//! use autoframe::codec::{AutoFrameCodec, FixedLengthCodec, FrameCodec, NewlineCodec};
//!
//! let mut auto = AutoFrameCodec::new(vec![
//!     Box::new(NewlineCodec),
//!     Box::new(FixedLengthCodec::new(8).unwrap()),
//! ])
//! .unwrap();
//!
//! let mut view: &[u8] = b"hello\nworld\n";
//! assert_eq!(&auto.decode(&mut view).unwrap()[..], b"hello");
//! assert_eq!(&auto.decode(&mut view).unwrap()[..], b"world");
//! assert!(view.is_empty());
//! ```

use std::collections::VecDeque;

use bytes::Bytes;

use super::FrameCodec;
use crate::error::{FrameError, Result};

/// Tuning knobs for [`AutoFrameCodec`].
#[derive(Debug, Clone, Copy)]
pub struct AutoFrameConfig {
    /// Per-frame sanity bound; a frame outside (0, max] invalidates the
    /// candidate's whole pass.
    pub max_frame_bytes: usize,
    /// Skip scoring while the view is shorter than this.
    pub min_buffer_to_consider: usize,
    /// Halt a candidate's scoring run at this many frames.
    pub max_frames_per_pass: usize,
    /// Retain at most this many frames per pass; excess frames still count
    /// toward the score but are dropped.
    pub max_queue_frames: usize,
    /// Per-byte penalty for bytes a candidate leaves unconsumed.
    pub remainder_penalty: i64,
    /// Consecutive wins required before locking onto a candidate.
    pub lock_after_hits: u32,
    /// Minimum frames in the winning pass for it to count toward a lock.
    pub min_frames_to_lock: usize,
}

impl Default for AutoFrameConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 4096,
            min_buffer_to_consider: 4,
            max_frames_per_pass: 64,
            max_queue_frames: 16,
            remainder_penalty: 2,
            lock_after_hits: 3,
            min_frames_to_lock: 2,
        }
    }
}

/// Result of running one candidate over a copy of the view.
struct PassResult {
    candidate: usize,
    score: i64,
    consumed: usize,
    decoded: usize,
    frames: Vec<Bytes>,
}

/// Auto-detecting meta-codec.
///
/// Streak counters are keyed by candidate position, so two candidates with
/// identical parameters are still distinct entries. All state (pending
/// queue, streaks, lock) is mutated only inside `decode`; the codec is not
/// reentrant and must not be shared across concurrent decodes.
pub struct AutoFrameCodec {
    candidates: Vec<Box<dyn FrameCodec>>,
    config: AutoFrameConfig,
    default_encoder: Option<Box<dyn FrameCodec>>,
    pending: VecDeque<Bytes>,
    streaks: Vec<u32>,
    locked: Option<usize>,
}

impl AutoFrameCodec {
    /// Create an auto-codec over the given candidates with default tuning.
    ///
    /// Fails with [`FrameError::InvalidConfig`] when the candidate list is
    /// empty.
    pub fn new(candidates: Vec<Box<dyn FrameCodec>>) -> Result<Self> {
        Self::with_config(candidates, AutoFrameConfig::default())
    }

    /// Create an auto-codec with explicit tuning.
    pub fn with_config(
        candidates: Vec<Box<dyn FrameCodec>>,
        config: AutoFrameConfig,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(FrameError::InvalidConfig(
                "auto codec needs at least one candidate".to_string(),
            ));
        }
        let streaks = vec![0; candidates.len()];
        Ok(Self {
            candidates,
            config,
            default_encoder: None,
            pending: VecDeque::new(),
            streaks,
            locked: None,
        })
    }

    /// Set the encoder used before a lock is established. Without one,
    /// encode falls back to the first candidate.
    pub fn set_default_encoder(&mut self, encoder: Box<dyn FrameCodec>) {
        self.default_encoder = Some(encoder);
    }

    /// Read-only mode tag: `AUTO` before a lock, `LOCKED:<codec-name>`
    /// afterwards.
    pub fn mode(&self) -> String {
        match self.locked {
            Some(i) => format!("LOCKED:{}", self.candidates[i].name()),
            None => "AUTO".to_string(),
        }
    }

    /// Whether a winner has been locked in.
    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Run one candidate over a copy of the view and score it.
    ///
    /// Returns `None` for a candidate that decodes nothing or produces a
    /// frame outside the sanity bound.
    fn score_candidate(&mut self, index: usize, view: &[u8]) -> Option<PassResult> {
        let cfg = self.config;
        let codec = &mut self.candidates[index];

        let mut local: &[u8] = view;
        let mut decoded = 0usize;
        let mut frames = Vec::new();

        while decoded < cfg.max_frames_per_pass {
            let Some(frame) = codec.decode(&mut local) else {
                break;
            };
            if frame.is_empty() || frame.len() > cfg.max_frame_bytes {
                return None;
            }
            decoded += 1;
            if frames.len() < cfg.max_queue_frames {
                frames.push(frame);
            }
        }

        if decoded == 0 {
            return None;
        }

        let consumed = view.len() - local.len();
        let remainder = local.len();
        let score =
            decoded as i64 * 1000 + consumed as i64 - remainder as i64 * cfg.remainder_penalty;

        Some(PassResult {
            candidate: index,
            score,
            consumed,
            decoded,
            frames,
        })
    }

    /// Streak bookkeeping after a scoring pass: the winner gains one, every
    /// other candidate loses one (floored at zero). A sufficient streak on
    /// a sufficiently productive pass sets the lock.
    fn update_streaks(&mut self, winner: usize, decoded: usize) {
        for (i, streak) in self.streaks.iter_mut().enumerate() {
            if i == winner {
                *streak += 1;
            } else {
                *streak = streak.saturating_sub(1);
            }
        }

        if self.streaks[winner] >= self.config.lock_after_hits
            && decoded >= self.config.min_frames_to_lock
        {
            tracing::debug!(
                "auto codec locking onto {} after {} wins",
                self.candidates[winner].name(),
                self.streaks[winner]
            );
            self.locked = Some(winner);
        }
    }
}

impl FrameCodec for AutoFrameCodec {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if let Some(i) = self.locked {
            return self.candidates[i].encode(payload);
        }
        if let Some(encoder) = &self.default_encoder {
            return encoder.encode(payload);
        }
        self.candidates[0].encode(payload)
    }

    fn decode(&mut self, view: &mut &[u8]) -> Option<Bytes> {
        // Drain frames queued by an earlier pass before anything else.
        if let Some(frame) = self.pending.pop_front() {
            return Some(frame);
        }

        if let Some(i) = self.locked {
            return self.candidates[i].decode(view);
        }

        if view.len() < self.config.min_buffer_to_consider {
            return None;
        }

        let snapshot = *view;
        let mut best: Option<PassResult> = None;
        for index in 0..self.candidates.len() {
            if let Some(result) = self.score_candidate(index, snapshot) {
                let better = match &best {
                    Some(b) => result.score > b.score,
                    None => true,
                };
                if better {
                    best = Some(result);
                }
            }
        }

        let winner = best?;
        *view = &snapshot[winner.consumed..];
        self.pending.extend(winner.frames);
        self.update_streaks(winner.candidate, winner.decoded);

        self.pending.pop_front()
    }
}
