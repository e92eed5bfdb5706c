// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 tilecast contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Frame pacer
//!
//! Maps the hardware vblank counter onto a logical movie-frame index:
//! `index = floor(hw_counter * movie_rate / refresh_rate)`. Four strategies
//! compute the same function with different cost profiles; they agree exactly
//! for every counter in the supported range, with exact division as the
//! oracle (tested, including a property sweep). The lookup table is the
//! default: lowest and most predictable per-call cost, at the price of one
//! table entry per hardware tick of the movie.
//!
//! The pacer is deliberately dumb about frame parity. When decode overruns
//! and the index jumps by more than one, fixing up the tile-region parity is
//! the orchestrator's documented job, not the pacer's.

use crate::core::vdp::VideoStandard;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Numeric strategy used to derive the logical frame index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacingStrategy {
    /// Exact integer division per call; the oracle the others must match
    ExactDivision,
    /// 32-bit fixed-point reciprocal multiply and shift
    Reciprocal,
    /// Incremental advance from the previous index via a remainder
    /// accumulator; cheapest when the index rarely changes
    Delta,
    /// Table built once at playback start, indexed by the raw counter
    #[default]
    LookupTable,
}

/// Hardware-tick to movie-frame index converter
///
/// Output is monotonic non-decreasing for non-decreasing input on every
/// strategy; the delta strategy additionally requires its inputs to be
/// non-decreasing (true for a vblank counter).
pub struct FramePacer {
    strategy: PacingStrategy,
    /// Movie frames per second
    movie_rate: u32,
    /// Display refreshes per second
    refresh_rate: u32,
    /// `ceil(movie_rate << 32 / refresh_rate)` for the reciprocal strategy
    reciprocal_q32: u64,
    /// Delta-strategy state: last input tick
    last_tick: u32,
    /// Delta-strategy state: index at `last_tick`
    last_index: u32,
    /// Delta-strategy state: `movie_rate * last_tick mod refresh_rate`
    remainder: u32,
    /// Lookup table, one entry per supported hardware tick
    table: Vec<u32>,
}

impl FramePacer {
    /// Create a pacer for one playback run
    ///
    /// `movie_frames` bounds the lookup table: the table covers every
    /// hardware tick the movie can span, plus one trailing entry so the tick
    /// that finishes the movie still resolves.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilecast::core::pacer::{FramePacer, PacingStrategy};
    /// use tilecast::core::vdp::VideoStandard;
    ///
    /// let mut pacer = FramePacer::new(
    ///     VideoStandard::Ntsc,
    ///     15,
    ///     4,
    ///     PacingStrategy::LookupTable,
    /// );
    /// // 60 Hz refresh at 15 fps: one movie frame every 4 ticks
    /// assert_eq!(pacer.logical_frame(0), 0);
    /// assert_eq!(pacer.logical_frame(3), 0);
    /// assert_eq!(pacer.logical_frame(4), 1);
    /// ```
    pub fn new(
        standard: VideoStandard,
        movie_rate: u32,
        movie_frames: u32,
        strategy: PacingStrategy,
    ) -> Self {
        let refresh_rate = standard.refresh_rate();
        let reciprocal_q32 = ((movie_rate as u64) << 32).div_ceil(refresh_rate as u64);

        let table = if strategy == PacingStrategy::LookupTable {
            let ticks = Self::max_ticks(movie_rate, refresh_rate, movie_frames);
            let mut table = Vec::with_capacity(ticks as usize);
            for tick in 0..ticks {
                table.push((tick as u64 * movie_rate as u64 / refresh_rate as u64) as u32);
            }
            log::debug!(
                "pacer lookup table: {} entries ({} movie frames at {}/{} Hz)",
                table.len(),
                movie_frames,
                movie_rate,
                refresh_rate
            );
            table
        } else {
            Vec::new()
        };

        Self {
            strategy,
            movie_rate,
            refresh_rate,
            reciprocal_q32,
            last_tick: 0,
            last_index: 0,
            remainder: 0,
            table,
        }
    }

    /// Hardware ticks a movie of `frames` frames spans, plus one
    const fn max_ticks(movie_rate: u32, refresh_rate: u32, frames: u32) -> u32 {
        (frames * refresh_rate).div_ceil(movie_rate) + 1
    }

    /// Strategy in use
    pub fn strategy(&self) -> PacingStrategy {
        self.strategy
    }

    /// Forget incremental state (used when playback loops and the tick
    /// counter restarts from a new origin)
    pub fn reset(&mut self) {
        self.last_tick = 0;
        self.last_index = 0;
        self.remainder = 0;
    }

    /// Convert a hardware vblank count into the logical frame index
    #[inline]
    pub fn logical_frame(&mut self, hw_tick: u32) -> u32 {
        match self.strategy {
            PacingStrategy::ExactDivision => self.exact(hw_tick),
            PacingStrategy::Reciprocal => self.reciprocal(hw_tick),
            PacingStrategy::Delta => self.delta(hw_tick),
            PacingStrategy::LookupTable => self.lookup(hw_tick),
        }
    }

    #[inline(always)]
    fn exact(&self, hw_tick: u32) -> u32 {
        ((hw_tick as u64 * self.movie_rate as u64) / self.refresh_rate as u64) as u32
    }

    /// `floor(tick * rate / refresh)` via one 64-bit multiply
    ///
    /// The fraction is `ceil(rate << 32 / refresh)`, whose error term is
    /// small enough that the floor matches exact division for any tick a
    /// 32-bit counter can hold at the supported rate pairs.
    #[inline(always)]
    fn reciprocal(&self, hw_tick: u32) -> u32 {
        ((hw_tick as u64 * self.reciprocal_q32) >> 32) as u32
    }

    /// Advance incrementally from the last computed index
    fn delta(&mut self, hw_tick: u32) -> u32 {
        let elapsed = hw_tick.saturating_sub(self.last_tick);
        if elapsed > 0 {
            let acc = self.remainder as u64 + elapsed as u64 * self.movie_rate as u64;
            self.last_index += (acc / self.refresh_rate as u64) as u32;
            self.remainder = (acc % self.refresh_rate as u64) as u32;
            self.last_tick = hw_tick;
        }
        self.last_index
    }

    #[inline(always)]
    fn lookup(&self, hw_tick: u32) -> u32 {
        match self.table.get(hw_tick as usize) {
            Some(&index) => index,
            // Ticks past the movie's end clamp to the final entry
            None => *self.table.last().unwrap_or(&0),
        }
    }
}
