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

//! Horizontal-interrupt palette cycler
//!
//! Color memory holds 64 entries — two 32-color banks — but a frame carries
//! one 32-color strip per 8-line tile row. The cycler repaints the bank the
//! beam is *not* currently reading, once per strip boundary, so every strip
//! scans out with its own palette and the image carries far more simultaneous
//! color than the hardware nominally allows.
//!
//! The service runs up to once per 8 display lines, so the do-nothing path
//! has to be a handful of instructions: one counter add and one range check
//! against the precomputed swap window. All real work happens only inside
//! `[window_start, window_end]`.
//!
//! # Swap window
//!
//! The window is derived once per broadcast standard from the display height
//! in tile rows, the frame height in strips, and a minimum top offset that
//! keeps DMA from bleeding into the active area. Worked examples for a
//! 22-strip frame:
//!
//! * NTSC: 28 tile rows, frame centered at row `(28 - 22) / 2 = 3`;
//!   first boundary fires at line `(3 + 1) * 8 - 1 = 31`, last opportunity at
//!   `31 + (22 - 2) * 8 = 191`.
//! * PAL: 30 tile rows, centered at row 4; window is `39..=199`.
//!
//! Both bounds are one less than a strip-height multiple because the service
//! fires on the last line before each boundary.
//!
//! # Seeding policy
//!
//! The first two strips are seeded into both banks by the vertical-blank
//! service ([`PaletteCycler::begin_frame`]), outside the DMA queue. The
//! window therefore spans `strips - 1` firing opportunities: the first
//! `strips - 2` each load one strip (the third onward), and the last finds
//! the cursor exhausted and idles. Historical variants disagreed here; this
//! is the one policy used everywhere.

use crate::core::dma::DmaOp;
use crate::core::resource::{COLORS_PER_STRIP, STRIP_HEIGHT};
use crate::core::staging::StagingBuffer;
use crate::core::vdp::{
    cram_dma_cmd, cram_write_cmd, display_off_word, display_on_word, VdpBus, VideoStandard,
    MODE2_PLAYBACK,
};
use serde::{Deserialize, Serialize};


/// Lowest tile row the frame may start at without DMA flicker reaching the
/// active area
pub const MIN_FLICKER_SAFE_TILE_ROW: u16 = 3;

/// How the per-strip color push reaches color memory
///
/// Chosen at configuration time; the hot path never branches per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushMode {
    /// Four batches of 8 colors through the data port. Highest CPU cost,
    /// no DMA setup latency.
    Cpu,
    /// Three DMA bursts of 8 + 12 + 12 colors. Lower CPU cost, fixed
    /// per-burst setup latency.
    #[default]
    Dma,
}

/// Cycler phase, observable for tests and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclerPhase {
    /// Outside the swap window
    Idle,
    /// Inside the window, waiting for the next strip boundary
    Armed,
    /// Mid color burst, display disabled
    Swapping,
}

/// Scanline bounds of the palette swap window, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapWindow {
    /// First service line that performs a swap
    pub start: u16,
    /// Last service line inside the window
    pub end: u16,
    /// Tile row the frame starts at (vertical centering, flicker-clamped)
    pub first_tile_row: u16,
}

impl SwapWindow {
    /// Derive the window for a standard and a frame height in strips
    ///
    /// Evaluated once at playback start; the per-interrupt path only
    /// compares against the two bounds.
    pub const fn compute(standard: VideoStandard, strips: u16) -> Self {
        let total_rows = standard.active_tile_rows();
        let centered = total_rows.saturating_sub(strips) / 2;
        let first_tile_row = if centered > MIN_FLICKER_SAFE_TILE_ROW {
            centered
        } else {
            MIN_FLICKER_SAFE_TILE_ROW
        };
        let start = (first_tile_row + 1) * STRIP_HEIGHT - 1;
        let end = start + (strips - 2) * STRIP_HEIGHT;
        Self {
            start,
            end,
            first_tile_row,
        }
    }

    /// Number of service firings that land inside the window
    #[inline(always)]
    pub const fn opportunities(&self) -> u16 {
        (self.end - self.start) / STRIP_HEIGHT + 1
    }
}

/// The per-scanline palette state machine
///
/// Shared-state discipline (single core, two interrupt contexts plus the
/// foreground loop):
///
/// * [`PaletteCycler::begin_frame`] is the *only* operation that re-seeds the
///   strip cursor and bank toggle, and it runs in vertical-blank context —
///   the same place the queued render/unpack buffer swap is applied, so the
///   cycler can never observe a half-updated buffer mid-scan.
/// * [`PaletteCycler::on_hline`] is the *only* per-scanline mutation and runs
///   in horizontal-interrupt context.
/// * The foreground loop never touches the live cursor; it stages new
///   palettes exclusively through the double buffer's queued swap.
pub struct PaletteCycler {
    window: SwapWindow,
    push_mode: PushMode,
    /// Strips per frame
    strips: u16,
    /// Software scanline counter, tracks the line each service fires on
    scanline: u16,
    /// Next strip index to push (starts past the two seeded strips)
    cursor: u16,
    /// CRAM bank the next push targets: 0 or 1
    toggle: u16,
    phase: CyclerPhase,
    /// Strips pushed since construction
    pub pushes: u64,
}

impl PaletteCycler {
    /// Create a cycler for the given standard, frame height and push mode
    pub fn new(standard: VideoStandard, strips: u16, push_mode: PushMode) -> Self {
        let window = SwapWindow::compute(standard, strips);
        log::debug!(
            "palette cycler: {strips} strips, window {}..={}, first row {}, {push_mode:?} push",
            window.start,
            window.end,
            window.first_tile_row
        );
        Self {
            window,
            push_mode,
            strips,
            scanline: STRIP_HEIGHT - 1,
            cursor: 2,
            toggle: 0,
            phase: CyclerPhase::Idle,
            pushes: 0,
        }
    }

    /// The precomputed swap window
    #[inline(always)]
    pub fn window(&self) -> SwapWindow {
        self.window
    }

    /// Current phase
    #[inline(always)]
    pub fn phase(&self) -> CyclerPhase {
        self.phase
    }

    /// Strip index the next in-window service will push
    #[inline(always)]
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    /// CRAM bank the next push targets
    #[inline(always)]
    pub fn toggle(&self) -> u16 {
        self.toggle
    }

    /// Vertical-blank service: reset the per-frame state and seed the first
    /// two strips into both CRAM banks
    ///
    /// Must be called with the display blanked, after the queued palette
    /// swap has been applied, so `render` is the buffer the whole upcoming
    /// display pass will scan from. Interrupt-context only; the foreground
    /// never calls this directly.
    pub fn begin_frame<B: VdpBus>(&mut self, bus: &mut B, render: &StagingBuffer) {
        self.scanline = STRIP_HEIGHT - 1;
        self.cursor = 2;
        self.toggle = 0;
        self.phase = CyclerPhase::Idle;

        // Seed strips 0 and 1 outside the DMA queue: 64 colors through the
        // data port while the beam is blanked.
        for bank in 0..2u16 {
            let base = bank as usize * COLORS_PER_STRIP;
            let colors = &render.words()[base..base + COLORS_PER_STRIP];
            bus.ctrl_write_cmd(cram_write_cmd(bank * 64));
            for pair in colors.chunks_exact(2) {
                bus.data_write(((pair[0] as u32) << 16) | pair[1] as u32);
            }
        }
    }

    /// Horizontal-interrupt service, fired once per strip height of lines
    ///
    /// The out-of-window path is deliberately minimal: advance the software
    /// scanline counter, compare against the window, return.
    pub fn on_hline<B: VdpBus>(&mut self, bus: &mut B, render: &StagingBuffer) {
        let line = self.scanline;
        self.scanline += STRIP_HEIGHT;

        if line < self.window.start || line > self.window.end {
            self.phase = CyclerPhase::Idle;
            return;
        }

        if self.cursor >= self.strips {
            // Final opportunity of the window: every strip is already in
            // place, nothing left to load
            self.phase = CyclerPhase::Armed;
            return;
        }

        self.phase = CyclerPhase::Swapping;
        let strip = self.cursor as usize;
        match self.push_mode {
            PushMode::Cpu => self.push_strip_cpu(bus, render, strip),
            PushMode::Dma => self.push_strip_dma(bus, render, strip),
        }
        self.cursor += 1;
        self.toggle ^= 1;
        self.pushes += 1;
        self.phase = CyclerPhase::Armed;
    }

    /// Push one strip through the data port: four batches of 8 colors, each
    /// batch bracketed by display off/on so a partially updated bank is
    /// never scanned out
    fn push_strip_cpu<B: VdpBus>(&self, bus: &mut B, render: &StagingBuffer, strip: usize) {
        let base = strip * COLORS_PER_STRIP;
        let colors = &render.words()[base..base + COLORS_PER_STRIP];
        let bank_addr = self.toggle * 64;

        for batch in 0..4u16 {
            let cmd = cram_write_cmd(bank_addr + batch * 16);
            let batch_colors = &colors[batch as usize * 8..][..8];
            bus.ctrl_write(display_off_word(MODE2_PLAYBACK));
            bus.ctrl_write_cmd(cmd);
            for pair in batch_colors.chunks_exact(2) {
                bus.data_write(((pair[0] as u32) << 16) | pair[1] as u32);
            }
            bus.ctrl_write(display_on_word(MODE2_PLAYBACK));
        }
    }

    /// Push one strip as three DMA bursts of 8 + 12 + 12 colors
    ///
    /// The source setup happens with the display still on; only the trigger
    /// is bracketed by the display toggle, keeping the blanked span as short
    /// as the transfer itself.
    fn push_strip_dma<B: VdpBus>(&self, bus: &mut B, render: &StagingBuffer, strip: usize) {
        let strip_addr = render.addr() + (strip * COLORS_PER_STRIP * 2) as u32;
        let bank_addr = self.toggle * 64;

        let mut offset = 0u16;
        for len in [8u16, 12, 12] {
            let src = strip_addr + offset as u32 * 2;
            let op = DmaOp::encode(src, cram_dma_cmd(bank_addr + offset * 2), len);
            bus.ctrl_write(op.len_lo);
            bus.ctrl_write(op.len_hi);
            bus.ctrl_write(op.src_lo);
            bus.ctrl_write(op.src_mid);
            bus.ctrl_write(op.src_hi);
            bus.ctrl_write(display_off_word(MODE2_PLAYBACK));
            bus.ctrl_write_cmd(op.command);
            bus.ctrl_write(display_on_word(MODE2_PLAYBACK));
            offset += len;
        }
    }
}
