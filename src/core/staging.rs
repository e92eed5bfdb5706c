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

//! Staging buffers and the palette double buffer
//!
//! Decoded chunks land in fixed-capacity staging buffers sized to the worst
//! case across the whole movie, reused every frame. Each buffer sits at a
//! fixed work-RAM address — the engine's assumed memory map — so that the DMA
//! source encoding is deterministic: `DmaOp::encode` takes the buffer address
//! plus an element offset, nothing depends on where the host allocator put
//! the backing storage.
//!
//! The palette pair is never copied: the unpack buffer is filled by the
//! decode stage while the render buffer is consumed by the palette cycler,
//! and the two exchange roles by an index swap. The foreground only *queues*
//! the swap; it takes effect in the vertical-blank service, which is the one
//! place the cycler's consuming pointer may change (see the concurrency notes
//! on [`PaletteCycler`](crate::core::cycler::PaletteCycler)).

/// Fixed work-RAM layout of the staging buffers
pub mod layout {
    /// Decoded tileset chunk staging
    pub const TILESET_STAGING: u32 = 0x00FF_0400;
    /// Decoded tilemap staging (extended-width rows)
    pub const TILEMAP_STAGING: u32 = 0x00FF_4400;
    /// Palette buffer A
    pub const PALETTE_A: u32 = 0x00FF_6400;
    /// Palette buffer B
    pub const PALETTE_B: u32 = 0x00FF_6C00;
}

/// Reusable decoded-words buffer at a fixed work-RAM address
#[derive(Debug)]
pub struct StagingBuffer {
    words: Box<[u16]>,
    addr: u32,
}

impl StagingBuffer {
    /// Allocate a zeroed buffer of `capacity_words` at `addr`
    pub fn new(addr: u32, capacity_words: usize) -> Self {
        Self {
            words: vec![0u16; capacity_words].into_boxed_slice(),
            addr,
        }
    }

    /// Allocate a buffer pre-filled with `fill` (e.g. the filler tile index
    /// for tilemap staging, so pad columns always reference a black tile)
    pub fn filled(addr: u32, capacity_words: usize, fill: u16) -> Self {
        Self {
            words: vec![fill; capacity_words].into_boxed_slice(),
            addr,
        }
    }

    /// Work-RAM base address used for DMA source encoding
    #[inline(always)]
    pub fn addr(&self) -> u32 {
        self.addr
    }

    /// Capacity in words
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.words.len()
    }

    /// Buffer contents
    #[inline(always)]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Mutable contents for the decode stage
    #[inline(always)]
    pub fn words_mut(&mut self) -> &mut [u16] {
        &mut self.words
    }
}

/// The render/unpack palette buffer pair
///
/// `render` is what the palette cycler is currently consuming; `unpack` is
/// what the decode stage is currently filling. Ownership transfers by
/// swapping the role index, never by copying.
#[derive(Debug)]
pub struct PaletteDoubleBuffer {
    bufs: [StagingBuffer; 2],
    render: usize,
    swap_queued: bool,
}

impl PaletteDoubleBuffer {
    /// Allocate both buffers, `colors` entries each, zeroed (black)
    pub fn new(colors: usize) -> Self {
        Self {
            bufs: [
                StagingBuffer::new(layout::PALETTE_A, colors),
                StagingBuffer::new(layout::PALETTE_B, colors),
            ],
            render: 0,
            swap_queued: false,
        }
    }

    /// The buffer the cycler reads from
    #[inline(always)]
    pub fn render(&self) -> &StagingBuffer {
        &self.bufs[self.render]
    }

    /// Mutable render buffer — only for the fade effect, which runs after
    /// the decode stage has stopped producing frames
    #[inline(always)]
    pub fn render_mut(&mut self) -> &mut StagingBuffer {
        &mut self.bufs[self.render]
    }

    /// The buffer the decode stage writes into
    #[inline(always)]
    pub fn unpack_mut(&mut self) -> &mut StagingBuffer {
        &mut self.bufs[self.render ^ 1]
    }

    /// Queue the role exchange (foreground context)
    ///
    /// The swap does not take effect here: the cycler may still be mid-frame
    /// in the current render buffer. It is applied by the vertical-blank
    /// service via [`PaletteDoubleBuffer::apply_queued_swap`].
    pub fn queue_swap(&mut self) {
        self.swap_queued = true;
    }

    /// Whether a swap is queued but not yet applied
    #[inline(always)]
    pub fn swap_queued(&self) -> bool {
        self.swap_queued
    }

    /// Apply a queued swap (vertical-blank context only)
    ///
    /// # Returns
    ///
    /// `true` if a swap was queued and has now taken effect
    pub fn apply_queued_swap(&mut self) -> bool {
        if !self.swap_queued {
            return false;
        }
        self.render ^= 1;
        self.swap_queued = false;
        log::trace!("palette buffers swapped, render = {}", self.render);
        true
    }
}
