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

//! DMA operation encoder and transfer queue
//!
//! A [`DmaOp`] is a source/destination/length triple pre-formatted into the
//! exact control-port words the VDP expects, so that flushing inside the
//! narrow vertical-blank window is a fixed burst of register writes with no
//! arithmetic left to do. The [`DmaQueue`] holds at most one pending op per
//! purpose (tileset, tilemap, palette) in fixed slots; re-enqueueing before a
//! flush overwrites the slot, last writer wins, and there is no backlog.
//!
//! No capacity check happens at flush time. The caller sizes its chunks so
//! the largest possible transfer fits the retrace budget; blowing the budget
//! tears the picture but never faults, and the simulation bus counts such
//! windows.

use crate::core::vdp::VdpBus;


/// One pre-formatted DMA transfer
///
/// The five 16-bit words program length and source address; the 32-bit
/// command selects the destination memory and offset and, on its low half,
/// triggers the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaOp {
    /// `0x9300 | length bits 0-7` (length in transfer words)
    pub len_lo: u16,
    /// `0x9400 | length bits 8-15`
    pub len_hi: u16,
    /// `0x9500 | source bits 1-8`
    pub src_lo: u16,
    /// `0x9600 | source bits 9-16`
    pub src_mid: u16,
    /// `0x9700 | source bits 17-23`
    pub src_hi: u16,
    /// Destination command word (see [`crate::core::vdp::vram_dma_cmd`])
    pub command: u32,
}

impl DmaOp {
    /// Encode a transfer. Pure: all address and length math happens here,
    /// none at flush time.
    ///
    /// # Arguments
    ///
    /// * `source` - byte address of the staging data in work RAM (even)
    /// * `command` - destination command word carrying the DMA trigger bit
    /// * `len_words` - transfer length in 16-bit words
    pub fn encode(source: u32, command: u32, len_words: u16) -> Self {
        Self {
            len_lo: 0x9300 | (len_words & 0xFF),
            len_hi: 0x9400 | ((len_words >> 8) & 0xFF),
            src_lo: 0x9500 | ((source >> 1) & 0xFF) as u16,
            src_mid: 0x9600 | ((source >> 9) & 0xFF) as u16,
            src_hi: 0x9700 | ((source >> 17) & 0x7F) as u16,
            command,
        }
    }

    /// Recover the `(source, command, len_words)` triple from the formatted
    /// words. Exact inverse of [`DmaOp::encode`] for even source addresses
    /// up to 24 bits.
    pub fn decode(&self) -> (u32, u32, u16) {
        let source = (((self.src_lo & 0xFF) as u32)
            | (((self.src_mid & 0xFF) as u32) << 8)
            | (((self.src_hi & 0x7F) as u32) << 16))
            << 1;
        let len = (self.len_lo & 0xFF) | ((self.len_hi & 0xFF) << 8);
        (source, self.command, len)
    }

    /// Transfer size in bytes
    #[inline(always)]
    pub fn len_bytes(&self) -> u32 {
        let (_, _, len) = self.decode();
        len as u32 * 2
    }
}

/// Queue slot identity, in flush order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaPurpose {
    /// Tile pixel data into the tile region selected by frame parity
    Tileset = 0,
    /// Tile-index rows into the plane
    Tilemap = 1,
    /// Palette strips into color memory
    Palette = 2,
}

/// Fixed-slot transfer queue
///
/// # Examples
///
/// ```
/// use tilecast::core::dma::{DmaOp, DmaPurpose, DmaQueue};
/// use tilecast::core::vdp::vram_dma_cmd;
///
/// let mut queue = DmaQueue::new();
/// queue.enqueue(
///     DmaPurpose::Tileset,
///     DmaOp::encode(0xFF_0400, vram_dma_cmd(0x2000), 0x100),
/// );
/// assert_eq!(queue.pending(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DmaQueue {
    slots: [Option<DmaOp>; 3],
}

impl DmaQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an op into its slot and mark it ready
    ///
    /// An op already pending in the slot is overwritten; the previous
    /// transfer never happens.
    pub fn enqueue(&mut self, purpose: DmaPurpose, op: DmaOp) {
        let slot = purpose as usize;
        if self.slots[slot].is_some() {
            log::debug!("DMA slot {purpose:?} overwritten before flush");
        }
        self.slots[slot] = Some(op);
    }

    /// Number of slots currently ready
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Total bytes the next flush will move
    pub fn pending_bytes(&self) -> u32 {
        self.slots.iter().flatten().map(|op| op.len_bytes()).sum()
    }

    /// Flush every ready slot to the control port and clear it
    ///
    /// Walks the fixed slot order (tileset, tilemap, palette) and writes each
    /// op's five register words followed by the command halves in one
    /// contiguous burst. The command's low word is written last because that
    /// write is what triggers the transfer. Flushing with no slots ready
    /// performs no port writes at all.
    ///
    /// Must only be called inside the vertical-blank window.
    ///
    /// # Returns
    ///
    /// Number of ops flushed
    pub fn flush<B: VdpBus>(&mut self, bus: &mut B) -> usize {
        let mut flushed = 0;
        for slot in &mut self.slots {
            let Some(op) = slot.take() else { continue };
            bus.ctrl_write(op.len_lo);
            bus.ctrl_write(op.len_hi);
            bus.ctrl_write(op.src_lo);
            bus.ctrl_write(op.src_mid);
            bus.ctrl_write(op.src_hi);
            bus.ctrl_write((op.command >> 16) as u16);
            bus.ctrl_write(op.command as u16);
            flushed += 1;
        }
        flushed
    }
}
