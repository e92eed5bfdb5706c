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

//! VDP port model
//!
//! The video display processor is addressed through a control/data port pair.
//! Everything the engine sends to the hardware goes through the [`VdpBus`]
//! trait: 16-bit register writes, 32-bit command words (address setup and DMA
//! triggers), and 32-bit data writes. The hot paths are written against the
//! trait so the backend (real port pair or the [`sim::SimBus`] software
//! simulation) is chosen once, never branched on per call.
//!
//! # Control port protocol
//!
//! A 16-bit write with the top three bits `100` is a register write:
//! `0x8000 | (reg << 8) | value`. Anything else is half of a 32-bit command
//! word. The command encodes a destination address and a code selecting the
//! target memory:
//!
//! ```text
//! bits 31-30: CD1..CD0 (low code bits)
//! bits 29-16: A13..A0  (address low bits)
//! bits  7-4:  CD5..CD2 (high code bits; CD5 = DMA trigger)
//! bits  1-0:  A15..A14 (address high bits)
//! ```
//!
//! # DMA register protocol
//!
//! Transfer length and source address are programmed through registers
//! 0x93..0x97 before the trigger command:
//!
//! | Register | Value                      |
//! |----------|----------------------------|
//! | 0x93     | length low (in words)      |
//! | 0x94     | length high                |
//! | 0x95     | source address bits 1-8    |
//! | 0x96     | source address bits 9-16   |
//! | 0x97     | source address bits 17-23  |

use serde::{Deserialize, Serialize};

pub mod sim;

#[cfg(test)]
mod tests;

/// Broadcast display standard
///
/// The two standards differ in total scanline count and refresh rate, which
/// feeds the palette swap window bounds and the frame pacer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoStandard {
    /// 60 Hz, 262 lines total, 224 active
    Ntsc,
    /// 50 Hz, 313 lines total, 240 active
    Pal,
}

impl VideoStandard {
    /// Total scanlines per refresh, including the blanking interval
    #[inline(always)]
    pub const fn total_lines(self) -> u16 {
        match self {
            VideoStandard::Ntsc => 262,
            VideoStandard::Pal => 313,
        }
    }

    /// Active display scanlines per refresh
    #[inline(always)]
    pub const fn active_lines(self) -> u16 {
        match self {
            VideoStandard::Ntsc => 224,
            VideoStandard::Pal => 240,
        }
    }

    /// Active display height in 8-line tile rows
    #[inline(always)]
    pub const fn active_tile_rows(self) -> u16 {
        self.active_lines() / 8
    }

    /// Display refreshes per second
    #[inline(always)]
    pub const fn refresh_rate(self) -> u32 {
        match self {
            VideoStandard::Ntsc => 60,
            VideoStandard::Pal => 50,
        }
    }

    /// Worst-case bytes the DMA engine can move during one blanking interval
    ///
    /// Roughly 205 bytes per blanked line at 40-cell width. Exceeding this is
    /// the soft real-time violation of the engine: the transfer bleeds into
    /// active display and tears, but nothing crashes.
    pub const fn vblank_dma_budget(self) -> u32 {
        (self.total_lines() - self.active_lines()) as u32 * 205
    }
}

bitflags::bitflags! {
    /// VDP status word
    ///
    /// Read from the control port. Only the bits the engine consumes are
    /// modeled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VdpStatus: u16 {
        /// Console is wired for PAL timing (bit 0)
        const PAL_MODE = 1 << 0;
        /// DMA transfer in progress (bit 1)
        const DMA_BUSY = 1 << 1;
        /// Beam is inside the horizontal blanking interval (bit 2)
        const HBLANK = 1 << 2;
        /// Beam is inside the vertical blanking interval (bit 3)
        const VBLANK = 1 << 3;
        /// Vertical interrupt pending (bit 7)
        const VINT_PENDING = 1 << 7;
        /// Write FIFO is empty (bit 9)
        const FIFO_EMPTY = 1 << 9;
    }
}

/// VDP register numbers used by the engine
pub mod reg {
    /// Mode register 1: horizontal interrupt enable (bit 4)
    pub const MODE1: u8 = 0x00;
    /// Mode register 2: display enable (bit 6), v-int enable, DMA enable
    pub const MODE2: u8 = 0x01;
    /// Plane A tilemap base address (bits 3-5 = address >> 13)
    pub const PLANE_A_ADDR: u8 = 0x02;
    /// Window tilemap base address
    pub const WINDOW_ADDR: u8 = 0x03;
    /// Plane B tilemap base address (bits 0-2 = address >> 13)
    pub const PLANE_B_ADDR: u8 = 0x04;
    /// Sprite attribute table base address
    pub const SPRITE_ADDR: u8 = 0x05;
    /// Horizontal interrupt line counter
    pub const HINT_COUNTER: u8 = 0x0A;
    /// Horizontal scroll table base address
    pub const HSCROLL_ADDR: u8 = 0x0D;
    /// Plane dimensions in tiles
    pub const PLANE_SIZE: u8 = 0x10;
    /// Auto-increment applied to the address after each data-port access
    pub const AUTO_INC: u8 = 0x0F;
    /// DMA length low byte (in transfer words)
    pub const DMA_LEN_LO: u8 = 0x13;
    /// DMA length high byte
    pub const DMA_LEN_HI: u8 = 0x14;
    /// DMA source address bits 1-8
    pub const DMA_SRC_LO: u8 = 0x15;
    /// DMA source address bits 9-16
    pub const DMA_SRC_MID: u8 = 0x16;
    /// DMA source address bits 17-23
    pub const DMA_SRC_HI: u8 = 0x17;
}

/// Mode register 1 value with the horizontal interrupt enabled
pub const MODE1_HINT_ON: u8 = 0x14;

/// Mode register 1 value with the horizontal interrupt masked
pub const MODE1_HINT_OFF: u8 = 0x04;

/// Mode register 2 base value during playback: display on, v-int enabled,
/// DMA enabled, 28-cell vertical mode.
pub const MODE2_PLAYBACK: u8 = 0x74;

/// Display enable bit inside mode register 2
pub const MODE2_DISPLAY_ON: u8 = 0x40;

/// Format a register write word: `0x8000 | (reg << 8) | value`
#[inline(always)]
pub const fn reg_write(reg: u8, value: u8) -> u16 {
    0x8000 | ((reg as u16) << 8) | value as u16
}

/// Control word turning the display off, preserving the other mode bits
#[inline(always)]
pub const fn display_off_word(mode2: u8) -> u16 {
    reg_write(reg::MODE2, mode2 & !MODE2_DISPLAY_ON)
}

/// Control word turning the display back on
#[inline(always)]
pub const fn display_on_word(mode2: u8) -> u16 {
    reg_write(reg::MODE2, mode2 | MODE2_DISPLAY_ON)
}

/// Pack a destination address and code bits into a 32-bit command word
#[inline(always)]
const fn command(addr: u16, code: u32) -> u32 {
    let base = (((addr as u32) & 0x3FFF) << 16) | ((addr as u32) >> 14);
    base | ((code & 0x3) << 30) | ((code & 0x3C) << 2)
}

/// CPU write command targeting tile memory (VRAM) at a byte address
#[inline(always)]
pub const fn vram_write_cmd(addr: u16) -> u32 {
    command(addr, 0b000001)
}

/// CPU write command targeting color memory (CRAM) at a byte address
#[inline(always)]
pub const fn cram_write_cmd(addr: u16) -> u32 {
    command(addr, 0b000011)
}

/// DMA trigger command targeting tile memory at a byte address
#[inline(always)]
pub const fn vram_dma_cmd(addr: u16) -> u32 {
    command(addr, 0b100001)
}

/// DMA trigger command targeting color memory at a byte address
#[inline(always)]
pub const fn cram_dma_cmd(addr: u16) -> u32 {
    command(addr, 0b100011)
}

/// The VDP port pair as seen by the engine
///
/// Implementations must honor the control port protocol described in the
/// module docs. The timing methods expose the display beam so the foreground
/// loop can block on vertical blank and dispatch the per-scanline palette
/// service; on hardware these map onto the h/v interrupt sources and the
/// vblank tick counter.
pub trait VdpBus {
    /// Write one 16-bit word to the control port
    fn ctrl_write(&mut self, word: u16);

    /// Write a full 32-bit command to the control port
    ///
    /// Equivalent to writing the high word then the low word. When the
    /// command carries the DMA trigger bit the transfer starts on the low
    /// half, which is why [`DmaQueue::flush`](crate::core::dma::DmaQueue::flush)
    /// emits the halves as separate word writes.
    fn ctrl_write_cmd(&mut self, cmd: u32) {
        self.ctrl_write((cmd >> 16) as u16);
        self.ctrl_write(cmd as u16);
    }

    /// Write one 32-bit value to the data port (two color entries)
    fn data_write(&mut self, value: u32);

    /// Read the status word
    fn status(&self) -> VdpStatus;

    /// Advance the display by one scanline and return the line just entered
    ///
    /// Lines `0..active_lines` are active display; the remainder of the
    /// refresh is the vertical blanking interval.
    fn step_line(&mut self) -> u16;

    /// Hardware frame counter, incremented once per vertical blank
    fn frame_count(&self) -> u32;
}
