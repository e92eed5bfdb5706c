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

//! Software simulation of the VDP port pair
//!
//! [`SimBus`] decodes exactly the register traffic the engine emits: register
//! writes, two-word command sequences, DMA setup and triggers, and data-port
//! color writes. It keeps a real 64-entry CRAM model so tests can assert what
//! the palette cycler made visible, and it logs every decoded DMA transfer
//! instead of copying source memory (the staging buffers stay ordinary Rust
//! buffers addressed through the fixed work-RAM layout).
//!
//! The simulation also audits the two soft real-time rules of the engine:
//! color memory must never be written while the beam is inside the active
//! display with the display enabled, and the bytes moved by DMA during one
//! blanking interval must fit the standard's budget. Violations are counted,
//! never fatal, matching how the hardware degrades (tearing, not crashing).

use super::{reg, VdpBus, VdpStatus, VideoStandard, MODE2_DISPLAY_ON};

/// Destination memory class of a decoded DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaTarget {
    /// Tile memory
    Vram,
    /// Color memory
    Cram,
}

/// One decoded DMA transfer, as triggered through the control port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaRecord {
    /// Source address in work RAM (byte address)
    pub source: u32,
    /// Destination byte address inside the target memory
    pub dest: u16,
    /// Transfer length in words
    pub len_words: u16,
    /// Destination memory class
    pub target: DmaTarget,
    /// Scanline on which the trigger arrived
    pub line: u16,
    /// Whether the trigger arrived inside the vertical blanking interval
    pub in_vblank: bool,
}

/// Latched state of a completed address command
#[derive(Debug, Clone, Copy)]
struct AddressCommand {
    code: u8,
    addr: u16,
}

/// Software VDP for tests and the demo harness
pub struct SimBus {
    standard: VideoStandard,

    /// Color memory: 64 entries of 9-bit BGR color
    cram: [u16; 64],

    /// VDP registers 0x00-0x1F
    regs: [u8; 32],

    /// First half of a pending two-word command
    pending_first: Option<u16>,

    /// Last completed address command (data-port writes go here)
    address: Option<AddressCommand>,

    /// Current scanline (0-based within the refresh)
    line: u16,

    /// Hardware frame counter, incremented at each vertical blank entry
    frames: u32,

    /// Control-port writes observed (all kinds)
    pub ctrl_writes: u64,

    /// Decoded DMA transfers in trigger order
    dma_log: Vec<DmaRecord>,

    /// Bytes moved by DMA inside the current blanking interval
    blank_dma_bytes: u32,

    /// Blanking intervals whose DMA volume exceeded the standard's budget
    pub budget_overruns: u32,

    /// CRAM writes that landed in active display with the display enabled
    pub visible_cram_writes: u32,
}

impl SimBus {
    /// Create a simulated VDP for the given broadcast standard
    ///
    /// The display starts enabled (mode 2 = playback base value) and the
    /// beam at line 0.
    pub fn new(standard: VideoStandard) -> Self {
        let mut regs = [0u8; 32];
        regs[reg::MODE2 as usize] = super::MODE2_PLAYBACK;
        regs[reg::AUTO_INC as usize] = 2;
        Self {
            standard,
            cram: [0; 64],
            regs,
            pending_first: None,
            address: None,
            line: 0,
            frames: 0,
            ctrl_writes: 0,
            dma_log: Vec::new(),
            blank_dma_bytes: 0,
            budget_overruns: 0,
            visible_cram_writes: 0,
        }
    }

    /// Broadcast standard the simulation runs at
    pub fn standard(&self) -> VideoStandard {
        self.standard
    }

    /// Current scanline
    pub fn line(&self) -> u16 {
        self.line
    }

    /// Whether the beam is inside the vertical blanking interval
    pub fn in_vblank(&self) -> bool {
        self.line >= self.standard.active_lines()
    }

    /// Whether the display enable bit is currently set
    pub fn display_enabled(&self) -> bool {
        self.regs[reg::MODE2 as usize] & MODE2_DISPLAY_ON != 0
    }

    /// Color memory contents
    pub fn cram(&self) -> &[u16; 64] {
        &self.cram
    }

    /// Decoded DMA transfers in trigger order
    pub fn dma_log(&self) -> &[DmaRecord] {
        &self.dma_log
    }

    /// Drop the accumulated DMA log (tests slice the traffic per phase)
    pub fn clear_dma_log(&mut self) {
        self.dma_log.clear();
    }

    /// DMA source address assembled from registers 0x95-0x97
    fn dma_source(&self) -> u32 {
        let lo = self.regs[reg::DMA_SRC_LO as usize] as u32;
        let mid = self.regs[reg::DMA_SRC_MID as usize] as u32;
        let hi = (self.regs[reg::DMA_SRC_HI as usize] & 0x7F) as u32;
        (lo | (mid << 8) | (hi << 16)) << 1
    }

    /// DMA length in words assembled from registers 0x93-0x94
    fn dma_length(&self) -> u16 {
        self.regs[reg::DMA_LEN_LO as usize] as u16
            | ((self.regs[reg::DMA_LEN_HI as usize] as u16) << 8)
    }

    fn complete_command(&mut self, first: u16, second: u16) {
        let addr = (first & 0x3FFF) | ((second & 0x3) << 14);
        let code = ((first >> 14) as u8) | (((second & 0xF0) >> 2) as u8);

        self.address = Some(AddressCommand { code, addr });

        // CD5 set: the low command half triggers a DMA transfer
        if code & 0x20 != 0 {
            let target = match code & 0x0F {
                0b0001 => DmaTarget::Vram,
                0b0011 => DmaTarget::Cram,
                other => {
                    log::warn!("DMA trigger with unsupported code {other:#04b}");
                    return;
                }
            };
            let record = DmaRecord {
                source: self.dma_source(),
                dest: addr,
                len_words: self.dma_length(),
                target,
                line: self.line,
                in_vblank: self.in_vblank(),
            };
            log::trace!(
                "DMA {:?} src={:#08X} dest={:#06X} len={} words (line {})",
                record.target,
                record.source,
                record.dest,
                record.len_words,
                record.line
            );

            if record.target == DmaTarget::Cram {
                self.audit_cram_write();
                let start = (addr / 2) as usize;
                for i in 0..record.len_words as usize {
                    // Source data is not resolved; mark the slots written so
                    // coverage checks still see the touched range.
                    if start + i < self.cram.len() {
                        self.cram[start + i] = 0xFFFF;
                    }
                }
            }

            if self.in_vblank() {
                self.blank_dma_bytes += record.len_words as u32 * 2;
            }
            self.dma_log.push(record);
        }
    }

    /// Count a CRAM write that would be visible as tearing
    fn audit_cram_write(&mut self) {
        if !self.in_vblank() && self.display_enabled() {
            self.visible_cram_writes += 1;
            log::warn!(
                "CRAM written on active line {} with display enabled",
                self.line
            );
        }
    }
}

impl VdpBus for SimBus {
    fn ctrl_write(&mut self, word: u16) {
        self.ctrl_writes += 1;

        // Register write: top three bits are 100 and no command half pending
        if self.pending_first.is_none() && word & 0xE000 == 0x8000 {
            let r = ((word >> 8) & 0x1F) as usize;
            self.regs[r] = word as u8;
            log::trace!("VDP reg {:#04X} = {:#04X}", r, word as u8);
            return;
        }

        match self.pending_first.take() {
            None => self.pending_first = Some(word),
            Some(first) => self.complete_command(first, word),
        }
    }

    fn data_write(&mut self, value: u32) {
        // A data write flushes a half-latched command
        self.pending_first = None;

        let Some(cmd) = self.address else {
            log::warn!("data-port write with no address set up");
            return;
        };
        // Only CRAM CPU writes are modeled; tile data is covered by the DMA log
        if cmd.code & 0x0F != 0b0011 || cmd.code & 0x20 != 0 {
            return;
        }

        let inc = self.regs[reg::AUTO_INC as usize] as u16;
        let mut addr = cmd.addr;
        self.audit_cram_write();
        for half in [(value >> 16) as u16, value as u16] {
            let slot = (addr / 2) as usize;
            if slot < self.cram.len() {
                self.cram[slot] = half;
            }
            addr = addr.wrapping_add(inc);
        }
        self.address = Some(AddressCommand {
            code: cmd.code,
            addr,
        });
    }

    fn status(&self) -> VdpStatus {
        let mut status = VdpStatus::FIFO_EMPTY;
        if self.standard == VideoStandard::Pal {
            status |= VdpStatus::PAL_MODE;
        }
        if self.in_vblank() {
            status |= VdpStatus::VBLANK;
        }
        status
    }

    fn step_line(&mut self) -> u16 {
        self.line += 1;
        if self.line == self.standard.active_lines() {
            // Entering vertical blank: this is the hardware frame tick
            self.frames += 1;
            self.blank_dma_bytes = 0;
        } else if self.line >= self.standard.total_lines() {
            // Leaving vertical blank: settle the DMA budget for the window
            if self.blank_dma_bytes > self.standard.vblank_dma_budget() {
                self.budget_overruns += 1;
                log::warn!(
                    "vblank DMA budget exceeded: {} of {} bytes",
                    self.blank_dma_bytes,
                    self.standard.vblank_dma_budget()
                );
            }
            self.line = 0;
        }
        self.line
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }
}
