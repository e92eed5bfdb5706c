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

//! Playback orchestrator
//!
//! The foreground loop of the engine. Per logical frame it decodes each
//! tileset chunk into staging and immediately enqueues its transfer at the
//! tile region selected by the frame's parity, giving every chunk its own
//! wait-for-blank/flush cycle (the staging buffer is reused and must not be
//! overwritten while a transfer of it is pending). After the chunks come the
//! palette block (into the unpack buffer, with the render/unpack swap
//! queued), the tilemap, the pacer advance, and one final wait/flush that
//! makes the whole frame visible.
//!
//! # Tile-region parity
//!
//! Tile memory holds two frame-sized regions. A frame's data always loads
//! into the region named by the low bit of its index, so the frame being
//! decoded can never land under the frame currently scanned out — provided
//! consecutive *rendered* frames never share that bit. The pacer knows
//! nothing of this: when decode overruns and the pacer jumps an even number
//! of frames, the orchestrator bumps the index by one more
//! ([`AdvancePolicy::SkipToPace`]) or ignores the jump entirely
//! ([`AdvancePolicy::ForceSequential`]). That fixup is orchestrator policy,
//! documented here, deliberately not a pacer responsibility.
//!
//! # Blanking-window discipline
//!
//! The only blocking operation is the vertical-blank wait: a tight poll on
//! the hardware frame counter, during which the per-scanline palette service
//! is dispatched at every strip boundary of the active display. Once the
//! counter ticks, the vertical-blank service runs with the display off: the
//! queued palette swap is applied, the cycler re-seeds the first two strips
//! from the (possibly new) render buffer, and the DMA queue flushes with the
//! audio bus locked. No palette service can interleave with the flush —
//! the beam is in the blanking interval, where strip boundaries do not fire.

use crate::core::codec::Codec;
use crate::core::config::{AdvancePolicy, PlayerConfig};
use crate::core::cycler::PaletteCycler;
use crate::core::dma::{DmaOp, DmaPurpose, DmaQueue};
use crate::core::error::{PlayerError, Result};
use crate::core::pacer::FramePacer;
use crate::core::resource::{ResourceTable, COLORS_PER_STRIP, STRIP_HEIGHT};
use crate::core::staging::{layout, PaletteDoubleBuffer, StagingBuffer};
use crate::core::vdp::{
    cram_dma_cmd, display_off_word, display_on_word, reg, reg_write, vram_dma_cmd, VdpBus,
    VideoStandard, MODE1_HINT_OFF, MODE1_HINT_ON, MODE2_PLAYBACK,
};

#[cfg(test)]
mod tests;

/// Byte address of the plane the movie renders into
pub const PLANE_BASE: u16 = 0xE000;

/// Plane width in tiles; equals the extended tilemap row width so one DMA
/// run per frame covers all rows and the pad columns land off screen
pub const PLANE_WIDTH_TILES: u16 = 64;

/// Visible screen width in tiles (40-cell mode)
pub const SCREEN_WIDTH_TILES: u16 = 40;

/// Tile index the whole plane is cleared to (a black tile)
pub const FILLER_TILE_INDEX: u16 = 0;

/// Console services the player consumes but does not own
///
/// Sound, audio-bus arbitration around DMA-sensitive windows, the exit
/// button, and the inter-loop pause are all host concerns; every hook
/// defaults to a no-op so tests and headless runs can use [`NullHost`].
pub trait Host {
    /// Start movie audio (called once per playback run)
    fn sound_start(&mut self) {}

    /// Stop movie audio
    fn sound_stop(&mut self) {}

    /// Lock the audio coprocessor off the shared bus before a DMA burst
    fn audio_bus_lock(&mut self) {}

    /// Release the audio coprocessor
    fn audio_bus_unlock(&mut self) {}

    /// Short busy-wait after the bus lock so in-flight audio fetches drain
    fn settle_delay(&mut self) {}

    /// Single digital exit button, sampled once per logical frame
    fn exit_requested(&mut self) -> bool {
        false
    }

    /// Pause between loop iterations of the movie
    fn loop_pause(&mut self) {}
}

/// Host with every hook left at its no-op default
#[derive(Debug, Default)]
pub struct NullHost;

impl Host for NullHost {}

/// Counters accumulated over one playback run
///
/// Budget and tearing violations are soft real-time failures: they are
/// visible on screen, never fatal, and only ever reported through these
/// numbers and the log.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Logical frames decoded and displayed
    pub frames_played: u32,
    /// Source frames skipped to stay on pace
    pub frames_dropped: u32,
    /// Pacer outputs adjusted to preserve region parity
    pub parity_bumps: u32,
    /// DMA ops flushed inside blanking windows
    pub dma_flushes: u32,
    /// Vertical blanks waited on
    pub display_passes: u32,
    /// Complete loops of the movie
    pub loops: u32,
    /// Whether playback ended through the exit button and fade
    pub exited_early: bool,
}

/// The playback engine
///
/// Owns the transfer queue, the palette cycler, the pacer and all staging
/// buffers; borrows the read-only resource table. Generic over the codec and,
/// per call, over the bus so the backend is fixed at the call site.
pub struct Player<'a, C: Codec> {
    table: &'a ResourceTable,
    codec: C,
    config: PlayerConfig,
    standard: VideoStandard,

    queue: DmaQueue,
    cycler: PaletteCycler,
    pacer: FramePacer,

    tileset: StagingBuffer,
    tilemap: StagingBuffer,
    pals: PaletteDoubleBuffer,

    /// Tilemap destination inside the plane
    plane_addr: u16,
    /// Hardware tick at which the current (loop) run started
    tick_origin: u32,
    /// Whether the interrupt services are bound and may fire
    interrupts_bound: bool,

    stats: PlaybackStats,
}

impl<'a, C: Codec> Player<'a, C> {
    /// Build a player for one movie on one console
    ///
    /// Validates the resource table and checks that the frame fits the
    /// standard's display with the flicker-safe top margin.
    pub fn new(
        table: &'a ResourceTable,
        codec: C,
        config: PlayerConfig,
        standard: VideoStandard,
    ) -> Result<Self> {
        table.validate()?;

        let geo = &table.geometry;
        if geo.extended_width_tiles != PLANE_WIDTH_TILES {
            return Err(PlayerError::InvalidGeometry(format!(
                "extended width {} must match the plane width {}",
                geo.extended_width_tiles, PLANE_WIDTH_TILES
            )));
        }
        if geo.width_tiles > SCREEN_WIDTH_TILES {
            return Err(PlayerError::InvalidGeometry(format!(
                "frame width {} exceeds the {}-tile screen",
                geo.width_tiles, SCREEN_WIDTH_TILES
            )));
        }

        let cycler = PaletteCycler::new(standard, geo.strips(), config.push);
        let first_row = cycler.window().first_tile_row;
        if first_row + geo.height_tiles > standard.active_tile_rows() {
            return Err(PlayerError::InvalidGeometry(format!(
                "frame of {} strips does not fit {} display rows below row {}",
                geo.height_tiles,
                standard.active_tile_rows(),
                first_row
            )));
        }

        let pacer = FramePacer::new(
            standard,
            geo.frame_rate,
            table.frame_count(),
            config.pacing,
        );

        // Frame centered horizontally; vertical position comes from the
        // cycler's flicker-clamped first row
        let x_off = (SCREEN_WIDTH_TILES - geo.width_tiles) / 2;
        let plane_addr = PLANE_BASE + (first_row * PLANE_WIDTH_TILES + x_off) * 2;

        Ok(Self {
            table,
            codec,
            config,
            standard,
            queue: DmaQueue::new(),
            cycler,
            pacer,
            tileset: StagingBuffer::new(
                layout::TILESET_STAGING,
                geo.max_chunk_tiles as usize * 16,
            ),
            tilemap: StagingBuffer::filled(
                layout::TILEMAP_STAGING,
                geo.tilemap_words(),
                FILLER_TILE_INDEX,
            ),
            pals: PaletteDoubleBuffer::new(geo.palette_colors()),
            plane_addr,
            tick_origin: 0,
            interrupts_bound: false,
            stats: PlaybackStats::default(),
        })
    }

    /// Stats accumulated so far
    pub fn stats(&self) -> &PlaybackStats {
        &self.stats
    }

    /// The palette cycler (observable state for diagnostics)
    pub fn cycler(&self) -> &PaletteCycler {
        &self.cycler
    }

    /// Play the movie to completion (or exit request) and return the stats
    pub fn play<B: VdpBus, H: Host>(&mut self, bus: &mut B, host: &mut H) -> Result<PlaybackStats> {
        self.setup_display(bus);
        self.load_tiles_cache(bus)?;

        host.sound_start();

        loop {
            // Align to the start of an active display period, then bind the
            // interrupt services. Binding happens between blanks, with the
            // palette pointers already seeded, so the first service firing
            // cannot observe uninitialized state.
            self.wait_vblank(bus);
            self.pacer.reset();
            self.interrupts_bound = true;
            bus.ctrl_write(reg_write(reg::HINT_COUNTER, STRIP_HEIGHT as u8 - 1));
            bus.ctrl_write(reg_write(reg::MODE1, MODE1_HINT_ON));
            self.tick_origin = bus.frame_count();

            let exit_frame = self.play_frames(bus, host)?;

            if let Some(at) = exit_frame {
                self.stats.exited_early = true;
                // Stop the audio right away only when the movie would have
                // ended inside the fade anyway
                let fade_movie_frames = self.config.fade.total_frames()
                    * self.table.geometry.frame_rate
                    / self.standard.refresh_rate();
                if at + fade_movie_frames >= self.table.frame_count() {
                    host.sound_stop();
                }
                self.fade_to_black(bus, host);
            }
            host.sound_stop();

            // Unbind the services before touching anything they read
            self.interrupts_bound = false;
            bus.ctrl_write(reg_write(reg::MODE1, MODE1_HINT_OFF));

            if exit_frame.is_some() || !self.config.loop_playback {
                break;
            }

            self.stats.loops += 1;
            self.clear_plane(bus);
            host.loop_pause();
        }

        log::info!(
            "playback done: {} frames, {} dropped, {} parity bumps, {} flushes",
            self.stats.frames_played,
            self.stats.frames_dropped,
            self.stats.parity_bumps,
            self.stats.dma_flushes
        );
        Ok(self.stats.clone())
    }

    /// The per-frame loop; returns the frame index at which the exit button
    /// ended it, if it did
    fn play_frames<B: VdpBus, H: Host>(
        &mut self,
        bus: &mut B,
        host: &mut H,
    ) -> Result<Option<u32>> {
        let geo = self.table.geometry;
        let frame_count = self.table.frame_count();
        let mut frame: u32 = 0;

        while frame < frame_count {
            let descriptor = &self.table.frames[frame as usize];

            // Even frames load the base region, odd frames the alternate;
            // the advance policy below keeps consecutive rendered frames on
            // opposite regions
            let region_base =
                geo.base_tile_index + (frame & 1) as u16 * geo.region_tiles;

            // Each chunk gets its own blank/flush cycle: the staging buffer
            // is reused, so the next decode must not start while a transfer
            // from it is still queued
            let mut tile_offset: u16 = 0;
            for chunk in &descriptor.tilesets {
                if chunk.tile_count > 0 {
                    self.codec
                        .decode(&chunk.block, self.tileset.words_mut())?;
                    let dest = (region_base + tile_offset) * 32;
                    self.queue.enqueue(
                        DmaPurpose::Tileset,
                        DmaOp::encode(
                            self.tileset.addr(),
                            vram_dma_cmd(dest),
                            chunk.tile_count * 16,
                        ),
                    );
                    tile_offset += chunk.tile_count;
                }
                self.wait_vblank_and_flush(bus, host);
            }

            // Palettes decode into the unpack buffer; the swap is only
            // queued here and takes effect inside the next blank, after the
            // cycler has finished with the current render buffer
            self.codec
                .decode(&descriptor.palettes, self.pals.unpack_mut().words_mut())?;
            self.pals.queue_swap();

            self.codec
                .decode(&descriptor.tilemap, self.tilemap.words_mut())?;
            self.queue.enqueue(
                DmaPurpose::Tilemap,
                DmaOp::encode(
                    self.tilemap.addr(),
                    vram_dma_cmd(self.plane_addr),
                    geo.tilemap_words() as u16,
                ),
            );

            let prev = frame;
            let tick = bus.frame_count() - self.tick_origin;
            let paced = self.pacer.logical_frame(tick);
            frame = self.advance_frame(prev, paced);

            self.wait_vblank_and_flush(bus, host);
            self.stats.frames_played += 1;

            log::debug!(
                "frame {prev} done in {} hw frames, next {frame}",
                bus.frame_count() - self.tick_origin - tick
            );

            if host.exit_requested() {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Apply the configured overrun policy to the pacer's raw output
    fn advance_frame(&mut self, prev: u32, paced: u32) -> u32 {
        match self.config.advance {
            AdvancePolicy::ForceSequential => prev + 1,
            AdvancePolicy::SkipToPace => {
                let mut next = paced.max(prev);
                // Consecutive rendered frames must not share region parity;
                // bump rather than overwrite the region being scanned out
                if (prev ^ next) & 1 == 0 {
                    next += 1;
                    if paced > prev + 1 {
                        self.stats.parity_bumps += 1;
                    }
                }
                self.stats.frames_dropped += next - prev - 1;
                next
            }
        }
    }

    /// Block until the next vertical blank, dispatching the palette service
    /// at every strip boundary of the active display on the way
    fn wait_vblank<B: VdpBus>(&mut self, bus: &mut B) {
        let start = bus.frame_count();
        while bus.frame_count() == start {
            let line = bus.step_line();
            if self.interrupts_bound
                && line < self.standard.active_lines()
                && line & (STRIP_HEIGHT - 1) == STRIP_HEIGHT - 1
            {
                self.cycler.on_hline(bus, self.pals.render());
            }
        }
        self.stats.display_passes += 1;
    }

    /// Wait for the blank, then run the vertical-blank service: display off,
    /// palette handoff, queue flush with the audio bus locked, display on
    fn wait_vblank_and_flush<B: VdpBus, H: Host>(&mut self, bus: &mut B, host: &mut H) {
        self.wait_vblank(bus);

        bus.ctrl_write(display_off_word(MODE2_PLAYBACK));

        if self.interrupts_bound {
            // The handoff point: the swap the foreground queued becomes
            // visible to the cycler here and nowhere else
            self.pals.apply_queued_swap();
            self.cycler.begin_frame(bus, self.pals.render());
        }

        host.audio_bus_lock();
        host.settle_delay();
        self.stats.dma_flushes += self.queue.flush(bus) as u32;
        host.audio_bus_unlock();

        bus.ctrl_write(display_on_word(MODE2_PLAYBACK));
    }

    /// Iteratively darken the render palettes to black, one step every few
    /// frames, while the cycler keeps repainting the fading strips
    fn fade_to_black<B: VdpBus, H: Host>(&mut self, bus: &mut B, host: &mut H) {
        let steps = self.config.fade.steps;
        let step_frames = self.config.fade.step_frames.max(1);

        for _ in 0..steps {
            for color in self.pals.render_mut().words_mut().iter_mut() {
                *color = darken(*color);
            }
            for _ in 0..step_frames {
                self.wait_vblank_and_flush(bus, host);
            }
        }
    }

    /// Display bring-up: plane layout, auto-increment, initial blackout
    ///
    /// The window and sprite tables are parked on top of other structures so
    /// the whole tile space below the plane is usable for movie tiles.
    fn setup_display<B: VdpBus>(&mut self, bus: &mut B) {
        // Blank the screen for the whole bring-up; the first flushing blank
        // window of playback re-enables it
        bus.ctrl_write(display_off_word(MODE2_PLAYBACK));

        bus.ctrl_write(reg_write(reg::PLANE_SIZE, 0x01)); // 64x32 tiles
        bus.ctrl_write(reg_write(reg::PLANE_A_ADDR, (PLANE_BASE >> 10) as u8));
        bus.ctrl_write(reg_write(reg::PLANE_B_ADDR, (PLANE_BASE >> 13) as u8));
        bus.ctrl_write(reg_write(reg::WINDOW_ADDR, (PLANE_BASE >> 10) as u8));
        // Sprite list and hscroll table share 0xF000, freeing the VRAM the
        // sprite table would otherwise occupy for movie tiles
        bus.ctrl_write(reg_write(reg::SPRITE_ADDR, 0x78));
        bus.ctrl_write(reg_write(reg::HSCROLL_ADDR, 0x3C));
        bus.ctrl_write(reg_write(reg::AUTO_INC, 2));

        // Black out color memory while the first frame loads: palette
        // buffer A is still zeroed, push all 64 visible entries from it
        self.queue.enqueue(
            DmaPurpose::Palette,
            DmaOp::encode(
                self.pals.render().addr(),
                cram_dma_cmd(0),
                2 * COLORS_PER_STRIP as u16,
            ),
        );
        self.queue.flush(bus);
    }

    /// Decode the shared tiles cache and load its fixed ranges, then the
    /// variable-range remainder
    fn load_tiles_cache<B: VdpBus>(&mut self, bus: &mut B) -> Result<()> {
        let cache = &self.table.tiles_cache;
        let Some(block) = &cache.block else {
            return Ok(());
        };
        if cache.tile_count == 0 {
            return Ok(());
        }

        // The cache can be larger than the per-chunk staging buffer; it gets
        // its own transient buffer at the same address since playback has
        // not started yet
        let mut staged = StagingBuffer::new(
            layout::TILESET_STAGING,
            cache.tile_count as usize * 16,
        );
        self.codec.decode(block, staged.words_mut())?;

        let mut placed: u16 = 0;
        for range in &cache.ranges {
            if placed >= cache.tile_count {
                break;
            }
            let count = range.tile_count.min(cache.tile_count - placed);
            self.queue.enqueue(
                DmaPurpose::Tileset,
                DmaOp::encode(
                    staged.addr() + placed as u32 * 32,
                    vram_dma_cmd(range.start_index * 32),
                    count * 16,
                ),
            );
            self.queue.flush(bus);
            placed += count;
        }

        if placed < cache.tile_count {
            self.queue.enqueue(
                DmaPurpose::Tileset,
                DmaOp::encode(
                    staged.addr() + placed as u32 * 32,
                    vram_dma_cmd(cache.overflow_index * 32),
                    (cache.tile_count - placed) * 16,
                ),
            );
            self.queue.flush(bus);
        }

        log::debug!("tiles cache loaded: {} tiles", cache.tile_count);
        Ok(())
    }

    /// Clear the movie's plane rows back to the filler tile between loops
    fn clear_plane<B: VdpBus>(&mut self, bus: &mut B) {
        for word in self.tilemap.words_mut().iter_mut() {
            *word = FILLER_TILE_INDEX;
        }
        self.queue.enqueue(
            DmaPurpose::Tilemap,
            DmaOp::encode(
                self.tilemap.addr(),
                vram_dma_cmd(self.plane_addr),
                self.table.geometry.tilemap_words() as u16,
            ),
        );
        self.queue.flush(bus);
    }
}

/// One fade step: subtract one unit from every color component, clamping
/// each at black independently
fn darken(color: u16) -> u16 {
    let r = color & 0x000E;
    let g = color & 0x00E0;
    let b = color & 0x0E00;
    (if r >= 0x002 { r - 0x002 } else { 0 })
        | (if g >= 0x020 { g - 0x020 } else { 0 })
        | (if b >= 0x200 { b - 0x200 } else { 0 })
}
