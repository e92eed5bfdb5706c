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

//! Demo playback harness
//!
//! Plays a synthetic movie through the full engine against the simulated
//! VDP and prints the playback statistics plus the simulation's audit
//! counters. Useful for eyeballing the engine's port traffic with
//! `RUST_LOG=trace` and for quick regression runs without test harness
//! overhead.

use clap::Parser;
use log::info;
use tilecast::core::config::PlayerConfig;
use tilecast::core::resource::{FrameGeometry, ResourceTable};
use tilecast::core::vdp::sim::SimBus;
use tilecast::core::vdp::VdpBus;
use tilecast::core::{NullHost, Player, RawCodec};

/// Streaming tile-video playback demo on the simulated VDP
#[derive(Parser)]
#[command(name = "tilecast")]
#[command(about = "Play a synthetic movie through the streaming engine", long_about = None)]
struct Args {
    /// Number of logical frames in the synthetic movie
    #[arg(short = 'n', long, default_value_t = 60)]
    frames: u32,

    /// Frame height in strips (8-line tile rows)
    #[arg(long, default_value_t = 22)]
    strips: u16,

    /// Run with PAL display timing instead of NTSC
    #[arg(long)]
    pal: bool,

    /// Path to a TOML playback configuration
    #[arg(short = 'c', long)]
    config: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present so developers can keep RUST_LOG settings local
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("tilecast v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    let geometry = FrameGeometry {
        width_tiles: 32,
        extended_width_tiles: 64,
        height_tiles: args.strips,
        frame_rate: 15,
        max_chunk_tiles: 128,
        region_tiles: 400,
        base_tile_index: 16,
    };
    let table = ResourceTable::synthetic(geometry, args.frames);

    // The simulated console's wiring comes from the command line; the
    // config then resolves against its status word like on hardware
    let mut bus = SimBus::new(if args.pal {
        tilecast::core::VideoStandard::Pal
    } else {
        tilecast::core::VideoStandard::Ntsc
    });
    let standard = config.standard.resolve(bus.status());
    info!(
        "playing {} synthetic frames, {} strips, {:?}, {:?} palette push",
        args.frames, args.strips, standard, config.push
    );

    let mut player = Player::new(&table, RawCodec, config, standard)?;
    let stats = player.play(&mut bus, &mut NullHost)?;

    info!(
        "frames played: {}, dropped: {}, parity bumps: {}",
        stats.frames_played, stats.frames_dropped, stats.parity_bumps
    );
    info!(
        "display passes: {}, DMA flushes: {}, hw frames: {}",
        stats.display_passes,
        stats.dma_flushes,
        bus.frame_count()
    );
    info!(
        "audit: {} visible CRAM writes, {} budget overruns",
        bus.visible_cram_writes, bus.budget_overruns
    );

    Ok(())
}
