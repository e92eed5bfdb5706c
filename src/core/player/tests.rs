// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 tilecast contributors

//! Playback orchestrator tests
//!
//! These run whole movies against the simulation bus and assert the engine's
//! externally visible properties: region parity alternation, swap safety,
//! budget discipline, pacing policies, exit and fade behavior.

use super::*;
use crate::core::codec::RawCodec;
use crate::core::config::StandardChoice;
use crate::core::cycler::PushMode;
use crate::core::pacer::PacingStrategy;
use crate::core::resource::FrameGeometry;
use crate::core::vdp::sim::{DmaTarget, SimBus};

fn geometry(strips: u16) -> FrameGeometry {
    FrameGeometry {
        width_tiles: 32,
        extended_width_tiles: 64,
        height_tiles: strips,
        frame_rate: 15,
        max_chunk_tiles: 20,
        region_tiles: 48,
        base_tile_index: 16,
    }
}

fn config(push: PushMode) -> PlayerConfig {
    PlayerConfig {
        push,
        ..PlayerConfig::default()
    }
}

/// Host that asks for exit after a fixed number of frame polls
#[derive(Default)]
struct CountingHost {
    polls: u32,
    exit_after: Option<u32>,
    sound_starts: u32,
    sound_stops: u32,
    bus_locks: u32,
    bus_unlocks: u32,
}

impl Host for CountingHost {
    fn sound_start(&mut self) {
        self.sound_starts += 1;
    }

    fn sound_stop(&mut self) {
        self.sound_stops += 1;
    }

    fn audio_bus_lock(&mut self) {
        self.bus_locks += 1;
    }

    fn audio_bus_unlock(&mut self) {
        self.bus_unlocks += 1;
    }

    fn exit_requested(&mut self) -> bool {
        self.polls += 1;
        match self.exit_after {
            Some(n) => self.polls > n,
            None => false,
        }
    }
}

/// Tileset transfers are the VRAM records sized to one chunk
fn tileset_dests(bus: &SimBus, geo: &FrameGeometry) -> Vec<u16> {
    let chunk_words = geo.max_chunk_tiles * 16;
    bus.dma_log()
        .iter()
        .filter(|r| r.target == DmaTarget::Vram && r.len_words == chunk_words)
        .map(|r| r.dest)
        .collect()
}

#[test]
fn test_full_movie_ntsc_stats() {
    let table = ResourceTable::synthetic(geometry(4), 4);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut host = CountingHost::default();
    let mut player = Player::new(
        &table,
        RawCodec,
        config(PushMode::Dma),
        VideoStandard::Ntsc,
    )
    .unwrap();

    let stats = player.play(&mut bus, &mut host).unwrap();

    // 15 fps on a 60 Hz display: four blank waits per frame keep exact pace
    assert_eq!(stats.frames_played, 4);
    assert_eq!(stats.frames_dropped, 0);
    assert_eq!(stats.parity_bumps, 0);
    assert!(!stats.exited_early);
    assert_eq!(stats.loops, 0);

    // One tileset and one tilemap flush per frame
    assert_eq!(stats.dma_flushes, 8);
    // Initial alignment plus four waits per frame
    assert_eq!(stats.display_passes, 17);

    assert_eq!(host.sound_starts, 1);
    assert_eq!(host.sound_stops, 1);
    // The audio bus is locked around every flushing blank window
    assert_eq!(host.bus_locks, 16);
    assert_eq!(host.bus_locks, host.bus_unlocks);
}

#[test]
fn test_region_parity_alternates() {
    let geo = geometry(4);
    let table = ResourceTable::synthetic(geo, 4);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut player =
        Player::new(&table, RawCodec, config(PushMode::Dma), VideoStandard::Ntsc).unwrap();

    player.play(&mut bus, &mut NullHost).unwrap();

    let dests = tileset_dests(&bus, &geo);
    assert_eq!(dests.len(), 4);

    // Even frames land in the base region, odd frames in the alternate
    let region_a = geo.base_tile_index * 32;
    let region_b = (geo.base_tile_index + geo.region_tiles) * 32;
    assert_eq!(dests, vec![region_a, region_b, region_a, region_b]);

    // No two consecutive rendered frames share a region
    for pair in dests.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn test_no_tearing_and_budget_kept() {
    for push in [PushMode::Cpu, PushMode::Dma] {
        let table = ResourceTable::synthetic(geometry(6), 6);
        let mut bus = SimBus::new(VideoStandard::Ntsc);
        let mut player =
            Player::new(&table, RawCodec, config(push), VideoStandard::Ntsc).unwrap();

        player.play(&mut bus, &mut NullHost).unwrap();

        // Every color write happened blanked or with the display off, and
        // no blank window moved more bytes than the standard allows
        assert_eq!(bus.visible_cram_writes, 0, "{push:?}");
        assert_eq!(bus.budget_overruns, 0, "{push:?}");
    }
}

#[test]
fn test_dma_flushes_only_in_vblank() {
    let table = ResourceTable::synthetic(geometry(4), 3);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut player =
        Player::new(&table, RawCodec, config(PushMode::Cpu), VideoStandard::Ntsc).unwrap();

    player.play(&mut bus, &mut NullHost).unwrap();

    // Queue flushes (tileset and tilemap transfers) always trigger inside
    // the blanking interval
    for record in bus.dma_log() {
        if record.target == DmaTarget::Vram {
            assert!(record.in_vblank, "VRAM DMA on active line {}", record.line);
        }
    }
}

#[test]
fn test_exit_runs_fade_to_black() {
    let table = ResourceTable::synthetic(geometry(4), 8);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut host = CountingHost {
        exit_after: Some(1),
        ..CountingHost::default()
    };
    let mut player = Player::new(
        &table,
        RawCodec,
        PlayerConfig {
            push: PushMode::Cpu,
            fade: crate::core::config::FadeConfig {
                steps: 8,
                step_frames: 1,
            },
            ..PlayerConfig::default()
        },
        VideoStandard::Ntsc,
    )
    .unwrap();

    let stats = player.play(&mut bus, &mut host).unwrap();

    assert!(stats.exited_early);
    assert_eq!(stats.frames_played, 2);

    // Eight fade steps of one frame each ran after the exit poll
    assert_eq!(stats.display_passes, 1 + 2 * 4 + 8);

    // Seven darkening steps zero any component; the final passes pushed
    // all-black strips into both banks
    assert!(bus.cram().iter().all(|&c| c == 0), "CRAM not black after fade");
}

#[test]
fn test_advance_policy_skip_to_pace() {
    let table = ResourceTable::synthetic(geometry(4), 4);
    let mut player = Player::new(
        &table,
        RawCodec,
        config(PushMode::Dma),
        VideoStandard::Ntsc,
    )
    .unwrap();

    // On pace: pacer still on the same frame advances by one
    assert_eq!(player.advance_frame(0, 0), 1);
    // Normal advance, parity already alternates
    assert_eq!(player.advance_frame(0, 1), 1);
    assert_eq!(player.stats.parity_bumps, 0);

    // Overrun by an even step: bump one further to restore parity
    assert_eq!(player.advance_frame(0, 2), 3);
    assert_eq!(player.stats.parity_bumps, 1);

    // Overrun by an odd step needs no bump
    assert_eq!(player.advance_frame(1, 4), 4);
    assert_eq!(player.stats.parity_bumps, 1);

    // The pacer never moves the index backwards
    assert_eq!(player.advance_frame(5, 2), 6);
}

#[test]
fn test_advance_policy_force_sequential() {
    let table = ResourceTable::synthetic(geometry(4), 4);
    let mut player = Player::new(
        &table,
        RawCodec,
        PlayerConfig {
            advance: AdvancePolicy::ForceSequential,
            ..PlayerConfig::default()
        },
        VideoStandard::Ntsc,
    )
    .unwrap();

    // The pacer's jump is ignored entirely
    assert_eq!(player.advance_frame(0, 3), 1);
    assert_eq!(player.advance_frame(1, 7), 2);
    assert_eq!(player.stats.frames_dropped, 0);
}

#[test]
fn test_pal_playback_drops_to_keep_pace() {
    let geo = geometry(4);
    let table = ResourceTable::synthetic(geo, 20);
    let mut bus = SimBus::new(VideoStandard::Pal);
    let mut player =
        Player::new(&table, RawCodec, config(PushMode::Dma), VideoStandard::Pal).unwrap();

    let stats = player.play(&mut bus, &mut NullHost).unwrap();

    // 15 fps wants 10/3 PAL ticks per frame but each frame costs 4, so the
    // pacer periodically jumps and frames drop
    assert!(stats.frames_dropped > 0);
    assert!(stats.frames_played < 20);
    assert!(stats.frames_played + stats.frames_dropped >= 20);

    // Parity still alternates through every drop
    let dests = tileset_dests(&bus, &geo);
    for pair in dests.windows(2) {
        assert_ne!(pair[0], pair[1], "parity repeated under frame dropping");
    }
}

#[test]
fn test_loop_playback_restarts() {
    let table = ResourceTable::synthetic(geometry(4), 2);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut host = CountingHost {
        // Let the first loop finish, exit during the second
        exit_after: Some(3),
        ..CountingHost::default()
    };
    let mut player = Player::new(
        &table,
        RawCodec,
        PlayerConfig {
            loop_playback: true,
            ..config(PushMode::Dma)
        },
        VideoStandard::Ntsc,
    )
    .unwrap();

    let stats = player.play(&mut bus, &mut host).unwrap();

    assert_eq!(stats.loops, 1);
    assert!(stats.exited_early);
    assert!(stats.frames_played > 2);
}

#[test]
fn test_rejects_frame_wider_than_screen() {
    let mut geo = geometry(4);
    geo.width_tiles = 44;
    let table = ResourceTable::synthetic(geo, 2);
    assert!(matches!(
        Player::new(&table, RawCodec, config(PushMode::Dma), VideoStandard::Ntsc),
        Err(PlayerError::InvalidGeometry(_))
    ));
}

#[test]
fn test_rejects_frame_taller_than_display() {
    let mut geo = geometry(26);
    geo.region_tiles = 100;
    let table = ResourceTable::synthetic(geo, 2);
    // 26 strips below the flicker-safe row 3 exceed NTSC's 28 rows
    assert!(matches!(
        Player::new(&table, RawCodec, config(PushMode::Dma), VideoStandard::Ntsc),
        Err(PlayerError::InvalidGeometry(_))
    ));
}

#[test]
fn test_standard_choice_feeds_player() {
    // Standard auto-detection reads the PAL wiring bit from the status word
    let bus = SimBus::new(VideoStandard::Ntsc);
    let standard = StandardChoice::Auto.resolve(bus.status());
    assert_eq!(standard, VideoStandard::Ntsc);

    let pal_bus = SimBus::new(VideoStandard::Pal);
    assert_eq!(
        StandardChoice::Auto.resolve(pal_bus.status()),
        VideoStandard::Pal
    );
}

#[test]
fn test_two_strip_movie_lookup_pacing() {
    // Minimal movie: 4 logical frames, 2 strips, NTSC, lookup-table pacing.
    // The cycler has nothing to push beyond the seeded strips; playback
    // still advances exactly one frame per four hardware ticks.
    let geo = geometry(2);
    let table = ResourceTable::synthetic(geo, 4);
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    let mut player = Player::new(
        &table,
        RawCodec,
        PlayerConfig {
            pacing: PacingStrategy::LookupTable,
            ..config(PushMode::Cpu)
        },
        VideoStandard::Ntsc,
    )
    .unwrap();

    let stats = player.play(&mut bus, &mut NullHost).unwrap();

    assert_eq!(stats.frames_played, 4);
    assert_eq!(stats.frames_dropped, 0);
    assert_eq!(bus.visible_cram_writes, 0);

    // The final frame's seeded banks carry that frame's first two strips
    let f = 3u16;
    assert_eq!(bus.cram()[0], (f << 9) & 0x0EEE);
    assert_eq!(bus.cram()[32], ((f << 9) | (1 << 5)) & 0x0EEE);
}

#[test]
fn test_darken_clamps_components() {
    assert_eq!(darken(0x0EEE), 0x0CCC);
    assert_eq!(darken(0x0222), 0x0000);
    assert_eq!(darken(0x0040), 0x0020);
    // Mixed: red already black, green and blue still fading
    assert_eq!(darken(0x0420), 0x0200);
    assert_eq!(darken(0x0000), 0x0000);
}
