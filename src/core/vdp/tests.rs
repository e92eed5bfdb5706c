// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 tilecast contributors

//! Unit tests for VDP command words and the simulation bus

use super::sim::{DmaTarget, SimBus};
use super::*;

#[test]
fn test_command_words_match_protocol() {
    // CRAM CPU write commands used by the palette cycler
    assert_eq!(cram_write_cmd(0x0000), 0xC000_0000);
    assert_eq!(cram_write_cmd(0x0010), 0xC010_0000);
    assert_eq!(cram_write_cmd(0x0040), 0xC040_0000);
    assert_eq!(cram_write_cmd(0x0070), 0xC070_0000);

    // CRAM DMA trigger commands (same addresses, trigger bit set)
    assert_eq!(cram_dma_cmd(0x0000), 0xC000_0080);
    assert_eq!(cram_dma_cmd(0x0028), 0xC028_0080);
    assert_eq!(cram_dma_cmd(0x0068), 0xC068_0080);

    // VRAM DMA with address bits above A13 folded into the low half
    assert_eq!(vram_dma_cmd(0x2000), 0x6000_0080);
    assert_eq!(vram_dma_cmd(0xE186), 0x6186_0083);
}

#[test]
fn test_display_toggle_words() {
    assert_eq!(display_off_word(MODE2_PLAYBACK), 0x8134);
    assert_eq!(display_on_word(MODE2_PLAYBACK), 0x8174);
}

#[test]
fn test_standard_geometry() {
    assert_eq!(VideoStandard::Ntsc.total_lines(), 262);
    assert_eq!(VideoStandard::Ntsc.active_lines(), 224);
    assert_eq!(VideoStandard::Ntsc.active_tile_rows(), 28);
    assert_eq!(VideoStandard::Ntsc.refresh_rate(), 60);

    assert_eq!(VideoStandard::Pal.total_lines(), 313);
    assert_eq!(VideoStandard::Pal.active_lines(), 240);
    assert_eq!(VideoStandard::Pal.active_tile_rows(), 30);
    assert_eq!(VideoStandard::Pal.refresh_rate(), 50);
}

#[test]
fn test_sim_register_write() {
    let mut bus = SimBus::new(VideoStandard::Ntsc);

    bus.ctrl_write(reg_write(reg::AUTO_INC, 2));
    bus.ctrl_write(display_off_word(MODE2_PLAYBACK));
    assert!(!bus.display_enabled());

    bus.ctrl_write(display_on_word(MODE2_PLAYBACK));
    assert!(bus.display_enabled());
}

#[test]
fn test_sim_decodes_dma_trigger() {
    let mut bus = SimBus::new(VideoStandard::Ntsc);

    // Program length 0x123 words and source 0xFF0400, then trigger
    bus.ctrl_write(0x9323);
    bus.ctrl_write(0x9401);
    bus.ctrl_write(0x9500);
    bus.ctrl_write(0x9682);
    bus.ctrl_write(0x977F);
    bus.ctrl_write_cmd(vram_dma_cmd(0x2000));

    let log = bus.dma_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].source, 0x00FF_0400);
    assert_eq!(log[0].dest, 0x2000);
    assert_eq!(log[0].len_words, 0x0123);
    assert_eq!(log[0].target, DmaTarget::Vram);
}

#[test]
fn test_sim_cram_data_writes() {
    let mut bus = SimBus::new(VideoStandard::Ntsc);

    // Move into vblank so the write is not flagged as visible
    while !bus.in_vblank() {
        bus.step_line();
    }

    bus.ctrl_write_cmd(cram_write_cmd(0x0000));
    bus.data_write(0x0EEE_0A00);
    bus.data_write(0x0222_0044);

    assert_eq!(bus.cram()[0], 0x0EEE);
    assert_eq!(bus.cram()[1], 0x0A00);
    assert_eq!(bus.cram()[2], 0x0222);
    assert_eq!(bus.cram()[3], 0x0044);
    assert_eq!(bus.visible_cram_writes, 0);
}

#[test]
fn test_sim_flags_visible_cram_write() {
    let mut bus = SimBus::new(VideoStandard::Ntsc);

    // Beam at line 0, display enabled: this write would tear
    bus.ctrl_write_cmd(cram_write_cmd(0x0000));
    bus.data_write(0x0EEE_0EEE);
    assert_eq!(bus.visible_cram_writes, 1);

    // Same write with the display off is clean
    bus.ctrl_write(display_off_word(MODE2_PLAYBACK));
    bus.ctrl_write_cmd(cram_write_cmd(0x0004));
    bus.data_write(0x0EEE_0EEE);
    assert_eq!(bus.visible_cram_writes, 1);
}

#[test]
fn test_sim_line_and_frame_counters() {
    let mut bus = SimBus::new(VideoStandard::Ntsc);
    assert_eq!(bus.frame_count(), 0);

    // Step through one full refresh
    for _ in 0..VideoStandard::Ntsc.active_lines() {
        bus.step_line();
    }
    assert!(bus.in_vblank());
    assert_eq!(bus.frame_count(), 1);

    for _ in VideoStandard::Ntsc.active_lines()..VideoStandard::Ntsc.total_lines() {
        bus.step_line();
    }
    assert!(!bus.in_vblank());
    assert_eq!(bus.line(), 0);
    assert_eq!(bus.frame_count(), 1);
}

#[test]
fn test_sim_status_flags() {
    let mut ntsc = SimBus::new(VideoStandard::Ntsc);
    assert!(!ntsc.status().contains(VdpStatus::PAL_MODE));
    assert!(!ntsc.status().contains(VdpStatus::VBLANK));

    while !ntsc.in_vblank() {
        ntsc.step_line();
    }
    assert!(ntsc.status().contains(VdpStatus::VBLANK));

    let pal = SimBus::new(VideoStandard::Pal);
    assert!(pal.status().contains(VdpStatus::PAL_MODE));
}
