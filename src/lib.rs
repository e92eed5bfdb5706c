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

//! Streaming tile-video playback engine for the Sega Mega Drive VDP
//!
//! This library plays a pre-encoded fixed-frame-rate movie (tileset chunks,
//! tilemaps and per-strip palettes) out of a read-only resource table into
//! video memory, synchronized to the display's retrace signals: a bounded
//! DMA queue flushed inside vertical blanks, a per-scanline palette cycler
//! that repaints color memory mid-frame, a four-strategy frame pacer, and an
//! orchestrator that ping-pongs two tile regions so a frame being decoded
//! never lands under the frame on screen.
//!
//! # Example
//!
//! ```
//! use tilecast::core::config::PlayerConfig;
//! use tilecast::core::resource::{FrameGeometry, ResourceTable};
//! use tilecast::core::vdp::{sim::SimBus, VideoStandard};
//! use tilecast::core::{NullHost, Player, RawCodec};
//!
//! let geometry = FrameGeometry {
//!     width_tiles: 32,
//!     extended_width_tiles: 64,
//!     height_tiles: 4,
//!     frame_rate: 15,
//!     max_chunk_tiles: 20,
//!     region_tiles: 48,
//!     base_tile_index: 16,
//! };
//! let table = ResourceTable::synthetic(geometry, 4);
//! let mut bus = SimBus::new(VideoStandard::Ntsc);
//!
//! let mut player = Player::new(
//!     &table,
//!     RawCodec,
//!     PlayerConfig::default(),
//!     VideoStandard::Ntsc,
//! )
//! .unwrap();
//! let stats = player.play(&mut bus, &mut NullHost).unwrap();
//! assert_eq!(stats.frames_played, 4);
//! ```

pub mod core;
