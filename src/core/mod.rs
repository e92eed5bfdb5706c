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

//! Core playback engine components
//!
//! This module contains every component of the streaming engine:
//! - VDP port model (trait, command words, software simulation)
//! - DMA op encoder and transfer queue
//! - Resource table (frame descriptors, geometry, tiles cache)
//! - Codec boundary
//! - Staging buffers and the palette double buffer
//! - Horizontal-interrupt palette cycler
//! - Frame pacer
//! - Playback orchestrator

pub mod codec;
pub mod config;
pub mod cycler;
pub mod dma;
pub mod error;
pub mod pacer;
pub mod player;
pub mod resource;
pub mod staging;
pub mod vdp;

// Re-export commonly used types
pub use codec::{Codec, RawCodec};
pub use config::PlayerConfig;
pub use cycler::PaletteCycler;
pub use dma::{DmaOp, DmaPurpose, DmaQueue};
pub use error::{PlayerError, Result};
pub use pacer::FramePacer;
pub use player::{Host, NullHost, PlaybackStats, Player};
pub use resource::ResourceTable;
pub use vdp::{VdpBus, VideoStandard};
