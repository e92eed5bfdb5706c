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

/// Player error types
use thiserror::Error;

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Main error type for the playback engine
///
/// Errors only exist at the setup boundary (resource table validation,
/// configuration parsing). The real-time loop has no recoverable-error
/// channel: timing violations degrade to dropped or held frames and are
/// counted in [`PlaybackStats`](crate::core::player::PlaybackStats).
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("resource table is empty")]
    EmptyResourceTable,

    #[error("invalid frame geometry: {0}")]
    InvalidGeometry(String),

    #[error(
        "tileset chunk too large in frame {frame}: {tiles} tiles (staging capacity {capacity})"
    )]
    OversizedTilesetChunk {
        frame: usize,
        tiles: u16,
        capacity: u16,
    },

    #[error("palette block too large in frame {frame}: {colors} colors (expected {expected})")]
    OversizedPaletteBlock {
        frame: usize,
        colors: usize,
        expected: usize,
    },

    #[error("unsupported compression id: {0:#04X}")]
    UnsupportedCompression(u8),

    #[error("decoded block size mismatch: got {got} bytes, expected {expected}")]
    DecodedSizeMismatch { got: usize, expected: usize },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
