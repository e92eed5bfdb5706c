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

//! Movie resource table
//!
//! The resource table is generated at build time by the movie encoder and is
//! read-only at runtime: one [`FrameDescriptor`] per logical frame, each
//! referencing up to three compressed tileset chunks, one compressed tilemap
//! and one compressed palette block. Chunk sizes are a content-authoring
//! invariant — [`ResourceTable::validate`] checks them once at setup, and the
//! playback loop never re-checks.

use crate::core::error::{PlayerError, Result};

/// Number of 8-pixel scanlines per palette strip (one tile row)
pub const STRIP_HEIGHT: u16 = 8;

/// Colors per palette strip: two 16-color palettes per horizontal band
pub const COLORS_PER_STRIP: usize = 32;

/// Tileset chunks per frame descriptor
pub const TILESET_CHUNKS: usize = 3;

/// Compression scheme identifier of a block
///
/// The engine treats codecs as black boxes behind
/// [`Codec`](crate::core::codec::Codec); this id only selects which one runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Stored uncompressed, decode is a straight copy
    None,
    /// Run-length encoding over words with an extended-width row gap
    RleWord,
    /// LZ-family word compressor
    Lz,
}

/// One compressed payload in the resource table
#[derive(Debug, Clone)]
pub struct CompressedBlock {
    /// Compression scheme of `payload`
    pub compression: Compression,
    /// Compressed bytes, byte order as authored
    pub payload: Box<[u8]>,
}

impl CompressedBlock {
    /// Wrap raw (uncompressed) little-endian word data
    pub fn raw(words: &[u16]) -> Self {
        let mut payload = Vec::with_capacity(words.len() * 2);
        for w in words {
            payload.extend_from_slice(&w.to_le_bytes());
        }
        Self {
            compression: Compression::None,
            payload: payload.into_boxed_slice(),
        }
    }
}

/// One compressed tileset chunk plus its tile count
///
/// A chunk with `tile_count == 0` is empty and skipped by the player (frames
/// reuse cached or previously loaded tiles instead).
#[derive(Debug, Clone)]
pub struct TilesetChunk {
    /// Tiles decoded from this chunk (32 bytes each)
    pub tile_count: u16,
    /// Compressed tile pixel data
    pub block: CompressedBlock,
}

impl TilesetChunk {
    /// An empty chunk
    pub fn empty() -> Self {
        Self {
            tile_count: 0,
            block: CompressedBlock {
                compression: Compression::None,
                payload: Box::new([]),
            },
        }
    }
}

/// Everything needed to put one logical frame on screen
///
/// Immutable; compiled into the resource table and never mutated at runtime.
#[derive(Debug, Clone)]
pub struct FrameDescriptor {
    /// Up to three tileset chunks, loaded in order at accumulating offsets
    pub tilesets: [TilesetChunk; TILESET_CHUNKS],
    /// Tile-index grid at the extended row width
    pub tilemap: CompressedBlock,
    /// All palette strips of the frame, 32 colors per strip
    pub palettes: CompressedBlock,
}

/// Static shape shared by every frame of one movie
#[derive(Debug, Clone, Copy)]
pub struct FrameGeometry {
    /// Visible frame width in tiles
    pub width_tiles: u16,
    /// Padded row width in tiles; DMA copies whole padded rows and the pad
    /// lands in plane columns outside the visible frame
    pub extended_width_tiles: u16,
    /// Frame height in tiles == number of palette strips
    pub height_tiles: u16,
    /// Movie frame rate in frames per second
    pub frame_rate: u32,
    /// Worst-case tiles in any single tileset chunk across the whole movie
    pub max_chunk_tiles: u16,
    /// Worst-case total tiles per frame; sizes each of the two ping-ponged
    /// tile regions in video memory
    pub region_tiles: u16,
    /// First tile index of the even-parity region (everything below is the
    /// reserved tile and the tiles cache)
    pub base_tile_index: u16,
}

impl FrameGeometry {
    /// Number of palette strips per frame
    #[inline(always)]
    pub fn strips(&self) -> u16 {
        self.height_tiles
    }

    /// Colors in one frame's palette block
    #[inline(always)]
    pub fn palette_colors(&self) -> usize {
        self.height_tiles as usize * COLORS_PER_STRIP
    }

    /// Words in one decoded tilemap (extended rows)
    #[inline(always)]
    pub fn tilemap_words(&self) -> usize {
        self.extended_width_tiles as usize * self.height_tiles as usize
    }

    fn validate(&self) -> Result<()> {
        if self.width_tiles == 0 || self.height_tiles == 0 {
            return Err(PlayerError::InvalidGeometry(
                "zero frame dimensions".into(),
            ));
        }
        if self.extended_width_tiles < self.width_tiles {
            return Err(PlayerError::InvalidGeometry(format!(
                "extended width {} narrower than visible width {}",
                self.extended_width_tiles, self.width_tiles
            )));
        }
        if self.frame_rate == 0 {
            return Err(PlayerError::InvalidGeometry("zero frame rate".into()));
        }
        if self.height_tiles < 2 {
            // The palette cycler needs at least two strips to ping-pong the
            // two CRAM banks
            return Err(PlayerError::InvalidGeometry(format!(
                "frame height {} below the two-strip minimum",
                self.height_tiles
            )));
        }
        if self.region_tiles == 0 {
            return Err(PlayerError::InvalidGeometry("zero region size".into()));
        }
        // Both tile regions must sit below the plane tables at 0xE000
        // (1792 tile slots)
        let top = self.base_tile_index as u32 + 2 * self.region_tiles as u32;
        if top > 1792 {
            return Err(PlayerError::InvalidGeometry(format!(
                "tile regions end at index {top}, past the 1792-tile space"
            )));
        }
        Ok(())
    }
}

/// A fixed destination range for cached tiles in tile memory
#[derive(Debug, Clone, Copy)]
pub struct CacheRange {
    /// First tile index of the range
    pub start_index: u16,
    /// Number of tiles the range holds
    pub tile_count: u16,
}

/// Tiles shared across many frames, loaded once before playback
///
/// The cache fills its fixed ranges first, in order; tiles left over go to
/// the variable range.
#[derive(Debug, Clone, Default)]
pub struct TilesCache {
    /// Fixed destination ranges, filled in order
    pub ranges: Vec<CacheRange>,
    /// Variable-range start index for the remainder
    pub overflow_index: u16,
    /// Compressed cache tiles
    pub block: Option<CompressedBlock>,
    /// Total tiles in the cache
    pub tile_count: u16,
}

/// Build-time generated movie data, read-only at runtime
#[derive(Debug, Clone)]
pub struct ResourceTable {
    /// Shape shared by every frame
    pub geometry: FrameGeometry,
    /// One descriptor per logical frame
    pub frames: Vec<FrameDescriptor>,
    /// Tiles shared across frames, loaded once at setup
    pub tiles_cache: TilesCache,
}

impl ResourceTable {
    /// Check the content-authoring invariants once, before playback starts
    ///
    /// Oversized chunks are an encoder bug, not a runtime condition: the
    /// staging buffers are sized from `max_chunk_tiles` and the playback loop
    /// performs no bounds checks of its own.
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.frames.is_empty() {
            return Err(PlayerError::EmptyResourceTable);
        }
        for (i, frame) in self.frames.iter().enumerate() {
            let mut frame_tiles = 0u32;
            for chunk in &frame.tilesets {
                if chunk.tile_count > self.geometry.max_chunk_tiles {
                    return Err(PlayerError::OversizedTilesetChunk {
                        frame: i,
                        tiles: chunk.tile_count,
                        capacity: self.geometry.max_chunk_tiles,
                    });
                }
                frame_tiles += chunk.tile_count as u32;
            }
            if frame_tiles > self.geometry.region_tiles as u32 {
                return Err(PlayerError::OversizedTilesetChunk {
                    frame: i,
                    tiles: frame_tiles as u16,
                    capacity: self.geometry.region_tiles,
                });
            }
            if frame.palettes.compression == Compression::None {
                let colors = frame.palettes.payload.len() / 2;
                if colors > self.geometry.palette_colors() {
                    return Err(PlayerError::OversizedPaletteBlock {
                        frame: i,
                        colors,
                        expected: self.geometry.palette_colors(),
                    });
                }
            }
        }
        log::debug!(
            "resource table: {} frames, {}x{} tiles, {} strips, {} fps",
            self.frames.len(),
            self.geometry.width_tiles,
            self.geometry.height_tiles,
            self.geometry.strips(),
            self.geometry.frame_rate
        );
        Ok(())
    }

    /// Number of logical frames in the movie
    #[inline(always)]
    pub fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Build a deterministic uncompressed movie for tests and the demo
    /// harness
    ///
    /// Every frame carries one tileset chunk of `max_chunk_tiles` tiles, a
    /// full extended-width tilemap referencing the frame's own region, and a
    /// palette block whose colors encode frame and strip so playback effects
    /// are traceable at the port level.
    pub fn synthetic(geometry: FrameGeometry, frame_count: u32) -> Self {
        let frames = (0..frame_count)
            .map(|f| {
                let tiles = geometry.max_chunk_tiles;
                let tile_words: Vec<u16> = (0..tiles as usize * 16)
                    .map(|i| (f as u16).wrapping_mul(31).wrapping_add(i as u16))
                    .collect();

                let base = geometry.base_tile_index + (f & 1) as u16 * geometry.region_tiles;
                let map_words: Vec<u16> = (0..geometry.tilemap_words())
                    .map(|i| base + (i as u16) % tiles)
                    .collect();

                let pal_words: Vec<u16> = (0..geometry.palette_colors())
                    .map(|i| {
                        let strip = (i / COLORS_PER_STRIP) as u16;
                        ((f as u16) << 9 | strip << 5 | (i % COLORS_PER_STRIP) as u16) & 0x0EEE
                    })
                    .collect();

                FrameDescriptor {
                    tilesets: [
                        TilesetChunk {
                            tile_count: tiles,
                            block: CompressedBlock::raw(&tile_words),
                        },
                        TilesetChunk::empty(),
                        TilesetChunk::empty(),
                    ],
                    tilemap: CompressedBlock::raw(&map_words),
                    palettes: CompressedBlock::raw(&pal_words),
                }
            })
            .collect();

        Self {
            geometry,
            frames,
            tiles_cache: TilesCache::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            width_tiles: 32,
            extended_width_tiles: 64,
            height_tiles: 22,
            frame_rate: 15,
            max_chunk_tiles: 300,
            region_tiles: 704,
            base_tile_index: 16,
        }
    }

    fn frame(tiles: u16) -> FrameDescriptor {
        FrameDescriptor {
            tilesets: [
                TilesetChunk {
                    tile_count: tiles,
                    block: CompressedBlock::raw(&vec![0u16; tiles as usize * 16]),
                },
                TilesetChunk::empty(),
                TilesetChunk::empty(),
            ],
            tilemap: CompressedBlock::raw(&[0u16; 64]),
            palettes: CompressedBlock::raw(&[0u16; 22 * 32]),
        }
    }

    #[test]
    fn test_valid_table_passes() {
        let table = ResourceTable {
            geometry: geometry(),
            frames: vec![frame(100), frame(0)],
            tiles_cache: TilesCache::default(),
        };
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = ResourceTable {
            geometry: geometry(),
            frames: vec![],
            tiles_cache: TilesCache::default(),
        };
        assert!(matches!(
            table.validate(),
            Err(PlayerError::EmptyResourceTable)
        ));
    }

    #[test]
    fn test_oversized_chunk_rejected() {
        let table = ResourceTable {
            geometry: geometry(),
            frames: vec![frame(301)],
            tiles_cache: TilesCache::default(),
        };
        assert!(matches!(
            table.validate(),
            Err(PlayerError::OversizedTilesetChunk { frame: 0, .. })
        ));
    }

    #[test]
    fn test_bad_geometry_rejected() {
        let mut g = geometry();
        g.extended_width_tiles = 16;
        let table = ResourceTable {
            geometry: g,
            frames: vec![frame(10)],
            tiles_cache: TilesCache::default(),
        };
        assert!(matches!(
            table.validate(),
            Err(PlayerError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_single_strip_rejected() {
        let mut g = geometry();
        g.height_tiles = 1;
        let table = ResourceTable {
            geometry: g,
            frames: vec![frame(10)],
            tiles_cache: TilesCache::default(),
        };
        assert!(matches!(
            table.validate(),
            Err(PlayerError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_geometry_accessors() {
        let g = geometry();
        assert_eq!(g.strips(), 22);
        assert_eq!(g.palette_colors(), 704);
        assert_eq!(g.tilemap_words(), 64 * 22);
    }
}
