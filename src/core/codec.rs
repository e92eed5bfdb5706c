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

//! Codec boundary
//!
//! Decompression is an external collaborator: any type implementing
//! [`Codec`] can be plugged in, the engine only relies on the
//! `decode(compressedBlock) -> rawBuffer` shape. The id on each block selects
//! which scheme the codec must apply; the in-tree [`RawCodec`] handles only
//! uncompressed payloads and rejects everything else at setup.

use crate::core::error::{PlayerError, Result};
use crate::core::resource::{CompressedBlock, Compression};

/// Block decompressor
///
/// `decode` is pure with respect to the engine: it reads the block and fills
/// `dest` (a word buffer) completely, returning the number of words written.
/// It must never write past `dest` — block sizes are validated against the
/// staging capacity before playback starts.
pub trait Codec {
    /// Decompress one block into a word buffer
    ///
    /// # Arguments
    ///
    /// * `block` - compressed payload plus its scheme id
    /// * `dest` - staging buffer sized to the worst case
    ///
    /// # Returns
    ///
    /// Number of words written to `dest`
    fn decode(&self, block: &CompressedBlock, dest: &mut [u16]) -> Result<usize>;
}

/// Pass-through codec for uncompressed payloads
///
/// The movie encoder can store blocks raw when they do not compress well;
/// this codec copies them into staging as little-endian words. Any other
/// scheme id is an authoring mismatch and fails at setup.
#[derive(Debug, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    fn decode(&self, block: &CompressedBlock, dest: &mut [u16]) -> Result<usize> {
        match block.compression {
            Compression::None => {}
            Compression::RleWord => return Err(PlayerError::UnsupportedCompression(0x01)),
            Compression::Lz => return Err(PlayerError::UnsupportedCompression(0x02)),
        }

        let words = block.payload.len() / 2;
        if words > dest.len() {
            return Err(PlayerError::DecodedSizeMismatch {
                got: block.payload.len(),
                expected: dest.len() * 2,
            });
        }
        for (i, chunk) in block.payload.chunks_exact(2).enumerate() {
            dest[i] = u16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(words)
    }
}
