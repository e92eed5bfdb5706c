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

//! Playback configuration
//!
//! Everything that was a build-time `#define` in the original engine is a
//! configuration value here, loaded from TOML or constructed in code. The
//! choices are still made once, before playback starts; the hot paths read
//! resolved values and never consult the config again.
//!
//! ```toml
//! standard = "auto"
//! pacing = "lookup-table"
//! push = "dma"
//! advance = "skip-to-pace"
//!
//! [fade]
//! steps = 16
//! step_frames = 4
//! ```

use crate::core::cycler::PushMode;
use crate::core::error::{PlayerError, Result};
use crate::core::pacer::PacingStrategy;
use crate::core::vdp::{VdpStatus, VideoStandard};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Broadcast standard selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardChoice {
    /// Read the PAL bit from the VDP status word at startup
    #[default]
    Auto,
    /// Force NTSC timing
    Ntsc,
    /// Force PAL timing
    Pal,
}

impl StandardChoice {
    /// Resolve against the console's status word
    pub fn resolve(self, status: VdpStatus) -> VideoStandard {
        match self {
            StandardChoice::Ntsc => VideoStandard::Ntsc,
            StandardChoice::Pal => VideoStandard::Pal,
            StandardChoice::Auto => {
                if status.contains(VdpStatus::PAL_MODE) {
                    VideoStandard::Pal
                } else {
                    VideoStandard::Ntsc
                }
            }
        }
    }
}

/// What to do when decode overruns and the pacer jumps ahead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvancePolicy {
    /// Follow the pacer, dropping frames; bump by one extra frame whenever
    /// the jump would repeat the tile-region parity
    #[default]
    SkipToPace,
    /// Ignore the pacer's jump and always play the next frame; playback
    /// slows down instead of dropping
    ForceSequential,
}

/// Fade-to-black shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeConfig {
    /// Darkening steps until black
    pub steps: u16,
    /// Display frames between steps
    pub step_frames: u16,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            steps: 16,
            step_frames: 4,
        }
    }
}

impl FadeConfig {
    /// Display frames the whole fade occupies
    #[inline(always)]
    pub fn total_frames(&self) -> u32 {
        self.steps as u32 * self.step_frames as u32
    }
}

/// Complete playback configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Broadcast standard (default: auto-detect)
    pub standard: StandardChoice,
    /// Frame pacing strategy (default: lookup table)
    pub pacing: PacingStrategy,
    /// Palette push mode for the h-int cycler (default: DMA bursts)
    pub push: PushMode,
    /// Overrun policy (default: skip to pace)
    pub advance: AdvancePolicy,
    /// Fade-to-black shape on exit
    pub fade: FadeConfig,
    /// Loop the movie when the table runs out instead of returning
    pub loop_playback: bool,
}

impl PlayerConfig {
    /// Load a configuration from a TOML file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tilecast::core::config::PlayerConfig;
    ///
    /// let config = PlayerConfig::load("player.toml").unwrap();
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PlayerError::ConfigNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: PlayerConfig = toml::from_str(&text)?;
        log::debug!("config loaded from {}: {config:?}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.standard, StandardChoice::Auto);
        assert_eq!(config.pacing, PacingStrategy::LookupTable);
        assert_eq!(config.push, PushMode::Dma);
        assert_eq!(config.advance, AdvancePolicy::SkipToPace);
        assert_eq!(config.fade.steps, 16);
        assert_eq!(config.fade.step_frames, 4);
        assert!(!config.loop_playback);
    }

    #[test]
    fn test_parse_full_toml() {
        let config: PlayerConfig = toml::from_str(
            r#"
            standard = "pal"
            pacing = "reciprocal"
            push = "cpu"
            advance = "force-sequential"
            loop_playback = true

            [fade]
            steps = 8
            step_frames = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.standard, StandardChoice::Pal);
        assert_eq!(config.pacing, PacingStrategy::Reciprocal);
        assert_eq!(config.push, PushMode::Cpu);
        assert_eq!(config.advance, AdvancePolicy::ForceSequential);
        assert!(config.loop_playback);
        assert_eq!(config.fade.total_frames(), 16);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: PlayerConfig = toml::from_str(r#"push = "cpu""#).unwrap();
        assert_eq!(config.push, PushMode::Cpu);
        assert_eq!(config.pacing, PacingStrategy::LookupTable);
    }

    #[test]
    fn test_standard_resolution() {
        assert_eq!(
            StandardChoice::Auto.resolve(VdpStatus::PAL_MODE),
            VideoStandard::Pal
        );
        assert_eq!(
            StandardChoice::Auto.resolve(VdpStatus::empty()),
            VideoStandard::Ntsc
        );
        assert_eq!(
            StandardChoice::Ntsc.resolve(VdpStatus::PAL_MODE),
            VideoStandard::Ntsc
        );
    }
}
