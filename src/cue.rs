use rand::seq::SliceRandom;
use rand::Rng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::timer::Cue;

pub const DEFAULT_COUNTDOWN_SOUND: &str = "Countdown03-3.mp3";
pub const DEFAULT_FINISH_SOUND: &str = "Water_Drop02-1(Low-Reverb).mp3";

pub const POSITIVE_WORDS: [&str; 15] = [
    "Happy", "Lucky", "Smile", "Relax", "Awesome", "Great", "Enjoy", "Peace", "Love", "Shine",
    "Sweet", "Fun", "Good", "Nice", "Cool",
];

#[derive(Debug, Error)]
pub enum CueError {
    #[error("sound asset {} not found", .0.display())]
    MissingAsset(PathBuf),
    #[error("could not play {}: {}", .path.display(), .reason)]
    Playback { path: PathBuf, reason: String },
}

/// Something that can make a noise for a sound asset
pub trait CuePlayer {
    fn play(&mut self, asset: &Path) -> Result<(), CueError>;
}

impl<P: CuePlayer + ?Sized> CuePlayer for Box<P> {
    fn play(&mut self, asset: &Path) -> Result<(), CueError> {
        (**self).play(asset)
    }
}

fn require_asset(asset: &Path) -> Result<(), CueError> {
    if asset.is_file() {
        Ok(())
    } else {
        Err(CueError::MissingAsset(asset.to_path_buf()))
    }
}

/// Rings the terminal bell in place of the asset, as long as the asset exists
#[derive(Debug, Default, Clone, Copy)]
pub struct BellPlayer;

impl CuePlayer for BellPlayer {
    fn play(&mut self, asset: &Path) -> Result<(), CueError> {
        require_asset(asset)?;
        let mut out = io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| CueError::Playback {
                path: asset.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl CuePlayer for SilentPlayer {
    fn play(&mut self, _asset: &Path) -> Result<(), CueError> {
        Ok(())
    }
}

/// Decodes and plays the asset on the default output device
#[cfg(feature = "audio")]
pub struct RodioPlayer {
    // dropping the stream silences every sink
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
}

#[cfg(feature = "audio")]
impl RodioPlayer {
    pub fn try_new() -> Result<Self, CueError> {
        let (stream, handle) =
            rodio::OutputStream::try_default().map_err(|e| CueError::Playback {
                path: PathBuf::new(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

#[cfg(feature = "audio")]
impl CuePlayer for RodioPlayer {
    fn play(&mut self, asset: &Path) -> Result<(), CueError> {
        require_asset(asset)?;
        let failed = |reason: String| CueError::Playback {
            path: asset.to_path_buf(),
            reason,
        };
        let file = std::fs::File::open(asset).map_err(|e| failed(e.to_string()))?;
        let source = rodio::Decoder::new(io::BufReader::new(file)).map_err(|e| failed(e.to_string()))?;
        let sink = rodio::Sink::try_new(&self.handle).map_err(|e| failed(e.to_string()))?;
        sink.append(source);
        sink.detach();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAssets {
    pub countdown: PathBuf,
    pub finish: PathBuf,
}

impl Default for SoundAssets {
    fn default() -> Self {
        Self {
            countdown: PathBuf::from(DEFAULT_COUNTDOWN_SOUND),
            finish: PathBuf::from(DEFAULT_FINISH_SOUND),
        }
    }
}

/// Picks a word for the completion banner
pub fn pick_phrase<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    POSITIVE_WORDS.choose(rng).copied().unwrap_or("Enjoy")
}

pub fn finish_message(word: &str) -> String {
    format!("BREW FINISHED! ✨ {word} ✨")
}

/// Turns timer cues into sounds and the completion message
pub struct CueDispatcher<P: CuePlayer, R: Rng> {
    player: P,
    rng: R,
    assets: SoundAssets,
}

impl<P: CuePlayer, R: Rng> CueDispatcher<P, R> {
    pub fn new(player: P, rng: R, assets: SoundAssets) -> Self {
        Self {
            player,
            rng,
            assets,
        }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Handles one cue. Returns the completion message for a finish cue.
    pub fn dispatch(&mut self, cue: Cue) -> Option<String> {
        match cue {
            Cue::Countdown => {
                let asset = self.assets.countdown.clone();
                self.play(&asset);
                None
            }
            Cue::Finish => {
                let asset = self.assets.finish.clone();
                self.play(&asset);
                Some(finish_message(pick_phrase(&mut self.rng)))
            }
        }
    }

    /// Dispatches every cue of a tick, keeping the last message produced.
    pub fn dispatch_all(&mut self, cues: &[Cue]) -> Option<String> {
        cues.iter().fold(None, |msg, cue| self.dispatch(*cue).or(msg))
    }

    fn play(&mut self, asset: &Path) {
        match self.player.play(asset) {
            Ok(()) => {}
            Err(CueError::MissingAsset(path)) => {
                debug!(path = %path.display(), "sound asset missing, skipping cue")
            }
            Err(e) => warn!("{e}"),
        }
    }
}
