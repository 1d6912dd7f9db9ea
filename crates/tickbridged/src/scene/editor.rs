//! Editor play-mode state and the host busy signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use strum::Display;
use thiserror::Error;

/// Play mode of the host editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlayMode {
    /// Editing; the simulation is stopped.
    #[default]
    Edit,
    /// Running.
    Playing,
    /// Running but frozen; single frames may be stepped.
    Paused,
}

/// Rejected play-mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditorError {
    /// `play` while already playing.
    #[error("editor is already playing")]
    AlreadyPlaying,
    /// `stop` or `pause` while in edit mode.
    #[error("editor is not playing")]
    NotPlaying,
    /// `step` while not paused.
    #[error("editor must be paused to step")]
    NotPaused,
}

/// Play mode plus the simulated frame counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EditorState {
    play_mode: PlayMode,
    frame: u64,
}

impl EditorState {
    /// Current mode.
    #[must_use]
    pub const fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Frames simulated since play began.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Enters play mode, or resumes when paused.
    pub fn play(&mut self) -> Result<PlayMode, EditorError> {
        match self.play_mode {
            PlayMode::Playing => return Err(EditorError::AlreadyPlaying),
            PlayMode::Edit => self.frame = 0,
            PlayMode::Paused => {}
        }
        self.play_mode = PlayMode::Playing;
        Ok(self.play_mode)
    }

    /// Returns to edit mode.
    pub fn stop(&mut self) -> Result<PlayMode, EditorError> {
        if self.play_mode == PlayMode::Edit {
            return Err(EditorError::NotPlaying);
        }
        self.play_mode = PlayMode::Edit;
        self.frame = 0;
        Ok(self.play_mode)
    }

    /// Toggles between playing and paused.
    pub fn pause(&mut self) -> Result<PlayMode, EditorError> {
        self.play_mode = match self.play_mode {
            PlayMode::Edit => return Err(EditorError::NotPlaying),
            PlayMode::Playing => PlayMode::Paused,
            PlayMode::Paused => PlayMode::Playing,
        };
        Ok(self.play_mode)
    }

    /// Advances one frame while paused.
    pub fn step(&mut self) -> Result<u64, EditorError> {
        if self.play_mode != PlayMode::Paused {
            return Err(EditorError::NotPaused);
        }
        self.frame += 1;
        Ok(self.frame)
    }

    /// Host tick hook: advances the frame counter while playing.
    pub fn advance(&mut self) {
        if self.play_mode == PlayMode::Playing {
            self.frame += 1;
        }
    }
}

/// Flag the embedding application raises while a long host-side process
/// (an import, a compile) is running.
#[derive(Debug, Clone, Default)]
pub struct BusySignal(Arc<AtomicBool>);

impl BusySignal {
    /// Marks the host busy.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Marks the host idle.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Whether the host is busy.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
