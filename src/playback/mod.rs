// src/playback/mod.rs
pub mod clock;
pub mod coordinator;
pub mod video_index;

pub use clock::PlaybackClock;
pub use coordinator::{CoordinatorState, EegPlaybackSource, StreamCoordinator, VideoIndexPlaybackSource};
pub use video_index::VideoIndex;
