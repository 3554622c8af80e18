pub mod player;
pub mod provider;
pub mod providers;

pub use player::CommandPlayer;
pub use provider::{PlaybackError, Player, SpeechError, Synthesizer};
pub use providers::GoogleTts;
