//! Scene sequencing: preload cache, playback state machine and the player facade.

/// Player facade tying the graph, preload cache and sequencer together.
pub mod player;
/// Opportunistic next-scene narration decoding.
pub mod preload;
/// Playback state machine; the only mutator of the active scene index.
pub mod sequencer;
