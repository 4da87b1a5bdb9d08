//! Importer for Kwik-format extracellular recordings.
//!
//! The Kwik family stores one experiment as a small set of HDF5 containers:
//! a `.kwik` metadata file next to a `.raw.kwd` companion holding the
//! continuous samples. This crate maps one recording into an in-memory
//! [`Session`] owning per-channel [`ChannelSignal`]s, synthesized
//! [`SpikeTrain`]s and a [`StimulusEpochs`] collection.
//!
//! Reads come in two flavors: eager (bulk data loaded) and lazy
//! (structurally complete records whose `lazy_shape` describes the data a
//! full read would have returned). The `cascade` flag of [`read_session`]
//! independently controls whether child entities are populated at all.

mod reader;
mod synth;
pub mod types;

use std::error::Error;
use std::path::Path;

// Re-export types
pub use types::*;

pub use reader::{
    read_channel_signal, read_session, read_spiketrain, read_stimulus_epochs,
    DEFAULT_SEGMENT_DURATION, DEFAULT_T_START,
};

/// Name of the file format this adapter reads.
pub const FORMAT_NAME: &str = "kwik";

/// File extensions used by the Kwik family.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["kwd", "kwx", "kwik"];

/// Entity kinds this adapter can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Session,
    ChannelSignal,
    SpikeTrain,
    StimulusEpochs,
}

/// Every entity kind reachable through this adapter, the aggregate first.
///
/// [`Session`] comes from [`read_session`]; the other kinds are also
/// retrievable one at a time through their dedicated read functions.
pub const SUPPORTED_ENTITIES: [EntityKind; 4] = [
    EntityKind::Session,
    EntityKind::ChannelSignal,
    EntityKind::SpikeTrain,
    EntityKind::StimulusEpochs,
];

/// Loads a Kwik session and returns its object graph.
///
/// Performs the common read: eager, cascading, recording 0, thread-local
/// randomness for the synthesized entities. Use [`read_session`] directly
/// for lazy or shallow reads, another recording index, or a seeded RNG.
///
/// # Examples
///
/// ```no_run
/// use kwik_importer::load;
///
/// let result = load("path/to/your/recording.kwik");
/// match result {
///     Ok(session) => println!("Channels: {}", session.num_channels()),
///     Err(e) => println!("Error loading file: {}", e),
/// }
/// ```
pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Session, Box<dyn Error>> {
    Ok(reader::read_session(
        file_path,
        false,
        true,
        0,
        &mut rand::thread_rng(),
    )?)
}
