use ndarray::{Array1, Array3};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(0);

/// Identifier of a [`Session`], used for child-to-parent back-references.
///
/// Children do not hold a pointer to their owning session; they carry its id
/// instead, so the object graph stays acyclic. Ids are allocated from a
/// process-wide counter and are unique within a process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One channel's continuously sampled voltage trace.
///
/// In a lazy read the sample buffer is empty and `lazy_shape` records the
/// size that a full read would have produced.
#[derive(Debug, Clone)]
pub struct ChannelSignal {
    /// Recorded samples for this channel; empty when read lazily
    pub samples: Array1<f64>,
    /// Unit label for the sample values (always volts)
    pub units: String,
    /// Sampling rate of the continuous recording (Hz)
    pub sampling_rate: f64,
    /// Time of the first sample (s)
    pub t_start: f64,
    /// Index of the source channel in the raw data array
    pub channel_index: usize,
    /// Shape the data would have had, present only after a lazy read
    pub lazy_shape: Option<Vec<usize>>,
    /// Free-form metadata slot for values outside the core model
    pub annotations: HashMap<String, String>,
    /// Back-reference to the owning session, set during session assembly
    pub session: Option<SessionId>,
}

/// Spike times attributed to one putative unit on one channel.
///
/// Times are kept in the order they were generated and are not guaranteed
/// to be monotonic. Waveforms, sampling rate and left sweep are only
/// present after an eager read.
#[derive(Debug, Clone)]
pub struct SpikeTrain {
    /// Spike timestamps (s), in generation order; empty when read lazily
    pub times: Array1<f64>,
    /// Lower bound of the valid time range (s)
    pub t_start: f64,
    /// Exclusive upper bound of the valid time range (s)
    pub t_stop: f64,
    /// Index of the channel the unit was recorded on
    pub channel_index: usize,
    /// Per-spike waveform snippets (mV)
    /// - Shape: [num_spikes, num_electrodes, num_waveform_samples]
    pub waveforms: Option<Array3<f64>>,
    /// Sampling rate of the waveform snippets (Hz)
    pub sampling_rate: Option<f64>,
    /// Pre-trigger span covered by each snippet (s)
    pub left_sweep: Option<f64>,
    /// Number of spikes a full read would have produced, lazy reads only
    pub lazy_shape: Option<Vec<usize>>,
    /// Free-form metadata slot for values outside the core model
    pub annotations: HashMap<String, String>,
    /// Back-reference to the owning session, set during session assembly
    pub session: Option<SessionId>,
}

/// Labeled stimulus intervals, stored as three parallel vectors.
#[derive(Debug, Clone, Default)]
pub struct StimulusEpochs {
    /// Onset time of each epoch (s)
    pub times: Vec<f64>,
    /// Duration of each epoch (s)
    pub durations: Vec<f64>,
    /// Categorical label of each epoch
    pub labels: Vec<String>,
    /// Back-reference to the owning session, set during session assembly
    pub session: Option<SessionId>,
}

impl StimulusEpochs {
    /// Number of epochs in the collection.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if the collection holds no epochs (always the case after a
    /// lazy read).
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Aggregate read result for one recording session.
///
/// Owns every child record exclusively. `signals` is ordered by channel
/// index; `spike_trains` holds the trains of channel 0 first, then channel
/// 1, and so on. `stimulus_epochs` and `duration` are only populated by a
/// cascading read.
///
/// # Examples
///
/// ```no_run
/// use kwik_importer::load;
///
/// let session = load("path/to/recording.kwik").unwrap();
/// println!("{} channels", session.signals.len());
/// if let Some(duration) = session.duration {
///     println!("{:.3} seconds of data", duration);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    /// Identifier children use to refer back to this session
    pub id: SessionId,
    /// Session name, derived from the source file name
    pub name: String,
    /// Continuous signals, one per channel
    pub signals: Vec<ChannelSignal>,
    /// Spike trains, several per channel
    pub spike_trains: Vec<SpikeTrain>,
    /// Stimulus markers; `None` for non-cascading reads
    pub stimulus_epochs: Option<StimulusEpochs>,
    /// Time of the last sample (s); `None` for non-cascading reads
    pub duration: Option<f64>,
}

impl Session {
    /// Creates an empty session with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Session {
            id: SessionId::next(),
            name: name.into(),
            signals: Vec::new(),
            spike_trains: Vec::new(),
            stimulus_epochs: None,
            duration: None,
        }
    }

    /// Stamps every child record with this session's id.
    ///
    /// Run once after assembly; children created outside a session keep
    /// `session == None` until linked.
    pub fn link_children(&mut self) {
        for signal in &mut self.signals {
            signal.session = Some(self.id);
        }
        for train in &mut self.spike_trains {
            train.session = Some(self.id);
        }
        if let Some(epochs) = &mut self.stimulus_epochs {
            epochs.session = Some(self.id);
        }
    }

    /// Number of channels found in the raw recording.
    pub fn num_channels(&self) -> usize {
        self.signals.len()
    }
}

/// Custom error types for the Kwik importer.
///
/// Every failure in the read path surfaces as one of these; there is no
/// local recovery and no partially populated session on error.
#[derive(Debug)]
pub enum KwikError {
    /// The source file or its raw-data companion could not be opened
    SourceNotFound(PathBuf),
    /// An expected group or dataset was absent, or had the wrong rank
    MalformedContainer(String),
    /// A required attribute was absent on an otherwise valid recording
    MissingAttribute(&'static str),
    /// The crate was built without the statistics backend needed for
    /// waveform synthesis
    MissingOptionalDependency(&'static str),
    /// An error reported by the underlying HDF5 library
    Hdf5(hdf5::Error),
}

impl fmt::Display for KwikError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KwikError::SourceNotFound(path) => {
                write!(f, "cannot open source file: {}", path.display())
            }
            KwikError::MalformedContainer(msg) => write!(f, "malformed container: {}", msg),
            KwikError::MissingAttribute(name) => {
                write!(f, "missing required attribute '{}'", name)
            }
            KwikError::MissingOptionalDependency(name) => write!(
                f,
                "'{}' is unavailable; rebuild with the 'waveforms' feature enabled",
                name
            ),
            KwikError::Hdf5(e) => write!(f, "HDF5 error: {}", e),
        }
    }
}

impl Error for KwikError {}

impl From<hdf5::Error> for KwikError {
    fn from(error: hdf5::Error) -> Self {
        KwikError::Hdf5(error)
    }
}
