use ndarray::{s, Array1, Array3};
use rand::Rng;
use rand_distr::StandardNormal;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::synth;
use crate::types::*;

// Constants used throughout the reader
const RAW_DATA_EXTENSION: &str = "raw.kwd";
const SPIKETRAINS_PER_CHANNEL: usize = 3;
const SPIKES_PER_TRAIN: usize = 40;
const SPIKE_SAMPLING_RATE: f64 = 10_000.0; // Hz
const SPIKE_LEFT_SWEEP: f64 = 1.5; // s
const NUM_STIMULUS_EPOCHS: usize = 1000;
const STIMULUS_DURATION: f64 = 0.5; // s
// Draws strictly above this threshold take the minority label (p = 0.4).
const TRIGGER_A_THRESHOLD: f64 = 0.6;
const SIGNAL_UNITS: &str = "V";

/// Default spike train window length (s).
pub const DEFAULT_SEGMENT_DURATION: f64 = 15.0;
/// Default spike train window start (s).
pub const DEFAULT_T_START: f64 = -1.0;

/// Reads a full session from a Kwik file and its raw-data companion.
///
/// `path` points at the metadata container; the continuous samples are
/// expected next to it under the same stem with a `.raw.kwd` extension.
/// `lazy` substitutes shape-annotated placeholders for bulk data, `cascade`
/// controls whether child entities are populated at all, and `dataset`
/// selects the recording inside the container. Randomness for the
/// synthesized entities comes from `rng`, so callers can seed it.
///
/// Both containers stay open for the duration of the call and are never
/// written to. Any failure aborts the read; a partially populated session
/// is never returned.
pub fn read_session<P: AsRef<Path>, R: Rng>(
    path: P,
    lazy: bool,
    cascade: bool,
    dataset: usize,
    rng: &mut R,
) -> Result<Session, KwikError> {
    let path = path.as_ref();
    let raw_path = raw_companion_path(path);

    // The metadata side only validates the pair here; spike trains are
    // synthesized below rather than pulled from the sorting results.
    let _kwik = hdf5::File::open(path).map_err(|_| KwikError::SourceNotFound(path.to_path_buf()))?;
    let raw =
        hdf5::File::open(&raw_path).map_err(|_| KwikError::SourceNotFound(raw_path.clone()))?;
    log::debug!("opened {} and {}", path.display(), raw_path.display());

    let recording = recording_group(&raw, dataset)?;
    let data = recording.dataset("data").map_err(|_| {
        KwikError::MalformedContainer(format!("recording {} has no 'data' dataset", dataset))
    })?;
    let shape = data.shape();
    if shape.len() != 2 {
        return Err(KwikError::MalformedContainer(format!(
            "expected a 2-D sample array, got {} dimension(s)",
            shape.len()
        )));
    }
    let num_channels = shape[0];
    log::info!("found {} channels in recording {}", num_channels, dataset);

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());
    let mut session = Session::new(name);

    if cascade {
        for channel_index in 0..num_channels {
            session
                .signals
                .push(read_channel_signal(lazy, &raw, channel_index, dataset)?);
        }

        for channel_index in 0..num_channels {
            for _ in 0..SPIKETRAINS_PER_CHANNEL {
                session.spike_trains.push(read_spiketrain(
                    lazy,
                    channel_index,
                    DEFAULT_SEGMENT_DURATION,
                    DEFAULT_T_START,
                    rng,
                )?);
            }
        }

        // Stimulus onsets are drawn from the recording's own timeline, and
        // the session ends at its maximum.
        let timestamps = recording_timestamps(&recording)?;
        session.stimulus_epochs = Some(read_stimulus_epochs(lazy, &timestamps, rng)?);
        session.duration = timestamps.iter().copied().reduce(f64::max);
    }

    session.link_children();
    Ok(session)
}

/// Reads one channel's continuous trace from the raw container.
///
/// `raw` is an already-open raw-data container, so repeated single-channel
/// reads reuse the handle. The recording's `sample_rate` and `start_time`
/// attributes are required in both modes; a lazy read additionally needs
/// the declared `shape` and touches no sample data.
pub fn read_channel_signal(
    lazy: bool,
    raw: &hdf5::File,
    channel_index: usize,
    dataset: usize,
) -> Result<ChannelSignal, KwikError> {
    let recording = recording_group(raw, dataset)?;
    let sampling_rate: f64 = require_attr(&recording, "sample_rate")?;
    let t_start: f64 = require_attr(&recording, "start_time")?;

    let mut signal = ChannelSignal {
        samples: Array1::zeros(0),
        units: SIGNAL_UNITS.to_string(),
        sampling_rate,
        t_start,
        channel_index,
        lazy_shape: None,
        annotations: HashMap::new(),
        session: None,
    };

    if lazy {
        let declared: u64 = require_attr(&recording, "shape")?;
        signal.lazy_shape = Some(vec![declared as usize]);
    } else {
        let data = recording.dataset("data").map_err(|_| {
            KwikError::MalformedContainer(format!("recording {} has no 'data' dataset", dataset))
        })?;
        signal.samples = data.read_slice_1d(s![channel_index, ..])?;
    }

    // Extension point for metadata outside the core model.
    signal
        .annotations
        .insert("info".to_string(), "channel metadata goes here".to_string());

    Ok(signal)
}

/// Synthesizes one spike train for a channel.
///
/// Stands in for a real per-channel spike detector: timestamps are drawn
/// uniformly from `[t_start, t_start + segment_duration)` and kept in draw
/// order, so they are not guaranteed to be sorted. Every spike carries a
/// noisy copy of the canonical template snippet. Requires the `waveforms`
/// feature; without it the call fails before doing any work.
pub fn read_spiketrain<R: Rng>(
    lazy: bool,
    channel_index: usize,
    segment_duration: f64,
    t_start: f64,
    rng: &mut R,
) -> Result<SpikeTrain, KwikError> {
    // The template backs waveform synthesis in both modes; report the
    // missing backend before anything else.
    let template =
        synth::spike_template().ok_or(KwikError::MissingOptionalDependency("statrs"))?;

    let times = if lazy {
        Array1::zeros(0)
    } else {
        Array1::from_iter(
            (0..SPIKES_PER_TRAIN).map(|_| rng.gen::<f64>() * segment_duration + t_start),
        )
    };

    let mut train = SpikeTrain {
        times,
        t_start,
        t_stop: t_start + segment_duration,
        channel_index,
        waveforms: None,
        sampling_rate: None,
        left_sweep: None,
        lazy_shape: lazy.then(|| vec![SPIKES_PER_TRAIN]),
        annotations: HashMap::new(),
        session: None,
    };

    if !lazy {
        // One noisy copy of the template per spike. The middle dimension is
        // the electrode count, fixed at 1 for a single-site recording.
        let mut waveforms = Array3::zeros((SPIKES_PER_TRAIN, 1, template.len()));
        for mut snippet in waveforms.outer_iter_mut() {
            for (value, &canonical) in snippet.slice_mut(s![0, ..]).iter_mut().zip(&template) {
                let noise: f64 = rng.sample(StandardNormal);
                *value = canonical * (1.0 + noise / 6.0);
            }
        }
        train.waveforms = Some(waveforms);
        train.sampling_rate = Some(SPIKE_SAMPLING_RATE);
        train.left_sweep = Some(SPIKE_LEFT_SWEEP);
    }

    Ok(train)
}

/// Synthesizes the stimulus epoch collection.
///
/// Onset times are sampled with replacement from `time_vector`, which the
/// caller derives from the recording (one entry per sample; see
/// [`read_session`]). Every epoch lasts 500 ms. Labels are drawn
/// independently: `TriggerA` with probability 0.4, `TriggerB` otherwise.
pub fn read_stimulus_epochs<R: Rng>(
    lazy: bool,
    time_vector: &[f64],
    rng: &mut R,
) -> Result<StimulusEpochs, KwikError> {
    let mut epochs = StimulusEpochs::default();
    if lazy {
        return Ok(epochs);
    }
    if time_vector.is_empty() {
        return Err(KwikError::MalformedContainer(
            "recording declares zero samples; cannot place stimulus epochs".to_string(),
        ));
    }

    for _ in 0..NUM_STIMULUS_EPOCHS {
        let index = (rng.gen::<f64>() * time_vector.len() as f64) as usize;
        epochs.times.push(time_vector[index]);
        epochs.durations.push(STIMULUS_DURATION);
        let label = if rng.gen::<f64>() > TRIGGER_A_THRESHOLD {
            "TriggerA"
        } else {
            "TriggerB"
        };
        epochs.labels.push(label.to_string());
    }

    Ok(epochs)
}

/// Derives the raw-data companion path by swapping the source extension.
fn raw_companion_path(path: &Path) -> PathBuf {
    path.with_extension(RAW_DATA_EXTENSION)
}

/// Looks up the group holding one recording inside the raw container.
fn recording_group(raw: &hdf5::File, dataset: usize) -> Result<hdf5::Group, KwikError> {
    raw.group(&format!("recordings/{}", dataset)).map_err(|_| {
        KwikError::MalformedContainer(format!("missing group 'recordings/{}'", dataset))
    })
}

/// Reads a required scalar attribute from a recording group.
fn require_attr<T: hdf5::types::H5Type>(
    recording: &hdf5::Group,
    name: &'static str,
) -> Result<T, KwikError> {
    let attr = recording
        .attr(name)
        .map_err(|_| KwikError::MissingAttribute(name))?;
    Ok(attr.read_scalar::<T>()?)
}

/// Builds the per-sample timestamp vector declared by a recording's
/// attributes: `(index + start_time) / sample_rate`.
fn recording_timestamps(recording: &hdf5::Group) -> Result<Vec<f64>, KwikError> {
    let total: u64 = require_attr(recording, "shape")?;
    let start_time: f64 = require_attr(recording, "start_time")?;
    let sample_rate: f64 = require_attr(recording, "sample_rate")?;
    Ok((0..total)
        .map(|index| (index as f64 + start_time) / sample_rate)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_path_swaps_extension() {
        assert_eq!(
            raw_companion_path(Path::new("data/session.kwik")),
            PathBuf::from("data/session.raw.kwd")
        );
        assert_eq!(
            raw_companion_path(Path::new("session.kwx")),
            PathBuf::from("session.raw.kwd")
        );
    }
}
