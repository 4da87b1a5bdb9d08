use kwik_importer::load;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Load a Kwik session (expects session.raw.kwd next to the file)
    let session = load("data/session.kwik")?;

    // Print basic session information
    println!("Session: {}", session.name);
    println!("Number of channels: {}", session.num_channels());

    if let Some(duration) = session.duration {
        println!("Duration: {:.3} seconds", duration);
    }

    // List the first few channel signals
    for signal in session.signals.iter().take(5) {
        println!(
            "  channel {}: {} samples at {} Hz (starts at {:.3} s)",
            signal.channel_index,
            signal.samples.len(),
            signal.sampling_rate,
            signal.t_start
        );
    }

    if session.signals.len() > 5 {
        println!("  ... and {} more", session.signals.len() - 5);
    }

    // Summarize the spike trains
    println!("Number of spike trains: {}", session.spike_trains.len());
    if let Some(train) = session.spike_trains.first() {
        println!(
            "  first train: {} spikes on channel {} in [{:.1}, {:.1}) s",
            train.times.len(),
            train.channel_index,
            train.t_start,
            train.t_stop
        );

        if let Some(waveforms) = &train.waveforms {
            let shape = waveforms.shape();
            println!(
                "  waveforms: {} snippets x {} electrode(s) x {} samples",
                shape[0], shape[1], shape[2]
            );
        }
    }

    // Summarize the stimulus epochs
    if let Some(epochs) = &session.stimulus_epochs {
        println!("Number of stimulus epochs: {}", epochs.len());

        for ((time, duration), label) in epochs
            .times
            .iter()
            .zip(&epochs.durations)
            .zip(&epochs.labels)
            .take(3)
        {
            println!("  {} at {:.3} s for {:.3} s", label, time, duration);
        }
    }

    Ok(())
}
