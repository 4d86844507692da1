//! Bikebell - ring a bicycle bell by shaking the device
//!
//! Shakes above the threshold ring the selected bell, louder the harder
//! you shake, with every ring overlapping the ones still sounding.

use std::sync::Arc;

use clap::Parser;

use bikebell::app::BikeBell;
use bikebell::cli::{Args, Command, RideArgs, SettingsAction, ToneArgs};
use bikebell::motion::{CommandInhibitor, MotionSampler};
use bikebell::params::{PlayerConfig, SamplerConfig};
use bikebell::settings::PreferenceStore;
use bikebell::shell;
use bikebell::sound::{SilentOutput, SoundPlayer};
use bikebell::tone::write_tone_file;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let store = PreferenceStore::new(&args.settings);
    match args.command {
        None => ride(RideArgs::default(), store),
        Some(Command::Ride(ride_args)) => ride(ride_args, store),
        Some(Command::Settings { action }) => settings(action.unwrap_or(SettingsAction::Show), &store),
        Some(Command::Tone(tone_args)) => tone(&tone_args),
    }
}

fn ride(args: RideArgs, store: PreferenceStore) -> Result<(), String> {
    let settings = store.load().map_err(|e| e.to_string())?;
    log::info!("Settings from {}: {}", store.path().display(), settings);

    let sampler_config = SamplerConfig::default();
    sampler_config.validate()?;
    let tick = sampler_config.update_interval();

    let mut startup_errors = Vec::new();
    let output = match args.create_output() {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Continuing without sound");
            startup_errors.push(e.to_string());
            Box::new(SilentOutput)
        }
    };

    let player_config = PlayerConfig {
        assets_dir: args.assets.clone(),
        ..PlayerConfig::default()
    };
    let player = SoundPlayer::new(player_config, settings.bell_type, output);
    let sampler = MotionSampler::new(
        sampler_config,
        args.create_source(),
        Arc::new(CommandInhibitor::new()),
    );

    let bell = BikeBell::new(sampler, player, settings, Some(store));
    shell::run(bell, tick, args.start, startup_errors);
    Ok(())
}

fn settings(action: SettingsAction, store: &PreferenceStore) -> Result<(), String> {
    let mut settings = store.load().map_err(|e| e.to_string())?;
    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            threshold,
            sensitivity,
            bell,
        } => {
            if let Some(percent) = threshold {
                settings.set_threshold(percent);
            }
            if let Some(percent) = sensitivity {
                settings.set_sensitivity(percent);
            }
            if let Some(bell) = bell {
                settings.bell_type = bell;
            }
            store.save(&settings).map_err(|e| e.to_string())?;
        }
        SettingsAction::Reset => {
            settings.reset();
            store.save(&settings).map_err(|e| e.to_string())?;
        }
    }
    println!("{}", settings);
    Ok(())
}

fn tone(args: &ToneArgs) -> Result<(), String> {
    let config = args.tone_config();
    let path = args.output_path();
    write_tone_file(&path, &config)?;
    println!(
        "Wrote {} ({} samples at {} Hz)",
        path.display(),
        config.num_samples(),
        config.sample_rate_hz
    );
    Ok(())
}
