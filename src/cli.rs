//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::motion::{AccelerometerSource, ReplaySource};
use crate::params::ToneConfig;
use crate::sound::{AudioOutput, BellType, CpalOutput, SilentOutput, SoundError};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "bikebell")]
#[command(about = "Shake-triggered bicycle bell", long_about = None)]
pub struct Args {
    /// Preferences file
    #[arg(long, value_name = "FILE", default_value = "bikebell.toml", global = true)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sense shakes and ring the bell (default)
    Ride(RideArgs),

    /// Inspect or change persisted settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Write a synthesized bell tone as a WAV file
    Tone(ToneArgs),
}

#[derive(clap::Args, Debug)]
pub struct RideArgs {
    /// Replay recorded x,y,z readings (g) instead of a live accelerometer
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Restart the replay from the top when it ends
    #[arg(long = "loop", requires = "replay")]
    pub looping: bool,

    /// Directory holding bike_bell.wav and cowbell.wav
    #[arg(long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// Do not open an audio device
    #[arg(long)]
    pub mute: bool,

    /// Start sensing immediately
    #[arg(long)]
    pub start: bool,
}

impl Default for RideArgs {
    fn default() -> Self {
        Self {
            replay: None,
            looping: false,
            assets: PathBuf::from("assets"),
            mute: false,
            start: false,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings (default)
    Show,

    /// Change one or more settings
    Set {
        /// Motion threshold percentage (0-100)
        #[arg(long, value_name = "PERCENT")]
        threshold: Option<f64>,

        /// Sound intensity percentage (0-100)
        #[arg(long, value_name = "PERCENT")]
        sensitivity: Option<f64>,

        /// Bell sound: regular or cow
        #[arg(long, value_name = "BELL")]
        bell: Option<BellType>,
    },

    /// Restore default threshold and sensitivity
    Reset,
}

#[derive(clap::Args, Debug)]
pub struct ToneArgs {
    /// Output file
    #[arg(long, value_name = "FILE", required_unless_present = "bell")]
    pub out: Option<PathBuf>,

    /// Write the asset for this bell under --assets instead of --out
    #[arg(long, value_name = "BELL", conflicts_with = "out")]
    pub bell: Option<BellType>,

    /// Asset directory used with --bell
    #[arg(long, value_name = "DIR", default_value = "assets")]
    pub assets: PathBuf,

    /// Tone frequency
    #[arg(long, value_name = "HZ", default_value_t = 1760.0)]
    pub frequency: f64,

    /// Tone length
    #[arg(long, value_name = "SECONDS", default_value_t = 0.2)]
    pub duration: f64,
}

impl RideArgs {
    /// Create the accelerometer source selected on the command line
    pub fn create_source(&self) -> Box<dyn AccelerometerSource> {
        match &self.replay {
            Some(path) => {
                log::info!("Motion: replay of {}", path.display());
                Box::new(ReplaySource::new(path, self.looping))
            }
            None => default_source(),
        }
    }

    /// Create the audio output, or a silent one when muted
    pub fn create_output(&self) -> Result<Box<dyn AudioOutput>, SoundError> {
        if self.mute {
            log::info!("Audio: muted");
            return Ok(Box::new(SilentOutput));
        }
        Ok(Box::new(CpalOutput::new()?))
    }
}

#[cfg(target_os = "macos")]
fn default_source() -> Box<dyn AccelerometerSource> {
    log::info!("Motion: Apple Silicon accelerometer");
    Box::new(crate::motion::AppleSpuSource::new())
}

#[cfg(not(target_os = "macos"))]
fn default_source() -> Box<dyn AccelerometerSource> {
    log::info!("Motion: no built-in accelerometer on this platform, use --replay");
    Box::new(crate::motion::UnavailableSource)
}

impl ToneArgs {
    /// Where the tone should be written
    pub fn output_path(&self) -> PathBuf {
        match (&self.out, self.bell) {
            (Some(path), _) => path.clone(),
            (None, Some(bell)) => bell.asset_path(&self.assets),
            (None, None) => BellType::Regular.asset_path(&self.assets),
        }
    }

    pub fn tone_config(&self) -> ToneConfig {
        ToneConfig {
            frequency_hz: self.frequency,
            duration_s: self.duration,
            ..ToneConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_is_no_subcommand() {
        let args = Args::parse_from(["bikebell"]);
        assert!(args.command.is_none());
        assert_eq!(args.settings, PathBuf::from("bikebell.toml"));
    }

    #[test]
    fn test_ride_flags() {
        let args = Args::parse_from([
            "bikebell", "ride", "--replay", "ride.csv", "--loop", "--mute", "--settings", "x.toml",
        ]);
        let Some(Command::Ride(ride)) = args.command else {
            panic!("expected ride");
        };
        assert_eq!(ride.replay.as_deref(), Some(Path::new("ride.csv")));
        assert!(ride.looping && ride.mute && !ride.start);
        assert_eq!(args.settings, PathBuf::from("x.toml"));
        assert_eq!(ride.create_source().name(), "replay");
    }

    #[test]
    fn test_settings_set_parses_bell() {
        let args = Args::parse_from(["bikebell", "settings", "set", "--bell", "cow", "--threshold", "20"]);
        match args.command {
            Some(Command::Settings {
                action: Some(SettingsAction::Set { threshold, sensitivity, bell }),
            }) => {
                assert_eq!(threshold, Some(20.0));
                assert_eq!(sensitivity, None);
                assert_eq!(bell, Some(BellType::Cow));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tone_paths() {
        let args = Args::parse_from(["bikebell", "tone", "--bell", "cow", "--assets", "sounds"]);
        let Some(Command::Tone(tone)) = args.command else {
            panic!("expected tone");
        };
        assert_eq!(tone.output_path(), Path::new("sounds").join("cowbell.wav"));
        assert_eq!(tone.tone_config().frequency_hz, 1760.0);

        assert!(Args::try_parse_from(["bikebell", "tone"]).is_err());
    }
}
