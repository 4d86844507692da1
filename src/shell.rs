//! Terminal front end for a ride: line commands in, coloured status out.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::app::BikeBell;
use crate::events::BellEvent;
use crate::indicator::BellIndicator;
use crate::sound::BellType;

/// Magnitude fed to the controller by the `r` command
pub const TEST_RING_MAGNITUDE: f64 = 2.0;

pub const HELP: &str = "\
commands:
  <enter> | t        toggle sensing
  r                  ring once as if shaken
  s                  show settings
  threshold <0-100>  motion threshold percentage
  sensitivity <0-100> sound intensity percentage
  bell <regular|cow> bell sound
  reset              restore default threshold and sensitivity
  h                  this help
  q                  quit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShellCommand {
    Toggle,
    Ring,
    Show,
    Threshold(f64),
    Sensitivity(f64),
    Bell(BellType),
    Reset,
    Help,
    Quit,
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or("t").to_ascii_lowercase();
    let arg = words.next();

    let percent = |name: &str| -> Result<f64, String> {
        let text = arg.ok_or_else(|| format!("{} needs a percentage", name))?;
        text.parse::<f64>()
            .map_err(|_| format!("Not a number: {}", text))
    };

    match head.as_str() {
        "t" | "toggle" => Ok(ShellCommand::Toggle),
        "r" | "ring" => Ok(ShellCommand::Ring),
        "s" | "show" | "settings" => Ok(ShellCommand::Show),
        "threshold" => percent("threshold").map(ShellCommand::Threshold),
        "sensitivity" => percent("sensitivity").map(ShellCommand::Sensitivity),
        "bell" => {
            let text = arg.ok_or("bell needs regular or cow")?;
            text.parse().map(ShellCommand::Bell)
        }
        "reset" => Ok(ShellCommand::Reset),
        "h" | "help" | "?" => Ok(ShellCommand::Help),
        "q" | "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("Unknown command: {} (h for help)", other)),
    }
}

/// Apply a command to the controller. Returns false on quit.
pub fn apply(bell: &mut BikeBell, command: ShellCommand, now: Instant) -> bool {
    match command {
        ShellCommand::Toggle => {
            bell.toggle();
        }
        ShellCommand::Ring => bell.simulate_shake(TEST_RING_MAGNITUDE, now),
        ShellCommand::Show => println!("{}", status_line(bell)),
        ShellCommand::Threshold(p) => bell.set_threshold(p),
        ShellCommand::Sensitivity(p) => bell.set_sensitivity(p),
        ShellCommand::Bell(b) => bell.set_bell_type(b),
        ShellCommand::Reset => bell.reset_settings(),
        ShellCommand::Help => println!("{}", HELP),
        ShellCommand::Quit => return false,
    }
    true
}

pub fn status_line(bell: &BikeBell) -> String {
    format!(
        "{} ring {:.2} | {} | {} magnitude {:.3} | {} playing",
        render_indicator(bell.indicator()),
        bell.ring_scale(),
        bell.settings(),
        bell.source_name(),
        bell.magnitude(),
        bell.live_voices()
    )
}

/// ANSI escape for an indicator colour name
fn ansi_color(name: &str) -> &'static str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "orange" => "\x1b[38;5;208m",
        _ => "\x1b[0m",
    }
}

/// Bell icon in its indicator colour
pub fn render_indicator(indicator: BellIndicator) -> String {
    let label = match indicator {
        BellIndicator::Inactive => "off",
        BellIndicator::Active => "on",
        BellIndicator::Ringing => "ringing",
    };
    format!("{}[bell {}]\x1b[0m", ansi_color(indicator.color_name()), label)
}

/// Terminal line for an event, if it is worth printing
pub fn render_event(event: &BellEvent) -> Option<String> {
    match event {
        BellEvent::ActivationChanged(true) => Some("Sensing started".to_string()),
        BellEvent::ActivationChanged(false) => Some("Sensing stopped".to_string()),
        BellEvent::Magnitude(_) => None,
        BellEvent::Rang {
            intensity,
            volume,
            bell,
            live_voices,
        } => Some(format!(
            "ding! {} intensity {:.3} volume {:.2} ({} playing)",
            bell, intensity, volume, live_voices
        )),
        BellEvent::IndicatorChanged(indicator) => Some(render_indicator(*indicator)),
        BellEvent::SettingsChanged(settings) => Some(format!("Settings: {}", settings)),
        BellEvent::Error(message) => Some(format!("\x1b[31mError:\x1b[0m {}", message)),
    }
}

/// Read stdin lines on a background thread. The channel disconnects at EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("bikebell-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("Could not read commands from stdin: {}", e);
    }
    rx
}

/// Drive the controller until `q`, or until stdin closes with sensing off.
///
/// `startup_errors` are published once the terminal is subscribed.
pub fn run(mut bell: BikeBell, tick: Duration, start_active: bool, startup_errors: Vec<String>) {
    bell.subscribe(Box::new(|event| {
        if let Some(line) = render_event(event) {
            println!("{}", line);
        }
    }));
    for message in startup_errors {
        bell.report_error(message);
    }

    println!("{}", status_line(&bell));
    println!("h for help");
    bell.check_assets();
    if start_active {
        bell.start_sensing();
    }

    let commands = spawn_stdin_reader();
    let mut stdin_open = true;

    loop {
        while stdin_open {
            match commands.try_recv() {
                Ok(line) => match parse_command(&line) {
                    Ok(command) => {
                        if !apply(&mut bell, command, Instant::now()) {
                            bell.stop_sensing();
                            return;
                        }
                    }
                    Err(message) => println!("{}", message),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("stdin closed");
                    stdin_open = false;
                }
            }
        }

        bell.tick(Instant::now());

        if !stdin_open && !bell.is_active() {
            break;
        }
        thread::sleep(tick);
    }
}
