use clap::builder::BoolishValueParser;
use clap::{ArgAction, Subcommand};
use serde_json::json;
use shamezone_core::messages::sample_message;
use shamezone_core::Tone;

use crate::app::{open_session, print_json, sync_reminders};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Set the reminder tone (soft, tryMe, nuclear)
    Tone {
        tone: Tone,
    },
    /// Set the fixed reminder time used by the soft tone
    Time {
        /// HH:MM
        #[arg(required_unless_present = "clear")]
        time: Option<String>,
        /// Go back to reminding at the current time of day
        #[arg(long, conflicts_with = "time")]
        clear: bool,
    },
    /// Turn test mode on or off
    TestMode {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        enabled: bool,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        SettingsAction::Show => {
            let settings = session.settings();
            print_json(&json!({
                "tone": settings.tone,
                "description": settings.tone.description(),
                "time": settings.time,
                "testMode": settings.test_mode,
            }))?;
        }
        SettingsAction::Tone { tone } => {
            session.set_tone(tone)?;
            sync_reminders(&mut session);
            print_json(&json!({
                "tone": tone,
                "sample": sample_message(tone),
            }))?;
        }
        SettingsAction::Time { time, clear } => {
            let time = if clear { None } else { time };
            session.set_time(time.as_deref())?;
            sync_reminders(&mut session);
            if session.settings().tone.has_time_picker() {
                println!("reminder time: {}", session.settings().time.as_deref().unwrap_or("now"));
            } else {
                println!(
                    "reminder time saved; the {} tone ignores it",
                    session.settings().tone
                );
            }
        }
        SettingsAction::TestMode { enabled } => {
            session.set_test_mode(enabled)?;
            println!("test mode {}", if enabled { "on" } else { "off" });
        }
    }
    Ok(())
}
