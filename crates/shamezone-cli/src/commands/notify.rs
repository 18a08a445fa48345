use clap::Subcommand;
use shamezone_core::{Database, Notifier};

use crate::app::{open_session, print_json};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Rebuild the reminder schedule now and show it
    Plan,
    /// List queued reminders, soonest first
    List,
    /// Drop every queued reminder
    Cancel,
}

pub fn run(action: NotifyAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        NotifyAction::Plan => {
            let mut session = open_session()?;
            match session.reschedule()? {
                Some(report) => print_json(&report)?,
                None => println!("nothing to schedule"),
            }
        }
        NotifyAction::List => {
            let db = Database::open()?;
            print_json(&db.queued_notifications()?)?;
        }
        NotifyAction::Cancel => {
            let mut db = Database::open()?;
            db.cancel_all()?;
            println!("all reminders cancelled");
        }
    }
    Ok(())
}
