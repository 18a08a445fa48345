//! Shared wiring for commands that touch app state.

use std::error::Error;
use std::rc::Rc;

use serde::Serialize;
use shamezone_core::{Config, Database, Session};
use tracing::warn;

pub type CliSession = Session<Rc<Database>, Rc<Database>>;

/// Open the session on the on-disk database. One connection backs both the
/// persisted state and the reminder queue.
pub fn open_session() -> Result<CliSession, Box<dyn Error>> {
    let config = Config::load()?;
    let db = Rc::new(Database::open()?);
    let clock = Rc::new(config.clock.clock());
    Ok(Session::open(clock, Rc::clone(&db), db, &config, None)?)
}

/// Bring the reminder queue in line with whatever the command changed.
///
/// A failed rebuild is reported but does not fail the command; the state
/// change itself is already saved.
pub fn sync_reminders(session: &mut CliSession) {
    if let Err(e) = session.reschedule_if_needed() {
        warn!(error = %e, "reminders not updated");
        eprintln!("warning: reminders not updated: {e}");
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
