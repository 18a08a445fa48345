use clap::Subcommand;
use serde_json::json;

use crate::app::{open_session, print_json};

#[derive(Subcommand)]
pub enum OnboardingAction {
    /// Whether onboarding was completed
    Status,
    /// Mark onboarding as completed
    Complete,
}

pub fn run(action: OnboardingAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;
    match action {
        OnboardingAction::Status => {
            print_json(&json!({ "complete": session.is_onboarding_complete()? }))?;
        }
        OnboardingAction::Complete => {
            session.complete_onboarding()?;
            println!("onboarding complete");
        }
    }
    Ok(())
}
