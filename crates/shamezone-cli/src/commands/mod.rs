pub mod config;
pub mod goal;
pub mod notify;
pub mod onboarding;
pub mod settings;
pub mod stats;
