//! Tone message pools and goal-title interpolation.

use rand::Rng;

use crate::settings::Tone;

const SOFT: &[&str] = &[
    "Hey, you? Remember '{goal}'? Maybe later...?",
    "Just a little reminder that '{goal}' exists. No pressure. Some pressure.",
    "'{goal}' misses you. It told me so.",
    "Tiny step on '{goal}' today? Even a small one counts.",
    "You said '{goal}' mattered. Still true?",
    "Friendly ping: '{goal}' is waiting patiently.",
];

const TRY_ME: &[&str] = &[
    "Still ignoring '{goal}'? Prove you're not a quitter.",
    "'{goal}' isn't going to do itself. Shocking, I know.",
    "Another day, another excuse about '{goal}'?",
    "You, '{goal}', now. Stop scrolling.",
    "Remember when you were serious about '{goal}'? Me neither.",
    "Everyone else is crushing it. '{goal}' is collecting dust.",
];

const NUCLEAR: &[&str] = &[
    "'{goal}' is still undone. Pathetic.",
    "Wow. '{goal}' again. Your future self is filing a complaint.",
    "At this rate '{goal}' will be finished by your grandchildren.",
    "Your couch is winning against '{goal}'. Fight back.",
    "‘{goal}’ called. It wants a real owner.",
    "Every minute you ignore '{goal}' is a minute of proof you'll quit.",
    "'{goal}': 0. Excuses: undefeated.",
];

const ROASTS: [&str; 3] = [
    "Maybe later… or not.",
    "Still ignoring this? Prove you're not a quitter.",
    "‘This’ is still undone. Pathetic.",
];

/// Static template pool for a tone.
pub fn pool(tone: Tone) -> &'static [&'static str] {
    match tone {
        Tone::Soft => SOFT,
        Tone::TryMe => TRY_ME,
        Tone::Nuclear => NUCLEAR,
    }
}

/// Pick a template uniformly from the tone's pool and fill in the goal title.
pub fn get_tone_message<R: Rng + ?Sized>(tone: Tone, goal_title: &str, rng: &mut R) -> String {
    let templates = pool(tone);
    let template = templates[rng.gen_range(0..templates.len())];
    interpolate(template, goal_title)
}

/// Same as [`get_tone_message`] for a raw tone name; unknown names use the soft pool.
pub fn get_tone_message_by_name<R: Rng + ?Sized>(
    tone: &str,
    goal_title: &str,
    rng: &mut R,
) -> String {
    get_tone_message(Tone::from_name_or_soft(tone), goal_title, rng)
}

/// Replace the `{goal}` placeholder with `goal_title`.
///
/// A quoted placeholder (`'{goal}'` or `‘{goal}’`) is replaced together with
/// its quotes; a bare `{goal}` is replaced on its own.
pub fn interpolate(template: &str, goal_title: &str) -> String {
    const FORMS: [&str; 3] = ["'{goal}'", "‘{goal}’", "{goal}"];
    let mut out = String::with_capacity(template.len() + goal_title.len());
    let mut rest = template;
    // Scan the template only, so a title containing `{goal}` is left alone.
    while let Some((at, len)) = FORMS
        .iter()
        .filter_map(|form| rest.find(form).map(|at| (at, form.len())))
        .min_by_key(|&(at, _)| at)
    {
        out.push_str(&rest[..at]);
        out.push_str(goal_title);
        rest = &rest[at + len..];
    }
    out.push_str(rest);
    out
}

/// Preview line shown next to each tone in the picker.
pub fn sample_message(tone: Tone) -> String {
    interpolate(pool(tone)[0], "your goal")
}

/// Line shown when a log comes in outside the tone's on-time window.
pub fn roast(tone: Tone) -> &'static str {
    match tone {
        Tone::Soft => ROASTS[0],
        Tone::TryMe => ROASTS[1],
        Tone::Nuclear => ROASTS[2],
    }
}
