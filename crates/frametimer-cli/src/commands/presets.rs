use clap::Subcommand;
use frametimer_core::storage::Database;
use frametimer_core::{ActivePreset, Settings};

#[derive(Subcommand)]
pub enum PresetsAction {
    /// List all preset groups and sub-presets
    List,
    /// Show one preset (defaults to the active one)
    Show {
        group: Option<String>,
        sub: Option<String>,
    },
    /// Select the active preset
    Use { group: String, sub: String },
    /// Auto-detect a preset from a video title and reset the session
    Detect { title: String },
}

pub fn run(action: PresetsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Settings::load()?;

    match action {
        PresetsAction::List => {
            for (group, subs) in &settings.presets.data {
                for (sub, entry) in subs {
                    let marker = if *group == settings.presets.active.group
                        && *sub == settings.presets.active.sub
                    {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{marker} {group} > {sub} ({} splits, {} keywords)",
                        entry.splits.len(),
                        entry.keywords.len()
                    );
                }
            }
        }
        PresetsAction::Show { group, sub } => {
            let group = group.unwrap_or_else(|| settings.presets.active.group.clone());
            let sub = sub.unwrap_or_else(|| settings.presets.active.sub.clone());
            match settings.presets.lookup(&group, &sub) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(entry)?),
                None => {
                    eprintln!("no such preset: {group} > {sub}");
                    std::process::exit(1);
                }
            }
        }
        PresetsAction::Use { group, sub } => {
            if settings.presets.lookup(&group, &sub).is_none() {
                eprintln!("no such preset: {group} > {sub}");
                std::process::exit(1);
            }
            settings.presets.active = ActivePreset { group, sub };
            settings.save()?;
            println!("ok");
        }
        PresetsAction::Detect { title } => match settings.presets.detect(&title) {
            Some((group, sub)) => {
                settings.presets.active = ActivePreset {
                    group: group.clone(),
                    sub: sub.clone(),
                };
                settings.save()?;

                // The segment plan changed; reset the persisted session.
                let db = Database::open()?;
                let mut timer = super::timer::load_timer(&db);
                timer.set_preset_names(settings.presets.active_names());
                timer.start_reset();
                super::timer::save_timer(&db, &timer)?;

                println!("switched to: {group} > {sub}");
            }
            None => {
                eprintln!("no preset keywords match \"{title}\"");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
