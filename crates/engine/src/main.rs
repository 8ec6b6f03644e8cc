//! Arcanum Engine - scenario runner.
//!
//! Replays a JSON scenario of lifecycle events against an in-memory engine
//! and prints effective levels, inventory and grant records per character.
//!
//! Usage: `arcanum-engine [scenario.json]`

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use arcanum_domain::{
    CharacterId, ClassId, ClassLevel, DomainId, EffectiveLevels, GrantRecord, RuleRegistry,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcanum_engine::app::{App, EnginePorts};
use arcanum_engine::entities::GrantLedger;
use arcanum_engine::infrastructure::{
    memory::{InMemoryWorld, ItemSnapshot},
    settings::ReconcilerSettings,
    static_data::TwoDaDirectory,
};
use arcanum_engine::use_cases::caster_level::{CarrierAnomaly, TriggerOutcome};

#[derive(Debug, Deserialize)]
struct Scenario {
    characters: Vec<ScenarioCharacter>,
    #[serde(default)]
    events: Vec<ScenarioEvent>,
}

#[derive(Debug, Deserialize)]
struct ScenarioCharacter {
    name: String,
    classes: BTreeMap<String, u8>,
    #[serde(default)]
    domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScenarioEvent {
    Login { character: String },
    LevelUp { character: String },
    LevelDown { character: String },
    SetLevel { character: String, class: String, level: u8 },
    SpellCast { character: String },
}

#[derive(Debug, Serialize)]
struct CharacterReport {
    name: String,
    levels: EffectiveLevels,
    items: Vec<ItemSnapshot>,
    grants: Vec<GrantRecord>,
    anomalies: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary usually runs from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arcanum_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = ReconcilerSettings::from_env();
    let scenario_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.data_path.join("scenario.json"));

    tracing::info!(
        scenario = %scenario_path.display(),
        data_path = %settings.data_path.display(),
        "Starting Arcanum Engine"
    );

    let raw = tokio::fs::read_to_string(&scenario_path)
        .await
        .with_context(|| format!("reading scenario {}", scenario_path.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw).context("parsing scenario")?;

    let world = Arc::new(InMemoryWorld::new());
    let static_data = Arc::new(TwoDaDirectory::new(settings.data_path.clone()));
    let app = App::new(
        EnginePorts::in_memory(world.clone(), static_data),
        RuleRegistry::standard(),
        settings,
    );

    let mut ids: HashMap<String, CharacterId> = HashMap::new();
    for character in &scenario.characters {
        let id = CharacterId::new();
        world
            .add_character(
                id,
                character
                    .classes
                    .iter()
                    .map(|(class, level)| ClassLevel::new(class.as_str(), *level)),
                character.domains.iter().map(DomainId::new),
            )
            .await;
        tracing::info!(name = %character.name, character_id = %id, "Character added");
        ids.insert(character.name.clone(), id);
    }

    for event in scenario.events {
        replay(&app, &world, &ids, event).await?;
    }

    let ledger = GrantLedger::new(world.clone());
    let mut reports = Vec::new();
    for character in &scenario.characters {
        let id = ids[&character.name];
        let anomalies = app
            .caster_levels
            .verify_now(id)
            .await?
            .unwrap_or_default()
            .iter()
            .map(describe_anomaly)
            .collect();
        reports.push(CharacterReport {
            name: character.name.clone(),
            levels: app.caster_levels.effective_levels(id).await?,
            items: world.items_of(id).await,
            grants: ledger.load(id).await?.records,
            anomalies,
        });
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

async fn replay(
    app: &App,
    world: &InMemoryWorld,
    ids: &HashMap<String, CharacterId>,
    event: ScenarioEvent,
) -> anyhow::Result<()> {
    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .with_context(|| format!("unknown character {name:?}"))
    };

    let outcome = match event {
        ScenarioEvent::Login { character } => app.caster_levels.on_login(lookup(&character)?),
        ScenarioEvent::LevelUp { character } => app.caster_levels.on_level_up(lookup(&character)?),
        ScenarioEvent::LevelDown { character } => {
            app.caster_levels.on_level_down(lookup(&character)?)
        }
        ScenarioEvent::SetLevel {
            character,
            class,
            level,
        } => {
            world
                .set_class_level(lookup(&character)?, class.as_str(), level)
                .await;
            return Ok(());
        }
        ScenarioEvent::SpellCast { character } => {
            let id = lookup(&character)?;
            let levels = app.caster_levels.effective_levels(id).await?;
            let seen: Vec<(ClassId, Option<u8>)> = app
                .caster_levels
                .on_spell_cast(id, || async {
                    levels
                        .boosted()
                        .map(|(class, _)| (class.clone(), world.override_level(id, class)))
                        .collect()
                })
                .await?;
            for (class, level) in seen {
                tracing::info!(
                    name = %character,
                    class = %class,
                    caster_level = ?level,
                    "Spell resolved with override"
                );
            }
            return Ok(());
        }
    };

    if let TriggerOutcome::Started(handle) = outcome {
        handle.await.context("reconciliation task panicked")?;
    }
    Ok(())
}

fn describe_anomaly(anomaly: &CarrierAnomaly) -> String {
    format!("{anomaly:?}")
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
