//! Variables, actors, locations and items
//!
//! Imported before any conversation so entries can resolve actor ids and
//! scripts can resolve variable names. In merge mode each asset replaces the
//! same-named asset already in the database and keeps its id.

use crate::formats::arcweave::{
    ArcweaveProject, Asset, Attribute, Component, Variable as SourceVariable,
};
use crate::formats::database::{
    Actor, DialogueDatabase, Field, Item, Location, Variable, VariableValue,
};
use crate::script::markup::{plain_line, touch_up};
use crate::script::transpile::ACTOR_INDEX_VARIABLE;

use super::ImportContext;

/// Name of the implicit first entry of the component table
pub const PLAYER_NAME: &str = "Player";

/// Name of the actor created when no NPC component is configured
pub const NPC_NAME: &str = "NPC";

/// Field holding a node's source id
pub const GUID_FIELD: &str = "Guid";

/// Actor names indexed by `actorIndex`/`conversantIndex`: `Player`, then every
/// component name in sorted order.
#[must_use]
pub fn component_table(project: &ArcweaveProject) -> Vec<String> {
    let mut names: Vec<String> = project
        .components
        .values()
        .map(|component| plain_line(&component.name))
        .collect();
    names.sort();
    std::iter::once(PLAYER_NAME.to_string()).chain(names).collect()
}

/// Prefix of player `index`'s copy of a per-player variable
#[must_use]
pub fn player_prefix(index: u32) -> String {
    format!("Player{index}_")
}

fn initial_value(name: &str, variable: &SourceVariable) -> Option<VariableValue> {
    let value = &variable.value;
    match variable.kind.as_str() {
        "boolean" => Some(VariableValue::Boolean(value.as_bool().unwrap_or_default())),
        "integer" | "float" => Some(VariableValue::Number(value.as_f64().unwrap_or_default())),
        "string" => Some(VariableValue::Text(value.as_str().unwrap_or_default().to_string())),
        other => {
            tracing::warn!("Variable {} has unsupported type '{}', skipping", name, other);
            None
        }
    }
}

/// Insert or replace a variable by name.
fn put_variable(db: &mut DialogueDatabase, name: String, initial_value: VariableValue) {
    if let Some(existing) = db.variables.iter_mut().find(|v| v.name == name) {
        existing.initial_value = initial_value;
    } else {
        let id = db.next_variable_id();
        db.variables.push(Variable {
            id,
            name,
            initial_value,
        });
    }
}

/// Import every project variable, plus per-player copies in multiplayer mode.
pub fn import_variables(ctx: &ImportContext<'_>, db: &mut DialogueDatabase) {
    let num_players = ctx.prefs.num_players;

    for variable in ctx.project.variables.values() {
        let name = variable.name.trim();
        if name.is_empty() {
            continue;
        }
        let Some(value) = initial_value(name, variable) else {
            continue;
        };

        if ctx.transpiler.is_multiplayer() && !ctx.transpiler.is_global(name) {
            for index in 0..num_players {
                put_variable(db, format!("{}{name}", player_prefix(index)), value.clone());
            }
        }
        put_variable(db, name.to_string(), value);
    }

    if ctx.transpiler.is_multiplayer() {
        put_variable(
            db,
            ACTOR_INDEX_VARIABLE.to_string(),
            VariableValue::Text(player_prefix(0).trim_end_matches('_').to_string()),
        );
    }

    db.variables.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!("Imported {} variables", ctx.project.variables.len());
}

/// String attributes of a component as fields.
fn component_fields(
    ctx: &ImportContext<'_>,
    id: &str,
    component: &Component,
) -> Vec<Field> {
    let referrer = format!("component {id}");
    let mut fields: Vec<Field> = component
        .attributes
        .iter()
        .filter_map(|attr_id| ctx.catalog.resolve::<Attribute>(attr_id, &referrer))
        .filter_map(|attr| {
            attr.value
                .as_text()
                .map(|text| Field::text(plain_line(&attr.name), touch_up(text)))
        })
        .collect();
    if ctx.prefs.import_guids {
        fields.push(Field::text(GUID_FIELD, id));
    }
    fields
}

fn portrait(ctx: &ImportContext<'_>, id: &str, component: &Component) -> Option<String> {
    if !ctx.prefs.import_portraits {
        return None;
    }
    let cover = component.assets.cover.as_ref()?;
    ctx.catalog
        .resolve::<Asset>(&cover.id, &format!("component {id}"))
        .map(|asset| format!("assets/{}", asset.name))
}

/// Actor id to reuse for `name`, or a fresh one.
fn take_actor_slot(db: &mut DialogueDatabase, name: &str) -> u32 {
    match db.actors.iter().position(|a| a.name == name) {
        Some(index) => db.actors.remove(index).id,
        None => db.next_actor_id(),
    }
}

fn import_role(
    ctx: &mut ImportContext<'_>,
    db: &mut DialogueDatabase,
    component_ids: &[String],
    is_player: bool,
) -> Option<u32> {
    let mut first = None;
    for id in component_ids {
        let Some(component) = ctx.catalog.resolve::<Component>(id, "import preferences") else {
            continue;
        };
        let name = plain_line(&component.name);
        let actor = Actor {
            id: take_actor_slot(db, &name),
            fields: component_fields(ctx, id, component),
            portrait: portrait(ctx, id, component),
            name,
            is_player,
        };
        tracing::debug!("Actor {} '{}' (player: {})", actor.id, actor.name, is_player);
        ctx.component_actors.insert(id.clone(), actor.id);
        first.get_or_insert(actor.id);
        db.actors.push(actor);
    }
    first
}

/// Existing actor named `name`, or a new bare one.
fn ensure_actor(db: &mut DialogueDatabase, name: &str, is_player: bool) -> u32 {
    if let Some(actor) = db.actor_by_name(name) {
        return actor.id;
    }
    let id = db.next_actor_id();
    db.actors.push(Actor {
        id,
        name: name.to_string(),
        is_player,
        ..Actor::default()
    });
    tracing::debug!("Created default actor '{}'", name);
    id
}

/// Import player and NPC components as actors and record the defaults.
pub fn import_actors(ctx: &mut ImportContext<'_>, db: &mut DialogueDatabase) {
    let prefs = ctx.prefs;
    let player = import_role(ctx, db, &prefs.player_component_ids, true);
    let npc = import_role(ctx, db, &prefs.npc_component_ids, false);

    ctx.default_player = player.unwrap_or_else(|| ensure_actor(db, PLAYER_NAME, true));
    ctx.default_npc = npc.unwrap_or_else(|| ensure_actor(db, NPC_NAME, false));
}

/// Import location components.
pub fn import_locations(ctx: &ImportContext<'_>, db: &mut DialogueDatabase) {
    for id in &ctx.prefs.location_component_ids {
        let Some(component) = ctx.catalog.resolve::<Component>(id, "import preferences") else {
            continue;
        };
        let name = plain_line(&component.name);
        let slot = db.locations.iter().position(|l| l.name == name);
        let location_id = match slot {
            Some(index) => db.locations.remove(index).id,
            None => db.next_location_id(),
        };
        db.locations.push(Location {
            id: location_id,
            fields: component_fields(ctx, id, component),
            name,
        });
    }
}

/// Import item components.
pub fn import_items(ctx: &ImportContext<'_>, db: &mut DialogueDatabase) {
    for id in &ctx.prefs.item_component_ids {
        let Some(component) = ctx.catalog.resolve::<Component>(id, "import preferences") else {
            continue;
        };
        let name = plain_line(&component.name);
        let slot = db.items.iter().position(|i| i.name == name);
        let item_id = match slot {
            Some(index) => db.items.remove(index).id,
            None => db.next_item_id(),
        };
        db.items.push(Item {
            id: item_id,
            fields: component_fields(ctx, id, component),
            name,
        });
    }
}

/// Import every asset category.
pub fn import_assets(ctx: &mut ImportContext<'_>, db: &mut DialogueDatabase) {
    import_variables(ctx, db);
    import_locations(ctx, db);
    import_items(ctx, db);
    import_actors(ctx, db);

    // Merge mode re-inserts replaced entities at the end.
    db.actors.sort_by_key(|a| a.id);
    db.locations.sort_by_key(|l| l.id);
    db.items.sort_by_key(|i| i.id);
    tracing::info!(
        "Imported {} actors, {} locations, {} items, {} variables",
        db.actors.len(),
        db.locations.len(),
        db.items.len(),
        db.variables.len()
    );
}

/// Actor id for component table slot `index`, falling back to `fallback`.
#[must_use]
pub fn participant(
    component_names: &[String],
    db: &DialogueDatabase,
    index: usize,
    fallback: u32,
) -> u32 {
    let Some(name) = component_names.get(index) else {
        tracing::warn!(
            "Component index {} is out of range (table has {} names)",
            index,
            component_names.len()
        );
        return fallback;
    };
    db.actor_by_name(name).map_or(fallback, |actor| actor.id)
}
