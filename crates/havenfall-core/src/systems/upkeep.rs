//! Upkeep — timed expiry of campfires, effect markers and graves, and
//! resolution of the prophet-call singleton.

use crate::components::{Campfire, EffectMarker, Grave, Position};
use crate::systems::progression::Progression;
use havenfall_logic::constants::CAMPFIRE_BURN_RATE;
use hecs::{Entity, World};

/// Burn campfire fuel and expire spent fires, effect markers and graves.
pub fn upkeep_system(world: &mut World, dt: f32) {
    let mut expired: Vec<Entity> = Vec::new();

    for (e, fire) in world.query_mut::<&mut Campfire>() {
        fire.fuel -= dt * CAMPFIRE_BURN_RATE;
        if fire.fuel <= 0.0 {
            expired.push(e);
        }
    }
    for (e, effect) in world.query_mut::<&mut EffectMarker>() {
        effect.life -= dt;
        if effect.life <= 0.0 {
            expired.push(e);
        }
    }
    for (e, grave) in world.query_mut::<&mut Grave>() {
        grave.life -= dt;
        if grave.life <= 0.0 {
            expired.push(e);
        }
    }

    for e in expired {
        let _ = world.despawn(e);
    }
}

/// Resolve the prophet call against the live world: mirror the anchor's
/// position, run down the TTL, and clear the call when the anchor is gone
/// or the countdown lapses. The call never owns its anchor.
pub fn prophet_call_system(world: &World, prog: &mut Progression, dt: f32) {
    let Some(call) = prog.call.as_mut() else {
        return;
    };
    let anchor_pos = world.get::<&Position>(call.anchor).ok().map(|p| p.0);
    if let Some(pos) = anchor_pos {
        call.pos = pos;
    }
    call.ttl = (call.ttl - dt).max(0.0);
    if call.ttl <= 0.0 || anchor_pos.is_none() {
        prog.call = None;
    }
}
