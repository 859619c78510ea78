//! Cart steering — carts trail the settlement's first human.

use crate::components::{Cart, Position};
use crate::systems::progression::first_human_pos;
use havenfall_logic::constants::WORLD_SIZE;
use hecs::World;

/// Blend each cart's velocity toward its escort and integrate, clamping
/// both velocity and position.
pub fn cart_system(world: &mut World, dt: f32) {
    let escort = first_human_pos(world);
    let n = WORLD_SIZE as f32;

    for (_, (cart, pos)) in world.query_mut::<(&mut Cart, &mut Position)>() {
        if let Some((hx, hy)) = escort {
            let dx = hx - pos.x();
            let dy = hy - pos.y();
            let dist = (dx * dx + dy * dy).sqrt().max(1.0);
            let desired_vx = (dx / dist) * 1.2;
            let desired_vy = (dy / dist) * 1.2;
            cart.vx = (cart.vx + (desired_vx - cart.vx) * 0.6 * dt).clamp(-1.6, 1.6);
            cart.vy = (cart.vy + (desired_vy - cart.vy) * 0.6 * dt).clamp(-1.6, 1.6);
        }
        *pos = Position::new(
            (pos.x() + cart.vx * dt).clamp(0.5, n - 0.5),
            (pos.y() + cart.vy * dt).clamp(0.5, n - 0.5),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ActionMarker, AgentState, Gender, Human, Vec2};

    fn escort(x: f32, y: f32) -> (Position, Human, AgentState) {
        (
            Position::new(x, y),
            Human {
                gender: Gender::Male,
                age: 25.0,
                hunger: 0.0,
                thirst: 0.0,
                wood: 0.0,
                stone: 0.0,
                meat: 0.0,
                sick: false,
                profession: None,
                role: None,
                home: Vec2::new(x, y),
                reproduce_cooldown: 0.0,
                build_cooldown: 0.0,
                action: ActionMarker::default(),
                facing: 0.0,
                moving: false,
            },
            AgentState::Idle,
        )
    }

    #[test]
    fn test_cart_accelerates_toward_escort() {
        let mut world = World::new();
        world.spawn(escort(20.0, 10.0));
        let cart = world.spawn((Position::new(10.0, 10.0), Cart::default()));

        for _ in 0..20 {
            cart_system(&mut world, 0.1);
        }
        let pos = world.get::<&Position>(cart).unwrap();
        assert!(pos.x() > 10.0, "cart drifted toward the escort");
        let c = world.get::<&Cart>(cart).unwrap();
        assert!(c.vx > 0.0 && c.vx <= 1.6);
    }

    #[test]
    fn test_cart_coasts_without_humans() {
        let mut world = World::new();
        let cart = world.spawn((
            Position::new(10.0, 10.0),
            Cart { vx: 1.0, vy: 0.0 },
        ));
        cart_system(&mut world, 0.1);
        let pos = world.get::<&Position>(cart).unwrap();
        assert!((pos.x() - 10.1).abs() < 0.001, "keeps its momentum");
    }

    #[test]
    fn test_cart_clamped_inside_world() {
        let mut world = World::new();
        let n = WORLD_SIZE as f32;
        let cart = world.spawn((
            Position::new(n - 0.6, 10.0),
            Cart { vx: 5.0, vy: 0.0 },
        ));
        for _ in 0..10 {
            cart_system(&mut world, 0.1);
        }
        let pos = world.get::<&Position>(cart).unwrap();
        assert!(pos.x() <= n - 0.5);
    }
}
