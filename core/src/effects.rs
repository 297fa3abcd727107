use crate::game::{rand_range, rand_unit, splitmix32};

pub const EFFECT_DURATION_MS: f32 = 1200.0;
pub const EFFECT_PARTICLE_COUNT: usize = 25;
pub const EFFECT_RING_MAX_RADIUS: f32 = 64.0;

pub const PARTICLE_LIFE_DECAY: f32 = 0.02;
pub const PARTICLE_SPEED_MAX: f32 = 3.2;
pub const PARTICLE_RADIUS_MIN: f32 = 1.5;
pub const PARTICLE_RADIUS_MAX: f32 = 3.5;
pub const PARTICLE_COLOR_COUNT: u32 = 4;

#[derive(Clone, Copy, Debug)]
pub struct EffectParticle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub radius: f32,
    pub color: u32,
}

#[derive(Clone, Debug)]
pub struct PlacementEffect {
    pub x: f32,
    pub y: f32,
    pub spawned_at: f32,
    pub particles: Vec<EffectParticle>,
}

pub fn effect_seed(piece_id: usize, nonce: u32) -> u32 {
    splitmix32(nonce ^ (piece_id as u32).wrapping_mul(0xC2B2_AE35))
}

pub fn spawn_effect(x: f32, y: f32, now_ms: f32, seed: u32) -> PlacementEffect {
    let mut particles = Vec::with_capacity(EFFECT_PARTICLE_COUNT);
    for index in 0..EFFECT_PARTICLE_COUNT {
        let salt = index as u32 * 4;
        particles.push(EffectParticle {
            x,
            y,
            vx: rand_range(seed, salt, -PARTICLE_SPEED_MAX, PARTICLE_SPEED_MAX),
            vy: rand_range(seed, salt + 1, -PARTICLE_SPEED_MAX, PARTICLE_SPEED_MAX),
            life: 1.0,
            radius: rand_range(seed, salt + 2, PARTICLE_RADIUS_MIN, PARTICLE_RADIUS_MAX),
            color: (rand_unit(seed, salt + 3) * PARTICLE_COLOR_COUNT as f32) as u32
                % PARTICLE_COLOR_COUNT,
        });
    }
    PlacementEffect {
        x,
        y,
        spawned_at: now_ms,
        particles,
    }
}

pub fn effect_age(effect: &PlacementEffect, now_ms: f32) -> f32 {
    (now_ms - effect.spawned_at).max(0.0)
}

pub fn effect_progress(effect: &PlacementEffect, now_ms: f32) -> f32 {
    (effect_age(effect, now_ms) / EFFECT_DURATION_MS).clamp(0.0, 1.0)
}

pub fn update_effects(effects: &mut Vec<PlacementEffect>, now_ms: f32) {
    effects.retain(|effect| effect_age(effect, now_ms) <= EFFECT_DURATION_MS);
    for effect in effects.iter_mut() {
        for particle in effect.particles.iter_mut() {
            if particle.life <= 0.0 {
                continue;
            }
            particle.x += particle.vx;
            particle.y += particle.vy;
            particle.life = (particle.life - PARTICLE_LIFE_DECAY).max(0.0);
        }
    }
}
