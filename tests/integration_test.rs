use bevy_ecs::prelude::{Schedule, World};
use game_engine_particles::ecs::*;
use game_engine_particles::emitter::{EmissionSchedule, ParticleTemplate};
use game_engine_particles::particles::{Particle, SpriteDescriptor};
use game_engine_particles::range::{ScalarRange, VectorRange};
use game_engine_particles::*;
use glam::Vec2;

fn quiet_system(capacity: usize) -> anyhow::Result<ParticleSystem> {
    Ok(ParticleSystem::new(ParticleSystemConfig {
        gravity: Vec2::ZERO,
        sprite: SpriteDescriptor::from_texture(8, 8),
        ..ParticleSystemConfig::with_capacity(capacity)
    })?)
}

#[test]
fn test_capacity_limits_live_count() -> anyhow::Result<()> {
    let mut system = quiet_system(2)?;
    for _ in 0..3 {
        system.spawn(Particle::new(1.0, Vec2::ZERO));
    }

    let snapshot = system.update(0.0);
    assert_eq!(snapshot.live_count(), 2);
    assert_eq!(snapshot.as_bytes().len(), 2 * std::mem::size_of::<ParticleInstance>());
    Ok(())
}

#[test]
fn test_finite_emitter_lifecycle() -> anyhow::Result<()> {
    let mut manager = ParticleSystemManager::new();
    let target = manager.add_system(quiet_system(100)?);

    let template = ParticleTemplate {
        lifetime: ScalarRange::new(2.0, 3.0).into(),
        ..Default::default()
    };
    let schedule = EmissionSchedule {
        total_spawn_count: 30,
        cycle_duration: 1.0,
        ..Default::default()
    };
    manager.add_emitter(
        target,
        ParticleEmitter::rectangle(template, VectorRange::centered(Vec2::splat(4.0)).into(), schedule)?,
    )?;

    let mut emitted = 0;
    for _ in 0..10 {
        emitted += manager.update(0.125).admitted;
    }
    assert_eq!(emitted, 30);
    assert!(manager.is_idle());

    let system = manager.system(target).ok_or_else(|| anyhow::anyhow!("missing system"))?;
    assert_eq!(system.snapshot().live_count(), 30);
    for instance in system.snapshot().instances() {
        assert!(instance.position[0].abs() <= 2.0);
        assert!(instance.position[1].abs() <= 2.0);
    }

    // 最长寿命 3 秒，之后全部移除
    for _ in 0..40 {
        manager.update(0.125);
    }
    let system = manager.system(target).ok_or_else(|| anyhow::anyhow!("missing system"))?;
    assert!(system.is_empty());
    assert_eq!(system.stats().total_removed, 30);
    Ok(())
}

#[test]
fn test_looping_emitter_keeps_spawning() -> anyhow::Result<()> {
    let mut system = quiet_system(1000)?;
    let mut emitter = ParticleEmitter::circle(
        ParticleTemplate {
            lifetime: Value::Fixed(10.0),
            ..Default::default()
        },
        range::RadialRange::disc(3.0),
        EmissionSchedule {
            infinite_loop: true,
            total_spawn_count: 8,
            cycle_duration: 0.5,
            autoplay: true,
        },
    )?;

    let mut admitted = 0;
    for _ in 0..16 {
        admitted += emitter.tick(0.125, &mut system).admitted;
    }
    // 2 秒 = 4 个周期
    assert_eq!(admitted, 32);
    assert!(emitter.is_playing());
    assert_eq!(emitter.scheduler().cycles_completed(), 4);
    Ok(())
}

#[test]
fn test_gravity_and_curves_reach_instance_buffer() -> anyhow::Result<()> {
    let config = EffectConfig::from_toml_str(
        r#"
        [system]
        capacity = 4
        gravity = [0.0, -10.0]

        [[emitters]]
        schedule = { total_spawn_count = 1, cycle_duration = 1.0 }
        shape = { kind = "rectangle", position = [0.0, 0.0] }
        anchor = { position = [50.0, 50.0] }

        [emitters.particle]
        lifetime = 4.0
        scale_curve = [1.0, 3.0]
        opacity_curve = [1.0, 0.0]
        color_curve = [0xFFFFFF]
        "#,
    )?;
    let mut manager = config.build()?;

    // 单粒子计划：周期结束时生成，目标时间 0，偏移截断到本帧的 1 秒
    manager.update(1.0);
    let (_, system) = manager.systems().next().ok_or_else(|| anyhow::anyhow!("no system"))?;
    let instance = system.snapshot().instances()[0];

    // 预老化 1 秒 + 同一帧积分 1 秒：v = -20, y = 50 - 10 - 20
    assert_eq!(instance.position, [50.0, 20.0]);
    assert_eq!(instance.scale, 2.0);
    assert_eq!(instance.opacity, 0.5);
    assert_eq!(instance.color, [1.0, 1.0, 1.0]);
    Ok(())
}

#[test]
fn test_single_particle_survives_at_high_frame_rate() -> anyhow::Result<()> {
    let mut manager = ParticleSystemManager::new();
    let target = manager.add_system(quiet_system(4)?);
    manager.add_emitter(
        target,
        ParticleEmitter::rectangle(
            ParticleTemplate {
                lifetime: Value::Fixed(1.0),
                ..Default::default()
            },
            Vec2::ZERO.into(),
            EmissionSchedule {
                total_spawn_count: 1,
                cycle_duration: 2.0,
                ..Default::default()
            },
        )?,
    )?;

    // 周期 2 秒、寿命 1 秒：偏移不超过一帧，粒子仍然可见
    let mut frame = EmitterTick::default();
    while !manager.is_idle() {
        frame += manager.update(1.0 / 60.0);
    }
    assert_eq!(frame.admitted, 1);
    assert_eq!(frame.expired, 0);

    let system = manager.system(target).ok_or_else(|| anyhow::anyhow!("missing system"))?;
    assert_eq!(system.snapshot().live_count(), 1);
    Ok(())
}

#[test]
fn test_invalid_effect_is_rejected() {
    let missing_texture = r#"
        [system]
        capacity = 8
        sprite = { quad_size = [1.0, 1.0] }
    "#;
    assert!(matches!(
        EffectConfig::from_toml_str(missing_texture),
        Err(ConfigError::ValidationError(ParticleError::MissingTexture))
    ));
}

#[test]
fn test_ecs_schedule_drives_particles() -> anyhow::Result<()> {
    let mut world = World::new();
    init_particle_resources(&mut world);

    let target = world.spawn(ParticleSystemComponent(quiet_system(16)?)).id();
    let emitter = ParticleEmitter::rectangle(
        ParticleTemplate {
            lifetime: Value::Fixed(5.0),
            ..Default::default()
        },
        Vec2::ZERO.into(),
        EmissionSchedule {
            total_spawn_count: 4,
            cycle_duration: 1.0,
            ..Default::default()
        },
    )?
    .with_anchor(Anchor::at(1.0, 2.0));
    world.spawn(EmitterComponent::new(emitter, target));

    let mut schedule = Schedule::default();
    add_particle_systems(&mut schedule);

    world.resource_mut::<ParticleTime>().delta_seconds = 1.0;
    schedule.run(&mut world);

    let system = &world
        .get::<ParticleSystemComponent>(target)
        .ok_or_else(|| anyhow::anyhow!("missing component"))?
        .0;
    assert_eq!(system.snapshot().live_count(), 4);
    assert!(system.particles().all(|p| p.position() == Vec2::new(1.0, 2.0)));
    Ok(())
}
