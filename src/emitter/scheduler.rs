//! 发射调度器
//!
//! 把经过的时间换算成本帧需要生成的粒子数。同一帧内生成的多个粒子
//! 各自带有时间偏移（`elapsed_time_offset`），工厂据此预先老化粒子，
//! 避免低帧率下一帧的粒子挤成一团。
//!
//! ```text
//!            play()
//!   Stopped ───────▶ Playing
//!      ▲                │
//!      └────────────────┘
//!        stop() / 有限循环结束
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{ParticleError, ParticleResult};
use crate::impl_default;

/// 发射计划（不可变配置）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionSchedule {
    /// 是否无限循环
    pub infinite_loop: bool,
    /// 每个周期生成的粒子总数
    pub total_spawn_count: u32,
    /// 周期时长（秒）
    pub cycle_duration: f32,
    /// 创建后立即播放
    pub autoplay: bool,
}

impl_default!(EmissionSchedule {
    infinite_loop: false,
    total_spawn_count: 10,
    cycle_duration: 1.0,
    autoplay: true,
});

impl EmissionSchedule {
    /// 名义生成间隔
    pub fn step(&self) -> f32 {
        self.cycle_duration / self.total_spawn_count.saturating_sub(1).max(1) as f32
    }

    pub fn validate(&self) -> ParticleResult<()> {
        if !self.cycle_duration.is_finite() || self.cycle_duration <= 0.0 {
            return Err(ParticleError::InvalidEmission(format!(
                "cycle duration must be positive, got {}",
                self.cycle_duration
            )));
        }
        Ok(())
    }
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// 发射调度器
#[derive(Debug, Clone)]
pub struct EmissionScheduler {
    schedule: EmissionSchedule,
    state: PlaybackState,
    current_time: f32,
    emitted_this_cycle: u32,
    cycles_completed: u64,
}

impl EmissionScheduler {
    pub fn new(schedule: EmissionSchedule) -> ParticleResult<Self> {
        schedule.validate()?;
        let state = if schedule.autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        };
        Ok(Self {
            schedule,
            state,
            current_time: 0.0,
            emitted_this_cycle: 0,
            cycles_completed: 0,
        })
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn emitted_this_cycle(&self) -> u32 {
        self.emitted_this_cycle
    }

    /// 无限循环模式下已完成的周期数
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// 开始播放；已在播放时无效果
    pub fn play(&mut self) {
        if self.state == PlaybackState::Stopped {
            self.state = PlaybackState::Playing;
            self.reset_cycle();
        }
    }

    /// 停止播放；已停止时无效果
    pub fn stop(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Stopped;
            self.reset_cycle();
        }
    }

    fn reset_cycle(&mut self) {
        self.current_time = 0.0;
        self.emitted_this_cycle = 0;
    }

    /// 推进 `dt` 秒，对每个应生成的粒子调用一次 `spawn(elapsed_time_offset)`
    ///
    /// 偏移量不超过本帧的 `dt`：粒子不会早于本帧开始时刻出生。
    /// 无限循环模式下一帧跨越多个整周期时，只补完正在进行的周期，
    /// 中间被跳过的周期不再补发。返回本次发出的生成请求数。
    pub fn tick<F: FnMut(f32)>(&mut self, dt: f32, mut spawn: F) -> u32 {
        if !self.is_playing() {
            return 0;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let duration = self.schedule.cycle_duration;
        self.current_time += dt;

        let mut requested = 0;
        if self.schedule.infinite_loop {
            if self.current_time >= duration {
                // 先补完正在进行的周期，剩余时间带入新周期
                requested += self.emit_until(duration, self.current_time, dt, &mut spawn);
                let overflow = self.current_time - duration;
                let skipped = (overflow / duration).floor();
                if skipped >= 1.0 {
                    tracing::trace!(
                        target: "particles",
                        skipped,
                        "Emission cycles skipped by a long frame"
                    );
                }
                self.current_time = overflow.rem_euclid(duration);
                self.emitted_this_cycle = 0;
                self.cycles_completed += 1 + skipped as u64;
            }
        } else {
            self.current_time = self.current_time.min(duration);
        }

        requested += self.emit_until(self.current_time, self.current_time, dt, &mut spawn);

        if !self.schedule.infinite_loop && self.current_time >= duration {
            self.stop();
        }
        requested
    }

    /// 生成周期时间 `cycle_time` 之前应出现的所有粒子
    ///
    /// `now` 是同一周期坐标系下的本帧结束时刻，偏移量 = `now - 目标时间`，
    /// 截断到 `[0, max_offset]`。
    fn emit_until<F: FnMut(f32)>(
        &mut self,
        cycle_time: f32,
        now: f32,
        max_offset: f32,
        spawn: &mut F,
    ) -> u32 {
        let total = self.schedule.total_spawn_count;
        let progress = cycle_time / self.schedule.cycle_duration;
        let expected = ((progress * total as f32).floor().max(0.0) as u32).min(total);
        if expected <= self.emitted_this_cycle {
            return 0;
        }

        let step = self.schedule.step();
        for index in self.emitted_this_cycle..expected {
            let target_time = index as f32 * step;
            spawn((now - target_time).max(0.0).min(max_offset));
        }

        let count = expected - self.emitted_this_cycle;
        self.emitted_this_cycle = expected;
        count
    }
}
