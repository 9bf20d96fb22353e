//! 随机范围采样
//!
//! 粒子属性声明为"固定值或随机范围"（[`Value`]），在粒子生成时解析一次，
//! 生命周期内不再重新采样。
//!
//! | 类型 | 采样方式 |
//! |------|----------|
//! | [`ScalarRange`] | `[min, max]` 均匀分布 |
//! | [`VectorRange`] | 每个轴独立均匀分布 |
//! | [`RadialRange`] | 独立采样强度与角度（度），转换为 `power·(cos θ, sin θ)` |
//! | [`ColorRange`] | 固定打包颜色 / 灰度范围 / 每通道独立范围 |
//!
//! 所有分量都是独立抽取的，不做联合采样。

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::color::Color;
use crate::core::{ParticleError, ParticleResult};

/// 可采样的随机范围
pub trait Sample {
    /// 采样结果类型
    type Output: Copy + Debug + PartialEq + Finite;

    /// 抽取一个值，每次调用使用独立的随机数
    fn sample<G: Rng + ?Sized>(&self, rng: &mut G) -> Self::Output;

    /// 检查边界是否有限且 `min <= max`
    fn validate(&self) -> ParticleResult<()>;
}

/// 采样结果的有限性检查
pub trait Finite {
    fn all_finite(&self) -> bool;
}

impl Finite for f32 {
    fn all_finite(&self) -> bool {
        self.is_finite()
    }
}

impl Finite for Vec2 {
    fn all_finite(&self) -> bool {
        self.is_finite()
    }
}

impl Finite for Color {
    fn all_finite(&self) -> bool {
        self.is_finite()
    }
}

/// `[min, max]` 上的均匀采样
///
/// `min == max` 时不消耗随机数，直接返回该值。
pub(crate) fn uniform<G: Rng + ?Sized>(rng: &mut G, min: f32, max: f32) -> f32 {
    if min == max {
        return min;
    }
    let (lo, hi) = if min < max { (min, max) } else { (max, min) };
    let value = lo + rng.gen::<f32>() * (hi - lo);
    // 舍入可能越过上界
    value.max(lo).min(hi)
}

fn check_bounds(name: &str, min: f32, max: f32) -> ParticleResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ParticleError::InvalidRange(format!(
            "{name} bounds must be finite, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(ParticleError::InvalidRange(format!(
            "{name} min {min} is greater than max {max}"
        )));
    }
    Ok(())
}

// ============================================================================
// 标量范围
// ============================================================================

/// 标量范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarRange {
    pub min: f32,
    pub max: f32,
}

impl ScalarRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 退化范围，总是返回 `value`
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Sample for ScalarRange {
    type Output = f32;

    fn sample<G: Rng + ?Sized>(&self, rng: &mut G) -> f32 {
        uniform(rng, self.min, self.max)
    }

    fn validate(&self) -> ParticleResult<()> {
        check_bounds("scalar range", self.min, self.max)
    }
}

// ============================================================================
// 向量范围
// ============================================================================

/// 二维向量范围，每个轴独立采样
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorRange {
    pub min: Vec2,
    pub max: Vec2,
}

impl VectorRange {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// 以原点为中心、尺寸为 `size` 的矩形区域
    pub fn centered(size: Vec2) -> Self {
        let half = size * 0.5;
        Self::new(-half, half)
    }

    pub fn contains(&self, value: Vec2) -> bool {
        value.cmpge(self.min).all() && value.cmple(self.max).all()
    }
}

impl Sample for VectorRange {
    type Output = Vec2;

    fn sample<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec2 {
        Vec2::new(
            uniform(rng, self.min.x, self.max.x),
            uniform(rng, self.min.y, self.max.y),
        )
    }

    fn validate(&self) -> ParticleResult<()> {
        check_bounds("vector range x", self.min.x, self.max.x)?;
        check_bounds("vector range y", self.min.y, self.max.y)
    }
}

// ============================================================================
// 径向范围
// ============================================================================

/// 径向范围：强度 + 角度（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialRange {
    pub power_min: f32,
    pub power_max: f32,
    pub angle_min: f32,
    pub angle_max: f32,
}

impl RadialRange {
    pub const fn new(power_min: f32, power_max: f32, angle_min: f32, angle_max: f32) -> Self {
        Self {
            power_min,
            power_max,
            angle_min,
            angle_max,
        }
    }

    /// 全方向，强度在 `[0, radius]`
    pub const fn disc(radius: f32) -> Self {
        Self::new(0.0, radius, 0.0, 360.0)
    }

    pub const fn power(&self) -> ScalarRange {
        ScalarRange::new(self.power_min, self.power_max)
    }

    pub const fn angle(&self) -> ScalarRange {
        ScalarRange::new(self.angle_min, self.angle_max)
    }
}

impl Sample for RadialRange {
    type Output = Vec2;

    fn sample<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec2 {
        let power = uniform(rng, self.power_min, self.power_max);
        let angle = uniform(rng, self.angle_min, self.angle_max).to_radians();
        Vec2::new(angle.cos(), angle.sin()) * power
    }

    fn validate(&self) -> ParticleResult<()> {
        check_bounds("radial power", self.power_min, self.power_max)?;
        check_bounds("radial angle", self.angle_min, self.angle_max)
    }
}

// ============================================================================
// 颜色范围
// ============================================================================

/// 颜色范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorRange {
    /// 固定颜色 `0xRRGGBB`，不消耗随机数
    Packed(u32),
    /// 灰度范围
    Gray(ScalarRange),
    /// 每通道独立范围
    Channels {
        r_min: f32,
        r_max: f32,
        g_min: f32,
        g_max: f32,
        b_min: f32,
        b_max: f32,
    },
}

impl ColorRange {
    pub fn between(min: Color, max: Color) -> Self {
        Self::Channels {
            r_min: min.r,
            r_max: max.r,
            g_min: min.g,
            g_max: max.g,
            b_min: min.b,
            b_max: max.b,
        }
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::Packed(0xFFFFFF)
    }
}

impl Sample for ColorRange {
    type Output = Color;

    fn sample<G: Rng + ?Sized>(&self, rng: &mut G) -> Color {
        match *self {
            Self::Packed(rgb) => Color::from_packed(rgb),
            Self::Gray(range) => Color::gray(range.sample(rng)),
            Self::Channels {
                r_min,
                r_max,
                g_min,
                g_max,
                b_min,
                b_max,
            } => Color::new(
                uniform(rng, r_min, r_max),
                uniform(rng, g_min, g_max),
                uniform(rng, b_min, b_max),
            ),
        }
    }

    fn validate(&self) -> ParticleResult<()> {
        match *self {
            Self::Packed(rgb) if rgb > 0xFFFFFF => Err(ParticleError::InvalidRange(format!(
                "packed color {rgb:#x} exceeds 0xFFFFFF"
            ))),
            Self::Packed(_) => Ok(()),
            Self::Gray(range) => range.validate(),
            Self::Channels {
                r_min,
                r_max,
                g_min,
                g_max,
                b_min,
                b_max,
            } => {
                check_bounds("red channel", r_min, r_max)?;
                check_bounds("green channel", g_min, g_max)?;
                check_bounds("blue channel", b_min, b_max)
            }
        }
    }
}

// ============================================================================
// 固定值或范围
// ============================================================================

/// 属性声明：固定值或随机范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    untagged,
    bound(
        serialize = "R: serde::Serialize, R::Output: serde::Serialize",
        deserialize = "R: serde::Deserialize<'de>, R::Output: serde::Deserialize<'de>"
    )
)]
pub enum Value<R: Sample> {
    Fixed(R::Output),
    Range(R),
}

impl<R: Sample> Value<R> {
    pub fn fixed(value: R::Output) -> Self {
        Self::Fixed(value)
    }

    pub fn range(range: R) -> Self {
        Self::Range(range)
    }

    /// 解析为具体值；固定值不消耗随机数
    pub fn resolve<G: Rng + ?Sized>(&self, rng: &mut G) -> R::Output {
        match self {
            Self::Fixed(value) => *value,
            Self::Range(range) => range.sample(rng),
        }
    }

    pub fn validate(&self) -> ParticleResult<()> {
        match self {
            Self::Fixed(value) if !value.all_finite() => Err(ParticleError::InvalidRange(
                format!("fixed value {value:?} is not finite"),
            )),
            Self::Fixed(_) => Ok(()),
            Self::Range(range) => range.validate(),
        }
    }
}

impl Value<ScalarRange> {
    /// 可能取到的最小值
    pub fn lower_bound(&self) -> f32 {
        match self {
            Self::Fixed(value) => *value,
            Self::Range(range) => range.min,
        }
    }
}

impl From<f32> for Value<ScalarRange> {
    fn from(value: f32) -> Self {
        Self::Fixed(value)
    }
}

impl From<ScalarRange> for Value<ScalarRange> {
    fn from(range: ScalarRange) -> Self {
        Self::Range(range)
    }
}

impl From<Vec2> for Value<VectorRange> {
    fn from(value: Vec2) -> Self {
        Self::Fixed(value)
    }
}

impl From<VectorRange> for Value<VectorRange> {
    fn from(range: VectorRange) -> Self {
        Self::Range(range)
    }
}

impl From<Vec2> for Value<RadialRange> {
    fn from(value: Vec2) -> Self {
        Self::Fixed(value)
    }
}

impl From<RadialRange> for Value<RadialRange> {
    fn from(range: RadialRange) -> Self {
        Self::Range(range)
    }
}
