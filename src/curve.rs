//! 生命周期曲线
//!
//! 曲线是按顺序排列的控制点，在生命比例 `t ∈ [0, 1)` 上做分段线性插值：
//!
//! ```text
//! exact = (n - 1) * t
//! lo    = floor(exact)
//! hi    = min(lo + 1, n - 1)
//! value = lerp(points[lo], points[hi], exact - lo)
//! ```
//!
//! 控制点可以是随机范围（[`CurveDef`]），在粒子生成时解析为 [`Curve`]。

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::core::{ParticleError, ParticleResult};
use crate::range::{ColorRange, Sample, ScalarRange, Value};

/// 线性插值
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Color {
    fn lerp(self, other: Self, t: f32) -> Self {
        Color::new(
            Lerp::lerp(self.r, other.r, t),
            Lerp::lerp(self.g, other.g, t),
            Lerp::lerp(self.b, other.b, t),
        )
    }
}

/// 已解析的曲线，至少包含一个控制点
#[derive(Debug, Clone, PartialEq)]
pub struct Curve<T> {
    points: Vec<T>,
}

impl<T: Lerp> Curve<T> {
    pub fn new(points: Vec<T>) -> ParticleResult<Self> {
        if points.is_empty() {
            return Err(ParticleError::EmptyCurve);
        }
        Ok(Self { points })
    }

    /// 单点曲线，对任意 `t` 返回同一个值
    pub fn constant(value: T) -> Self {
        Self {
            points: vec![value],
        }
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 在生命比例 `t` 处采样
    pub fn evaluate(&self, t: f32) -> T {
        let n = self.points.len();
        if n == 1 {
            return self.points[0];
        }

        let t = t.max(0.0).min(1.0);
        let exact = (n - 1) as f32 * t;
        let lo = (exact.floor() as usize).min(n - 1);
        let hi = (lo + 1).min(n - 1);
        let frac = exact - lo as f32;

        self.points[lo].lerp(self.points[hi], frac)
    }

    /// 对每个控制点应用变换
    pub fn map(mut self, f: impl Fn(T) -> T) -> Self {
        for point in &mut self.points {
            *point = f(*point);
        }
        self
    }
}

impl Curve<f32> {
    /// 所有控制点乘以 `factor`
    pub fn scaled(self, factor: f32) -> Self {
        self.map(|v| v * factor)
    }
}

/// 可在生成时解析的控制点
pub trait Resolve {
    type Output: Lerp;

    fn resolve<G: Rng + ?Sized>(&self, rng: &mut G) -> Self::Output;

    fn validate(&self) -> ParticleResult<()>;
}

impl Resolve for Value<ScalarRange> {
    type Output = f32;

    fn resolve<G: Rng + ?Sized>(&self, rng: &mut G) -> f32 {
        Value::resolve(self, rng)
    }

    fn validate(&self) -> ParticleResult<()> {
        Value::validate(self)
    }
}

impl Resolve for ColorRange {
    type Output = Color;

    fn resolve<G: Rng + ?Sized>(&self, rng: &mut G) -> Color {
        self.sample(rng)
    }

    fn validate(&self) -> ParticleResult<()> {
        Sample::validate(self)
    }
}

/// 曲线声明，控制点在每个粒子生成时解析一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveDef<P> {
    points: Vec<P>,
}

/// 标量曲线声明
pub type ScalarCurveDef = CurveDef<Value<ScalarRange>>;
/// 颜色曲线声明
pub type ColorCurveDef = CurveDef<ColorRange>;

impl<P: Resolve> CurveDef<P> {
    pub fn new(points: Vec<P>) -> ParticleResult<Self> {
        let def = Self { points };
        def.validate()?;
        Ok(def)
    }

    pub fn constant(point: P) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// 反序列化得到的曲线可能为空，使用前必须验证
    pub fn validate(&self) -> ParticleResult<()> {
        if self.points.is_empty() {
            return Err(ParticleError::EmptyCurve);
        }
        self.points.iter().try_for_each(Resolve::validate)
    }

    /// 解析所有控制点
    pub fn resolve<G: Rng + ?Sized>(&self, rng: &mut G) -> Curve<P::Output> {
        Curve {
            points: self.points.iter().map(|p| p.resolve(rng)).collect(),
        }
    }
}

impl ScalarCurveDef {
    pub fn from_values(values: &[f32]) -> ParticleResult<Self> {
        Self::new(values.iter().copied().map(Value::Fixed).collect())
    }
}

impl ColorCurveDef {
    pub fn from_packed(colors: &[u32]) -> ParticleResult<Self> {
        Self::new(colors.iter().copied().map(ColorRange::Packed).collect())
    }
}
