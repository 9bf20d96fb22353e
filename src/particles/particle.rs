//! 粒子状态与渲染实例记录

use glam::Vec2;

use crate::color::Color;
use crate::curve::Curve;

/// 单个粒子
///
/// 由粒子工厂创建，只由生命周期积分器修改，生命比例达到 1 时被移除。
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// 生命比例 `[0, 1)`
    pub(crate) age_fraction: f32,
    /// 累计存活秒数，f64 累加使死亡时刻与步长划分无关
    pub(crate) age_seconds: f64,
    /// 1 / 寿命（秒）
    pub(crate) inverse_lifetime: f32,
    pub(crate) position: Vec2,
    /// 弧度
    pub(crate) rotation: f32,
    pub(crate) velocity: Vec2,
    /// 弧度/秒
    pub(crate) angular_velocity: f32,
    pub(crate) scale_curve: Curve<f32>,
    pub(crate) color_curve: Curve<Color>,
    pub(crate) opacity_curve: Curve<f32>,
    pub(crate) current_scale: f32,
    pub(crate) current_color: Color,
    pub(crate) current_opacity: f32,
}

impl Particle {
    /// 创建静止、白色、不透明、尺寸为 1 的粒子
    ///
    /// 非正的寿命会在第一次积分时死亡。
    pub fn new(lifetime: f32, position: Vec2) -> Self {
        let inverse_lifetime = if lifetime > 0.0 {
            lifetime.recip()
        } else {
            f32::INFINITY
        };

        Self {
            age_fraction: 0.0,
            age_seconds: 0.0,
            inverse_lifetime,
            position,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            scale_curve: Curve::constant(1.0),
            color_curve: Curve::constant(Color::WHITE),
            opacity_curve: Curve::constant(1.0),
            current_scale: 1.0,
            current_color: Color::WHITE,
            current_opacity: 1.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// 设置初始旋转与角速度（弧度）
    pub fn with_rotation(mut self, rotation: f32, angular_velocity: f32) -> Self {
        self.rotation = rotation;
        self.angular_velocity = angular_velocity;
        self
    }

    /// 设置三条生命周期曲线，并按当前生命比例刷新显示值
    pub fn with_curves(
        mut self,
        scale: Curve<f32>,
        color: Curve<Color>,
        opacity: Curve<f32>,
    ) -> Self {
        self.scale_curve = scale;
        self.color_curve = color;
        self.opacity_curve = opacity;
        self.sample_curves();
        self
    }

    pub(crate) fn sample_curves(&mut self) {
        let t = self.age_fraction;
        self.current_scale = self.scale_curve.evaluate(t);
        self.current_opacity = self.opacity_curve.evaluate(t);
        self.current_color = self.color_curve.evaluate(t);
    }

    pub fn age_fraction(&self) -> f32 {
        self.age_fraction
    }

    pub fn inverse_lifetime(&self) -> f32 {
        self.inverse_lifetime
    }

    pub fn lifetime(&self) -> f32 {
        self.inverse_lifetime.recip()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn scale(&self) -> f32 {
        self.current_scale
    }

    pub fn color(&self) -> Color {
        self.current_color
    }

    pub fn opacity(&self) -> f32 {
        self.current_opacity
    }

    pub fn scale_curve(&self) -> &Curve<f32> {
        &self.scale_curve
    }

    pub fn is_alive(&self) -> bool {
        self.age_fraction < 1.0
    }

    /// 转换为渲染实例记录
    pub fn to_instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            rotation: self.rotation,
            scale: self.current_scale,
            color: self.current_color.to_array(),
            opacity: self.current_opacity,
        }
    }
}

/// 渲染实例记录（对应着色器中的实例属性）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    /// 位置
    pub position: [f32; 2],
    /// 旋转（弧度）
    pub rotation: f32,
    /// 尺寸
    pub scale: f32,
    /// 颜色 (RGB)
    pub color: [f32; 3],
    /// 不透明度
    pub opacity: f32,
}
