//! Scene light descriptions.
//!
//! Lights are a tagged variant over their kind so every consumer handles
//! directional, point and spot lights through an exhaustive `match`.

use crate::color::Color;
use crate::math::Vec3;

/// Kind-specific light properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light, like the sun.
    Directional { direction: Vec3 },
    /// Omnidirectional light with linear falloff over `range`.
    Point { position: Vec3, range: f32 },
    /// Cone light. `cone_angle` is the full opening angle in radians.
    Spot {
        position: Vec3,
        direction: Vec3,
        range: f32,
        cone_angle: f32,
    },
}

/// A light as exposed by the scene to materials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub enabled: bool,
}

impl Light {
    /// Create an enabled directional light.
    pub fn directional(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { direction },
            color,
            intensity,
            enabled: true,
        }
    }

    /// Create an enabled point light.
    pub fn point(position: Vec3, range: f32, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point { position, range },
            color,
            intensity,
            enabled: true,
        }
    }

    /// Create an enabled spot light.
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        range: f32,
        cone_angle: f32,
        color: Color,
        intensity: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot {
                position,
                direction,
                range,
                cone_angle,
            },
            color,
            intensity,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether the light can contribute at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.intensity > 0.0
    }

    /// Intensity reaching `target`, weighted by the light color's luminance.
    ///
    /// Directional lights are not attenuated. Point and spot lights fall off
    /// linearly and reach zero at `distance >= range`.
    pub fn effective_intensity(&self, target: Vec3) -> f32 {
        let attenuated = match self.kind {
            LightKind::Directional { .. } => self.intensity,
            LightKind::Point { position, range }
            | LightKind::Spot {
                position, range, ..
            } => {
                let distance = (position - target).norm();
                if distance < range {
                    self.intensity * (1.0 - distance / range)
                } else {
                    0.0
                }
            }
        };

        attenuated * self.color.luminance()
    }
}

/// Pick the single light contributing most to an object at `target`.
///
/// Disabled lights and lights with non-positive intensity are skipped. A
/// light must have a strictly positive effective intensity to be picked, and
/// on equal values the earliest light in `lights` wins.
pub fn find_nearby_light(lights: &[Light], target: Vec3) -> Option<&Light> {
    let mut best: Option<&Light> = None;
    let mut max_intensity = 0.0;

    for light in lights.iter().filter(|l| l.is_active()) {
        let intensity = light.effective_intensity(target);
        if intensity > max_intensity {
            max_intensity = intensity;
            best = Some(light);
        }
    }

    best
}
