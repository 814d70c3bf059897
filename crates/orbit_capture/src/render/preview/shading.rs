//! Preview shading
//!
//! A deliberately small local-illumination model: Lambert diffuse, a
//! Blinn-Phong highlight sharpened by low roughness, one-bounce mirror
//! reflection weighted by Schlick Fresnel, and straight refraction through the
//! subject for transmissive materials. The area light is treated as a point
//! light at its centre, with hard shadows.

use crate::foundation::math::{constants, utils, Vec3};
use crate::scene::{SceneBuildPlan, ShadingParams};
use super::geometry::{Floor, Hit, Prism, Ray, Surface, RAY_EPSILON};

/// Fraction of the world background reaching surfaces as ambient light
const AMBIENT_FACTOR: f64 = 0.35;

/// Scene ready for ray casting, derived from a build plan
#[derive(Debug, Clone)]
pub struct PreviewScene {
    prism: Prism,
    floor: Floor,
    floor_color: Vec3,
    material: ShadingParams,
    light_position: Vec3,
    light_energy: f64,
    background: Vec3,
}

impl PreviewScene {
    /// Convert a build plan into ray-castable primitives
    pub fn from_plan(plan: &SceneBuildPlan) -> Self {
        Self {
            prism: Prism::from_mesh(&plan.subject),
            floor: Floor::from_plane(&plan.ground),
            floor_color: Vec3::from(plan.ground.color),
            material: plan.material.shading.clone(),
            light_position: plan.light.location,
            light_energy: plan.light.energy,
            background: Vec3::from(plan.world.color) * plan.world.strength,
        }
    }

    /// Closest hit along `ray`
    pub fn trace(&self, ray: &Ray) -> Option<Hit> {
        let subject = self.prism.intersect(ray, RAY_EPSILON, f64::INFINITY);
        let t_max = subject.map_or(f64::INFINITY, |hit| hit.t);
        self.floor.intersect(ray, RAY_EPSILON, t_max).or(subject)
    }

    /// Linear RGB radiance arriving along `ray`
    pub fn shade(&self, ray: &Ray, depth: u32) -> Vec3 {
        let Some(hit) = self.trace(ray) else {
            return self.background;
        };

        match hit.surface {
            Surface::Ground => self.floor_color.component_mul(&self.irradiance(&hit)),
            Surface::Subject => self.shade_subject(ray, &hit, depth),
        }
    }

    /// Ambient plus direct light arriving at a hit point
    fn irradiance(&self, hit: &Hit) -> Vec3 {
        let ambient = self.background * AMBIENT_FACTOR;

        let to_light = self.light_position - hit.point;
        let distance_sq = to_light.norm_squared();
        let light_dir = to_light.normalize();
        let cos_theta = hit.normal.dot(&light_dir);
        if cos_theta <= 0.0 || self.occluded(hit, &light_dir, distance_sq.sqrt()) {
            return ambient;
        }

        let direct = self.light_energy / (4.0 * constants::PI * distance_sq) * cos_theta;
        ambient + Vec3::repeat(direct)
    }

    fn occluded(&self, hit: &Hit, light_dir: &Vec3, light_distance: f64) -> bool {
        let shadow_ray = Ray::new(hit.point + hit.normal * RAY_EPSILON, *light_dir);
        self.prism.intersect(&shadow_ray, RAY_EPSILON, light_distance).is_some()
    }

    fn shade_subject(&self, ray: &Ray, hit: &Hit, depth: u32) -> Vec3 {
        let m = &self.material;
        let base = Vec3::new(m.base_color[0], m.base_color[1], m.base_color[2]);

        // Schlick Fresnel; F0 = 0.08·specular for dielectrics, base color for metals
        let f0 = Vec3::repeat(0.08 * m.specular_ior_level).lerp(&base, m.metallic);
        let cos_i = (-ray.direction.dot(&hit.normal)).max(0.0);
        let fresnel = f0 + (Vec3::repeat(1.0) - f0) * (1.0 - cos_i).powi(5);

        let diffuse_weight = (1.0 - m.metallic) * (1.0 - m.transmission);
        let mut color = base.component_mul(&self.irradiance(hit)) * diffuse_weight;

        // Highlight from the key light
        let light_dir = (self.light_position - hit.point).normalize();
        let half = (light_dir - ray.direction).normalize();
        let shininess = utils::lerp(256.0, 4.0, m.roughness);
        let highlight = hit.normal.dot(&half).max(0.0).powf(shininess);
        if !self.occluded(hit, &light_dir, (self.light_position - hit.point).norm()) {
            color += fresnel * highlight;
        }

        if depth == 0 {
            return color;
        }

        // Mirror reflection, fading out as the surface gets rough
        let reflect_dir = ray.direction - hit.normal * 2.0 * ray.direction.dot(&hit.normal);
        let reflected = self.shade(&Ray::new(hit.point + hit.normal * RAY_EPSILON, reflect_dir), depth - 1);
        color += fresnel.component_mul(&reflected) * (1.0 - m.roughness);

        if m.transmission > 0.0 {
            let transmitted = self.transmit(ray, hit, depth - 1);
            let weight = (Vec3::repeat(1.0) - fresnel) * m.transmission * (1.0 - m.metallic);
            color += weight.component_mul(&transmitted.component_mul(&base.map(|c| utils::clamp(c + 0.2, 0.0, 1.0))));
        }

        color
    }

    /// Radiance seen through the subject along a refracted path
    fn transmit(&self, ray: &Ray, hit: &Hit, depth: u32) -> Vec3 {
        let ior = self.material.ior;
        let inside_dir = refract(&ray.direction, &hit.normal, 1.0 / ior).unwrap_or(ray.direction);
        let inside = Ray::new(hit.point - hit.normal * RAY_EPSILON, inside_dir);

        let Some(span) = self.prism_span(&inside) else {
            return self.shade(&inside, depth);
        };
        let (t_exit, exit_normal) = span;
        let exit_point = inside.at(t_exit);
        let out_dir = refract(&inside.direction, &-exit_normal, ior).unwrap_or(inside.direction);
        self.shade(&Ray::new(exit_point + exit_normal * RAY_EPSILON, out_dir), depth)
    }

    /// Where a ray starting inside the subject leaves it
    fn prism_span(&self, ray: &Ray) -> Option<(f64, Vec3)> {
        let span = self.prism.span(ray)?;
        (span.t_exit > 0.0).then_some((span.t_exit, span.exit_normal))
    }
}

/// Refract unit `incident` through a surface with unit `normal` facing it
///
/// `eta` is the ratio of refractive indices (outside / inside). Returns `None`
/// on total internal reflection.
fn refract(incident: &Vec3, normal: &Vec3, eta: f64) -> Option<Vec3> {
    let cos_i = -incident.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    (k >= 0.0).then(|| (incident * eta + normal * (eta * cos_i - k.sqrt())).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CaptureConfig;
    use crate::scene::MaterialVariant;
    use approx::assert_relative_eq;

    fn scene(material: MaterialVariant) -> PreviewScene {
        PreviewScene::from_plan(&SceneBuildPlan::for_variant(material, &CaptureConfig::default()))
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = scene(MaterialVariant::ceramic());
        let up = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::z());
        assert_relative_eq!(scene.shade(&up, 2), Vec3::repeat(2.0));
    }

    #[test]
    fn test_subject_occludes_floor() {
        let scene = scene(MaterialVariant::ceramic());
        let ray = Ray::new(Vec3::new(4.0, 0.0, 0.6), Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(scene.trace(&ray).unwrap().surface, Surface::Subject);
    }

    #[test]
    fn test_shadow_darkens_floor() {
        let scene = scene(MaterialVariant::ceramic());
        let down = Vec3::new(0.0, 0.0, -1.0);

        // The light sits at (5, -5, 5); the subject shadows the floor on the opposite side
        let lit = scene.shade(&Ray::new(Vec3::new(1.5, -1.5, 3.0), down), 0);
        let shadowed = scene.shade(&Ray::new(Vec3::new(-0.8, 0.8, 3.0), down), 0);
        assert!(lit.x > shadowed.x);
    }

    #[test]
    fn test_refract_straight_through() {
        let dir = Vec3::new(0.0, 0.0, -1.0);
        let refracted = refract(&dir, &Vec3::z(), 1.0 / 1.5).unwrap();
        assert_relative_eq!(refracted, dir, epsilon = 1e-12);
    }

    #[test]
    fn test_total_internal_reflection() {
        let grazing = Vec3::new(1.0, 0.0, -0.05).normalize();
        assert!(refract(&grazing, &Vec3::z(), 1.5).is_none());
    }

    #[test]
    fn test_all_materials_shade_finite() {
        for material in MaterialVariant::default_set() {
            let scene = scene(material);
            let ray = Ray::new(Vec3::new(4.5, 0.0, 2.2), Vec3::new(-4.5, 0.0, -1.6));
            let color = scene.shade(&ray, 3);
            assert!(color.iter().all(|c| c.is_finite() && *c >= 0.0));
        }
    }
}
