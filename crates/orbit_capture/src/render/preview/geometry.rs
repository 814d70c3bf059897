//! Ray intersection for the preview scene primitives

use crate::foundation::math::{constants, Vec3};
use crate::scene::{GroundPlane, SubjectMesh};

/// Offset applied to secondary ray origins to avoid self-intersection
pub const RAY_EPSILON: f64 = 1e-6;

/// Half-line in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at parameter `t`
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Which primitive a ray hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The captured object
    Subject,
    /// The floor
    Ground,
}

/// Closest intersection along a ray
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    /// Ray parameter of the hit
    pub t: f64,
    /// World-space point
    pub point: Vec3,
    /// Unit normal facing against the incoming ray
    pub normal: Vec3,
    /// Primitive that was hit
    pub surface: Surface,
}

/// Bounding half-space `normal·p <= offset`
#[derive(Debug, Clone, Copy)]
struct HalfSpace {
    normal: Vec3,
    offset: f64,
}

/// Entry and exit of a ray through the prism
#[derive(Debug, Clone, Copy)]
pub struct Span {
    /// Parameter where the ray enters
    pub t_enter: f64,
    /// Outward normal at the entry point
    pub enter_normal: Vec3,
    /// Parameter where the ray leaves
    pub t_exit: f64,
    /// Outward normal at the exit point
    pub exit_normal: Vec3,
}

/// Right regular prism built as an intersection of half-spaces
#[derive(Debug, Clone)]
pub struct Prism {
    faces: Vec<HalfSpace>,
}

impl Prism {
    /// Build the prism described by a subject mesh
    ///
    /// Vertex `k` of the cross-section sits at angle `k·2π/sides`, so face
    /// normals point between adjacent vertices.
    pub fn from_mesh(mesh: &SubjectMesh) -> Self {
        let sides = mesh.sides.max(3);
        let apothem = mesh.radius * (constants::PI / f64::from(sides)).cos();
        let center = mesh.location;

        let mut faces: Vec<HalfSpace> = (0..sides)
            .map(|k| {
                let angle = (f64::from(k) + 0.5) * constants::TAU / f64::from(sides);
                let normal = Vec3::new(angle.cos(), angle.sin(), 0.0);
                HalfSpace { normal, offset: apothem + normal.dot(&center) }
            })
            .collect();
        faces.push(HalfSpace { normal: Vec3::z(), offset: mesh.top() });
        faces.push(HalfSpace { normal: -Vec3::z(), offset: -mesh.bottom() });

        Self { faces }
    }

    /// Parameters where the ray's line crosses the prism, if it does
    pub fn span(&self, ray: &Ray) -> Option<Span> {
        let mut span = Span {
            t_enter: f64::NEG_INFINITY,
            enter_normal: Vec3::zeros(),
            t_exit: f64::INFINITY,
            exit_normal: Vec3::zeros(),
        };

        for face in &self.faces {
            let denom = face.normal.dot(&ray.direction);
            let distance = face.offset - face.normal.dot(&ray.origin);
            if denom.abs() < 1e-12 {
                // Parallel to the face: either always inside it or never
                if distance < 0.0 {
                    return None;
                }
                continue;
            }
            let t = distance / denom;
            if denom < 0.0 {
                if t > span.t_enter {
                    span.t_enter = t;
                    span.enter_normal = face.normal;
                }
            } else if t < span.t_exit {
                span.t_exit = t;
                span.exit_normal = face.normal;
            }
        }

        (span.t_enter <= span.t_exit).then_some(span)
    }

    /// Closest hit on the outside of the prism within `(t_min, t_max)`
    pub fn intersect(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<Hit> {
        let span = self.span(ray)?;
        (span.t_enter > t_min && span.t_enter < t_max).then(|| Hit {
            t: span.t_enter,
            point: ray.at(span.t_enter),
            normal: span.enter_normal,
            surface: Surface::Subject,
        })
    }
}

/// Bounded horizontal floor
#[derive(Debug, Clone)]
pub struct Floor {
    elevation: f64,
    half_size: f64,
}

impl Floor {
    /// Build the floor described by a ground plane
    pub fn from_plane(plane: &GroundPlane) -> Self {
        Self {
            elevation: plane.elevation,
            half_size: plane.size * 0.5,
        }
    }

    /// Hit within `(t_min, t_max)`, normal facing the incoming ray
    pub fn intersect(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<Hit> {
        if ray.direction.z.abs() < 1e-12 {
            return None;
        }
        let t = (self.elevation - ray.origin.z) / ray.direction.z;
        if t <= t_min || t >= t_max {
            return None;
        }
        let point = ray.at(t);
        if point.x.abs() > self.half_size || point.y.abs() > self.half_size {
            return None;
        }
        let normal = if ray.direction.z < 0.0 { Vec3::z() } else { -Vec3::z() };
        Some(Hit { t, point, normal, surface: Surface::Ground })
    }
}
