use glam::{Mat4, Vec3, Vec4};

/// Left, right, bottom, top, near, far. Each plane is `(normal, d)` with the
/// normal pointing into the volume, normalized when the normal is non-zero.
pub type FrustumPlanes = [Vec4; 6];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Gribb-Hartmann plane extraction from a combined view-projection matrix.
pub fn extract_frustum_planes(view_proj: Mat4) -> FrustumPlanes {
    let row0 = view_proj.row(0);
    let row1 = view_proj.row(1);
    let row2 = view_proj.row(2);
    let row3 = view_proj.row(3);

    let planes = [
        row3 + row0,
        row3 - row0,
        row3 + row1,
        row3 - row1,
        row3 + row2,
        row3 - row2,
    ];

    planes.map(|plane| {
        let len = plane.truncate().length();
        if len > 0.0001 {
            plane / len
        } else {
            plane
        }
    })
}

/// Conservative box test: `false` only when the box is fully outside one plane.
pub fn aabb_in_frustum(planes: &FrustumPlanes, aabb: &Aabb) -> bool {
    let center = aabb.center();
    let half = aabb.half_extents();
    for plane in planes {
        let normal = plane.truncate();
        let d = normal.dot(center) + plane.w;
        let r = half.dot(normal.abs());
        if d < -r {
            return false;
        }
    }
    true
}

/// Culling gate run before any window or portal math.
pub fn is_visible(view_proj: Mat4, aabb: &Aabb) -> bool {
    aabb_in_frustum(&extract_frustum_planes(view_proj), aabb)
}
