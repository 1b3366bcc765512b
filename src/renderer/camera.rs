use glam::{Mat4, Vec3};

/// Initial eye position, looking at the origin.
pub const HOME_POSITION: Vec3 = Vec3::new(0.0, 1000.0, 1400.0);

pub struct Camera {
    /// Distance from target
    pub distance: f32,
    /// Horizontal rotation (radians)
    pub azimuth: f32,
    /// Vertical rotation (radians), clamped
    pub elevation: f32,
    /// Look-at target point
    pub target: Vec3,
    /// Field of view in degrees
    pub fov: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self::looking_at(HOME_POSITION, Vec3::ZERO)
    }

    /// Orbital camera placed at `eye` and looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length();
        let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
        Self {
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: offset.y.atan2(horizontal),
            target,
            fov: 60.0,
            near: 1.0,
            far: 24000.0,
        }
    }

    /// Calculate camera position from orbital parameters
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Unit vector the camera looks along (local -Z).
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize()
    }

    /// Local X, Y and Z axes in world space.
    pub fn local_axes(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward).normalize();
        (right, up, -forward)
    }

    /// Move the camera along its own axes without changing where it faces.
    ///
    /// `delta` is in camera space: +X right, +Y up, +Z backwards.
    pub fn translate_local(&mut self, delta: Vec3) {
        let (x, y, z) = self.local_axes();
        self.target += x * delta.x + y * delta.y + z * delta.z;
    }

    /// Build view matrix (camera transform)
    pub fn build_view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Build perspective projection matrix
    pub fn build_projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn build_view_projection_matrix(&self, aspect: f32) -> Mat4 {
        self.build_projection_matrix(aspect) * self.build_view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
