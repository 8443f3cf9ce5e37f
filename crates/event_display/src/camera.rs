use glam::{DVec2, DVec3};

/// Elevation is kept inside +-89 degrees so the view never flips over a pole.
pub const ELEVATION_LIMIT_DEG: f64 = 89.0;
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 5.0;

/// Orthographic orbit camera looking at the centre of the plot box, with `z`
/// as the world "up" direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    // --- Orbital Parameters (Primary State) ---
    /// Rotation of the eye around the `z` axis, measured from `+x` (radians).
    pub azimuth_rad: f64,
    /// Angle of the eye above the `xy` plane (radians).
    pub elevation_rad: f64,
    /// Screen magnification; 1.0 fits the plot box.
    pub zoom: f64,

    // --- Derived Properties (Updated by `update()`) ---
    /// Unit vector from the box centre towards the eye.
    eye_dir: DVec3,
    /// Screen-right direction in world space.
    right: DVec3,
    /// Screen-up direction in world space.
    up: DVec3,
}

impl Camera {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        let mut camera = Self {
            azimuth_rad: azimuth_deg.to_radians(),
            elevation_rad: elevation_deg
                .clamp(-ELEVATION_LIMIT_DEG, ELEVATION_LIMIT_DEG)
                .to_radians(),
            zoom: 1.0,
            eye_dir: DVec3::X, // placeholder
            right: DVec3::Y,   // placeholder
            up: DVec3::Z,      // placeholder
        };

        camera.update();
        camera
    }

    /// Recomputes the view basis from the orbital parameters. Must be called
    /// after any of them change.
    pub fn update(&mut self) {
        let (sin_az, cos_az) = self.azimuth_rad.sin_cos();
        let (sin_el, cos_el) = self.elevation_rad.sin_cos();

        self.eye_dir = DVec3::new(cos_el * cos_az, cos_el * sin_az, sin_el);

        // Forward points from the eye to the target; right = forward x up.
        let forward = -self.eye_dir;
        self.right = forward.cross(DVec3::Z).normalize();
        self.up = self.right.cross(forward);
    }

    #[inline]
    pub fn eye_dir(&self) -> DVec3 {
        self.eye_dir
    }

    /// Screen position of `q` (box units), `y` pointing up.
    #[inline]
    pub fn project(&self, q: DVec3) -> DVec2 {
        DVec2::new(q.dot(self.right), q.dot(self.up))
    }

    /// Signed distance towards the eye; larger means nearer.
    #[inline]
    pub fn depth(&self, q: DVec3) -> f64 {
        q.dot(self.eye_dir)
    }
}

impl Default for Camera {
    /// Same starting view as matplotlib's 3D axes.
    fn default() -> Self {
        Self::new(-60.0, 30.0)
    }
}

pub struct CameraController {
    home: Camera,
}

impl CameraController {
    /// `home` is the view restored by [`reset`](Self::reset).
    pub fn new(home: Camera) -> Self {
        Self { home }
    }

    /// Rotates the camera by a pointer drag of `(dx, dy)` pixels.
    pub fn handle_drag(&mut self, dx: f64, dy: f64, camera: &mut Camera) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }

        camera.azimuth_rad -= dx * 0.005;
        camera.elevation_rad += dy * 0.005;

        let limit = ELEVATION_LIMIT_DEG.to_radians();
        camera.elevation_rad = camera.elevation_rad.clamp(-limit, limit);
        camera.azimuth_rad = camera.azimuth_rad.rem_euclid(std::f64::consts::TAU);

        camera.update();
    }

    /// Positive `delta` (scroll up) zooms in.
    pub fn handle_scroll(&mut self, delta: f64, camera: &mut Camera) {
        if delta == 0.0 {
            return;
        }
        camera.zoom = (camera.zoom * 1.1_f64.powf(delta)).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn reset(&self, camera: &mut Camera) {
        *camera = self.home.clone();
    }
}
