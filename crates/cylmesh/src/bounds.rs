use glam::DVec3;

/// Axis-aligned bounds of a point set. Non-finite points are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.expand(p);
        }
        bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn expand(&mut self, p: DVec3) {
        if !p.is_finite() {
            return;
        }
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Size along each axis; zero for an empty box.
    pub fn extent(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn contains(&self, p: DVec3, eps: f64) -> bool {
        !self.is_empty()
            && p.cmpge(self.min - DVec3::splat(eps)).all()
            && p.cmple(self.max + DVec3::splat(eps)).all()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}
