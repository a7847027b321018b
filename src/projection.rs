use std::f64::consts::PI;

const EPSILON: f64 = 1e-6;

/// Parameters for one conic equal-area component, in the usual
/// cartographic terms: a longitude rotation, a post-rotation center,
/// two standard parallels, and the screen-space scale/translation.
#[derive(Debug, Clone, Copy)]
pub struct ConicConfig {
    pub rotate_deg: f64,
    pub center_deg: (f64, f64),
    pub parallels_deg: (f64, f64),
    pub scale: f64,
    pub translate: (f64, f64),
}

/// Albers conic equal-area projection with precomputed constants.
///
/// `apply` maps (longitude, latitude) in degrees to screen coordinates
/// with y growing downward.
#[derive(Debug, Clone, Copy)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    rotate_deg: f64,
    k: f64,
    dx: f64,
    dy: f64,
}

impl ConicEqualArea {
    pub fn new(config: ConicConfig) -> Self {
        let phi0 = config.parallels_deg.0.to_radians();
        let phi1 = config.parallels_deg.1.to_radians();
        let n = (phi0.sin() + phi1.sin()) / 2.0;
        let c = 1.0 + phi0.sin() * (2.0 * n - phi0.sin());
        let r0 = c.sqrt() / n;

        // The configured center (already in rotated coordinates) must land
        // exactly on the translate point.
        let (cx, cy) = raw_conic(
            n,
            c,
            r0,
            config.center_deg.0.to_radians(),
            config.center_deg.1.to_radians(),
        );
        let k = config.scale;
        let dx = config.translate.0 - k * cx;
        let dy = config.translate.1 + k * cy;

        ConicEqualArea {
            n,
            c,
            r0,
            rotate_deg: config.rotate_deg,
            k,
            dx,
            dy,
        }
    }

    pub fn apply(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let lambda = wrap_longitude((longitude + self.rotate_deg).to_radians());
        let phi = latitude.to_radians();
        let (x, y) = raw_conic(self.n, self.c, self.r0, lambda, phi);
        (self.dx + self.k * x, self.dy - self.k * y)
    }
}

fn raw_conic(n: f64, c: f64, r0: f64, lambda: f64, phi: f64) -> (f64, f64) {
    let r = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
    let nl = n * lambda;
    (r * nl.sin(), r0 - r * nl.cos())
}

fn wrap_longitude(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - 2.0 * PI
    } else if lambda < -PI {
        lambda + 2.0 * PI
    } else {
        lambda
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipRect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl ClipRect {
    fn contains(&self, point: (f64, f64)) -> bool {
        point.0 >= self.x0 && point.0 <= self.x1 && point.1 >= self.y0 && point.1 <= self.y1
    }
}

/// Composite projection of the United States: the lower 48 on an Albers
/// projection, with Alaska (at 0.35x scale) and Hawaii tucked into
/// insets below the southwest corner.
///
/// A point is routed to the first component whose screen-space clip
/// rectangle contains its projection; points outside all three regions
/// do not project at all.
#[derive(Debug, Clone, Copy)]
pub struct AlbersUsa {
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
    lower48_clip: ClipRect,
    alaska_clip: ClipRect,
    hawaii_clip: ClipRect,
}

impl AlbersUsa {
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        let k = scale;
        let (x, y) = translate;

        let lower48 = ConicEqualArea::new(ConicConfig {
            rotate_deg: 96.0,
            center_deg: (-0.6, 38.7),
            parallels_deg: (29.5, 45.5),
            scale: k,
            translate: (x, y),
        });
        let alaska = ConicEqualArea::new(ConicConfig {
            rotate_deg: 154.0,
            center_deg: (-2.0, 58.5),
            parallels_deg: (55.0, 65.0),
            scale: k * 0.35,
            translate: (x - 0.307 * k, y + 0.201 * k),
        });
        let hawaii = ConicEqualArea::new(ConicConfig {
            rotate_deg: 157.0,
            center_deg: (-3.0, 19.9),
            parallels_deg: (8.0, 18.0),
            scale: k,
            translate: (x - 0.205 * k, y + 0.212 * k),
        });

        AlbersUsa {
            lower48,
            alaska,
            hawaii,
            lower48_clip: ClipRect {
                x0: x - 0.455 * k,
                y0: y - 0.238 * k,
                x1: x + 0.455 * k,
                y1: y + 0.238 * k,
            },
            alaska_clip: ClipRect {
                x0: x - 0.425 * k + EPSILON,
                y0: y + 0.120 * k + EPSILON,
                x1: x - 0.214 * k - EPSILON,
                y1: y + 0.234 * k - EPSILON,
            },
            hawaii_clip: ClipRect {
                x0: x - 0.214 * k + EPSILON,
                y0: y + 0.166 * k + EPSILON,
                x1: x - 0.115 * k - EPSILON,
                y1: y + 0.234 * k - EPSILON,
            },
        }
    }

    /// Project (longitude, latitude) in degrees, or `None` when the
    /// point falls outside every component region.
    pub fn apply(&self, longitude: f64, latitude: f64) -> Option<(f64, f64)> {
        let p = self.lower48.apply(longitude, latitude);
        if self.lower48_clip.contains(p) {
            return Some(p);
        }
        let p = self.alaska.apply(longitude, latitude);
        if self.alaska_clip.contains(p) {
            return Some(p);
        }
        let p = self.hawaii.apply(longitude, latitude);
        if self.hawaii_clip.contains(p) {
            return Some(p);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn albers_usa() -> AlbersUsa {
        AlbersUsa::new(1600.0, (650.0, 400.0))
    }

    #[test]
    fn lower48_point_projects_into_main_region() {
        let proj = albers_usa();
        // Near St. Louis.
        let (x, y) = proj.apply(-90.0, 40.0).unwrap();
        assert!((x - 790.0).abs() < 1.0, "x = {}", x);
        assert!((y - 359.4).abs() < 1.0, "y = {}", y);
    }

    #[test]
    fn alaska_point_lands_in_inset() {
        let proj = albers_usa();
        // Anchorage.
        let (x, y) = proj.apply(-149.9, 61.2).unwrap();
        assert!(x >= -30.0 && x <= 307.6, "x = {}", x);
        assert!(y >= 592.0 && y <= 774.4, "y = {}", y);
    }

    #[test]
    fn hawaii_point_lands_in_inset() {
        let proj = albers_usa();
        // Honolulu.
        let (x, y) = proj.apply(-157.86, 21.3).unwrap();
        assert!(x >= 307.6 && x <= 466.0, "x = {}", x);
        assert!(y >= 665.6 && y <= 774.4, "y = {}", y);
    }

    #[test]
    fn out_of_domain_points_do_not_project() {
        let proj = albers_usa();
        assert!(proj.apply(0.0, 0.0).is_none());
        // Mid-Atlantic.
        assert!(proj.apply(-40.0, 30.0).is_none());
        // Southern hemisphere.
        assert!(proj.apply(-70.0, -33.0).is_none());
    }

    #[test]
    fn translate_centers_the_projection() {
        // The lower-48 center parameter should land exactly on the
        // translate point.
        let conic = ConicEqualArea::new(ConicConfig {
            rotate_deg: 96.0,
            center_deg: (-0.6, 38.7),
            parallels_deg: (29.5, 45.5),
            scale: 1600.0,
            translate: (650.0, 400.0),
        });
        let (x, y) = conic.apply(-96.6, 38.7);
        assert!((x - 650.0).abs() < 1e-6, "x = {}", x);
        assert!((y - 400.0).abs() < 1e-6, "y = {}", y);
    }

    #[test]
    fn scale_is_linear_in_screen_space() {
        let small = AlbersUsa::new(800.0, (650.0, 400.0));
        let large = AlbersUsa::new(1600.0, (650.0, 400.0));
        let (xs, ys) = small.apply(-90.0, 40.0).unwrap();
        let (xl, yl) = large.apply(-90.0, 40.0).unwrap();
        // Distances from the translate point double with the scale.
        assert!(((xl - 650.0) - 2.0 * (xs - 650.0)).abs() < 1e-6);
        assert!(((yl - 400.0) - 2.0 * (ys - 400.0)).abs() < 1e-6);
    }
}
