//! Geographic to planar projection.
//!
//! The default is the ETRS89 Lambert Azimuthal Equal Area grid (EPSG:3035),
//! the standard metric grid for pan-European statistics. Distances in this
//! grid stay within a fraction of a percent of ground distance across the
//! continent, which is all the nearest-place search needs.

use geo::Coord;

/// GRS80 semi-major axis in meters
const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening
const GRS80_INV_F: f64 = 298.257_222_101;

/// Below this the projection denominator is treated as the antipodal singularity
const ANTIPODE_EPSILON: f64 = 1e-12;

/// A deterministic map from geographic degrees to planar meters.
///
/// Implementations must be pure: the same input always yields the same output.
pub trait Projection: Send + Sync {
    /// Short identifier, e.g. "EPSG:3035"
    fn name(&self) -> &str;

    /// Project (lat, lon) in degrees. Returns None outside the valid domain.
    fn project(&self, lat: f64, lon: f64) -> Option<Coord<f64>>;
}

/// Ellipsoidal Lambert Azimuthal Equal Area (oblique aspect)
#[derive(Debug, Clone)]
pub struct LambertAzimuthalEqualArea {
    name: String,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    e: f64,
    e2: f64,
    qp: f64,
    rq: f64,
    d: f64,
    sin_beta0: f64,
    cos_beta0: f64,
}

impl LambertAzimuthalEqualArea {
    /// Build a projection centered at (lat0, lon0) degrees on the ellipsoid
    /// given by semi-major axis `a` and inverse flattening `inv_f`.
    pub fn new(
        name: impl Into<String>,
        lat0: f64,
        lon0: f64,
        false_easting: f64,
        false_northing: f64,
        a: f64,
        inv_f: f64,
    ) -> Self {
        let f = 1.0 / inv_f;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();

        let phi0 = lat0.to_radians();
        let qp = authalic_q(1.0, e, e2);
        let q0 = authalic_q(phi0.sin(), e, e2);
        let beta0 = (q0 / qp).clamp(-1.0, 1.0).asin();
        let rq = a * (qp / 2.0).sqrt();
        let d = a * (phi0.cos() / (1.0 - e2 * phi0.sin().powi(2)).sqrt()) / (rq * beta0.cos());

        Self {
            name: name.into(),
            lon0: lon0.to_radians(),
            false_easting,
            false_northing,
            e,
            e2,
            qp,
            rq,
            d,
            sin_beta0: beta0.sin(),
            cos_beta0: beta0.cos(),
        }
    }

    /// ETRS89-extended / LAEA Europe (EPSG:3035)
    pub fn etrs89() -> Self {
        Self::new(
            "EPSG:3035",
            52.0,
            10.0,
            4_321_000.0,
            3_210_000.0,
            GRS80_A,
            GRS80_INV_F,
        )
    }
}

impl Default for LambertAzimuthalEqualArea {
    fn default() -> Self {
        Self::etrs89()
    }
}

impl Projection for LambertAzimuthalEqualArea {
    fn name(&self) -> &str {
        &self.name
    }

    fn project(&self, lat: f64, lon: f64) -> Option<Coord<f64>> {
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 {
            return None;
        }

        let q = authalic_q(lat.to_radians().sin(), self.e, self.e2);
        let beta = (q / self.qp).clamp(-1.0, 1.0).asin();
        let (sin_beta, cos_beta) = beta.sin_cos();
        let (sin_dlon, cos_dlon) = (lon.to_radians() - self.lon0).sin_cos();

        let denom = 1.0 + self.sin_beta0 * sin_beta + self.cos_beta0 * cos_beta * cos_dlon;
        if denom < ANTIPODE_EPSILON {
            return None;
        }

        let b = self.rq * (2.0 / denom).sqrt();
        let x = self.false_easting + b * self.d * cos_beta * sin_dlon;
        let y = self.false_northing
            + (b / self.d) * (self.cos_beta0 * sin_beta - self.sin_beta0 * cos_beta * cos_dlon);

        Some(Coord { x, y })
    }
}

/// Authalic latitude helper q(φ), taking sin φ
fn authalic_q(sin_phi: f64, e: f64, e2: f64) -> f64 {
    let es = e * sin_phi;
    (1.0 - e2) * (sin_phi / (1.0 - es * es) - (1.0 / (2.0 * e)) * ((1.0 - es) / (1.0 + es)).ln())
}
