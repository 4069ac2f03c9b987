//! Shoreline skeleton and the sampled containment test.

use std::fs;
use std::path::Path;

use geo::{Coord, Intersects, LineString, Polygon};

use crate::error::PlanError;
use crate::geodesic::{geodesic_km, is_valid_coordinate, linspace, Coordinate};

/// Surveyed navigable boundary of the Maschsee (Hanover), lat/lng.
const MASCHSEE_RING: [Coordinate; 39] = [
    (52.35319481421753, 9.741068524961092),
    (52.35375288163785, 9.740944334909406),
    (52.354923174878856, 9.740252419024957),
    (52.35601216990911, 9.739320993798955),
    (52.35770249713955, 9.73872665573478),
    (52.35836344085968, 9.737954903401128),
    (52.35889435569331, 9.736517847317502),
    (52.36144590835293, 9.735187239829951),
    (52.36171134804204, 9.736136406481053),
    (52.361995365501336, 9.736120380558818),
    (52.362518252958246, 9.738393785869484),
    (52.36161367655934, 9.738981599734384),
    (52.361648185835286, 9.739504317188478),
    (52.35759845926092, 9.74253466887106),
    (52.357365499776016, 9.742647688861135),
    (52.356373251178255, 9.743438828791655),
    (52.35634736613406, 9.74374963376436),
    (52.3545181179009, 9.745400648693204),
    (52.35403574132127, 9.745047440643674),
    (52.353261022403466, 9.745862423368775),
    (52.353261022403466, 9.746562423368775),
    (52.34839859450956, 9.750271272453712),
    (52.34784003843393, 9.750271272453712),
    (52.34746106110065, 9.751774190015617),
    (52.344011148585295, 9.75426737232507),
    (52.343327511541844, 9.75284234353687),
    (52.34381817005903, 9.752458161034456),
    (52.34378073857038, 9.752279317457125),
    (52.34327490452804, 9.752728082341761),
    (52.342990805740264, 9.751518957467772),
    (52.34315049255071, 9.749434006792855),
    (52.34361358175123, 9.74762061432649),
    (52.34448144012328, 9.745931067726529),
    (52.345667770995355, 9.744848294726213),
    (52.34648725566052, 9.744591105398646),
    (52.34830194094891, 9.744971640283941),
    (52.34957533218151, 9.746027255531429),
    (52.35094080033972, 9.74564581475346),
    (52.35184567068127, 9.744430526592005),
];

/// Closed ring of navigable boundary points.
///
/// Stored open (first != last); the edge from the last point back to the
/// first is implied. Index 0 is the depot anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ShorelineSkeleton {
    ring: Vec<Coordinate>,
}

impl ShorelineSkeleton {
    /// Validates and normalizes a ring. A repeated closing point is dropped.
    pub fn new(mut ring: Vec<Coordinate>) -> Result<Self, PlanError> {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(PlanError::InvalidSkeleton(format!(
                "ring needs at least 3 distinct points, got {}",
                ring.len()
            )));
        }
        if let Some(bad) = ring.iter().position(|point| !is_valid_coordinate(*point)) {
            return Err(PlanError::InvalidSkeleton(format!(
                "ring point {} is not a valid coordinate: {:?}",
                bad, ring[bad]
            )));
        }
        Ok(Self { ring })
    }

    /// The built-in Maschsee skeleton.
    pub fn maschsee() -> Self {
        Self {
            ring: MASCHSEE_RING.to_vec(),
        }
    }

    /// Loads a ring from a JSON file holding `[[lat, lng], ...]`.
    pub fn from_json_file(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path)?;
        let points: Vec<[f64; 2]> = serde_json::from_str(&text)
            .map_err(|err| PlanError::InvalidSkeleton(format!("{}: {}", path.display(), err)))?;
        Self::new(points.into_iter().map(|[lat, lng]| (lat, lng)).collect())
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.ring
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Ring edges `(i, i + 1, km)`, wraparound edge last.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let n = self.ring.len();
        (0..n).map(move |i| {
            let j = (i + 1) % n;
            (i, j, geodesic_km(self.ring[i], self.ring[j]))
        })
    }

    /// Total ring length in kilometers.
    pub fn perimeter_km(&self) -> f64 {
        self.edges().map(|(_, _, km)| km).sum()
    }
}

impl Default for ShorelineSkeleton {
    fn default() -> Self {
        Self::maschsee()
    }
}

/// Planar point-in-polygon test on straight lat/lng segments.
///
/// A segment counts as navigable when every one of `samples` evenly spaced
/// points on it lies inside the ring or on its boundary. This is an accepted
/// approximation: the segment between samples is not checked, and lat/lng
/// are treated as planar.
#[derive(Debug, Clone)]
pub struct PlanarContainment {
    polygon: Polygon<f64>,
    samples: usize,
}

impl PlanarContainment {
    pub fn new(skeleton: &ShorelineSkeleton, samples: usize) -> Self {
        let exterior: LineString<f64> = skeleton
            .points()
            .iter()
            .map(|&(lat, lng)| Coord { x: lng, y: lat })
            .collect();
        Self {
            polygon: Polygon::new(exterior, Vec::new()),
            samples,
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Inside or on the boundary of the ring.
    pub fn contains(&self, point: Coordinate) -> bool {
        let (lat, lng) = point;
        self.polygon.intersects(&Coord { x: lng, y: lat })
    }

    pub fn segment_inside(&self, from: Coordinate, to: Coordinate) -> bool {
        linspace(from, to, self.samples)
            .into_iter()
            .all(|point| self.contains(point))
    }
}
