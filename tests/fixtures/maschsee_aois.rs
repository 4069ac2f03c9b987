//! Weed patches on the Maschsee, all inside the navigable boundary.
//!
//! Centers were picked between opposite shore points; polygons are small
//! squares around them, like the clusters produced upstream.

/// A named AOI patch.
#[derive(Debug, Clone)]
pub struct Patch {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub amount: u32,
}

impl Patch {
    pub const fn new(name: &'static str, lat: f64, lng: f64, amount: u32) -> Self {
        Self { name, lat, lng, amount }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn polygon(&self) -> Vec<[f64; 2]> {
        super::square_polygon(self.center(), 0.0002)
    }
}

pub const MASCHSEE_AOIS: &[Patch] = &[
    Patch::new("north-basin", 52.3605, 9.7380, 4),
    Patch::new("rowing-club", 52.3580, 9.7400, 3),
    Patch::new("mid-west", 52.3530, 9.7440, 5),
    Patch::new("mid-lake", 52.3500, 9.7475, 2),
    Patch::new("south-basin", 52.3460, 9.7480, 6),
];

/// Well outside the lake, east of the city center.
pub const OUTSIDE_LAKE: Patch = Patch::new("city-center", 52.3740, 9.7380, 1);

pub fn total_amount() -> u32 {
    MASCHSEE_AOIS.iter().map(|patch| patch.amount).sum()
}
