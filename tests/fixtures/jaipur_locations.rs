//! Real Jaipur dustbin locations.
//!
//! Coordinates are (longitude, latitude). Handy distances, great-circle:
//! - depot to Hawa Mahal: ~4.1 km
//! - Hawa Mahal to City Palace: ~0.4 km
//! - Hawa Mahal to Amer Fort: ~7.3 km
//! - Hawa Mahal to Mansarovar: ~11.8 km

use waste_dispatch::{CollectionPoint, LonLat};

/// A named dustbin with coordinates and fill level.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub lon: f64,
    pub lat: f64,
    pub fill: f64,
}

impl Location {
    pub const fn new(id: &'static str, name: &'static str, lon: f64, lat: f64, fill: f64) -> Self {
        Self {
            id,
            name,
            lon,
            lat,
            fill,
        }
    }

    pub fn coords(&self) -> LonLat {
        LonLat::new(self.lon, self.lat)
    }

    pub fn point(&self) -> CollectionPoint {
        CollectionPoint::new(self.id, self.coords(), self.name).with_fill(self.fill)
    }
}

pub const HAWA_MAHAL: Location = Location::new("hawa_mahal", "Hawa Mahal", 75.8267, 26.9239, 80.0);
pub const CITY_PALACE: Location = Location::new("city_palace", "City Palace", 75.8236, 26.9258, 70.0);
pub const JANTAR_MANTAR: Location =
    Location::new("jantar_mantar", "Jantar Mantar", 75.8246, 26.9248, 65.0);
pub const AMER_FORT: Location = Location::new("amer_fort", "Amer Fort", 75.8513, 26.9855, 85.0);
pub const RAJA_PARK: Location = Location::new("raja_park", "Raja Park", 75.8281, 26.8997, 75.0);
pub const MANSAROVAR: Location = Location::new("mansarovar", "Mansarovar", 75.7500, 26.8430, 60.0);
pub const VAISHALI_NAGAR: Location =
    Location::new("vaishali_nagar", "Vaishali Nagar", 75.7350, 26.9470, 70.0);
pub const MALVIYA_NAGAR: Location =
    Location::new("malviya_nagar", "Malviya Nagar", 75.8130, 26.8540, 68.0);
pub const C_SCHEME: Location = Location::new("c_scheme", "C-Scheme", 75.8050, 26.9100, 72.0);
pub const BAPU_BAZAAR: Location = Location::new("bapu_bazaar", "Bapu Bazaar", 75.8220, 26.9200, 90.0);

pub const ALL: &[Location] = &[
    HAWA_MAHAL,
    CITY_PALACE,
    JANTAR_MANTAR,
    AMER_FORT,
    RAJA_PARK,
    MANSAROVAR,
    VAISHALI_NAGAR,
    MALVIYA_NAGAR,
    C_SCHEME,
    BAPU_BAZAAR,
];
