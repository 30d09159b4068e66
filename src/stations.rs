/// Station registry for the feeding-station monitoring service.
///
/// Stations are seeded at start, either generated from the built-in city
/// registry (a fixed number of stations per city) or loaded from a JSON seed
/// file. This module also holds the read-only views the UI layer needs:
/// status summaries, per-city filtering and the list of cities.

use std::path::Path;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::model::{AnimalType, GeoPoint, Station, StationSeed, StationStatus};

// ---------------------------------------------------------------------------
// City metadata
// ---------------------------------------------------------------------------

/// A city hosting feeding stations, with its approximate centre.
pub struct City {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// The 81 provinces hosting feeding stations, in licence-plate order
/// (index = plate code - 1). The index is part of each generated station
/// id (`st_<city index>_<n>`), so entries are never reordered.
pub static CITY_REGISTRY: &[City] = &[
    City { name: "Adana", latitude: 37.00167, longitude: 35.32889 },
    City { name: "Adıyaman", latitude: 37.76389, longitude: 38.27778 },
    City { name: "Afyonkarahisar", latitude: 38.75694, longitude: 30.54333 },
    City { name: "Ağrı", latitude: 39.7225, longitude: 43.05306 },
    City { name: "Amasya", latitude: 40.65, longitude: 35.83333 },
    City { name: "Ankara", latitude: 39.93333, longitude: 32.85 },
    City { name: "Antalya", latitude: 36.90812, longitude: 30.69556 },
    City { name: "Artvin", latitude: 41.18194, longitude: 41.82083 },
    City { name: "Aydın", latitude: 37.845, longitude: 27.83917 },
    City { name: "Balıkesir", latitude: 39.64833, longitude: 27.88278 },
    City { name: "Bilecik", latitude: 40.1425, longitude: 29.97944 },
    City { name: "Bingöl", latitude: 38.88472, longitude: 40.49389 },
    City { name: "Bitlis", latitude: 38.4, longitude: 42.10833 },
    City { name: "Bolu", latitude: 40.735, longitude: 31.60611 },
    City { name: "Burdur", latitude: 37.72028, longitude: 30.29083 },
    City { name: "Bursa", latitude: 40.18333, longitude: 29.06667 },
    City { name: "Çanakkale", latitude: 40.15528, longitude: 26.41417 },
    City { name: "Çankırı", latitude: 40.6, longitude: 33.61528 },
    City { name: "Çorum", latitude: 40.55056, longitude: 34.95556 },
    City { name: "Denizli", latitude: 37.77667, longitude: 29.08639 },
    City { name: "Diyarbakır", latitude: 37.91, longitude: 40.24 },
    City { name: "Edirne", latitude: 41.67719, longitude: 26.55944 },
    City { name: "Elazığ", latitude: 38.67472, longitude: 39.22306 },
    City { name: "Erzincan", latitude: 39.75, longitude: 39.5 },
    City { name: "Erzurum", latitude: 39.90861, longitude: 41.27694 },
    City { name: "Eskişehir", latitude: 39.77667, longitude: 30.52056 },
    City { name: "Gaziantep", latitude: 37.06667, longitude: 37.38333 },
    City { name: "Giresun", latitude: 40.9175, longitude: 38.38778 },
    City { name: "Gümüşhane", latitude: 40.46083, longitude: 39.48167 },
    City { name: "Hakkari", latitude: 37.57444, longitude: 43.74083 },
    City { name: "Hatay", latitude: 36.2025, longitude: 36.16056 },
    City { name: "Isparta", latitude: 37.76472, longitude: 30.55667 },
    City { name: "Mersin", latitude: 36.8121, longitude: 34.6415 },
    City { name: "İstanbul", latitude: 41.0082, longitude: 28.9784 },
    City { name: "İzmir", latitude: 38.4127, longitude: 27.1384 },
    City { name: "Kars", latitude: 40.60194, longitude: 43.0975 },
    City { name: "Kastamonu", latitude: 41.37806, longitude: 33.77528 },
    City { name: "Kayseri", latitude: 38.73122, longitude: 35.47873 },
    City { name: "Kırklareli", latitude: 41.735, longitude: 27.225 },
    City { name: "Kırşehir", latitude: 39.14583, longitude: 34.16389 },
    City { name: "Kocaeli", latitude: 40.85333, longitude: 29.88139 },
    City { name: "Konya", latitude: 37.86667, longitude: 32.48333 },
    City { name: "Kütahya", latitude: 39.42417, longitude: 29.98333 },
    City { name: "Malatya", latitude: 38.35528, longitude: 38.30944 },
    City { name: "Manisa", latitude: 38.6191, longitude: 27.4289 },
    City { name: "Kahramanmaraş", latitude: 37.58583, longitude: 36.93722 },
    City { name: "Mardin", latitude: 37.31306, longitude: 40.735 },
    City { name: "Muğla", latitude: 37.21806, longitude: 28.36667 },
    City { name: "Muş", latitude: 38.73444, longitude: 41.49111 },
    City { name: "Nevşehir", latitude: 38.62444, longitude: 34.71444 },
    City { name: "Niğde", latitude: 37.96667, longitude: 34.68333 },
    City { name: "Ordu", latitude: 40.98611, longitude: 37.87972 },
    City { name: "Rize", latitude: 41.02083, longitude: 40.52389 },
    City { name: "Sakarya", latitude: 40.75694, longitude: 30.37833 },
    City { name: "Samsun", latitude: 41.29278, longitude: 36.33139 },
    City { name: "Siirt", latitude: 37.93333, longitude: 41.95 },
    City { name: "Sinop", latitude: 42.02667, longitude: 35.15111 },
    City { name: "Sivas", latitude: 39.75, longitude: 37.01667 },
    City { name: "Tekirdağ", latitude: 40.97806, longitude: 27.51167 },
    City { name: "Tokat", latitude: 40.31667, longitude: 36.55 },
    City { name: "Trabzon", latitude: 41.005, longitude: 39.72694 },
    City { name: "Tunceli", latitude: 39.10833, longitude: 39.54722 },
    City { name: "Şanlıurfa", latitude: 37.15833, longitude: 38.79167 },
    City { name: "Uşak", latitude: 38.67417, longitude: 29.40583 },
    City { name: "Van", latitude: 38.5, longitude: 43.38333 },
    City { name: "Yozgat", latitude: 39.81806, longitude: 34.81472 },
    City { name: "Zonguldak", latitude: 41.45056, longitude: 31.79 },
    City { name: "Aksaray", latitude: 38.36861, longitude: 34.03694 },
    City { name: "Bayburt", latitude: 40.25528, longitude: 40.22472 },
    City { name: "Karaman", latitude: 37.17583, longitude: 33.22139 },
    City { name: "Kırıkkale", latitude: 39.84167, longitude: 33.50639 },
    City { name: "Batman", latitude: 37.88111, longitude: 41.13028 },
    City { name: "Şırnak", latitude: 37.51639, longitude: 42.45944 },
    City { name: "Bartın", latitude: 41.63583, longitude: 32.3375 },
    City { name: "Ardahan", latitude: 41.11056, longitude: 42.70222 },
    City { name: "Iğdır", latitude: 39.92361, longitude: 44.045 },
    City { name: "Yalova", latitude: 40.655, longitude: 29.27694 },
    City { name: "Karabük", latitude: 41.2, longitude: 32.63333 },
    City { name: "Kilis", latitude: 36.71611, longitude: 37.115 },
    City { name: "Osmaniye", latitude: 37.07417, longitude: 36.24722 },
    City { name: "Düzce", latitude: 40.83889, longitude: 31.16389 },
];

/// Maximum offset (degrees) of a generated station from its city centre.
const LOCATION_JITTER_DEG: f64 = 0.05;

/// Looks up a city by name. Returns `None` if not found.
pub fn find_city(name: &str) -> Option<&'static City> {
    CITY_REGISTRY.iter().find(|c| c.name == name)
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Errors that can arise when loading a station seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate station id '{0}' in seed data")]
    DuplicateId(String),
}

/// Generates `per_city` seed records for every registry city, with random
/// fill levels in [0, 100], random animal type and a small location jitter.
pub fn generate_seeds(per_city: usize, rng: &mut impl Rng) -> Vec<StationSeed> {
    let mut seeds = Vec::with_capacity(CITY_REGISTRY.len() * per_city);

    for (city_idx, city) in CITY_REGISTRY.iter().enumerate() {
        for n in 1..=per_city {
            let animal = if rng.gen_bool(0.5) { AnimalType::Cat } else { AnimalType::Dog };
            seeds.push(StationSeed {
                id: format!("st_{}_{}", city_idx, n),
                name: format!("{} - {}. Pati Noktası", city.name, n),
                city: city.name.to_string(),
                location: GeoPoint {
                    latitude: city.latitude + rng.gen_range(-LOCATION_JITTER_DEG..LOCATION_JITTER_DEG),
                    longitude: city.longitude + rng.gen_range(-LOCATION_JITTER_DEG..LOCATION_JITTER_DEG),
                },
                address: format!("{} Merkez, No:{}", city.name, n * 5),
                fill_level: rng.gen_range(0..=100),
                animal,
            });
        }
    }

    seeds
}

/// Parses a JSON array of seed records.
pub fn parse_seeds(json: &str, origin: &str) -> Result<Vec<StationSeed>, SeedError> {
    let seeds: Vec<StationSeed> = serde_json::from_str(json).map_err(|source| SeedError::Parse {
        path: origin.to_string(),
        source,
    })?;

    let mut seen = std::collections::HashSet::new();
    for seed in &seeds {
        if !seen.insert(seed.id.as_str()) {
            return Err(SeedError::DuplicateId(seed.id.clone()));
        }
    }

    Ok(seeds)
}

/// Reads a JSON seed file.
pub fn load_seed_file(path: &Path) -> Result<Vec<StationSeed>, SeedError> {
    let display = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: display.clone(),
        source,
    })?;
    parse_seeds(&json, &display)
}

/// Turns seed records into live stations.
pub fn build_stations(seeds: Vec<StationSeed>, now: DateTime<Utc>) -> Vec<Station> {
    seeds.into_iter().map(|seed| Station::from_seed(seed, now)).collect()
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Station counts per status, as shown above the station list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub full: usize,
    pub decreasing: usize,
    pub critical: usize,
}

pub fn summarize(stations: &[Station]) -> StatusSummary {
    stations.iter().fold(StatusSummary::default(), |mut acc, s| {
        acc.total += 1;
        match s.status() {
            StationStatus::Green => acc.full += 1,
            StationStatus::Yellow => acc.decreasing += 1,
            StationStatus::Red => acc.critical += 1,
        }
        acc
    })
}

/// Stations located in `city`.
pub fn in_city<'a>(stations: &'a [Station], city: &str) -> Vec<&'a Station> {
    stations.iter().filter(|s| s.city == city).collect()
}

/// Distinct city names present in the collection, sorted.
pub fn cities(stations: &[Station]) -> Vec<String> {
    let mut names: Vec<String> = stations.iter().map(|s| s.city.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Looks up a station by id. Returns `None` if not found.
pub fn find_station<'a>(stations: &'a [Station], id: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::thresholds::classify;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn generated(per_city: usize) -> Vec<Station> {
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        build_stations(generate_seeds(per_city, &mut rng), fixed_now())
    }

    #[test]
    fn test_no_duplicate_city_names() {
        let mut seen = std::collections::HashSet::new();
        for city in CITY_REGISTRY {
            assert!(seen.insert(city.name), "duplicate city '{}' in CITY_REGISTRY", city.name);
        }
    }

    #[test]
    fn test_registry_covers_all_provinces_in_id_order() {
        assert_eq!(CITY_REGISTRY.len(), 81);
        assert_eq!(CITY_REGISTRY[0].name, "Adana");
        assert_eq!(CITY_REGISTRY[80].name, "Düzce");

        let istanbul = CITY_REGISTRY.iter().position(|c| c.name == "İstanbul");
        assert_eq!(istanbul, Some(33));
        assert!(find_city("İstanbul").is_some());
    }

    #[test]
    fn test_generated_ids_follow_city_index() {
        let stations = generated(3);
        let s = find_station(&stations, "st_33_2").unwrap();
        assert_eq!(s.city, "İstanbul");
        assert_eq!(s.name, "İstanbul - 2. Pati Noktası");
        assert_eq!(s.address, "İstanbul Merkez, No:10");
    }

    #[test]
    fn test_city_coordinates_are_within_turkey() {
        for city in CITY_REGISTRY {
            assert!((35.0..43.0).contains(&city.latitude), "latitude of '{}'", city.name);
            assert!((25.0..45.0).contains(&city.longitude), "longitude of '{}'", city.name);
        }
    }

    #[test]
    fn test_generate_creates_per_city_stations_with_unique_ids() {
        let stations = generated(3);
        assert_eq!(stations.len(), CITY_REGISTRY.len() * 3);

        let mut seen = std::collections::HashSet::new();
        for s in &stations {
            assert!(seen.insert(s.id.clone()), "duplicate id {}", s.id);
        }
    }

    #[test]
    fn test_generated_stations_satisfy_status_invariant() {
        for s in generated(3) {
            assert!(s.fill_level() <= 100);
            assert_eq!(s.status(), classify(i32::from(s.fill_level())));
        }
    }

    #[test]
    fn test_generated_stations_are_near_their_city() {
        for s in generated(2) {
            let city = find_city(&s.city).expect("generated station should reference a registry city");
            assert!((s.location.latitude - city.latitude).abs() <= LOCATION_JITTER_DEG);
            assert!((s.location.longitude - city.longitude).abs() <= LOCATION_JITTER_DEG);
        }
    }

    #[test]
    fn test_generation_is_reproducible_for_a_seed() {
        let a = generate_seeds(2, &mut Pcg64Mcg::seed_from_u64(5));
        let b = generate_seeds(2, &mut Pcg64Mcg::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_seeds_clamps_and_derives_status() {
        let json = r#"[
            {"id": "x1", "name": "Kadıköy", "city": "İstanbul",
             "location": {"latitude": 40.99, "longitude": 29.03},
             "fill_level": 130, "animal": "Cat"},
            {"id": "x2", "name": "Bornova", "city": "İzmir",
             "location": {"latitude": 38.46, "longitude": 27.22},
             "fill_level": 12, "animal": "Dog", "address": "Bornova Park"}
        ]"#;
        let stations = build_stations(parse_seeds(json, "inline").unwrap(), fixed_now());
        assert_eq!(stations[0].fill_level(), 100);
        assert_eq!(stations[0].address, "");
        assert_eq!(stations[1].status(), StationStatus::Red);
        assert_eq!(stations[1].address, "Bornova Park");
    }

    #[test]
    fn test_parse_seeds_rejects_duplicate_ids() {
        let json = r#"[
            {"id": "dup", "name": "A", "city": "Van", "location": {"latitude": 38.5, "longitude": 43.4}, "fill_level": 50, "animal": "Cat"},
            {"id": "dup", "name": "B", "city": "Van", "location": {"latitude": 38.5, "longitude": 43.4}, "fill_level": 60, "animal": "Dog"}
        ]"#;
        assert!(matches!(parse_seeds(json, "inline"), Err(SeedError::DuplicateId(id)) if id == "dup"));
    }

    #[test]
    fn test_parse_seeds_reports_malformed_json() {
        assert!(matches!(parse_seeds("not json", "inline"), Err(SeedError::Parse { .. })));
    }

    #[test]
    fn test_load_seed_file_reports_missing_file() {
        let result = load_seed_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(SeedError::Io { .. })));
    }

    #[test]
    fn test_summarize_counts_each_status() {
        let seeds = vec![95, 70, 69, 20, 19, 0]
            .into_iter()
            .enumerate()
            .map(|(i, lvl)| StationSeed {
                id: format!("s{}", i),
                name: format!("S{}", i),
                city: if i % 2 == 0 { "Van".to_string() } else { "Konya".to_string() },
                location: GeoPoint { latitude: 38.0, longitude: 33.0 },
                address: String::new(),
                fill_level: lvl,
                animal: AnimalType::Cat,
            })
            .collect();
        let stations = build_stations(seeds, fixed_now());

        assert_eq!(
            summarize(&stations),
            StatusSummary { total: 6, full: 2, decreasing: 2, critical: 2 }
        );
        assert_eq!(in_city(&stations, "Van").len(), 3);
        assert_eq!(cities(&stations), vec!["Konya".to_string(), "Van".to_string()]);
        assert!(find_station(&stations, "s3").is_some());
        assert!(find_station(&stations, "nope").is_none());
    }
}
