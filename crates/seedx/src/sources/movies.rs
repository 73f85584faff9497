//! 🎬 The movie factory. Directors, genres, years and ratings, drawn with
//! replacement from small fixed pools. None of it means anything. All of it
//! looks plausible on a dashboard, which is the entire job.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::common::{GeoPoint, Record};
use crate::errors::SeedError;

pub(crate) const GENRES: [&str; 8] = [
    "Acción",
    "Romance",
    "Suspenso",
    "Comedia",
    "Ciencia Ficción",
    "Drama",
    "Fantasía",
    "Terror",
];

pub(crate) const DIRECTORS: [&str; 10] = [
    "Juan Pérez",
    "María López",
    "Carlos Sánchez",
    "Ana Martínez",
    "Luis García",
    "Laura Rodríguez",
    "Jorge Ramírez",
    "Elena Torres",
    "Andrés Gómez",
    "Sofía Castro",
];

/// 📍 A candidate city: the name goes in `ciudad`, the point in `ubicacion`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct City {
    pub(crate) name: &'static str,
    pub(crate) location: GeoPoint,
}

pub(crate) const CITIES: [City; 8] = [
    City { name: "Madrid", location: GeoPoint { lat: 40.4168, lon: -3.7038 } },
    City { name: "Barcelona", location: GeoPoint { lat: 41.3874, lon: 2.1686 } },
    City { name: "Ciudad de México", location: GeoPoint { lat: 19.4326, lon: -99.1332 } },
    City { name: "Buenos Aires", location: GeoPoint { lat: -34.6037, lon: -58.3816 } },
    City { name: "Bogotá", location: GeoPoint { lat: 4.7110, lon: -74.0721 } },
    City { name: "Lima", location: GeoPoint { lat: -12.0464, lon: -77.0428 } },
    City { name: "Santiago", location: GeoPoint { lat: -33.4489, lon: -70.6693 } },
    City { name: "Montevideo", location: GeoPoint { lat: -34.9011, lon: -56.1645 } },
];

const FIRST_YEAR: i32 = 1990;
const LAST_YEAR: i32 = 2022;
const MIN_RATING: f64 = 5.0;
const MAX_RATING: f64 = 10.0;
const MIN_VOTES: u32 = 50;
const MAX_VOTES: u32 = 1000;
// -- fecha_ingreso lands somewhere in the year before the run started
const INGEST_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

/// 🎬 One movie, shaped exactly like the movie schema (plus geo when enabled).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Movie {
    pub(crate) titulo: String,
    pub(crate) director: String,
    pub(crate) genero: String,
    pub(crate) anio: i32,
    pub(crate) calificacion: f64,
    pub(crate) votos: u32,
    pub(crate) fecha_ingreso: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ciudad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ubicacion: Option<GeoPoint>,
}

impl Movie {
    pub(crate) fn into_record(self) -> Result<Record, SeedError> {
        Record::from_document(&self)
    }
}

/// 🎲 Rolls the dice for every field except the title.
///
/// Unseeded by default, so two runs produce two different catalogues. Hand
/// it a seed and it becomes boringly reproducible, which tests adore.
#[derive(Debug)]
pub(crate) struct MovieGenerator {
    rng: StdRng,
    geo: bool,
    started_at: DateTime<Utc>,
}

impl MovieGenerator {
    pub(crate) fn new(rng_seed: Option<u64>, geo: bool) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            geo,
            started_at: Utc::now(),
        }
    }

    // -- pools are non-empty consts, so indexing by a ranged roll cannot miss
    fn pick<T: Copy, const N: usize>(&mut self, pool: &[T; N]) -> T {
        pool[self.rng.random_range(0..N)]
    }

    pub(crate) fn movie(&mut self, titulo: String) -> Movie {
        let director = self.pick(&DIRECTORS).to_string();
        let genero = self.pick(&GENRES).to_string();
        let anio = self.rng.random_range(FIRST_YEAR..=LAST_YEAR);
        let calificacion = (self.rng.random_range(MIN_RATING..=MAX_RATING) * 10.0).round() / 10.0;
        let votos = self.rng.random_range(MIN_VOTES..=MAX_VOTES);
        let age = chrono::Duration::seconds(self.rng.random_range(0..=INGEST_WINDOW_SECS));
        let fecha_ingreso = (self.started_at - age).to_rfc3339_opts(SecondsFormat::Secs, true);

        let (ciudad, ubicacion) = if self.geo {
            let city = self.pick(&CITIES);
            (Some(city.name.to_string()), Some(city.location))
        } else {
            (None, None)
        };

        Movie {
            titulo,
            director,
            genero,
            anio,
            calificacion,
            votos,
            fecha_ingreso,
            ciudad,
            ubicacion,
        }
    }

    /// 🏭 Turn a list of titles into records, one movie per title.
    pub(crate) fn records_for(
        &mut self,
        titles: impl IntoIterator<Item = String>,
    ) -> Result<Vec<Record>, SeedError> {
        titles
            .into_iter()
            .map(|titulo| self.movie(titulo).into_record())
            .collect()
    }
}
