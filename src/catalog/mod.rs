//! The location data set challenges are drawn from.
//!
//! The data set is a JSON object that maps a country code to the list of location
//! records available in that country.

use std::collections::BTreeMap;
use std::fs;

use log::debug;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::location::{AcquisitionParams, PanoramaLocation};

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("IO Error: {0}")]
    IOError(String),
    #[error("Failed to parse location data: {0}")]
    JsonError(String),
    #[error("Catalog contains no countries")]
    Empty,
    #[error("Unknown country: {0}")]
    UnknownCountry(String),
    #[error("Country {country} has {available} locations, {requested} requested")]
    NotEnoughLocations {
        country: String,
        available: usize,
        requested: usize,
    },
    #[error("No country has at least {0} locations")]
    NoEligibleCountry(usize),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::JsonError(err.to_string())
    }
}

/// Number of locations sharing a country in an impostor challenge.
pub const IMPOSTOR_MAINS: usize = 3;

/// Three locations of one country plus one from elsewhere, in shuffled order.
#[derive(Debug, Clone)]
pub struct ImpostorChallenge {
    pub locations: Vec<PanoramaLocation>,
    /// Zero-based position of the impostor in `locations`.
    pub impostor_index: usize,
    pub main_country: String,
    pub impostor_country: String,
}

impl ImpostorChallenge {
    /// Checks a guess; `position` is one-based, as shown to players.
    pub fn is_solved_by(&self, main_country: &str, impostor_country: &str, position: usize) -> bool {
        main_country.eq_ignore_ascii_case(&self.main_country)
            && impostor_country.eq_ignore_ascii_case(&self.impostor_country)
            && position == self.impostor_index + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    countries: BTreeMap<String, Vec<PanoramaLocation>>,
    params: AcquisitionParams,
}

impl LocationCatalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let countries: BTreeMap<String, Vec<PanoramaLocation>> = serde_json::from_str(json)?;
        debug!("Loaded location catalog with {} countries", countries.len());
        Ok(Self {
            countries,
            params: AcquisitionParams::default(),
        })
    }

    pub fn load(path: &str) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Acquisition parameters attached to every location handed out.
    pub fn with_params(mut self, params: AcquisitionParams) -> Self {
        self.params = params;
        self
    }

    /// All country codes, sorted.
    pub fn countries(&self) -> Vec<&str> {
        self.countries.keys().map(String::as_str).collect()
    }

    pub fn locations(&self, code: &str) -> Option<&[PanoramaLocation]> {
        self.countries.get(code).map(Vec::as_slice)
    }

    /// Resolves a country display name (case-insensitive) to its code.
    pub fn code_for_name(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.countries
            .iter()
            .find(|(_, locations)| {
                locations
                    .first()
                    .is_some_and(|l| l.country_name.to_lowercase() == name)
            })
            .map(|(code, _)| code.as_str())
    }

    pub fn random_country<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str, CatalogError> {
        let codes = self.countries();
        codes.choose(rng).copied().ok_or(CatalogError::Empty)
    }

    /// Picks `amount` distinct locations of country `code`.
    pub fn locations_in<R: Rng + ?Sized>(
        &self,
        code: &str,
        rng: &mut R,
        amount: usize,
    ) -> Result<Vec<PanoramaLocation>, CatalogError> {
        let available = self
            .countries
            .get(code)
            .ok_or_else(|| CatalogError::UnknownCountry(code.to_string()))?;
        if available.len() < amount {
            return Err(CatalogError::NotEnoughLocations {
                country: code.to_string(),
                available: available.len(),
                requested: amount,
            });
        }

        Ok(rand::seq::index::sample(rng, available.len(), amount)
            .into_iter()
            .map(|i| available[i].clone().with_params(self.params.clone()))
            .collect())
    }

    /// Picks a random country, then `amount` distinct locations from it.
    pub fn random_locations<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        amount: usize,
    ) -> Result<Vec<PanoramaLocation>, CatalogError> {
        let code = self.random_country(rng)?.to_string();
        self.locations_in(&code, rng, amount)
    }

    /// Draws an impostor challenge: [`IMPOSTOR_MAINS`] locations of a random country
    /// and one impostor, placed at a random position.
    ///
    /// The impostor comes from another country whenever the catalog has one; otherwise
    /// it is a further location of the main country. It is never one of the mains.
    pub fn impostor_challenge<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<ImpostorChallenge, CatalogError> {
        let eligible: Vec<&str> = self
            .countries
            .iter()
            .filter(|(_, locations)| locations.len() >= IMPOSTOR_MAINS)
            .map(|(code, _)| code.as_str())
            .collect();
        let main_country = eligible
            .choose(rng)
            .copied()
            .ok_or(CatalogError::NoEligibleCountry(IMPOSTOR_MAINS))?;
        let mut locations = self.locations_in(main_country, rng, IMPOSTOR_MAINS)?;
        locations.shuffle(rng);

        let others: Vec<&str> = self
            .countries
            .iter()
            .filter(|(code, locations)| code.as_str() != main_country && !locations.is_empty())
            .map(|(code, _)| code.as_str())
            .collect();
        let (impostor_country, impostor) = match others.choose(rng) {
            Some(&code) => (code, self.locations_in(code, rng, 1)?.pop()),
            None => {
                let spare: Vec<&PanoramaLocation> = self.countries[main_country]
                    .iter()
                    .filter(|candidate| locations.iter().all(|l| l.pano_id != candidate.pano_id))
                    .collect();
                let impostor = spare
                    .choose(rng)
                    .map(|&l| l.clone().with_params(self.params.clone()));
                (main_country, impostor)
            }
        };
        let impostor = impostor.ok_or_else(|| CatalogError::NotEnoughLocations {
            country: impostor_country.to_string(),
            available: self.countries[impostor_country].len(),
            requested: IMPOSTOR_MAINS + 1,
        })?;

        let impostor_index = rng.random_range(0..=locations.len());
        locations.insert(impostor_index, impostor);
        debug!(
            "Impostor challenge: {} x{} with impostor from {} at {}",
            main_country, IMPOSTOR_MAINS, impostor_country, impostor_index
        );

        Ok(ImpostorChallenge {
            locations,
            impostor_index,
            main_country: main_country.to_string(),
            impostor_country: impostor_country.to_string(),
        })
    }
}
