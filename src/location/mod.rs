//! Location provider adapter.
//!
//! The mobile app resolves a fix through the OS location service behind a
//! permission prompt. The CLI analogue reads coordinates from the
//! environment (`SCRIIM_LAT` / `SCRIIM_LON`, handy with a `.env` file) or
//! from the config file. Either way the dispatcher only ever sees a
//! `LocationState`: a fix, or an error message explaining its absence.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Environment variable holding the latitude in decimal degrees
const ENV_LAT: &str = "SCRIIM_LAT";

/// Environment variable holding the longitude in decimal degrees
const ENV_LON: &str = "SCRIIM_LON";

/// A resolved coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    /// Both coordinates must be finite degrees for a fix to be usable
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Shareable Google Maps link for this fix
    pub fn maps_link(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// What the caller knows about the current location.
#[derive(Debug, Clone, Default)]
pub struct LocationState {
    pub fix: Option<LocationFix>,
    pub error: Option<String>,
}

impl LocationState {
    fn available(fix: LocationFix) -> Self {
        Self {
            fix: Some(fix),
            error: None,
        }
    }

    fn unavailable(error: &str) -> Self {
        Self {
            fix: None,
            error: Some(error.to_string()),
        }
    }
}

fn env_coord(var: &str) -> Option<f64> {
    std::env::var(var).ok()?.trim().parse().ok()
}

/// Resolve the current location from the environment, falling back to the
/// config file. Non-finite coordinates are rejected rather than passed on.
pub fn resolve(config: &Config) -> LocationState {
    let fix = match (env_coord(ENV_LAT), env_coord(ENV_LON)) {
        (Some(latitude), Some(longitude)) => Some(LocationFix {
            latitude,
            longitude,
        }),
        _ => match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => Some(LocationFix {
                latitude,
                longitude,
            }),
            _ => None,
        },
    };

    match fix {
        Some(fix) if fix.is_finite() => LocationState::available(fix),
        Some(_) => LocationState::unavailable("Configured coordinates are not finite numbers"),
        None => LocationState::unavailable(
            "Location is not configured. Set SCRIIM_LAT/SCRIIM_LON or add coordinates to the config file.",
        ),
    }
}
