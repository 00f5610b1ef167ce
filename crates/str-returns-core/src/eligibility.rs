//! Residence-permit purchase eligibility.
//!
//! Foreign residents may only buy second homes in designated zones. The
//! check is a filter applied before a simulation: it never feeds the return
//! formulas, it only produces an advisory on the simulation envelope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StrReturnsError;

/// Residence status of the buyer. Serialized as its display name and
/// parsed through `FromStr`, so JSON accepts the same spellings as the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResidencePermit {
    /// Residence permit B
    B,
    /// Settlement permit C
    C,
    /// Swiss citizen
    Swiss,
}

/// Location of the apartment. Unlisted places are kept by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    Interlaken,
    Zermatt,
    Verbier,
    Grindelwald,
    Lugano,
    Zurich,
    Lucerne,
    Other(String),
}

/// Designated tourist zones open to permit B holders.
const TOURIST_ZONES: [Zone; 4] = [
    Zone::Interlaken,
    Zone::Zermatt,
    Zone::Verbier,
    Zone::Grindelwald,
];

/// Additional zones open to permit C holders.
const SETTLED_ZONES: [Zone; 3] = [Zone::Lugano, Zone::Zurich, Zone::Lucerne];

/// A permit + zone pair attached to a simulation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub permit: ResidencePermit,
    pub zone: Zone,
}

/// Outcome of a zone check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneEligibility {
    pub permit: ResidencePermit,
    pub zone: Zone,
    pub allowed: bool,
    /// Explanation when the purchase is not allowed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Zones in which a buyer holding `permit` may purchase.
///
/// Swiss citizens are unrestricted; the listed zones are the ones the
/// input form offers, `check_zone` accepts any zone for them.
pub fn allowed_zones(permit: ResidencePermit) -> Vec<Zone> {
    match permit {
        ResidencePermit::B => TOURIST_ZONES.to_vec(),
        ResidencePermit::C | ResidencePermit::Swiss => TOURIST_ZONES
            .iter()
            .chain(SETTLED_ZONES.iter())
            .cloned()
            .collect(),
    }
}

pub fn check_zone(permit: ResidencePermit, zone: &Zone) -> ZoneEligibility {
    let allowed = match permit {
        ResidencePermit::Swiss => true,
        _ => allowed_zones(permit).contains(zone),
    };

    let reason = if allowed {
        None
    } else {
        Some(match permit {
            ResidencePermit::B => format!(
                "With a B permit you can only buy in the tourist zones designated by Swiss law; {zone} is not one of them"
            ),
            _ => format!("Permit {permit} holders cannot buy a second home in {zone}"),
        })
    };

    ZoneEligibility {
        permit,
        zone: zone.clone(),
        allowed,
        reason,
    }
}

impl fmt::Display for ResidencePermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResidencePermit::B => write!(f, "B"),
            ResidencePermit::C => write!(f, "C"),
            ResidencePermit::Swiss => write!(f, "Swiss"),
        }
    }
}

impl FromStr for ResidencePermit {
    type Err = StrReturnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" => Ok(ResidencePermit::B),
            "c" => Ok(ResidencePermit::C),
            "swiss" | "ch" | "citizen" => Ok(ResidencePermit::Swiss),
            other => Err(StrReturnsError::InvalidInput {
                field: "permit".into(),
                reason: format!("Unknown residence permit '{other}' (expected B, C or Swiss)"),
            }),
        }
    }
}

impl TryFrom<String> for ResidencePermit {
    type Error = StrReturnsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ResidencePermit> for String {
    fn from(permit: ResidencePermit) -> Self {
        permit.to_string()
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Interlaken => write!(f, "Interlaken"),
            Zone::Zermatt => write!(f, "Zermatt"),
            Zone::Verbier => write!(f, "Verbier"),
            Zone::Grindelwald => write!(f, "Grindelwald"),
            Zone::Lugano => write!(f, "Lugano"),
            Zone::Zurich => write!(f, "Zurich"),
            Zone::Lucerne => write!(f, "Lucerne"),
            Zone::Other(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Zone {
    type Err = StrReturnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(StrReturnsError::InvalidInput {
                field: "zone".into(),
                reason: "Zone name cannot be empty".into(),
            });
        }
        Ok(match name.to_lowercase().as_str() {
            "interlaken" => Zone::Interlaken,
            "zermatt" => Zone::Zermatt,
            "verbier" => Zone::Verbier,
            "grindelwald" => Zone::Grindelwald,
            "lugano" => Zone::Lugano,
            "zurich" | "zürich" => Zone::Zurich,
            "lucerne" | "luzern" | "lucerna" => Zone::Lucerne,
            _ => Zone::Other(name.to_string()),
        })
    }
}

impl TryFrom<String> for Zone {
    type Error = StrReturnsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permit_b_tourist_zones_only() {
        let zones = allowed_zones(ResidencePermit::B);
        assert_eq!(zones.len(), 4);
        assert!(check_zone(ResidencePermit::B, &Zone::Zermatt).allowed);

        let zurich = check_zone(ResidencePermit::B, &Zone::Zurich);
        assert!(!zurich.allowed);
        assert!(zurich.reason.unwrap().contains("tourist zones"));
    }

    #[test]
    fn test_permit_c_adds_cities() {
        assert_eq!(allowed_zones(ResidencePermit::C).len(), 7);
        assert!(check_zone(ResidencePermit::C, &Zone::Lucerne).allowed);
        assert!(!check_zone(ResidencePermit::C, &Zone::Other("Basel".into())).allowed);
    }

    #[test]
    fn test_swiss_anywhere() {
        let basel = check_zone(ResidencePermit::Swiss, &Zone::Other("Basel".into()));
        assert!(basel.allowed);
        assert!(basel.reason.is_none());
    }

    #[test]
    fn test_parse_permit_and_zone() {
        assert_eq!("b".parse::<ResidencePermit>().unwrap(), ResidencePermit::B);
        assert_eq!("Swiss".parse::<ResidencePermit>().unwrap(), ResidencePermit::Swiss);
        assert!("L".parse::<ResidencePermit>().is_err());

        assert_eq!("Zürich".parse::<Zone>().unwrap(), Zone::Zurich);
        assert_eq!("Lucerna".parse::<Zone>().unwrap(), Zone::Lucerne);
        assert_eq!("Davos".parse::<Zone>().unwrap(), Zone::Other("Davos".into()));
        assert!("  ".parse::<Zone>().is_err());
    }

    #[test]
    fn test_location_json_uses_zone_aliases() {
        let loc: Location =
            serde_json::from_str(r#"{"permit": "c", "zone": "Zürich"}"#).unwrap();
        assert_eq!(loc.permit, ResidencePermit::C);
        assert_eq!(loc.zone, Zone::Zurich);
        assert!(check_zone(loc.permit, &loc.zone).allowed);

        let loc: Location =
            serde_json::from_str(r#"{"permit": "B", "zone": "Lucerna"}"#).unwrap();
        assert_eq!(loc.zone, Zone::Lucerne);
    }

    #[test]
    fn test_zone_json_is_plain_name() {
        let json = serde_json::to_value(Zone::Other("Davos".into())).unwrap();
        assert_eq!(json, serde_json::json!("Davos"));
        assert_eq!(serde_json::to_value(Zone::Zurich).unwrap(), serde_json::json!("Zurich"));
        assert_eq!(serde_json::from_value::<Zone>(json).unwrap(), Zone::Other("Davos".into()));
    }

    #[test]
    fn test_location_json_rejects_unknown_permit() {
        let err = serde_json::from_str::<Location>(r#"{"permit": "L", "zone": "Zermatt"}"#);
        assert!(err.is_err());
        assert!(serde_json::from_str::<Location>(r#"{"permit": "B", "zone": " "}"#).is_err());
    }
}
