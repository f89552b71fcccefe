#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! police.uk wire types, crime category taxonomy, and the cleaned crime
//! row schema.
//!
//! The `data.police.uk` API returns street-level crimes as [`StreetCrime`]
//! records. The pipeline cleans those into [`CrimeRow`] values whose flat
//! column layout is described by [`CRIME_ROW_COLUMNS`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Street-level crime categories published by police.uk.
///
/// Serialized as the API's kebab-case slugs (e.g. `"anti-social-behaviour"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CrimeCategory {
    /// Personal, environmental and nuisance anti-social behaviour
    AntiSocialBehaviour,
    /// Theft of or from a bicycle
    BicycleTheft,
    /// Residential and business burglary
    Burglary,
    /// Criminal damage and arson
    CriminalDamageArson,
    /// Possession and trafficking of controlled drugs
    Drugs,
    /// Theft not covered by the more specific theft categories
    OtherTheft,
    /// Possession of a weapon such as a firearm or knife
    PossessionOfWeapons,
    /// Offences which cause fear, alarm or distress
    PublicOrder,
    /// Taking property by force or threat
    Robbery,
    /// Theft from shops or stalls
    Shoplifting,
    /// Theft directly from a person without force
    TheftFromThePerson,
    /// Theft of or from a vehicle, and interference with a vehicle
    VehicleCrime,
    /// Violence and sexual offences
    ViolentCrime,
    /// Offences not fitting any other category
    OtherCrime,
}

impl CrimeCategory {
    /// Returns the name police.uk publishes for this category.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AntiSocialBehaviour => "Anti-social behaviour",
            Self::BicycleTheft => "Bicycle theft",
            Self::Burglary => "Burglary",
            Self::CriminalDamageArson => "Criminal damage and arson",
            Self::Drugs => "Drugs",
            Self::OtherTheft => "Other theft",
            Self::PossessionOfWeapons => "Possession of weapons",
            Self::PublicOrder => "Public order",
            Self::Robbery => "Robbery",
            Self::Shoplifting => "Shoplifting",
            Self::TheftFromThePerson => "Theft from the person",
            Self::VehicleCrime => "Vehicle crime",
            Self::ViolentCrime => "Violence and sexual offences",
            Self::OtherCrime => "Other crime",
        }
    }
}

/// Turns a category slug into a display label.
///
/// Known slugs use [`CrimeCategory::label`]. Unknown ones, which the API
/// adds from time to time, are title-cased word by word.
#[must_use]
pub fn label_for_slug(slug: &str) -> String {
    if let Ok(category) = slug.parse::<CrimeCategory>() {
        return category.label().to_string();
    }

    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A coordinate as it appears on the wire.
///
/// police.uk sends coordinates as strings, but other producers of the same
/// shape send plain numbers. Parsing into `f64` happens during cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    /// Numeric JSON value.
    Number(f64),
    /// String JSON value, possibly non-numeric.
    Text(String),
}

impl Coordinate {
    /// Coerces the coordinate to a finite `f64`, or `None` when it is not
    /// numeric.
    #[must_use]
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// The street an anonymised crime location is snapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Street {
    /// police.uk street identifier.
    pub id: Option<u64>,
    /// Street description (e.g. "On or near Parking Area").
    pub name: Option<String>,
}

/// Nested location object of a [`StreetCrime`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeLocation {
    /// Latitude (WGS84).
    pub latitude: Coordinate,
    /// Longitude (WGS84).
    pub longitude: Coordinate,
    /// Snapped street, when known.
    pub street: Option<Street>,
}

/// Latest outcome recorded against a crime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeStatus {
    /// Outcome description (e.g. "Under investigation").
    pub category: String,
    /// Month of the outcome (`YYYY-MM`).
    pub date: Option<String>,
}

impl OutcomeStatus {
    /// Outcome used when the API reports none.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Creates the placeholder outcome for crimes with no recorded status.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            category: Self::UNKNOWN.to_string(),
            date: None,
        }
    }
}

/// A single street-level crime as returned by
/// `/crimes-street/all-crime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetCrime {
    /// Category slug (see [`CrimeCategory`]).
    pub category: String,
    /// Month of the crime (`YYYY-MM`).
    pub month: String,
    /// Approximate location, `None` for crimes the API could not place.
    pub location: Option<CrimeLocation>,
    /// Latest outcome, `None` when not yet recorded.
    pub outcome_status: Option<OutcomeStatus>,
    /// police.uk record identifier.
    pub id: Option<u64>,
    /// Identifier stable across monthly data releases.
    pub persistent_id: Option<String>,
    /// `"Force"` or `"BTP"`.
    pub location_type: Option<String>,
    /// Location subtype for BTP crimes (e.g. `"ROAD"`).
    pub location_subtype: Option<String>,
    /// Extra free-text context, usually empty.
    pub context: Option<String>,
}

/// A territorial police force.
///
/// Reads the API's `id`/`name` keys and writes `police_force_id` /
/// `police_force_name` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliceForce {
    /// Force identifier (e.g. `"leicestershire"`).
    #[serde(rename = "police_force_id", alias = "id")]
    pub id: String,
    /// Force name (e.g. "Leicestershire Police").
    #[serde(rename = "police_force_name", alias = "name")]
    pub name: String,
}

/// A neighbourhood policing team area within a force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbourhood {
    /// Neighbourhood identifier, unique within its force.
    #[serde(rename = "neighbourhood_id", alias = "id")]
    pub id: String,
    /// Neighbourhood name.
    #[serde(rename = "neighbourhood_name", alias = "name")]
    pub name: String,
    /// Owning force, filled in by the caller since the API omits it.
    #[serde(default)]
    pub police_force_id: Option<String>,
}

/// A single vertex of a police.uk neighbourhood boundary, also used for
/// neighbourhood centre points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    /// Latitude (WGS84).
    pub latitude: Coordinate,
    /// Longitude (WGS84).
    pub longitude: Coordinate,
}

/// Detail record for one neighbourhood (`/{force}/{neighbourhood}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourhoodDetail {
    /// Neighbourhood identifier.
    pub id: String,
    /// Neighbourhood name.
    pub name: String,
    /// HTML description, when published.
    pub description: Option<String>,
    /// Population estimate as published (free text).
    pub population: Option<String>,
    /// Force website page for the neighbourhood.
    pub url_force: Option<String>,
    /// Centre point of the neighbourhood.
    pub centre: Option<BoundaryPoint>,
    /// Owning force, filled in by the caller.
    #[serde(default)]
    pub police_force_id: Option<String>,
}

/// Column order of a cleaned crime table.
///
/// Written as the CSV header even when the table has no rows, so that
/// consumers see the same schema for empty and non-empty runs.
pub const CRIME_ROW_COLUMNS: &[&str] = &[
    "category",
    "latitude",
    "longitude",
    "street_name",
    "year",
    "month",
    "outcome_status",
    "police_force_id",
    "id",
    "persistent_id",
    "location_type",
    "location_subtype",
    "context",
    "street_id",
    "outcome_date",
];

/// A cleaned, flattened crime record.
///
/// Field order matches [`CRIME_ROW_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRow {
    /// Category slug.
    pub category: String,
    /// Latitude, `None` when missing or non-numeric at the source.
    pub latitude: Option<f64>,
    /// Longitude, `None` when missing or non-numeric at the source.
    pub longitude: Option<f64>,
    /// Street description.
    pub street_name: Option<String>,
    /// Year of the crime month.
    pub year: Option<i32>,
    /// Calendar month (1-12).
    pub month: Option<u32>,
    /// Outcome description, `"Unknown"` when the source had none.
    pub outcome_status: String,
    /// Force whose area the crime was fetched for.
    pub police_force_id: Option<String>,
    /// police.uk record identifier.
    pub id: Option<u64>,
    /// Identifier stable across monthly data releases.
    pub persistent_id: Option<String>,
    /// `"Force"` or `"BTP"`.
    pub location_type: Option<String>,
    /// BTP location subtype.
    pub location_subtype: Option<String>,
    /// Extra free-text context.
    pub context: Option<String>,
    /// police.uk street identifier.
    pub street_id: Option<u64>,
    /// Month of the latest outcome (`YYYY-MM`).
    pub outcome_date: Option<String>,
}
