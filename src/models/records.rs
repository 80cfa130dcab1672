//! Loosely-typed donor and request records as they arrive from the datastore
//! or an API caller, and their one-time validation into domain types.

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::domain::{AvailabilityWindow, BloodRequest, BloodType, Coordinates, Donor, SkipReason, Urgency};

/// A value stored either as a JSON number or as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self, field: &str) -> Result<f64, SkipReason> {
        match self {
            NumberOrText::Number(n) => Ok(*n),
            NumberOrText::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                SkipReason::MalformedRecord(format!("{} is not numeric: '{}'", field, s))
            }),
        }
    }
}

/// Donor row as stored upstream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "fullName", alias = "full_name", alias = "name", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(rename = "bloodGroup", alias = "blood_group", alias = "bloodType", default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub latitude: Option<NumberOrText>,
    #[serde(default)]
    pub longitude: Option<NumberOrText>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "formattedAddress", alias = "formatted_address", default)]
    pub formatted_address: Option<String>,
    #[serde(rename = "availableDate", alias = "available_date", default)]
    pub available_date: Option<String>,
    /// `HH:MM` or `HH:MM-HH:MM`
    #[serde(rename = "availableTime", alias = "available_time", default)]
    pub available_time: Option<String>,
    #[serde(rename = "lastDonation", alias = "last_donation_date", default)]
    pub last_donation: Option<String>,
    #[serde(rename = "isActive", alias = "is_active", default)]
    pub is_active: Option<bool>,
}

/// Blood request row as stored upstream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "patientName", alias = "patient_name", default)]
    pub patient_name: Option<String>,
    #[serde(rename = "contactEmail", alias = "contact_email", default)]
    pub contact_email: Option<String>,
    #[serde(rename = "contactPhone", alias = "contact_phone", default)]
    pub contact_phone: Option<String>,
    #[serde(rename = "bloodGroup", alias = "blood_group", alias = "bloodType", default)]
    pub blood_group: Option<String>,
    #[serde(rename = "hospitalName", alias = "hospital_name", default)]
    pub hospital_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<NumberOrText>,
    #[serde(default)]
    pub longitude: Option<NumberOrText>,
    #[serde(rename = "hospitalAddress", alias = "hospital_address", alias = "location", default)]
    pub hospital_address: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(rename = "unitsNeeded", alias = "units_needed", default)]
    pub units_needed: Option<NumberOrText>,
    #[serde(rename = "requiredDate", alias = "required_date", default)]
    pub required_date: Option<String>,
    #[serde(rename = "requiredTime", alias = "required_time", default)]
    pub required_time: Option<String>,
    #[serde(rename = "isActive", alias = "is_active", default)]
    pub is_active: Option<bool>,
}

impl DonorRecord {
    /// Identifier used when reporting a skip, even for malformed rows
    pub fn display_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| "<missing id>".to_string())
    }

    /// Validate into a [`Donor`]. Coordinates are left unset when the row
    /// has none stored, so the caller can resolve `location` later.
    pub fn into_donor(self) -> Result<Donor, SkipReason> {
        let id = required_text(self.id, "id")?;
        let blood_type: BloodType = required_text(self.blood_group, "blood group")?.parse()?;
        let date = parse_date(&required_text(self.available_date, "available date")?)?;
        let (start_time, end_time) = match non_empty(self.available_time) {
            Some(raw) => parse_time_range(&raw)?,
            None => (None, None),
        };
        let last_donation_date = non_empty(self.last_donation)
            .map(|raw| parse_date(&raw))
            .transpose()?;
        let coordinates = stored_coordinates(
            self.latitude.as_ref(),
            self.longitude.as_ref(),
            self.formatted_address.clone(),
        )?;

        Ok(Donor {
            id,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            blood_type,
            coordinates,
            location: non_empty(self.location).or(self.formatted_address),
            availability: AvailabilityWindow {
                date,
                start_time,
                end_time,
            },
            is_active: self.is_active.unwrap_or(true),
            last_donation_date,
        })
    }
}

impl RequestRecord {
    pub fn display_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| "<missing id>".to_string())
    }

    /// Validate into a [`BloodRequest`]
    pub fn into_request(self) -> Result<BloodRequest, SkipReason> {
        let id = required_text(self.id, "id")?;
        let blood_type: BloodType = required_text(self.blood_group, "blood group")?.parse()?;
        let urgency = match non_empty(self.urgency) {
            Some(raw) => raw.parse::<Urgency>()?,
            None => Urgency::Normal,
        };
        let units_needed = match &self.units_needed {
            Some(value) => parse_units(value)?,
            None => 1,
        };
        let required_date = parse_date(&required_text(self.required_date, "required date")?)?;
        let required_time = non_empty(self.required_time)
            .map(|raw| parse_time(&raw))
            .transpose()?;
        let coordinates = stored_coordinates(
            self.latitude.as_ref(),
            self.longitude.as_ref(),
            None,
        )?;

        Ok(BloodRequest {
            id,
            patient_name: self.patient_name,
            hospital_name: self.hospital_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            blood_type,
            coordinates,
            hospital_address: non_empty(self.hospital_address),
            urgency,
            units_needed,
            required_date,
            required_time,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn required_text(value: Option<String>, field: &str) -> Result<String, SkipReason> {
    non_empty(value).ok_or_else(|| SkipReason::MalformedRecord(format!("missing {}", field)))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_date(raw: &str) -> Result<NaiveDate, SkipReason> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| SkipReason::MalformedRecord(format!("unparseable date '{}'", raw)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, SkipReason> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| SkipReason::MalformedRecord(format!("unparseable time '{}'", raw)))
}

fn parse_time_range(raw: &str) -> Result<(Option<NaiveTime>, Option<NaiveTime>), SkipReason> {
    match raw.split_once('-') {
        Some((start, end)) => {
            let start = parse_time(start)?;
            let end = parse_time(end)?;
            if end < start {
                return Err(SkipReason::MalformedRecord(format!(
                    "availability ends before it starts '{}'",
                    raw
                )));
            }
            Ok((Some(start), Some(end)))
        }
        None => Ok((Some(parse_time(raw)?), None)),
    }
}

fn parse_units(value: &NumberOrText) -> Result<u32, SkipReason> {
    let units = value.as_f64("units needed")?;
    if !units.is_finite() || units.fract() != 0.0 || units < 1.0 || units > u32::MAX as f64 {
        return Err(SkipReason::MalformedRecord(format!(
            "units needed must be a positive integer, got {}",
            units
        )));
    }
    Ok(units as u32)
}

/// Coordinates stored on the row, if any.
///
/// A missing half or an exact `(0.0, 0.0)` pair means the row was never
/// resolved; it is reported as `None`, not as a position.
fn stored_coordinates(
    latitude: Option<&NumberOrText>,
    longitude: Option<&NumberOrText>,
    formatted_address: Option<String>,
) -> Result<Option<Coordinates>, SkipReason> {
    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return Ok(None);
    };
    let lat = lat.as_f64("latitude")?;
    let lon = lon.as_f64("longitude")?;

    if lat == 0.0 && lon == 0.0 {
        return Ok(None);
    }

    let mut coordinates = Coordinates::new(lat, lon);
    coordinates.formatted_address = formatted_address;
    if !coordinates.is_valid() {
        return Err(SkipReason::InvalidCoordinates);
    }
    Ok(Some(coordinates))
}
