use crate::error::{MalformedDataError, RequiredField};
use crate::graph::{Object, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub nearest_airport: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelRecord {
    pub name: String,
    pub phones: Vec<String>,
    pub address: AddressRecord,
    pub rating: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl AddressRecord {
    /// All six values are required; any one missing or blank rejects the
    /// whole address.
    pub fn new(
        number: Option<&str>,
        street: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        zip: Option<&str>,
        nearest_airport: Option<&str>,
    ) -> Result<Self, MalformedDataError> {
        let field = |v: Option<&str>| non_blank(v).ok_or_else(MalformedDataError::incomplete_address);
        Ok(Self {
            number: field(number)?,
            street: field(street)?,
            city: field(city)?,
            state: field(state)?,
            zip: field(zip)?,
            nearest_airport: field(nearest_airport)?,
        })
    }

    pub fn to_object(&self) -> Object {
        Object::new()
            .with("Number", self.number.as_str())
            .with("Street", self.street.as_str())
            .with("City", self.city.as_str())
            .with("State", self.state.as_str())
            .with("Zip", self.zip.as_str())
            .with("NearestAirport", self.nearest_airport.as_str())
    }
}

impl HotelRecord {
    /// Checks Name, then Phone, then Address, failing on the first violation.
    ///
    /// Phones are trimmed and blank entries dropped; at least one must remain.
    /// The address arrives already built so that its own failure is only
    /// reported once name and phones are known good. A blank rating is
    /// treated as absent.
    pub fn new<'a>(
        name: Option<&str>,
        phones: impl IntoIterator<Item = &'a str>,
        address: Result<AddressRecord, MalformedDataError>,
        rating: Option<&str>,
    ) -> Result<Self, MalformedDataError> {
        let name = non_blank(name).ok_or_else(|| MalformedDataError::missing(RequiredField::Name))?;
        let phones: Vec<String> = phones
            .into_iter()
            .filter_map(|p| non_blank(Some(p)))
            .collect();
        if phones.is_empty() {
            return Err(MalformedDataError::missing(RequiredField::Phone));
        }
        Ok(Self {
            name,
            phones,
            address: address?,
            rating: non_blank(rating),
        })
    }

    /// Keys in fixed order: Name, Phone, Address, then `_Rating` when present.
    pub fn to_object(&self) -> Object {
        let mut obj = Object::new()
            .with("Name", self.name.as_str())
            .with("Phone", self.phones.clone())
            .with("Address", self.address.to_object());
        if let Some(rating) = &self.rating {
            obj.insert("_Rating", rating.as_str());
        }
        obj
    }
}

impl From<&HotelRecord> for Value {
    fn from(record: &HotelRecord) -> Self {
        Value::Object(record.to_object())
    }
}
