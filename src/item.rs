use csv::{ByteRecord, ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::{Db, Tx};
use crate::errors::BackendError;
use crate::great_circle::{round_to, Coordinates};
use crate::normalization::normalize_label;
use crate::Id;

/// Athletes pick up items within this many meters of a sample.
pub const COLLECTION_RADIUS_METERS: f64 = 100.0;

pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_UID_LENGTH: usize = 10;

/// A point of interest that athletes collect by running past it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectibleItem {
    pub(crate) id: Id,
    pub(crate) name: String,
    pub(crate) uid: String,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) picture: String,
    pub(crate) value: i16,
}

impl CollectibleItem {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::unchecked(self.latitude, self.longitude)
    }

    pub fn is_within_reach(&self, coordinates: &Coordinates) -> bool {
        round_to(self.coordinates().meters_to(coordinates), 3) <= COLLECTION_RADIUS_METERS
    }
}

/// An item as submitted by a client, before validation.
#[derive(Clone, Debug, Deserialize)]
pub struct ItemInput {
    #[serde(deserialize_with = "crate::normalization::deserialize")]
    pub name: String,
    #[serde(deserialize_with = "crate::normalization::deserialize")]
    pub uid: String,
    pub value: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub picture: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewItem {
    pub(crate) name: String,
    pub(crate) uid: String,
    pub(crate) coordinates: Coordinates,
    pub(crate) picture: Url,
    pub(crate) value: i16,
}

impl ItemInput {
    /// Reads a bulk import row: name, uid, value, latitude, longitude and
    /// picture URL, in that order.
    fn from_record(record: &StringRecord) -> Option<Self> {
        if record.len() < 6 {
            return None;
        }

        Some(ItemInput {
            name: normalize_label(&record[0]),
            uid: normalize_label(&record[1]),
            value: record[2].trim().parse().ok()?,
            latitude: record[3].trim().parse().ok()?,
            longitude: record[4].trim().parse().ok()?,
            picture: record[5].trim().to_owned(),
        })
    }

    pub fn validate(self) -> Result<NewItem, BackendError> {
        check_length("name", &self.name, MAX_NAME_LENGTH)?;
        check_length("uid", &self.uid, MAX_UID_LENGTH)?;

        if self.value < 0 || self.value > i64::from(i16::MAX) {
            return Err(BackendError::InvalidItemValue(self.value));
        }

        let coordinates = Coordinates::new(self.latitude, self.longitude)?;
        let picture = parse_picture_url(&self.picture)?;

        Ok(NewItem {
            name: self.name,
            uid: self.uid,
            coordinates,
            picture,
            value: self.value as i16,
        })
    }
}

fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), BackendError> {
    let length = value.chars().count();

    if length == 0 || length > max {
        return Err(BackendError::InvalidLength { field, min: 1, max });
    }

    Ok(())
}

fn parse_picture_url(raw: &str) -> Result<Url, BackendError> {
    let url = Url::parse(raw).map_err(|source| BackendError::UnableToParseUrl {
        url: raw.to_owned(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(BackendError::UnsupportedUrlScheme(scheme.to_owned())),
    }
}

pub async fn create(db: &dyn Db, input: ItemInput) -> Result<CollectibleItem, BackendError> {
    let new_item = input.validate()?;

    let mut tx = db.begin().await?;
    let item = tx.insert_item(&new_item).await?;
    tx.commit().await?;

    Ok(item)
}

pub async fn list(db: &dyn Db) -> Result<Vec<CollectibleItem>, BackendError> {
    let mut tx = db.begin().await?;
    let items = tx.list_items().await?;
    tx.commit().await?;

    Ok(items)
}

/// Imports items from CSV data with a header row. Rows that aren't UTF-8
/// or don't validate are skipped and returned as they were given, with
/// undecodable bytes replaced; every other row is inserted.
pub async fn import(db: &dyn Db, data: &[u8]) -> Result<Vec<Vec<String>>, BackendError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut valid = vec![];
    let mut failed = vec![];

    for record in reader.byte_records() {
        let record = record.map_err(|source| BackendError::MalformedCsv { source })?;

        match StringRecord::from_byte_record(record) {
            Ok(record) => match ItemInput::from_record(&record).map(ItemInput::validate) {
                Some(Ok(new_item)) => valid.push(new_item),
                _ => failed.push(record.iter().map(str::to_owned).collect()),
            },
            Err(error) => failed.push(lossy_fields(&error.into_byte_record())),
        }
    }

    let mut tx = db.begin().await?;

    for new_item in &valid {
        tx.insert_item(new_item).await?;
    }

    tx.commit().await?;

    Ok(failed)
}

fn lossy_fields(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Adds every item within reach of `coordinates` that the athlete hasn’t
/// collected yet to their collection, returning the ids of those items.
pub(crate) async fn collect_nearby(
    tx: &mut dyn Tx,
    athlete_id: Id,
    coordinates: &Coordinates,
) -> Result<Vec<Id>, BackendError> {
    let mut collected = vec![];

    for item in tx.uncollected_items(athlete_id).await? {
        if item.is_within_reach(coordinates) && tx.collect_item(athlete_id, item.id).await? {
            collected.push(item.id);
        }
    }

    Ok(collected)
}
