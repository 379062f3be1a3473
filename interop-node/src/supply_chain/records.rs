//! Supply-chain records and their on-ledger encodings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A record stored in a web3 repository contract as a Solidity struct.
///
/// Connectors hand struct outputs back either as positional arrays or as
/// objects keyed by component name; both decode.
pub trait RepositoryRecord: Serialize + DeserializeOwned + Send {
    /// Name used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// The struct as the positional tuple `insertRecord` takes.
    fn to_tuple(&self) -> Value;

    fn from_tuple(fields: &[Value]) -> Option<Self>;

    fn from_output(value: &Value) -> Option<Self> {
        match value {
            Value::Array(fields) => Self::from_tuple(fields),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub bookshelf_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookshelf {
    pub id: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub shelf_count: u64,
    pub bamboo_harvest_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BambooHarvest {
    pub id: String,
    pub location: String,
    pub started_at: String,
    pub ended_at: String,
    pub harvester: String,
}

// uint256 outputs arrive as numbers or decimal strings
fn deserialize_count<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| serde::de::Error::custom(format!("invalid shelfCount: {}", value)))
}

impl RepositoryRecord for Bookshelf {
    const KIND: &'static str = "bookshelf";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_tuple(&self) -> Value {
        json!([self.id, self.shelf_count, self.bamboo_harvest_id])
    }

    fn from_tuple(fields: &[Value]) -> Option<Self> {
        let [id, shelf_count, bamboo_harvest_id] = fields else {
            return None;
        };
        let shelf_count = match shelf_count {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        Some(Self {
            id: text(id)?,
            shelf_count,
            bamboo_harvest_id: text(bamboo_harvest_id)?,
        })
    }
}

impl RepositoryRecord for BambooHarvest {
    const KIND: &'static str = "bamboo harvest";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_tuple(&self) -> Value {
        json!([
            self.id,
            self.location,
            self.started_at,
            self.ended_at,
            self.harvester
        ])
    }

    fn from_tuple(fields: &[Value]) -> Option<Self> {
        let [id, location, started_at, ended_at, harvester] = fields else {
            return None;
        };
        Some(Self {
            id: text(id)?,
            location: text(location)?,
            started_at: text(started_at)?,
            ended_at: text(ended_at)?,
            harvester: text(harvester)?,
        })
    }
}
