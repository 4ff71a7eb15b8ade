//! `Serialize`/`Deserialize` for [`Config`].
//!
//! A config is a flat object of its options plus `base_headers`, written as
//! an array of `[name, value]` pairs so header order survives. Deserializing
//! expects every option, rejects unknown keys and runs
//! [`Config::validate`]. Partial documents go through [`Config::resolve`].

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::overrides::BASE_HEADERS;
use super::{Config, Settings};

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut fields = match serde_json::to_value(&self.settings).map_err(S::Error::custom)? {
            Value::Object(fields) => fields,
            _ => return Err(S::Error::custom("settings did not serialize to an object")),
        };
        let headers = serde_json::to_value(&self.base_headers).map_err(S::Error::custom)?;
        fields.insert(BASE_HEADERS.to_string(), headers);
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let base_headers = match fields.remove(BASE_HEADERS) {
            Some(headers) => serde_json::from_value(headers).map_err(D::Error::custom)?,
            None => Config::defaults().base_headers.clone(),
        };
        let settings: Settings =
            serde_json::from_value(Value::Object(fields)).map_err(D::Error::custom)?;

        let config = Config {
            settings,
            base_headers,
        };
        config.validate().map_err(D::Error::custom)?;
        Ok(config)
    }
}
