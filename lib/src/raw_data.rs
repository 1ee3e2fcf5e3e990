use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DecodeError;

/// The `{ result: [...] }` envelope the legacy and content services wrap
/// every list in.
#[derive(Deserialize, Debug, Default)]
pub struct RawEnvelope {
    #[serde(default)]
    pub result: serde_json::Value,
}

impl RawEnvelope {
    /// A missing or null `result` decodes to an empty list.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Vec<T>, DecodeError> {
        match self.result {
            serde_json::Value::Null => Ok(Vec::new()),
            value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Err(DecodeError::NotAList),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::CourseInventory;

    fn envelope(value: serde_json::Value) -> RawEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_result_is_empty() {
        let records: Vec<CourseInventory> = envelope(json!({})).decode().unwrap();
        assert!(records.is_empty());

        let records: Vec<CourseInventory> = envelope(json!({ "result": null })).decode().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn object_result_is_rejected() {
        let err = envelope(json!({ "result": { "courseId": 11 } }))
            .decode::<CourseInventory>()
            .unwrap_err();

        assert!(matches!(err, DecodeError::NotAList));
    }

    #[test]
    fn malformed_record_is_rejected() {
        let err = envelope(json!({ "result": [{ "classes": [] }] }))
            .decode::<CourseInventory>()
            .unwrap_err();

        assert!(matches!(err, DecodeError::Record(_)));
    }
}
