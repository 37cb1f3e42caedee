//! JSON codec for the stored version marker.

use super::KeyValueStore;
use crate::core::{Result, StoredVersion, Version};

use serde_json::Value as JsonValue;

/// Encodes a version the way it is written to the store (`3` -> `"3"`).
pub fn encode_version(version: Version) -> Result<String> {
    Ok(serde_json::to_string(&version)?)
}

/// Decodes a stored marker.
///
/// Absent values, the empty string and JSON `null` all mean nothing was
/// recorded. Text that is not JSON is an error; JSON that is not a
/// non-negative integer within range comes back as [`StoredVersion::Corrupt`].
pub fn decode_version(raw: Option<&str>) -> Result<StoredVersion> {
    let Some(raw) = raw else {
        return Ok(StoredVersion::Absent);
    };
    if raw.is_empty() {
        return Ok(StoredVersion::Absent);
    }

    let decoded: JsonValue = serde_json::from_str(raw)?;
    let stored = match decoded {
        JsonValue::Null => StoredVersion::Absent,
        JsonValue::Number(number) => match number.as_u64().map(Version::try_from) {
            Some(Ok(version)) => StoredVersion::Recorded(version),
            _ => StoredVersion::Corrupt(raw.to_string()),
        },
        _ => StoredVersion::Corrupt(raw.to_string()),
    };
    Ok(stored)
}

/// Reads and decodes the marker at `storage_key`.
pub async fn read_version(store: &dyn KeyValueStore, storage_key: &str) -> Result<StoredVersion> {
    let raw = store.get(storage_key).await?;
    decode_version(raw.as_deref())
}

/// Encodes and writes `version` at `storage_key`.
pub async fn write_version(
    store: &dyn KeyValueStore,
    storage_key: &str,
    version: Version,
) -> Result<()> {
    store.set(storage_key, encode_version(version)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MigrationError;
    use crate::storage::InMemoryStore;

    #[test]
    fn missing_or_null_means_absent() {
        assert_eq!(decode_version(None).unwrap(), StoredVersion::Absent);
        assert_eq!(decode_version(Some("")).unwrap(), StoredVersion::Absent);
        assert_eq!(decode_version(Some("null")).unwrap(), StoredVersion::Absent);
    }

    #[test]
    fn zero_is_a_real_version() {
        assert_eq!(decode_version(Some("0")).unwrap(), StoredVersion::Recorded(0));
        assert_eq!(decode_version(Some(" 12 ")).unwrap(), StoredVersion::Recorded(12));
    }

    #[test]
    fn non_integers_are_corrupt() {
        for raw in ["\"3\"", "-1", "1.5", "true", "[1]", "{\"v\":1}", "4294967296"] {
            assert_eq!(
                decode_version(Some(raw)).unwrap(),
                StoredVersion::Corrupt(raw.to_string()),
                "{raw}"
            );
        }
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = decode_version(Some("{oops")).unwrap_err();
        assert!(matches!(err, MigrationError::Serialization(_)));
    }

    #[test]
    fn whitespace_only_marker_is_an_error() {
        for raw in [" ", "   ", "\n\t"] {
            let err = decode_version(Some(raw)).unwrap_err();
            assert!(matches!(err, MigrationError::Serialization(_)), "{raw:?}");
        }
    }

    #[tokio::test]
    async fn write_then_read() {
        let store = InMemoryStore::new();
        write_version(&store, "m.key", 5).await.unwrap();
        assert_eq!(store.get("m.key").await.unwrap(), Some("5".to_string()));
        assert_eq!(
            read_version(&store, "m.key").await.unwrap(),
            StoredVersion::Recorded(5)
        );
    }
}
