//! JSON output formatting

use serde_json::json;

use crate::lifecycle::Snapshot;

pub fn format_json(snapshot: &Snapshot) -> String {
    let value = serde_json::to_value(snapshot).unwrap_or(json!(null));
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoredState;

    #[test]
    fn test_format_json_empty() {
        let snapshot = Snapshot::from_stored(&StoredState::default());
        let value: serde_json::Value = serde_json::from_str(&format_json(&snapshot)).unwrap();
        assert_eq!(value["containers"], json!([]));
        assert_eq!(value["removal_in_progress"], json!(false));
        assert_eq!(value["statistics"]["containers_deleted"], json!(0));
    }
}
