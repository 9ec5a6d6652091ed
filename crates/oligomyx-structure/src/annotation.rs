//! Volumizer annotation files.
//!
//! The volumizer writes one data frame per structure as JSON, either
//! column-oriented (`{"type": {"0": "pore"}, "volume": {"0": 812.0}}`) or
//! record-oriented (`[{"type": "pore", "volume": 812.0}]`).

use oligomyx_common::{OligomyxError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One annotated void: pore, cavity, pocket, hub, ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnnotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub volume: f64,
}

pub fn parse_annotation_json(text: &str) -> Result<Vec<VolumeAnnotation>> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(columns) => {
            let kinds = column(&columns, "type")?;
            let volumes = column(&columns, "volume")?;
            kinds
                .iter()
                .map(|(row, kind)| {
                    let volume = volumes
                        .get(row)
                        .and_then(|v| v.as_f64())
                        .ok_or_else(|| parse_err(format!("row {row} has no numeric volume")))?;
                    let kind = kind
                        .as_str()
                        .ok_or_else(|| parse_err(format!("row {row} has no type")))?;
                    Ok(VolumeAnnotation { kind: kind.to_string(), volume })
                })
                .collect()
        }
        _ => Err(parse_err("annotation must be a JSON object or array".to_string())),
    }
}

/// Column keyed by numeric row index, so rows line up across columns.
fn column<'a>(columns: &'a serde_json::Map<String, Value>, name: &str) -> Result<BTreeMap<usize, &'a Value>> {
    let Some(Value::Object(cells)) = columns.get(name) else {
        return Err(parse_err(format!("missing column '{name}'")));
    };
    cells
        .iter()
        .map(|(row, cell)| {
            row.parse::<usize>()
                .map(|r| (r, cell))
                .map_err(|_| parse_err(format!("non-numeric row index '{row}'")))
        })
        .collect()
}

fn parse_err(msg: String) -> OligomyxError {
    OligomyxError::Parse(format!("volumizer annotation: {msg}"))
}

pub async fn read_annotation_file(path: &Path) -> Result<Vec<VolumeAnnotation>> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_annotation_json(&text)
}

/// Scalar metrics: `volume` (largest void), `total_volume`, and per type
/// `<type>_volume` (largest) and `<type>_count`.
pub fn summarize(annotations: &[VolumeAnnotation]) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    metrics.insert("volume".to_string(), 0.0);
    metrics.insert("total_volume".to_string(), 0.0);

    for a in annotations {
        let kind = a.kind.to_ascii_lowercase();
        *metrics.entry("total_volume".to_string()).or_insert(0.0) += a.volume;
        let largest = metrics.entry("volume".to_string()).or_insert(0.0);
        *largest = largest.max(a.volume);
        let per_kind = metrics.entry(format!("{kind}_volume")).or_insert(0.0);
        *per_kind = per_kind.max(a.volume);
        *metrics.entry(format!("{kind}_count")).or_insert(0.0) += 1.0;
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_oriented_frame() {
        let text = r#"{
            "id": {"0": 0, "1": 1, "2": 2},
            "type": {"0": "pore", "1": "cavity", "2": "pore"},
            "volume": {"0": 1200.5, "1": 300.0, "2": 80.0}
        }"#;
        let annotations = parse_annotation_json(text).unwrap();
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[1], VolumeAnnotation { kind: "cavity".into(), volume: 300.0 });

        let metrics = summarize(&annotations);
        assert_eq!(metrics["volume"], 1200.5);
        assert_eq!(metrics["total_volume"], 1580.5);
        assert_eq!(metrics["pore_volume"], 1200.5);
        assert_eq!(metrics["pore_count"], 2.0);
        assert_eq!(metrics["cavity_count"], 1.0);
    }

    #[test]
    fn test_record_oriented_frame() {
        let text = r#"[{"type": "Pocket", "volume": 55.0, "x": 1.0}]"#;
        let metrics = summarize(&parse_annotation_json(text).unwrap());
        assert_eq!(metrics["pocket_volume"], 55.0);
    }

    #[test]
    fn test_empty_frame_yields_zero_volume() {
        let metrics = summarize(&parse_annotation_json("[]").unwrap());
        assert_eq!(metrics["volume"], 0.0);
        assert_eq!(metrics["total_volume"], 0.0);
    }

    #[test]
    fn test_missing_volume_column_is_error() {
        let text = r#"{"type": {"0": "pore"}}"#;
        assert!(matches!(parse_annotation_json(text), Err(OligomyxError::Parse(_))));
    }
}
