use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::util::argb_to_hex;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    #[serde(default)]
    pub dimensions: Vec<DimensionInfo>,
    #[serde(default)]
    pub measures: Vec<MeasureInfo>,
    #[serde(default)]
    pub rows: Option<Vec<Vec<Cell>>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub color_map_ref: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureInfo {
    #[serde(default)]
    pub title: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub num: Option<f64>,
    #[serde(default)]
    pub elem: Option<i64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub attr_exps: Vec<AttrValue>,
    #[serde(default)]
    pub attr_dims: Vec<AttrValue>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AttrValue {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub num: Option<f64>,
}

impl DataSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid snapshot JSON in {}", path.display()))
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Column holding the measure; it follows the dimension cells.
    pub fn measure_index(&self) -> usize {
        self.dimensions.len()
    }

    pub fn grouping_dimension(&self) -> Option<&DimensionInfo> {
        self.dimensions.get(1)
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        self.rows.as_deref().unwrap_or_default()
    }

    /// Distinct grouping values in first-seen order.
    pub fn group_values(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();
        for row in self.rows() {
            let Some(text) = row.get(1).and_then(|cell| cell.text.as_deref()) else {
                continue;
            };
            if !text.is_empty() && seen.insert(text) {
                values.push(text.to_owned());
            }
        }
        values
    }
}

impl Cell {
    pub fn display_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    pub fn state_code(&self) -> &str {
        self.state.as_deref().unwrap_or("O")
    }

    /// Valid measures are finite and strictly positive.
    pub fn measure(&self) -> Option<f64> {
        self.num.filter(|value| value.is_finite() && *value > 0.0)
    }

    /// Color attached to this cell through an attribute expression or, failing that, an
    /// attribute dimension.
    pub fn embedded_color(&self) -> Option<String> {
        self.attr_exps
            .iter()
            .find_map(AttrValue::color)
            .or_else(|| {
                self.attr_dims
                    .iter()
                    .find_map(|attr| attr.text.clone().filter(|text| !text.is_empty()))
            })
    }
}

impl AttrValue {
    fn color(&self) -> Option<String> {
        if let Some(text) = self.text.as_deref().filter(|text| !text.is_empty()) {
            return Some(text.to_owned());
        }
        self.num
            .filter(|value| value.is_finite())
            .map(|value| argb_to_hex(value as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_differ_from_empty_rows() {
        let missing: DataSnapshot = serde_json::from_str(r#"{"dimensions": []}"#).unwrap();
        let empty: DataSnapshot = serde_json::from_str(r#"{"rows": []}"#).unwrap();

        assert!(missing.rows.is_none());
        assert_eq!(empty.rows.as_ref().map(Vec::len), Some(0));
        assert!(missing.rows().is_empty());
    }

    #[test]
    fn cells_parse_attribute_lists() {
        let cell: Cell = serde_json::from_str(
            r##"{"text": "G1", "attrExps": [{"num": 4278190335}], "attrDims": [{"text": "#00ff00"}]}"##,
        )
        .unwrap();

        assert_eq!(cell.embedded_color().as_deref(), Some("#0000ff"));
    }

    #[test]
    fn attribute_dimension_is_used_when_expressions_are_empty() {
        let cell: Cell =
            serde_json::from_str(r##"{"attrExps": [{}], "attrDims": [{"text": "#00ff00"}]}"##)
                .unwrap();

        assert_eq!(cell.embedded_color().as_deref(), Some("#00ff00"));
    }

    #[test]
    fn measures_must_be_finite_and_positive() {
        let cell = |num| Cell {
            num,
            ..Cell::default()
        };

        assert_eq!(cell(Some(3.5)).measure(), Some(3.5));
        assert_eq!(cell(Some(0.0)).measure(), None);
        assert_eq!(cell(Some(-2.0)).measure(), None);
        assert_eq!(cell(Some(f64::NAN)).measure(), None);
        assert_eq!(cell(Some(f64::INFINITY)).measure(), None);
        assert_eq!(cell(None).measure(), None);
    }

    #[test]
    fn group_values_keep_first_seen_order() {
        let snapshot: DataSnapshot = serde_json::from_str(
            r#"{"rows": [
                [{"text": "a"}, {"text": "West"}],
                [{"text": "b"}, {"text": "East"}],
                [{"text": "c"}, {"text": "West"}],
                [{"text": "d"}]
            ]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.group_values(), vec!["West", "East"]);
    }
}
