//! Pulls per-value colors out of the JSON payloads a color source returns.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::chart::data::Cell;
use crate::util::argb_to_hex;

pub type ColorMap = HashMap<String, String>;

/// Accepts a plain string, `{color}`, `{qColor}` (nested), an ARGB integer or
/// `{qNum}` holding an ARGB integer.
pub fn extract_color_value(entry: &Value) -> Option<String> {
    match entry {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => number.as_f64().map(|argb| argb_to_hex(argb as i64)),
        Value::Object(fields) => {
            if let Some(color) = fields.get("color").and_then(non_empty_str) {
                return Some(color.to_owned());
            }
            if let Some(nested) = fields.get("qColor").filter(|value| is_truthy(value)) {
                return extract_color_value(nested);
            }
            fields
                .get("qNum")
                .and_then(Value::as_f64)
                .filter(|argb| argb.is_finite())
                .map(|argb| argb_to_hex(argb as i64))
        }
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|text| !text.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

/// Key of a `{value: ...}` entry, stringified when numeric.
fn entry_key(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn coloring<'a>(layout: &'a Value, root: &str) -> Option<&'a Map<String, Value>> {
    layout.get(root)?.get("coloring")?.as_object()
}

/// Change fingerprint of a dimension layout (`qDim.coloring.changeHash`).
pub fn fingerprint(layout: &Value) -> Option<String> {
    match coloring(layout, "qDim")?.get("changeHash")? {
        Value::String(hash) if !hash.is_empty() => Some(hash.clone()),
        Value::Number(hash) => Some(hash.to_string()),
        _ => None,
    }
}

/// Reference to the linked color map object (`qDim.coloring.colorMapRef`).
pub fn color_map_ref(layout: &Value) -> Option<String> {
    coloring(layout, "qDim")?
        .get("colorMapRef")
        .and_then(non_empty_str)
        .map(str::to_owned)
}

/// `qDim.coloring.valueColors` of the dimension properties.
pub fn property_value_colors(properties: &Value) -> ColorMap {
    let mut colors = ColorMap::new();
    let Some(entries) = coloring(properties, "qDim")
        .and_then(|coloring| coloring.get("valueColors"))
        .and_then(Value::as_array)
    else {
        return colors;
    };

    for entry in entries {
        let Some(value) = entry.get("value").and_then(entry_key) else {
            continue;
        };
        if let Some(color) = entry.get("baseColor").and_then(extract_color_value) {
            colors.insert(value, color);
        }
    }
    colors
}

/// Payload shapes of a linked color map object, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// `colorMap.colors` as `[{value, baseColor|color}]`.
    EntryList,
    /// `colorMap.colors` keyed by value; numeric keys also match by position.
    KeyedMap,
    /// `qColorMap.colors` keyed by value; never overrides earlier entries.
    QColorMap,
    /// Root `colors`, either positional or keyed.
    RootColors,
    /// `valueColors` entries plus `qItems` (`{qText, qColor}`).
    ValueColors,
}

impl PayloadShape {
    pub const ALL: [PayloadShape; 5] = [
        Self::EntryList,
        Self::KeyedMap,
        Self::QColorMap,
        Self::RootColors,
        Self::ValueColors,
    ];

    /// Merges whatever this shape finds into `colors`.
    pub fn apply(self, payload: &Value, group_values: &[String], colors: &mut ColorMap) {
        match self {
            Self::EntryList => {
                let Some(entries) = payload
                    .get("colorMap")
                    .and_then(|map| map.get("colors"))
                    .and_then(Value::as_array)
                else {
                    return;
                };
                for entry in entries {
                    let Some(value) = entry.get("value").and_then(entry_key) else {
                        continue;
                    };
                    let color = entry
                        .get("baseColor")
                        .and_then(|base| base.get("color"))
                        .and_then(non_empty_str)
                        .map(str::to_owned)
                        .or_else(|| extract_color_value(entry));
                    if let Some(color) = color {
                        colors.insert(value, color);
                    }
                }
            }
            Self::KeyedMap => {
                let Some(entries) = payload
                    .get("colorMap")
                    .and_then(|map| map.get("colors"))
                    .and_then(Value::as_object)
                else {
                    return;
                };
                insert_keyed(entries, group_values, colors);
            }
            Self::QColorMap => {
                let Some(entries) = payload
                    .get("qColorMap")
                    .and_then(|map| map.get("colors"))
                    .and_then(Value::as_object)
                else {
                    return;
                };
                for (key, entry) in entries {
                    if colors.contains_key(key) {
                        continue;
                    }
                    if let Some(color) = extract_color_value(entry) {
                        colors.insert(key.clone(), color);
                    }
                }
            }
            Self::RootColors => match payload.get("colors") {
                Some(Value::Array(entries)) => {
                    for (entry, value) in entries.iter().zip(group_values) {
                        if let Some(color) = extract_color_value(entry) {
                            colors.insert(value.clone(), color);
                        }
                    }
                }
                Some(Value::Object(entries)) => {
                    for (key, entry) in entries {
                        if let Some(color) = extract_color_value(entry) {
                            colors.insert(key.clone(), color);
                        }
                    }
                }
                _ => {}
            },
            Self::ValueColors => {
                for entry in payload
                    .get("valueColors")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    let Some(value) = entry.get("value").and_then(entry_key) else {
                        continue;
                    };
                    let source = entry
                        .get("baseColor")
                        .filter(|value| is_truthy(value))
                        .or_else(|| entry.get("color").filter(|value| is_truthy(value)))
                        .unwrap_or(entry);
                    if let Some(color) = extract_color_value(source) {
                        colors.insert(value, color);
                    }
                }

                for item in payload
                    .get("qItems")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    let Some(text) = item.get("qText").and_then(non_empty_str) else {
                        continue;
                    };
                    if let Some(color) = item.get("qColor").and_then(extract_color_value) {
                        colors.insert(text.to_owned(), color);
                    }
                }
            }
        }
    }
}

/// Keyed colors; a numeric key also names the group value at that position.
fn insert_keyed(entries: &Map<String, Value>, group_values: &[String], colors: &mut ColorMap) {
    for (key, entry) in entries {
        let Some(color) = extract_color_value(entry) else {
            continue;
        };
        if let Some(value) = key
            .parse::<usize>()
            .ok()
            .and_then(|index| group_values.get(index))
        {
            colors.insert(value.clone(), color.clone());
        }
        colors.insert(key.clone(), color);
    }
}

fn insert_missing(entries: &Map<String, Value>, colors: &mut ColorMap) {
    for (key, entry) in entries {
        if colors.contains_key(key) {
            continue;
        }
        if let Some(color) = extract_color_value(entry) {
            colors.insert(key.clone(), color);
        }
    }
}

/// Colors of a linked color map object, trying every payload shape in order.
pub fn color_map_payload(payload: &Value, group_values: &[String]) -> ColorMap {
    let mut colors = ColorMap::new();
    for shape in PayloadShape::ALL {
        shape.apply(payload, group_values, &mut colors);
    }
    colors
}

/// Colors embedded directly in a dimension (or generic object) layout.
pub fn layout_colors(layout: &Value, group_values: &[String]) -> ColorMap {
    let mut colors = ColorMap::new();

    if let Some(coloring) = coloring(layout, "qDim") {
        if let Some(entries) = coloring
            .get("colorMap")
            .and_then(|map| map.get("colors"))
            .and_then(Value::as_object)
        {
            insert_keyed(entries, group_values, &mut colors);
        }

        for (index, entry) in coloring
            .get("valueColors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .enumerate()
        {
            let value = entry.get("value").and_then(entry_key);
            let direct = entry.get("color").filter(|color| is_truthy(color));
            if let (Some(value), Some(direct)) = (value, direct) {
                if let Some(color) = extract_color_value(direct) {
                    colors.insert(value, color);
                }
            } else if let Some(base) = entry.get("baseColor").filter(|base| is_truthy(base))
                && let Some(value) = group_values.get(index)
                && let Some(color) = extract_color_value(base)
            {
                colors.insert(value.clone(), color);
            }
        }
    }

    for root in [
        coloring(layout, "qDimension"),
        layout.get("coloring").and_then(Value::as_object),
    ]
    .into_iter()
    .flatten()
    {
        if let Some(entries) = root
            .get("colorMap")
            .and_then(|map| map.get("colors"))
            .and_then(Value::as_object)
        {
            insert_missing(entries, &mut colors);
        }
    }

    colors
}

/// Fills groups that still have no color from the grouping cell of each row.
pub fn merge_row_colors(rows: &[Vec<Cell>], colors: &mut ColorMap) {
    for row in rows {
        let Some(cell) = row.get(1) else {
            continue;
        };
        let Some(group) = cell.display_text() else {
            continue;
        };
        if colors.contains_key(group) {
            continue;
        }
        if let Some(color) = cell.embedded_color() {
            colors.insert(group.to_owned(), color);
        }
    }
}
