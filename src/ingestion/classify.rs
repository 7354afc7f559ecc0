//! Document shape classification.
//!
//! The match arms in [`classify`] are ordered, and the order is part of the
//! contract: a kepler.gl map bundle is also a plain JSON object, so the map
//! check must win before any of the geojson checks can see the document.

use serde_json::{Map, Value};

/// The closed set of recognized document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// A kepler.gl map bundle: `datasets` + `config` + `info.app == "kepler.gl"`.
    KeplerMap,
    /// An array whose first element is a plain object.
    RowArray,
    /// A GeoJSON object with `type == "Feature"` and a `geometry`.
    Feature,
    /// A GeoJSON object with `type == "FeatureCollection"` and `features`.
    FeatureCollection,
    /// Anything else; the file is skipped, not failed.
    Unsupported,
}

/// Classify a parsed document. First match wins.
pub fn classify(doc: &Value) -> DocumentShape {
    match doc {
        Value::Object(map) if is_kepler_map(map) => DocumentShape::KeplerMap,
        Value::Array(items) => match items.first() {
            Some(Value::Object(_)) => DocumentShape::RowArray,
            _ => DocumentShape::Unsupported,
        },
        Value::Object(map)
            if geojson_type(map) == Some("Feature") && map.contains_key("geometry") =>
        {
            DocumentShape::Feature
        }
        Value::Object(map)
            if geojson_type(map) == Some("FeatureCollection") && map.contains_key("features") =>
        {
            DocumentShape::FeatureCollection
        }
        _ => DocumentShape::Unsupported,
    }
}

fn is_kepler_map(map: &Map<String, Value>) -> bool {
    map.contains_key("datasets")
        && map.contains_key("config")
        && map.contains_key("info")
        && map
            .get("info")
            .and_then(|info| info.get("app"))
            .and_then(Value::as_str)
            == Some("kepler.gl")
}

fn geojson_type<'a>(map: &'a Map<String, Value>) -> Option<&'a str> {
    map.get("type").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DocumentShape, classify};

    fn kepler_map() -> serde_json::Value {
        json!({
            "datasets": [],
            "config": { "version": "v1" },
            "info": { "app": "kepler.gl", "title": "trip map" }
        })
    }

    #[test]
    fn kepler_map_requires_all_three_keys_and_the_app_marker() {
        assert_eq!(classify(&kepler_map()), DocumentShape::KeplerMap);

        for missing in ["datasets", "config", "info"] {
            let mut doc = kepler_map();
            doc.as_object_mut().unwrap().remove(missing);
            assert_ne!(classify(&doc), DocumentShape::KeplerMap, "missing {missing}");
        }

        let mut doc = kepler_map();
        doc["info"]["app"] = json!("someone-else");
        assert_ne!(classify(&doc), DocumentShape::KeplerMap);
    }

    #[test]
    fn row_array_needs_an_object_first_element() {
        assert_eq!(classify(&json!([{ "a": 1 }])), DocumentShape::RowArray);
        assert_eq!(classify(&json!([])), DocumentShape::Unsupported);
        assert_eq!(classify(&json!([1, 2, 3])), DocumentShape::Unsupported);
        assert_eq!(classify(&json!([[1], [2]])), DocumentShape::Unsupported);
    }

    #[test]
    fn geojson_shapes_need_their_companion_field() {
        let feature = json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [0.0, 0.0] },
            "properties": {}
        });
        assert_eq!(classify(&feature), DocumentShape::Feature);

        let no_geometry = json!({ "type": "Feature", "properties": {} });
        assert_eq!(classify(&no_geometry), DocumentShape::Unsupported);

        let collection = json!({ "type": "FeatureCollection", "features": [] });
        assert_eq!(classify(&collection), DocumentShape::FeatureCollection);

        let no_features = json!({ "type": "FeatureCollection" });
        assert_eq!(classify(&no_features), DocumentShape::Unsupported);
    }

    #[test]
    fn map_check_wins_over_geojson_checks() {
        // A bundle that also happens to carry a geojson-looking `type`.
        let mut doc = kepler_map();
        doc.as_object_mut()
            .unwrap()
            .insert("type".into(), json!("FeatureCollection"));
        doc.as_object_mut()
            .unwrap()
            .insert("features".into(), json!([]));
        assert_eq!(classify(&doc), DocumentShape::KeplerMap);
    }

    #[test]
    fn scalars_and_plain_objects_are_unsupported() {
        assert_eq!(classify(&json!(42)), DocumentShape::Unsupported);
        assert_eq!(classify(&json!("text")), DocumentShape::Unsupported);
        assert_eq!(classify(&json!({ "a": 1 })), DocumentShape::Unsupported);
    }
}
