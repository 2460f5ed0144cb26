// Earth Engine expression graph encoding for NDVI queries
//
// A graph is a map of named value nodes plus the name of the result node.
// Function bodies must live in the map; everything else is inlined.
use crate::application::ndvi_query::NdviQuery;
use crate::domain::region::Region;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const TIME_START: &str = "system:time_start";
const MAP_IMAGE_VAR: &str = "_MAPPING_VAR_0_0";
const MAP_FEATURE_VAR: &str = "_MAPPING_VAR_1_0";

#[derive(Debug, Default)]
struct ExpressionGraph {
    values: BTreeMap<String, Value>,
}

impl ExpressionGraph {
    fn add(&mut self, node: Value) -> String {
        let key = self.values.len().to_string();
        self.values.insert(key.clone(), node);
        key
    }

    fn set(&mut self, key: &str, node: Value) {
        self.values.insert(key.to_string(), node);
    }

    fn finish(self, result: String) -> Value {
        json!({ "result": result, "values": self.values })
    }
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn value_ref(key: &str) -> Value {
    json!({ "valueReference": key })
}

fn arg_ref(name: &str) -> Value {
    json!({ "argumentReference": name })
}

fn invoke<const N: usize>(function: &str, args: [(&str, Value); N]) -> Value {
    let arguments: Map<String, Value> = args
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments,
        }
    })
}

fn lambda(arg: &str, body: &str) -> Value {
    json!({
        "functionDefinitionValue": {
            "argumentNames": [arg],
            "body": body,
        }
    })
}

fn geometry(region: &Region) -> Value {
    match region {
        Region::Point(_) => invoke(
            "GeometryConstructors.Point",
            [("coordinates", constant(region.coordinates_json()))],
        ),
        Region::Polygon(_) => invoke(
            "GeometryConstructors.Polygon",
            [
                ("coordinates", constant(region.coordinates_json())),
                ("evenOdd", constant(json!(true))),
            ],
        ),
    }
}

/// Encode the query as a `value:compute` expression. The result evaluates to
/// a feature collection with one `{date, ndvi}` feature per image.
pub fn encode(query: &NdviQuery) -> Value {
    let mut graph = ExpressionGraph::default();

    // "0" is reserved for the result so it reads first
    let result = graph.add(Value::Null);
    let geom = graph.add(geometry(&query.region));

    let collection = invoke(
        "ImageCollection.load",
        [("id", constant(json!(query.collection_id)))],
    );

    let by_date = invoke(
        "Filter.dateRangeContains",
        [
            (
                "leftValue",
                invoke(
                    "DateRange",
                    [
                        ("start", constant(json!(query.date_range.start_str()))),
                        ("end", constant(json!(query.date_range.end_str()))),
                    ],
                ),
            ),
            ("rightField", constant(json!(TIME_START))),
        ],
    );
    let by_bounds = invoke(
        "Filter.intersects",
        [
            ("leftField", constant(json!(".all"))),
            ("rightValue", value_ref(&geom)),
        ],
    );
    let by_cloud = invoke(
        "Filter.lessThan",
        [
            ("leftField", constant(json!(query.cloud_filter.property))),
            ("rightValue", constant(json!(query.cloud_filter.max))),
        ],
    );

    let filtered = [by_date, by_bounds, by_cloud]
        .into_iter()
        .fold(collection, |acc, filter| {
            invoke("Collection.filter", [("collection", acc), ("filter", filter)])
        });

    let ndvi = invoke(
        "Image.rename",
        [
            (
                "input",
                invoke(
                    "Image.normalizedDifference",
                    [
                        ("input", arg_ref(MAP_IMAGE_VAR)),
                        (
                            "bandNames",
                            constant(json!([query.index.nir, query.index.red])),
                        ),
                    ],
                ),
            ),
            ("names", constant(json!([query.index.output]))),
        ],
    );
    let add_band_body = graph.add(invoke(
        "Image.addBands",
        [("dstImg", arg_ref(MAP_IMAGE_VAR)), ("srcImg", ndvi)],
    ));

    let with_ndvi = invoke(
        "Collection.map",
        [
            ("collection", filtered),
            ("baseAlgorithm", lambda(MAP_IMAGE_VAR, &add_band_body)),
        ],
    );

    let date = invoke(
        "Date.format",
        [
            (
                "date",
                invoke(
                    "Date",
                    [(
                        "value",
                        invoke(
                            "Element.get",
                            [
                                ("object", arg_ref(MAP_FEATURE_VAR)),
                                ("property", constant(json!(TIME_START))),
                            ],
                        ),
                    )],
                ),
            ),
            ("format", constant(json!(query.reduction.date_pattern))),
        ],
    );
    let reduced = invoke(
        "Image.reduceRegion",
        [
            (
                "image",
                invoke(
                    "Image.select",
                    [
                        ("input", arg_ref(MAP_FEATURE_VAR)),
                        ("bandSelectors", constant(json!([query.index.output]))),
                    ],
                ),
            ),
            ("reducer", invoke("Reducer.mean", [])),
            ("geometry", value_ref(&geom)),
            ("scale", constant(json!(query.reduction.scale))),
            ("maxPixels", constant(json!(query.reduction.max_pixels))),
        ],
    );
    let mean = invoke(
        "Dictionary.get",
        [
            ("dictionary", reduced),
            ("key", constant(json!(query.index.output))),
        ],
    );
    let feature_body = graph.add(invoke(
        "Feature",
        [
            ("geometry", constant(Value::Null)),
            (
                "metadata",
                json!({ "dictionaryValue": { "values": { "date": date, "ndvi": mean } } }),
            ),
        ],
    ));

    graph.set(
        &result,
        invoke(
            "Collection.map",
            [
                ("collection", with_ndvi),
                ("baseAlgorithm", lambda(MAP_FEATURE_VAR, &feature_body)),
            ],
        ),
    );

    graph.finish(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date_range::DateRange;

    fn query(region: Region) -> NdviQuery {
        NdviQuery::new(
            "COPERNICUS/S2_SR",
            DateRange::parse("2020-01-01", "2020-01-08").unwrap(),
            region,
        )
    }

    fn function_names(node: &Value, out: &mut Vec<String>) {
        match node {
            Value::Object(map) => {
                if let Some(name) = map.get("functionName").and_then(Value::as_str) {
                    out.push(name.to_string());
                }
                map.values().for_each(|v| function_names(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| function_names(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_encode_point_query() {
        let expr = encode(&query(Region::point(53.16, 36.59).unwrap()));

        assert_eq!(expr["result"], "0");
        let values = expr["values"].as_object().unwrap();
        assert_eq!(values.len(), 4);

        let geom = &values["1"]["functionInvocationValue"];
        assert_eq!(geom["functionName"], "GeometryConstructors.Point");
        assert_eq!(geom["arguments"]["coordinates"]["constantValue"], json!([53.16, 36.59]));

        let mut names = Vec::new();
        function_names(&expr, &mut names);
        for expected in [
            "ImageCollection.load",
            "Filter.dateRangeContains",
            "Filter.intersects",
            "Filter.lessThan",
            "Image.normalizedDifference",
            "Image.addBands",
            "Image.reduceRegion",
            "Reducer.mean",
            "Date.format",
            "Feature",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_encode_carries_parameters() {
        let expr = encode(&query(Region::point(1.0, 2.0).unwrap()));
        let text = expr.to_string();

        assert!(text.contains("\"COPERNICUS/S2_SR\""));
        assert!(text.contains("\"2020-01-01\""));
        assert!(text.contains("\"2020-01-08\""));
        assert!(text.contains("\"CLOUDY_PIXEL_PERCENTAGE\""));
        assert!(text.contains("[\"B8\",\"B4\"]"));
        assert!(text.contains("\"YYYY-MM-dd\""));

        let body = &expr["values"]["3"]["functionInvocationValue"]["arguments"]["metadata"];
        let reduce = &body["dictionaryValue"]["values"]["ndvi"]["functionInvocationValue"]
            ["arguments"]["dictionary"]["functionInvocationValue"]["arguments"];
        assert_eq!(reduce["scale"]["constantValue"], json!(10.0));
        assert_eq!(reduce["maxPixels"]["constantValue"], json!(1e8));
        assert_eq!(reduce["geometry"], json!({"valueReference": "1"}));
    }

    #[test]
    fn test_encode_polygon_geometry() {
        let region = Region::Polygon(vec![vec![
            crate::domain::region::Coordinate { lon: 0.0, lat: 0.0 },
            crate::domain::region::Coordinate { lon: 1.0, lat: 0.0 },
            crate::domain::region::Coordinate { lon: 1.0, lat: 1.0 },
            crate::domain::region::Coordinate { lon: 0.0, lat: 0.0 },
        ]]);
        let expr = encode(&query(region));

        let geom = &expr["values"]["1"]["functionInvocationValue"];
        assert_eq!(geom["functionName"], "GeometryConstructors.Polygon");
        assert_eq!(geom["arguments"]["coordinates"]["constantValue"][0][2], json!([1.0, 1.0]));
    }

    #[test]
    fn test_lambdas_reference_graph_bodies() {
        let expr = encode(&query(Region::point(1.0, 2.0).unwrap()));
        let outer = &expr["values"]["0"]["functionInvocationValue"]["arguments"];

        assert_eq!(outer["baseAlgorithm"]["functionDefinitionValue"]["body"], "3");
        let inner = &outer["collection"]["functionInvocationValue"]["arguments"];
        assert_eq!(inner["baseAlgorithm"]["functionDefinitionValue"]["body"], "2");
        assert_eq!(
            expr["values"]["2"]["functionInvocationValue"]["functionName"],
            "Image.addBands"
        );
    }
}
