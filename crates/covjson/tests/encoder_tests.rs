//! End-to-end tests for encoding result trees.

use covjson::{
    CovJsonError, Encoder, EncoderConfig, GroupingAxes, ResultTree, ReferenceSystem,
};
use test_utils::{
    date_level_tree, date_param_tree, dates, ensemble_tree, leaf_value, single_point_tree,
    test_catalog, write_temp_file, CATALOG_YAML, LEVEL_CONFIG_YAML,
};

fn encode(tree: &ResultTree, grouping: GroupingAxes) -> covjson::CoverageCollection {
    Encoder::new(EncoderConfig::with_grouping(grouping), test_catalog())
        .from_tree(tree)
        .unwrap()
}

fn range(doc: &covjson::CoverageCollection, coverage: usize, param: &str) -> Vec<f64> {
    doc.coverages[coverage].ranges[param].to_f64_vec()
}

// ============================================================================
// Grouping by date
// ============================================================================

#[test]
fn test_one_coverage_per_date() {
    let lats = [10.0, 20.0, 30.0];
    let lons = [1.0, 2.0];
    let tree = date_param_tree(&[20230101, 20230102, 20230103], &[167], &lats, &lons);
    let doc = encode(&tree, GroupingAxes::Date);

    assert_eq!(doc.coverages.len(), 3);
    for coverage in &doc.coverages {
        assert_eq!(coverage.ranges["2t"].len(), lats.len() * lons.len());
        assert_eq!(coverage.domain.len(), lats.len() * lons.len());
    }

    let timestamps: Vec<_> = doc.coverages.iter().filter_map(|c| c.timestamp()).collect();
    assert_eq!(
        timestamps,
        vec!["2023-01-01T00:00:00Z", "2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z"]
    );
}

#[test]
fn test_values_follow_composite_order() {
    let tree = date_param_tree(&[20230101], &[167, 228], &[10.0, 20.0], &[1.0, 2.0]);
    let doc = encode(&tree, GroupingAxes::Date);

    let coverage = &doc.coverages[0];
    assert_eq!(
        coverage.domain.axes.composite.values,
        vec![vec![10.0, 1.0], vec![10.0, 2.0], vec![20.0, 1.0], vec![20.0, 2.0]]
    );
    // each parameter owns a contiguous run of point values inside a leaf
    assert_eq!(
        range(&doc, 0, "2t"),
        vec![leaf_value(0, 0), leaf_value(0, 1), leaf_value(1, 0), leaf_value(1, 1)]
    );
    assert_eq!(
        range(&doc, 0, "tp"),
        vec![leaf_value(0, 2), leaf_value(0, 3), leaf_value(1, 2), leaf_value(1, 3)]
    );
}

#[test]
fn test_metadata_shared_between_coverages() {
    let tree = date_param_tree(&dates::TWO_DATES, &[167], &[10.0], &[1.0]);
    let doc = encode(&tree, GroupingAxes::Date);

    let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
    assert_eq!(json["coverages"][0]["mars:metadata"]["class"], "od");
    assert_eq!(json["coverages"][1]["mars:metadata"]["class"], "od");
    assert!(json["coverages"][0]["mars:metadata"].get("date").is_none());
}

// ============================================================================
// Grouping by date and level
// ============================================================================

#[test]
fn test_offset_layout_two_dates_two_levels_two_params() {
    let tree = date_level_tree(&dates::TWO_DATES, &[500, 850], &[167, 228], &[1.0], &[10.0]);
    let doc = encode(&tree, GroupingAxes::DateLevel);

    assert_eq!(doc.coverages.len(), 2);
    assert_eq!(range(&doc, 0, "2t"), vec![0.0, 2.0]);
    assert_eq!(range(&doc, 0, "tp"), vec![1.0, 3.0]);
    assert_eq!(range(&doc, 1, "2t"), vec![4.0, 6.0]);
    assert_eq!(range(&doc, 1, "tp"), vec![5.0, 7.0]);
}

#[test]
fn test_composite_count_is_levels_times_leaf_values() {
    let levels = [500, 700, 850];
    let lons = [1.0, 2.0, 3.0, 4.0];
    let tree = date_level_tree(&dates::TWO_DATES, &levels, &[130], &[45.0], &lons);
    let doc = encode(&tree, GroupingAxes::DateLevel);

    for coverage in &doc.coverages {
        assert_eq!(coverage.domain.len(), levels.len() * lons.len());
        assert_eq!(coverage.ranges["t"].len(), levels.len() * lons.len());
    }
    assert_eq!(doc.coverages[0].domain.axes.composite.values[0], vec![45.0, 1.0, 500.0]);
    assert_eq!(doc.coverages[0].domain.axes.composite.values[4], vec![45.0, 1.0, 700.0]);
}

#[test]
fn test_level_grouping_without_levelist() {
    let doc = encode(&single_point_tree(), GroupingAxes::DateLevel);
    assert_eq!(doc.coverages[0].domain.axes.composite.values, vec![vec![51.5, -0.1, 0.0]]);
}

// ============================================================================
// Grouping by date, number and step
// ============================================================================

#[test]
fn test_one_coverage_per_member_and_step() {
    let tree = ensemble_tree(&[20230101], &[1, 2], &[0, 6], &[167], &[1.0], &[10.0]);
    let doc = encode(&tree, GroupingAxes::DateNumberStep);

    assert_eq!(doc.coverages.len(), 4);
    let keys: Vec<(String, String)> = doc
        .coverages
        .iter()
        .map(|c| {
            (
                c.mars_metadata["number"].to_string(),
                c.mars_metadata["step"].to_string(),
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("1".to_string(), "0".to_string()),
            ("1".to_string(), "6".to_string()),
            ("2".to_string(), "0".to_string()),
            ("2".to_string(), "6".to_string()),
        ]
    );
    for (i, coverage) in doc.coverages.iter().enumerate() {
        assert_eq!(coverage.ranges["2t"].to_f64_vec(), vec![i as f64]);
        assert_eq!(coverage.mars_metadata["class"].to_string(), "od");
    }
}

#[test]
fn test_number_and_step_are_metadata_under_date_grouping() {
    let tree = ensemble_tree(&[20230101], &[3], &[12], &[167], &[1.0], &[10.0]);
    let doc = encode(&tree, GroupingAxes::Date);

    assert_eq!(doc.coverages.len(), 1);
    assert_eq!(doc.coverages[0].mars_metadata["number"].to_string(), "3");
    assert_eq!(doc.coverages[0].mars_metadata["step"].to_string(), "12");
}

// ============================================================================
// Document properties
// ============================================================================

#[test]
fn test_encoding_is_idempotent() {
    let tree = date_level_tree(
        &dates::TWO_DATES,
        &[500, 850],
        &[167, 228, 130],
        &[1.0, 2.0],
        &[3.0, 4.0],
    );
    let first = encode(&tree, GroupingAxes::DateLevel).to_json().unwrap();
    let second = encode(&tree, GroupingAxes::DateLevel).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_degenerate_single_value() {
    let doc = encode(&single_point_tree(), GroupingAxes::Date);

    assert_eq!(doc.coverages.len(), 1);
    assert_eq!(doc.coverages[0].ranges.len(), 1);
    assert_eq!(range(&doc, 0, "2t"), vec![280.5]);
    assert_eq!(doc.coverages[0].timestamp(), Some(dates::DATE_ISO));
}

#[test]
fn test_document_header() {
    let doc = encode(&single_point_tree(), GroupingAxes::Date);
    let json: serde_json::Value = serde_json::to_value(&doc).unwrap();

    assert_eq!(json["type"], "CoverageCollection");
    assert_eq!(json["domainType"], "MultiPoint");
    assert_eq!(json["referencing"][0]["coordinates"], serde_json::json!(["x", "y", "z"]));
    assert_eq!(json["parameters"]["2t"]["unit"]["symbol"], "K");
    assert_eq!(json["parameters"]["2t"]["observedProperty"]["id"], "2t");
    assert!(matches!(
        doc.referencing[0].system,
        ReferenceSystem::Geographic { ref id } if id == covjson::CRS84
    ));
}

#[test]
fn test_empty_branch_gives_zero_length_ranges() {
    let tree = ResultTree::root().with_child(
        ResultTree::node("date", vec![dates::DATE]).with_child(
            ResultTree::node("param", vec![167]).with_child(
                ResultTree::node("latitude", vec![1.0]).with_child(ResultTree::leaf(
                    "longitude",
                    Vec::<f64>::new(),
                    Vec::new(),
                )),
            ),
        ),
    );
    let doc = encode(&tree, GroupingAxes::Date);

    assert_eq!(doc.coverages.len(), 1);
    let coverage = &doc.coverages[0];
    assert_eq!(coverage.ranges["2t"].shape, vec![0]);
    assert!(coverage.ranges["2t"].values.is_empty());
    assert!(coverage.domain.axes.composite.values.is_empty());

    let json: serde_json::Value = serde_json::to_value(&doc).unwrap();
    assert_eq!(json["coverages"][0]["ranges"]["2t"]["values"], serde_json::json!([]));
    assert_eq!(
        json["coverages"][0]["domain"]["axes"]["composite"]["values"],
        serde_json::json!([])
    );
}

#[test]
fn test_malformed_leaf_aborts_encoding() {
    let tree = ResultTree::root().with_child(
        ResultTree::node("date", vec![20230101]).with_child(
            ResultTree::node("param", vec![167, 228]).with_child(
                ResultTree::node("latitude", vec![1.0])
                    .with_child(ResultTree::leaf("longitude", vec![2.0], vec![1.0, 2.0, 3.0])),
            ),
        ),
    );
    let err = Encoder::new(EncoderConfig::default(), test_catalog())
        .from_tree(&tree)
        .unwrap_err();
    assert!(matches!(
        err,
        CovJsonError::MalformedTree { expected: 2, actual: 3, .. }
    ));
}

#[test]
fn test_tree_from_json() {
    let tree: ResultTree = serde_json::from_str(test_utils::SINGLE_POINT_TREE_JSON).unwrap();
    let doc = encode(&tree, GroupingAxes::Date);
    assert_eq!(range(&doc, 0, "2t"), vec![280.5]);
}

// ============================================================================
// Configuration files
// ============================================================================

#[test]
fn test_encoder_from_config_file() {
    let config_file = write_temp_file(LEVEL_CONFIG_YAML, ".yaml");
    let config = EncoderConfig::load(config_file.path()).unwrap();
    assert_eq!(config.grouping, GroupingAxes::DateLevel);

    let doc = Encoder::from_config(config)
        .unwrap()
        .from_tree(&single_point_tree())
        .unwrap();
    assert_eq!(doc.coverages[0].domain.axes.composite.values[0].len(), 3);
}

#[test]
fn test_encoder_with_catalog_file() {
    let catalog_file = write_temp_file(CATALOG_YAML, ".yaml");
    let mut config = EncoderConfig::default();
    config.parameter_catalog = Some(catalog_file.path().to_path_buf());

    let encoder = Encoder::from_config(config).unwrap();
    assert_eq!(encoder.catalog().len(), 3);
}

#[test]
fn test_missing_catalog_file() {
    let mut config = EncoderConfig::default();
    config.parameter_catalog = Some("/nonexistent/catalog.yaml".into());
    assert!(matches!(
        Encoder::from_config(config),
        Err(CovJsonError::Io(_))
    ));
}
