//! Synthetic result-tree generators.
//!
//! Every generator fills leaf results with predictable values so tests can
//! check where each value ends up after encoding.

use covjson::{AxisValue, ResultLayout, ResultTree};

/// Value stored at `offset` in the leaf under latitude number `lat_idx`.
///
/// Calculated as `lat_idx * 1000 + offset`, so a decoded value names both
/// the leaf it came from and its position in the leaf's result array.
///
/// # Example
///
/// ```
/// use test_utils::leaf_value;
///
/// assert_eq!(leaf_value(0, 7), 7.0);
/// assert_eq!(leaf_value(2, 3), 2003.0);
/// ```
pub fn leaf_value(lat_idx: usize, offset: usize) -> f64 {
    (lat_idx * 1000 + offset) as f64
}

fn leaf_results(lat_idx: usize, len: usize) -> Vec<f64> {
    (0..len).map(|offset| leaf_value(lat_idx, offset)).collect()
}

fn latitude_branches(layout: ResultLayout, lats: &[f64], lons: &[f64]) -> Vec<ResultTree> {
    let len = layout.expected_len();
    lats.iter()
        .enumerate()
        .map(|(i, &lat)| {
            ResultTree::node("latitude", vec![lat]).with_child(ResultTree::leaf(
                "longitude",
                lons.to_vec(),
                leaf_results(i, len),
            ))
        })
        .collect()
}

fn to_values(values: &[i64]) -> Vec<AxisValue> {
    values.iter().map(|&v| AxisValue::Int(v)).collect()
}

/// Tree over `class/date/param/latitude/longitude`.
///
/// Suitable for the `Date` grouping. Each latitude gets its own leaf holding
/// all longitudes.
///
/// # Example
///
/// ```
/// use test_utils::date_param_tree;
///
/// let tree = date_param_tree(&[20230101, 20230102], &[167], &[1.0, 2.0], &[10.0]);
/// assert_eq!(tree.leaf_count(), 2);
/// ```
pub fn date_param_tree(dates: &[i64], params: &[i64], lats: &[f64], lons: &[f64]) -> ResultTree {
    let layout = ResultLayout {
        dates: dates.len(),
        numbers: 1,
        steps: 1,
        levels: 1,
        points: lons.len(),
        params: params.len(),
    };

    ResultTree::root().with_child(
        ResultTree::node("class", vec!["od"]).with_child(
            ResultTree::node("date", to_values(dates)).with_child(
                ResultTree::node("param", to_values(params))
                    .with_children(latitude_branches(layout, lats, lons)),
            ),
        ),
    )
}

/// Tree over `class/date/levelist/param/latitude/longitude`.
///
/// Suitable for the `DateLevel` grouping.
pub fn date_level_tree(
    dates: &[i64],
    levels: &[i64],
    params: &[i64],
    lats: &[f64],
    lons: &[f64],
) -> ResultTree {
    let layout = ResultLayout {
        dates: dates.len(),
        numbers: 1,
        steps: 1,
        levels: levels.len(),
        points: lons.len(),
        params: params.len(),
    };

    ResultTree::root().with_child(
        ResultTree::node("class", vec!["od"]).with_child(
            ResultTree::node("date", to_values(dates)).with_child(
                ResultTree::node("levelist", to_values(levels)).with_child(
                    ResultTree::node("param", to_values(params))
                        .with_children(latitude_branches(layout, lats, lons)),
                ),
            ),
        ),
    )
}

/// Tree over `class/date/number/step/param/latitude/longitude`.
///
/// Suitable for the `DateNumberStep` grouping.
pub fn ensemble_tree(
    dates: &[i64],
    numbers: &[i64],
    steps: &[i64],
    params: &[i64],
    lats: &[f64],
    lons: &[f64],
) -> ResultTree {
    let layout = ResultLayout {
        dates: dates.len(),
        numbers: numbers.len(),
        steps: steps.len(),
        levels: 1,
        points: lons.len(),
        params: params.len(),
    };

    ResultTree::root().with_child(
        ResultTree::node("class", vec!["od"]).with_child(
            ResultTree::node("date", to_values(dates)).with_child(
                ResultTree::node("number", to_values(numbers)).with_child(
                    ResultTree::node("step", to_values(steps)).with_child(
                        ResultTree::node("param", to_values(params))
                            .with_children(latitude_branches(layout, lats, lons)),
                    ),
                ),
            ),
        ),
    )
}

/// Evenly spaced coordinates starting at `start`.
pub fn coordinate_range(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}
