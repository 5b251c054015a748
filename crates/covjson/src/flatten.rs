//! Flattening of result trees into per-group coordinate and value lists.
//!
//! The flattener walks the tree depth-first. Internal nodes narrow the
//! active dates, levels, parameters (and optionally ensemble numbers and
//! steps) for their subtree; every leaf then contributes one composite
//! coordinate per (level, point) and one value per (level, point, parameter)
//! to each group on its path.
//!
//! # Result layout
//!
//! A leaf's `result` array is a dense row-major block whose dimensions are
//! given by [`LAYOUT_ORDER`], outermost first. The spatial point varies
//! fastest, so each parameter's values for one leaf form a contiguous run;
//! then come parameter, level, step, number and finally date. With one point
//! and no number/step axes the offset reduces to
//! `param + date * (levels * params) + level * params`.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::GroupingAxes;
use crate::coverage_json::MarsMetadata;
use crate::error::{CovJsonError, CovJsonResult};
use crate::tree::{AxisRole, AxisValue, ResultTree};

/// Level used for composite tuples when the tree has no `levelist` axis.
pub const IMPLICIT_LEVEL: f64 = 0.0;

/// Dimensions of a leaf result array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDim {
    Date,
    Number,
    Step,
    Level,
    Point,
    Param,
}

/// Nesting of the leaf result array, outermost first, fastest last.
pub const LAYOUT_ORDER: [LayoutDim; 6] = [
    LayoutDim::Date,
    LayoutDim::Number,
    LayoutDim::Step,
    LayoutDim::Level,
    LayoutDim::Param,
    LayoutDim::Point,
];

/// Index of one value inside a leaf result array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutIndex {
    pub date: usize,
    pub number: usize,
    pub step: usize,
    pub level: usize,
    pub point: usize,
    pub param: usize,
}

impl LayoutIndex {
    fn get(&self, dim: LayoutDim) -> usize {
        match dim {
            LayoutDim::Date => self.date,
            LayoutDim::Number => self.number,
            LayoutDim::Step => self.step,
            LayoutDim::Level => self.level,
            LayoutDim::Point => self.point,
            LayoutDim::Param => self.param,
        }
    }
}

/// Cardinalities of the dimensions of one leaf's result array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultLayout {
    pub dates: usize,
    pub numbers: usize,
    pub steps: usize,
    pub levels: usize,
    pub points: usize,
    pub params: usize,
}

impl ResultLayout {
    fn extent(&self, dim: LayoutDim) -> usize {
        match dim {
            LayoutDim::Date => self.dates,
            LayoutDim::Number => self.numbers,
            LayoutDim::Step => self.steps,
            LayoutDim::Level => self.levels,
            LayoutDim::Point => self.points,
            LayoutDim::Param => self.params,
        }
    }

    /// Number of results a leaf with this layout must carry.
    pub fn expected_len(&self) -> usize {
        LAYOUT_ORDER.iter().map(|&dim| self.extent(dim)).product()
    }

    /// Linear offset of `index` in the result array.
    pub fn offset(&self, index: LayoutIndex) -> usize {
        LAYOUT_ORDER
            .iter()
            .fold(0, |acc, &dim| acc * self.extent(dim) + index.get(dim))
    }
}

/// Key of one output coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub date: String,
    pub number: Option<String>,
    pub step: Option<String>,
}

/// Coordinates and values collected for one coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBucket {
    pub key: GroupKey,
    /// ISO 8601 timestamp of the date.
    pub timestamp: String,
    pub number: Option<AxisValue>,
    pub step: Option<AxisValue>,
    /// Composite tuples, index-aligned with every range list.
    pub composite: Vec<Vec<f64>>,
    /// Values per raw parameter id.
    pub ranges: BTreeMap<String, Vec<f64>>,
}

/// Output of [`flatten`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedTree {
    /// Scalar metadata from axes that do not vary under the grouping.
    pub metadata: MarsMetadata,
    /// Raw parameter ids in first-seen order.
    pub parameters: Vec<String>,
    /// Groups in first-seen order.
    pub groups: Vec<GroupBucket>,
}

/// Flatten a result tree under the given grouping.
pub fn flatten(tree: &ResultTree, grouping: GroupingAxes) -> CovJsonResult<FlattenedTree> {
    let mut ctx = FlattenContext::new(grouping);
    ctx.visit(tree, PathState::default())?;

    debug!(
        grouping = %grouping,
        leaves = ctx.leaves,
        groups = ctx.out.groups.len(),
        parameters = ctx.out.parameters.len(),
        "Flattened result tree"
    );
    Ok(ctx.out)
}

/// Selections active on the path from the root to the current node.
#[derive(Debug, Clone, Copy, Default)]
struct PathState<'a> {
    dates: &'a [AxisValue],
    numbers: Option<&'a [AxisValue]>,
    steps: Option<&'a [AxisValue]>,
    levels: Option<&'a [AxisValue]>,
    params: &'a [AxisValue],
    lat: f64,
}

/// A group key with the axis values it was built from.
struct GroupSlot<'a> {
    key: GroupKey,
    date: &'a AxisValue,
    number: Option<&'a AxisValue>,
    step: Option<&'a AxisValue>,
}

/// Accumulators owned by one flatten call.
struct FlattenContext<'a> {
    grouping: GroupingAxes,
    out: FlattenedTree,
    index: HashMap<GroupKey, usize>,
    trail: Vec<&'a str>,
    leaves: usize,
}

impl<'a> FlattenContext<'a> {
    fn new(grouping: GroupingAxes) -> Self {
        Self {
            grouping,
            out: FlattenedTree::default(),
            index: HashMap::new(),
            trail: Vec::new(),
            leaves: 0,
        }
    }

    fn visit(&mut self, node: &'a ResultTree, state: PathState<'a>) -> CovJsonResult<()> {
        if node.is_leaf() {
            return self.visit_leaf(node, &state);
        }

        for child in &node.children {
            let mut next = state;
            let role = child.role();

            if !self.grouping.varies(role) {
                self.record_metadata(child);
            } else {
                match role {
                    AxisRole::Date => {
                        next.dates = child.values.as_slice();
                        if !self.grouping.splits_members() {
                            self.ensure_groups(&next);
                        }
                    }
                    AxisRole::Number => next.numbers = Some(child.values.as_slice()),
                    AxisRole::Step => next.steps = Some(child.values.as_slice()),
                    AxisRole::Levelist => next.levels = Some(child.values.as_slice()),
                    AxisRole::Param => {
                        next.params = child.values.as_slice();
                        self.register_params(&next);
                    }
                    AxisRole::Latitude => match child.values.first() {
                        Some(lat) => next.lat = lat.as_f64(&child.axis)?,
                        None => {
                            warn!(
                                path = %self.path(),
                                "Latitude node without values, skipping branch"
                            );
                            continue;
                        }
                    },
                    AxisRole::Longitude | AxisRole::Other => {}
                }
            }

            self.trail.push(child.axis.as_str());
            self.visit(child, next)?;
            self.trail.pop();
        }
        Ok(())
    }

    fn visit_leaf(&mut self, leaf: &'a ResultTree, state: &PathState<'a>) -> CovJsonResult<()> {
        self.leaves += 1;

        let layout = ResultLayout {
            dates: state.dates.len(),
            numbers: state.numbers.map_or(1, <[AxisValue]>::len),
            steps: state.steps.map_or(1, <[AxisValue]>::len),
            levels: state.levels.map_or(1, <[AxisValue]>::len),
            points: leaf.values.len(),
            params: state.params.len(),
        };

        let expected = layout.expected_len();
        if expected == 0 {
            debug!(path = %self.path(), ?layout, "Empty axis on path, leaf contributes nothing");
            return Ok(());
        }
        if leaf.result.len() != expected {
            return Err(CovJsonError::MalformedTree {
                path: self.path(),
                expected,
                actual: leaf.result.len(),
            });
        }

        let points = leaf
            .values
            .iter()
            .map(|v| v.as_f64(&leaf.axis))
            .collect::<CovJsonResult<Vec<f64>>>()?;

        let levels = match state.levels {
            Some(levels) => levels
                .iter()
                .map(|v| v.as_f64("levelist"))
                .collect::<CovJsonResult<Vec<f64>>>()?,
            None => vec![IMPLICIT_LEVEL],
        };

        let params: Vec<String> = state.params.iter().map(ToString::to_string).collect();
        let with_level = self.grouping.has_level();
        let groups = self.ensure_groups(state);

        // ensure_groups yields buckets nested date > number > step, matching the layout.
        for (g, &bucket_idx) in groups.iter().enumerate() {
            let step = g % layout.steps;
            let number = (g / layout.steps) % layout.numbers;
            let date = g / (layout.steps * layout.numbers);

            let bucket = &mut self.out.groups[bucket_idx];
            for &level in &levels {
                for &point in &points {
                    bucket.composite.push(if with_level {
                        vec![state.lat, point, level]
                    } else {
                        vec![state.lat, point]
                    });
                }
            }

            for level in 0..layout.levels {
                for point in 0..layout.points {
                    for (param, key) in params.iter().enumerate() {
                        let offset = layout.offset(LayoutIndex {
                            date,
                            number,
                            step,
                            level,
                            point,
                            param,
                        });
                        bucket
                            .ranges
                            .entry(key.clone())
                            .or_default()
                            .push(leaf.result[offset]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Metadata accumulator: the first value seen for each non-varying axis.
    fn record_metadata(&mut self, node: &ResultTree) {
        if let Some(value) = node.values.first() {
            self.out
                .metadata
                .entry(node.axis.clone())
                .or_insert_with(|| value.clone());
        }
    }

    fn register_params(&mut self, state: &PathState<'a>) {
        for param in state.params {
            let id = param.to_string();
            if !self.out.parameters.contains(&id) {
                self.out.parameters.push(id);
            }
        }
        for idx in self.existing_groups(state) {
            let bucket = &mut self.out.groups[idx];
            for param in state.params {
                bucket.ranges.entry(param.to_string()).or_default();
            }
        }
    }

    /// Group keys on the current path, nested date > number > step.
    fn group_keys(&self, state: &PathState<'a>) -> Vec<GroupSlot<'a>> {
        let numbers: Vec<Option<&'a AxisValue>> = match state.numbers {
            Some(values) => values.iter().map(Some).collect(),
            None => vec![None],
        };
        let steps: Vec<Option<&'a AxisValue>> = match state.steps {
            Some(values) => values.iter().map(Some).collect(),
            None => vec![None],
        };

        let mut slots = Vec::with_capacity(state.dates.len() * numbers.len() * steps.len());
        for date in state.dates {
            for &number in &numbers {
                for &step in &steps {
                    let key = GroupKey {
                        date: date.to_string(),
                        number: number.map(ToString::to_string),
                        step: step.map(ToString::to_string),
                    };
                    slots.push(GroupSlot {
                        key,
                        date,
                        number,
                        step,
                    });
                }
            }
        }
        slots
    }

    fn existing_groups(&self, state: &PathState<'a>) -> Vec<usize> {
        self.group_keys(state)
            .into_iter()
            .filter_map(|slot| self.index.get(&slot.key).copied())
            .collect()
    }

    /// Get or create the buckets for every group on the path.
    fn ensure_groups(&mut self, state: &PathState<'a>) -> Vec<usize> {
        let keys = self.group_keys(state);
        let mut indices = Vec::with_capacity(keys.len());

        for GroupSlot {
            key,
            date,
            number,
            step,
        } in keys
        {
            let idx = match self.index.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = self.out.groups.len();
                    self.out.groups.push(GroupBucket {
                        key: key.clone(),
                        timestamp: date.to_timestamp(),
                        number: number.cloned(),
                        step: step.cloned(),
                        composite: Vec::new(),
                        ranges: BTreeMap::new(),
                    });
                    self.index.insert(key, idx);
                    idx
                }
            };

            let bucket = &mut self.out.groups[idx];
            for param in state.params {
                bucket.ranges.entry(param.to_string()).or_default();
            }
            indices.push(idx);
        }
        indices
    }

    fn path(&self) -> String {
        if self.trail.is_empty() {
            "root".to_string()
        } else {
            self.trail.join("/")
        }
    }
}
