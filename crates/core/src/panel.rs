//! Lab-panel field catalog and completeness rules.
//!
//! The screening form is a fixed panel of NHANES-coded lab fields. Seven
//! base fields are always required, and body composition must be supplied
//! either as the composite BMI value or as the height + weight pair. The
//! remaining fields are optional and only improve model accuracy.

use std::collections::BTreeMap;

use crate::error::CoreError;

/// Field values entered by the user, keyed by NHANES field code.
///
/// A `BTreeMap` keeps serialization and iteration order deterministic.
pub type LabValues = BTreeMap<String, f64>;

// ---------------------------------------------------------------------------
// Field catalog
// ---------------------------------------------------------------------------

/// Base fields that must always be present.
pub const REQUIRED_BASE: [&str; 7] = [
    "LBXHGB", "LBXMCVSI", "LBXMCHSI", "LBXRDW", "LBXRBCSI", "LBXHCT", "RIDAGEYR",
];

/// Composite body-mass field satisfying the alternative group on its own.
pub const BMI_COMPOSITE: &str = "BMXBMI";

/// Component pair satisfying the alternative group when both are present.
pub const BMI_COMPONENTS: [&str; 2] = ["BMXHT", "BMXWT"];

/// Sentinel reported when neither the composite field nor the component
/// pair is present.
pub const ALTERNATIVE_SENTINEL: &str = "BMXBMI_or_BMXHT_BMXWT";

/// Optional fields that improve model accuracy when provided.
pub const RECOMMENDED: [&str; 14] = [
    "LBXWBCSI", "LBXLYPCT", "LBXMOPCT", "LBXNEPCT", "LBXEOPCT", "LBXBAPCT",
    "LBXPLTSI", "LBXMPSI", "RIAGENDR", "LBXSGL", "LBXSCH", "BMXWAIST",
    "BP_SYS", "BP_DIA",
];

/// Number of slots counted by [`progress`]: the base fields plus one slot
/// for the satisfied alternative group.
pub const PROGRESS_TARGET: usize = REQUIRED_BASE.len() + 1;

/// Every field code the panel accepts, required fields first.
pub fn field_catalog() -> Vec<&'static str> {
    REQUIRED_BASE
        .into_iter()
        .chain([BMI_COMPOSITE])
        .chain(BMI_COMPONENTS)
        .chain(RECOMMENDED)
        .collect()
}

/// Whether `name` is a field code the panel knows about.
pub fn is_known_field(name: &str) -> bool {
    name == BMI_COMPOSITE
        || REQUIRED_BASE.contains(&name)
        || BMI_COMPONENTS.contains(&name)
        || RECOMMENDED.contains(&name)
}

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// Whether the body-composition alternative is satisfied: the composite
/// field is present, or both component fields are.
pub fn alternative_satisfied(values: &LabValues) -> bool {
    has(values, BMI_COMPOSITE) || BMI_COMPONENTS.iter().all(|name| has(values, name))
}

/// Names of unsatisfied requirements, in catalog order.
///
/// Missing base fields are listed by their own code; an unmet alternative
/// group is represented by [`ALTERNATIVE_SENTINEL`], appearing at most
/// once, after any base fields. Unknown field codes in `values` are
/// ignored.
pub fn missing_required(values: &LabValues) -> Vec<&'static str> {
    let mut missing: Vec<&'static str> = REQUIRED_BASE
        .into_iter()
        .filter(|name| !has(values, name))
        .collect();
    if !alternative_satisfied(values) {
        missing.push(ALTERNATIVE_SENTINEL);
    }
    missing
}

/// Number of satisfied required slots: present base fields, plus one iff
/// the alternative group is satisfied. Ranges from 0 to
/// [`PROGRESS_TARGET`].
pub fn progress(values: &LabValues) -> usize {
    let base = REQUIRED_BASE
        .into_iter()
        .filter(|name| has(values, name))
        .count();
    base + usize::from(alternative_satisfied(values))
}

/// Whether every requirement is satisfied.
pub fn is_complete(values: &LabValues) -> bool {
    missing_required(values).is_empty()
}

/// Build the submission payload from entered values.
///
/// Drops unknown field codes and non-finite values, then checks
/// completeness. Returns the filtered map ready for the wire, or a
/// validation error naming every unsatisfied requirement.
pub fn build_submission(values: &LabValues) -> Result<LabValues, CoreError> {
    let lab: LabValues = values
        .iter()
        .filter(|(name, value)| is_known_field(name) && value.is_finite())
        .map(|(name, value)| (name.clone(), *value))
        .collect();

    let missing = missing_required(&lab);
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(lab)
}

/// A field counts as present only when it holds a finite number; NaN and
/// infinities from upstream parsing are treated as absent.
fn has(values: &LabValues, name: &str) -> bool {
    values.get(name).is_some_and(|value| value.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
