//! Invariants over already-read values: axes, transformations and dataset
//! levels. Each rule reports independently so one document can surface
//! several defects at once.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::checker::Checker;
use crate::model::{Axis, AxisType, CoordinateTransformation, Dataset};
use crate::validation::{IssueCode, Location, ValidationIssue};

const MIN_AXES: usize = 2;
const MAX_AXES: usize = 5;
const MIN_SPACE_AXES: usize = 2;
const MAX_SPACE_AXES: usize = 3;

pub(crate) fn check_axes(c: &mut Checker<'_>, axes: &[Axis], loc: &Location) {
    if axes.len() < MIN_AXES {
        c.push(
            ValidationIssue::error(
                IssueCode::TooFewAxes,
                loc.clone(),
                format!("Expected at least {} axes, found {}", MIN_AXES, axes.len()),
            )
            .with("found", axes.len()),
        );
    }
    if axes.len() > MAX_AXES {
        c.push(
            ValidationIssue::error(
                IssueCode::TooManyAxes,
                loc.clone(),
                format!("Expected at most {} axes, found {}", MAX_AXES, axes.len()),
            )
            .with("found", axes.len()),
        );
    }

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, axis) in axes.iter().enumerate() {
        if let Some(&first) = first_seen.get(axis.name.as_str()) {
            c.push(
                ValidationIssue::error(
                    IssueCode::DuplicateAxisName,
                    loc.index(i).key("name"),
                    format!("Duplicate axis name '{}' (first at index {})", axis.name, first),
                )
                .with("found", axis.name.as_str())
                .with("first_index", first),
            );
        } else {
            first_seen.insert(axis.name.as_str(), i);
        }
    }

    let count = |wanted: &AxisType| axes.iter().filter(|a| &a.axis_type == wanted).count();
    let space = count(&AxisType::Space);
    let time = count(&AxisType::Time);
    let channel = count(&AxisType::Channel);

    if space < MIN_SPACE_AXES {
        c.push(
            ValidationIssue::error(
                IssueCode::TooFewSpaceAxes,
                loc.clone(),
                format!("Expected at least {} space axes, found {}", MIN_SPACE_AXES, space),
            )
            .with("found", space),
        );
    }
    if space > MAX_SPACE_AXES {
        c.push(
            ValidationIssue::error(
                IssueCode::TooManySpaceAxes,
                loc.clone(),
                format!("Expected at most {} space axes, found {}", MAX_SPACE_AXES, space),
            )
            .with("found", space),
        );
    }
    if time > 1 {
        c.push(
            ValidationIssue::error(
                IssueCode::TooManyTimeAxes,
                loc.clone(),
                format!("Expected at most one time axis, found {}", time),
            )
            .with("found", time),
        );
    }
    if channel > 1 {
        c.push(
            ValidationIssue::error(
                IssueCode::TooManyChannelAxes,
                loc.clone(),
                format!("Expected at most one channel axis, found {}", channel),
            )
            .with("found", channel),
        );
    }

    let ranks: Vec<u8> = axes.iter().map(|a| a.axis_type.order_rank()).collect();
    if ranks.windows(2).any(|w| w[0] > w[1]) {
        let found: Vec<&str> = axes.iter().map(|a| a.name.as_str()).collect();
        c.push(
            ValidationIssue::error(
                IssueCode::AxesOutOfOrder,
                loc.clone(),
                "Axes must be ordered time, then channel or custom, then space",
            )
            .with("found", found),
        );
    }
}

/// Checks one transformation list. `ndim` is the axis count when known.
pub(crate) fn check_transforms(
    c: &mut Checker<'_>,
    transforms: &[CoordinateTransformation],
    ndim: Option<usize>,
    loc: &Location,
) {
    let scales = transforms.iter().filter(|t| t.is_scale()).count();
    let translations = transforms.len() - scales;

    if scales != 1 {
        c.push(
            ValidationIssue::error(
                IssueCode::ScaleCount,
                loc.clone(),
                format!("Expected exactly one scale transformation, found {}", scales),
            )
            .with("found", scales),
        );
    }
    if translations > 1 {
        c.push(
            ValidationIssue::error(
                IssueCode::TooManyTranslations,
                loc.clone(),
                format!(
                    "Expected at most one translation transformation, found {}",
                    translations
                ),
            )
            .with("found", translations),
        );
    }
    let first_scale = transforms.iter().position(|t| t.is_scale());
    let first_translation = transforms.iter().position(|t| !t.is_scale());
    if let (Some(scale), Some(translation)) = (first_scale, first_translation) {
        if translation < scale {
            c.push(ValidationIssue::error(
                IssueCode::TranslationBeforeScale,
                loc.index(translation),
                "Translation must come after the scale transformation",
            ));
        }
    }

    let Some(ndim) = ndim else {
        return;
    };
    for (i, transform) in transforms.iter().enumerate() {
        if transform.ndim() != ndim {
            c.push(
                ValidationIssue::error(
                    IssueCode::TransformDimensionMismatch,
                    loc.index(i).key(transform.kind()),
                    format!(
                        "{} has {} values but there are {} axes",
                        transform.kind(),
                        transform.ndim(),
                        ndim
                    ),
                )
                .with("expected", ndim)
                .with("found", transform.ndim()),
            );
        }
    }
}

/// Checks the levels of one multiscale against each other.
pub(crate) fn check_datasets(
    c: &mut Checker<'_>,
    datasets: &[Dataset],
    space_axes: Option<&[usize]>,
    loc: &Location,
) {
    // Only meaningful when the axis count is unknown; otherwise each
    // transformation has already been compared against the axes.
    if space_axes.is_none() {
        if let Some(reference) = datasets.first().and_then(Dataset::ndim) {
            for (i, ds) in datasets.iter().enumerate().skip(1) {
                if let Some(ndim) = ds.ndim() {
                    if ndim != reference {
                        c.push(
                            ValidationIssue::error(
                                IssueCode::DatasetDimensionsDiffer,
                                loc.index(i),
                                format!(
                                    "Dataset has {} dimensions but the first dataset has {}",
                                    ndim, reference
                                ),
                            )
                            .with("expected", reference)
                            .with("found", ndim),
                        );
                    }
                }
            }
        }
    }

    if !c.rules.checks_dataset_order {
        return;
    }
    let Some(space_axes) = space_axes else {
        return;
    };
    let spatial: Option<Vec<Vec<f64>>> = datasets
        .iter()
        .map(|ds| {
            let scale = ds.scale()?;
            space_axes.iter().map(|&i| scale.get(i).copied()).collect()
        })
        .collect();
    let Some(spatial) = spatial else {
        return;
    };
    for (i, pair) in spatial.windows(2).enumerate() {
        if pair[0].partial_cmp(&pair[1]) == Some(Ordering::Greater) {
            c.push(
                ValidationIssue::error(
                    IssueCode::DatasetsNotOrdered,
                    loc.index(i + 1),
                    "Datasets must be ordered from highest to lowest resolution",
                )
                .with("previous_scale", pair[0].clone())
                .with("found", pair[1].clone()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionRules;
    use crate::schema::SchemaTable;
    use crate::validation::ValidationReport;

    fn run(rules: &'static VersionRules, f: impl FnOnce(&mut Checker<'_>)) -> ValidationReport {
        let table = SchemaTable::new();
        let mut c = Checker::new(&table, rules, false);
        f(&mut c);
        c.into_report()
    }

    fn codes(report: &ValidationReport) -> Vec<IssueCode> {
        report.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn valid_tczyx_axes() {
        let axes = vec![
            Axis::time("t"),
            Axis::channel("c"),
            Axis::space("z"),
            Axis::space("y"),
            Axis::space("x"),
        ];
        let report = run(&VersionRules::V05, |c| check_axes(c, &axes, &Location::root()));
        assert!(report.is_clean(), "{}", report);
    }

    #[test]
    fn each_axis_rule_has_its_own_code() {
        let dup = vec![Axis::channel("c"), Axis::channel("c")];
        let report = run(&VersionRules::V05, |c| check_axes(c, &dup, &Location::root()));
        let found = codes(&report);
        assert!(found.contains(&IssueCode::DuplicateAxisName));
        assert!(found.contains(&IssueCode::TooManyChannelAxes));
        assert!(found.contains(&IssueCode::TooFewSpaceAxes));

        let one = vec![Axis::space("x")];
        let report = run(&VersionRules::V05, |c| check_axes(c, &one, &Location::root()));
        assert!(codes(&report).contains(&IssueCode::TooFewAxes));

        let four_space: Vec<Axis> = ["w", "z", "y", "x"].into_iter().map(Axis::space).collect();
        let report = run(&VersionRules::V05, |c| check_axes(c, &four_space, &Location::root()));
        assert_eq!(codes(&report), vec![IssueCode::TooManySpaceAxes]);

        let two_times = vec![Axis::time("t"), Axis::time("u"), Axis::space("y"), Axis::space("x")];
        let report = run(&VersionRules::V05, |c| check_axes(c, &two_times, &Location::root()));
        assert_eq!(codes(&report), vec![IssueCode::TooManyTimeAxes]);
    }

    #[test]
    fn six_axes_are_too_many() {
        let axes = vec![
            Axis::time("t"),
            Axis::channel("c"),
            Axis::new("p", AxisType::Custom(Some("phase".into()))),
            Axis::space("z"),
            Axis::space("y"),
            Axis::space("x"),
        ];
        let report = run(&VersionRules::V05, |c| check_axes(c, &axes, &Location::root()));
        assert_eq!(codes(&report), vec![IssueCode::TooManyAxes]);
        assert_eq!(report.issues[0].context["found"], 6);
    }

    #[test]
    fn space_before_channel_is_out_of_order() {
        let axes = vec![Axis::space("y"), Axis::space("x"), Axis::channel("c")];
        let report = run(&VersionRules::V05, |c| check_axes(c, &axes, &Location::root()));
        assert_eq!(codes(&report), vec![IssueCode::AxesOutOfOrder]);
    }

    #[test]
    fn transform_rules() {
        let ok = vec![
            CoordinateTransformation::scale(vec![1.0, 1.0]),
            CoordinateTransformation::translation(vec![0.0, 0.0]),
        ];
        let report = run(&VersionRules::V05, |c| {
            check_transforms(c, &ok, Some(2), &Location::root())
        });
        assert!(report.is_clean());

        let reversed = vec![
            CoordinateTransformation::translation(vec![0.0, 0.0]),
            CoordinateTransformation::scale(vec![1.0, 1.0]),
        ];
        let report = run(&VersionRules::V05, |c| {
            check_transforms(c, &reversed, Some(2), &Location::root())
        });
        assert_eq!(codes(&report), vec![IssueCode::TranslationBeforeScale]);

        let no_scale = vec![
            CoordinateTransformation::translation(vec![0.0, 0.0]),
            CoordinateTransformation::translation(vec![1.0, 0.0]),
        ];
        let report = run(&VersionRules::V05, |c| {
            check_transforms(c, &no_scale, None, &Location::root())
        });
        assert_eq!(
            codes(&report),
            vec![IssueCode::ScaleCount, IssueCode::TooManyTranslations]
        );

        let wrong_len = vec![CoordinateTransformation::scale(vec![1.0, 1.0, 1.0])];
        let report = run(&VersionRules::V05, |c| {
            check_transforms(c, &wrong_len, Some(2), &Location::root())
        });
        assert_eq!(codes(&report), vec![IssueCode::TransformDimensionMismatch]);
        assert_eq!(report.issues[0].location.to_string(), "0.scale");
    }

    #[test]
    fn dataset_order_is_checked_for_05_only() {
        let datasets = vec![
            Dataset::new("0", vec![2.0, 2.0]),
            Dataset::new("1", vec![1.0, 1.0]),
        ];
        let space = [0usize, 1];

        let report = run(&VersionRules::V05, |c| {
            check_datasets(c, &datasets, Some(&space), &Location::root())
        });
        assert_eq!(codes(&report), vec![IssueCode::DatasetsNotOrdered]);
        assert_eq!(report.issues[0].location.to_string(), "1");

        let report = run(&VersionRules::V04, |c| {
            check_datasets(c, &datasets, Some(&space), &Location::root())
        });
        assert!(report.is_clean());
    }

    #[test]
    fn differing_dimensions_without_axes() {
        let datasets = vec![
            Dataset::new("0", vec![1.0, 1.0]),
            Dataset::new("1", vec![2.0, 2.0, 2.0]),
        ];
        let report = run(&VersionRules::V04, |c| {
            check_datasets(c, &datasets, None, &Location::root())
        });
        assert_eq!(codes(&report), vec![IssueCode::DatasetDimensionsDiffer]);
    }
}
