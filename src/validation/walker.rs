//! The depth-first walk behind [`validate_group`](super::validate_group).
//!
//! Each `visit_*` method checks one node kind against the store and recurses
//! into the children its metadata references. Issues are appended to the
//! caller's report; nothing short-circuits except a branch whose node is
//! missing or of the wrong type.

use std::panic;
use std::thread;

use serde_json::json;
use tracing::{debug, warn};

use super::{IssueCode, Location, ValidateOptions, ValidationIssue, ValidationReport};
use crate::error::StoreError;
use crate::model::{
    Collection, Image, LabelImage, LabelsGroup, Multiscale, NodeKind, OmeDocument, OmeNode,
    Plate, PlateDef, PlateWell, Series, SpecVersion, VersionRules, Well,
};
use crate::schema::{column_out_of_range, row_out_of_range, MetadataValidator};
use crate::store::{join_path, open_node, Store, ZarrNode};

/// Numbered bioformats2raw children probed before giving up.
const MAX_NUMBERED_SERIES: usize = 10_000;

/// The chain of groups from the walk's root to the current node.
#[derive(Debug)]
pub(crate) struct Trail<'p> {
    path: &'p str,
    depth: usize,
    parent: Option<&'p Trail<'p>>,
}

impl<'p> Trail<'p> {
    pub(crate) fn root(path: &'p str) -> Self {
        Self {
            path,
            depth: 0,
            parent: None,
        }
    }

    fn child<'c>(&'c self, path: &'c str) -> Trail<'c> {
        Trail {
            path,
            depth: self.depth + 1,
            parent: Some(self),
        }
    }

    fn contains(&self, path: &str) -> bool {
        let mut current = Some(self);
        while let Some(trail) = current {
            if trail.path == path {
                return true;
            }
            current = trail.parent;
        }
        false
    }
}

enum Resolved {
    Found(ZarrNode),
    Missing(String),
    /// A store fault, already reported.
    Failed,
}

pub(crate) struct Walker<'a> {
    store: &'a dyn Store,
    validator: MetadataValidator<'a>,
    version: SpecVersion,
    rules: &'static VersionRules,
    jobs: usize,
    max_depth: usize,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        store: &'a dyn Store,
        validator: MetadataValidator<'a>,
        version: SpecVersion,
        opts: &ValidateOptions,
    ) -> Self {
        Self {
            store,
            validator,
            version,
            rules: version.rules(),
            jobs: opts.jobs.max(1),
            max_depth: opts.max_depth,
        }
    }

    pub(crate) fn visit(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        metadata: &OmeNode,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        debug!(path = %node.path, kind = %metadata.kind(), "visiting node");
        match metadata {
            OmeNode::Image(image) => self.visit_image(trail, node, image, loc, report),
            OmeNode::LabelImage(label) => self.visit_label_image(node, label, loc, report),
            OmeNode::LabelsGroup(group) => {
                self.visit_labels_group(trail, node, group, None, loc, report)
            }
            OmeNode::Plate(plate) => self.visit_plate(trail, node, plate, loc, report),
            OmeNode::Well(well) => self.visit_well(trail, node, well, None, loc, report),
            OmeNode::Collection(collection) => {
                self.visit_collection(trail, node, collection, loc, report)
            }
            OmeNode::Series(series) => self.visit_series(trail, node, series, loc, report),
        }
    }

    fn visit_image(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        image: &Image,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        self.check_levels(node, image, false, loc, report);

        let labels_loc = loc.key("labels");
        let labels = match self.resolve(&node.path, "labels", &labels_loc, report) {
            Resolved::Found(labels) => labels,
            Resolved::Missing(_) | Resolved::Failed => return,
        };
        let fs_path = self.store.fs_path(&labels.path);
        if !labels.is_group() {
            report.add(
                ValidationIssue::error(
                    IssueCode::LabelsNotGroup,
                    labels_loc,
                    "'labels' exists but is not a group",
                )
                .with("expected", "group")
                .with("found", labels.kind_name())
                .with("fs_path", fs_path),
            );
            return;
        }
        let Some(trail) = self.enter(trail, &labels, &labels_loc, report) else {
            return;
        };
        let Some(document) = self.expect_child(
            &labels,
            &[NodeKind::LabelsGroup],
            IssueCode::LabelsMetadataInvalid,
            &labels_loc,
            report,
        ) else {
            return;
        };
        if let OmeNode::LabelsGroup(group) = &document.node {
            self.visit_labels_group(&trail, &labels, group, Some(image), &labels_loc, report);
        }
    }

    /// Checks every dataset of every multiscale against the array it names.
    fn check_levels(
        &self,
        node: &ZarrNode,
        image: &Image,
        integer_only: bool,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        for (i, multiscale) in image.multiscales.iter().enumerate() {
            let datasets_loc = loc.key("multiscales").index(i).key("datasets");
            for (j, dataset) in multiscale.datasets.iter().enumerate() {
                let dataset_loc = datasets_loc.index(j);
                self.check_dataset(
                    node,
                    multiscale,
                    &dataset.path,
                    integer_only,
                    &dataset_loc,
                    report,
                );
            }
        }
    }

    fn check_dataset(
        &self,
        node: &ZarrNode,
        multiscale: &Multiscale,
        path: &str,
        integer_only: bool,
        dataset_loc: &Location,
        report: &mut ValidationReport,
    ) {
        let path_loc = dataset_loc.key("path");
        let array_node = match self.resolve(&node.path, path, &path_loc, report) {
            Resolved::Found(array_node) => array_node,
            Resolved::Missing(fs_path) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::DatasetPathNotFound,
                        path_loc,
                        format!("Dataset '{}' does not exist", path),
                    )
                    .with("fs_path", fs_path),
                );
                return;
            }
            Resolved::Failed => return,
        };
        let fs_path = self.store.fs_path(&array_node.path);
        let Some(array) = array_node.as_array() else {
            report.add(
                ValidationIssue::error(
                    IssueCode::DatasetNotArray,
                    path_loc,
                    format!("Dataset '{}' is a group, not an array", path),
                )
                .with("expected", "array")
                .with("found", "group")
                .with("fs_path", fs_path),
            );
            return;
        };

        let axis_names = multiscale.axis_names();
        if array.ndim() != axis_names.len() {
            report.add(
                ValidationIssue::error(
                    IssueCode::DatasetDimensionMismatch,
                    path_loc.clone(),
                    format!(
                        "Array has {} dimension(s) but the multiscale declares {} axes",
                        array.ndim(),
                        axis_names.len()
                    ),
                )
                .with("expected", axis_names.len())
                .with("found", array.ndim())
                .with("fs_path", fs_path.clone()),
            );
        } else {
            match &array.dimension_names {
                None if self.rules.requires_dimension_names => report.add(
                    ValidationIssue::error(
                        IssueCode::DimensionNamesMismatch,
                        dataset_loc.key("dimension_names"),
                        "Array declares no dimension_names",
                    )
                    .with("expected", json!(axis_names))
                    .with("found", json!(null))
                    .with("fs_path", fs_path.clone()),
                ),
                None => {}
                Some(names) => {
                    let found: Vec<Option<&str>> = names.iter().map(Option::as_deref).collect();
                    let matches = found.len() == axis_names.len()
                        && found
                            .iter()
                            .zip(&axis_names)
                            .all(|(name, axis)| *name == Some(*axis));
                    if !matches {
                        report.add(
                            ValidationIssue::error(
                                IssueCode::DimensionNamesMismatch,
                                dataset_loc.key("dimension_names"),
                                "Array dimension_names differ from the axis names",
                            )
                            .with("expected", json!(axis_names))
                            .with("found", json!(found))
                            .with("fs_path", fs_path.clone()),
                        );
                    }
                }
            }
        }

        if integer_only && !array.data_type.is_integer() {
            report.add(
                ValidationIssue::error(
                    IssueCode::LabelNonIntegerDtype,
                    path_loc,
                    format!(
                        "Label arrays must hold integers, found '{}'",
                        array.data_type.raw
                    ),
                )
                .with("expected", "integer")
                .with("found", array.data_type.raw.clone())
                .with("fs_path", fs_path),
            );
        }
    }

    fn visit_labels_group(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        group: &LabelsGroup,
        parent: Option<&Image>,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        for (i, name) in group.labels.iter().enumerate() {
            let label_loc = loc.key("labels").index(i);
            let label_node = match self.resolve(&node.path, name, &label_loc, report) {
                Resolved::Found(label_node) => label_node,
                Resolved::Missing(fs_path) => {
                    report.add(
                        ValidationIssue::error(
                            IssueCode::LabelPathNotFound,
                            label_loc,
                            format!("Label '{}' does not exist", name),
                        )
                        .with("fs_path", fs_path),
                    );
                    continue;
                }
                Resolved::Failed => continue,
            };
            if !label_node.is_group() {
                report.add(
                    ValidationIssue::error(
                        IssueCode::LabelPathNotGroup,
                        label_loc,
                        format!("Label '{}' is an array, not a group", name),
                    )
                    .with("expected", "group")
                    .with("found", "array")
                    .with("fs_path", self.store.fs_path(&label_node.path)),
                );
                continue;
            }
            if self.enter(trail, &label_node, &label_loc, report).is_none() {
                continue;
            }
            let Some(document) = self.expect_child(
                &label_node,
                &[NodeKind::LabelImage, NodeKind::Image],
                IssueCode::LabelImageInvalid,
                &label_loc,
                report,
            ) else {
                continue;
            };

            let label_image = match &document.node {
                OmeNode::LabelImage(label) => {
                    self.visit_label_image(&label_node, label, &label_loc, report);
                    &label.image
                }
                OmeNode::Image(image) => {
                    report.add(
                        ValidationIssue::warning(
                            IssueCode::LabelImageInvalid,
                            label_loc.clone(),
                            format!("Label '{}' has no image-label metadata", name),
                        )
                        .with("fs_path", self.store.fs_path(&label_node.path)),
                    );
                    self.check_levels(&label_node, image, true, &label_loc, report);
                    image
                }
                _ => continue,
            };
            if let Some(parent) = parent {
                check_label_counts(parent, label_image, &label_loc, report);
            }
        }
    }

    fn visit_label_image(
        &self,
        node: &ZarrNode,
        label: &LabelImage,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        self.check_levels(node, &label.image, true, loc, report);

        let Some(source) = label.image_label.source_image() else {
            return;
        };
        let source_loc = loc.key("image-label").key("source").key("image");
        let source_node = match self.resolve(&node.path, source, &source_loc, report) {
            Resolved::Found(source_node) => source_node,
            Resolved::Missing(fs_path) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::LabelImageSourceNotFound,
                        source_loc,
                        format!("Source image '{}' does not exist", source),
                    )
                    .with("fs_path", fs_path),
                );
                return;
            }
            Resolved::Failed => return,
        };
        let fs_path = self.store.fs_path(&source_node.path);
        let found = if source_node.is_group() {
            match self
                .validator
                .validate_document_as(&source_node.document, self.version)
            {
                Ok(validated) if validated.value.kind() == NodeKind::Image => return,
                Ok(validated) => validated.value.kind().as_str(),
                Err(_) => "invalid metadata",
            }
        } else {
            "array"
        };
        report.add(
            ValidationIssue::error(
                IssueCode::LabelImageSourceInvalid,
                source_loc,
                format!("Source '{}' is not an image group", source),
            )
            .with("expected", NodeKind::Image.as_str())
            .with("found", found)
            .with("fs_path", fs_path),
        );
    }

    fn visit_plate(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        plate: &Plate,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        let def = &plate.plate;
        let wells_loc = loc.key("plate").key("wells");
        let wells = self.for_each_indexed(&def.wells, |i, well| {
            let mut part = ValidationReport::new();
            self.visit_plate_well(trail, node, def, well, &wells_loc.index(i), &mut part);
            part
        });
        report.merge(wells);
    }

    fn visit_plate_well(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        def: &PlateDef,
        well: &PlateWell,
        well_loc: &Location,
        report: &mut ValidationReport,
    ) {
        if well.row_index >= def.rows.len() {
            report.add(row_out_of_range(well_loc, well.row_index, def.rows.len()));
        }
        if well.column_index >= def.columns.len() {
            report.add(column_out_of_range(
                well_loc,
                well.column_index,
                def.columns.len(),
            ));
        }

        let well_node = match self.resolve(&node.path, &well.path, well_loc, report) {
            Resolved::Found(well_node) => well_node,
            Resolved::Missing(fs_path) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::WellPathNotFound,
                        well_loc.key("path"),
                        format!("Well '{}' does not exist", well.path),
                    )
                    .with("fs_path", fs_path),
                );
                return;
            }
            Resolved::Failed => return,
        };
        if !well_node.is_group() {
            report.add(
                ValidationIssue::error(
                    IssueCode::WellPathNotGroup,
                    well_loc.key("path"),
                    format!("Well '{}' is an array, not a group", well.path),
                )
                .with("expected", "group")
                .with("found", "array")
                .with("fs_path", self.store.fs_path(&well_node.path)),
            );
            return;
        }
        let Some(trail) = self.enter(trail, &well_node, well_loc, report) else {
            return;
        };
        let Some(document) = self.expect_child(
            &well_node,
            &[NodeKind::Well],
            IssueCode::WellInvalid,
            well_loc,
            report,
        ) else {
            return;
        };
        if let OmeNode::Well(parsed) = &document.node {
            self.visit_well(&trail, &well_node, parsed, Some(def), well_loc, report);
        }
    }

    fn visit_well(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        well: &Well,
        plate: Option<&PlateDef>,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        for (j, field) in well.well.images.iter().enumerate() {
            let field_loc = loc.key("well").key("images").index(j);

            if let (Some(acquisition), Some(plate)) = (field.acquisition, plate) {
                if plate.acquisitions.is_some() && !plate.declares_acquisition(acquisition) {
                    report.add(
                        ValidationIssue::error(
                            IssueCode::FieldAcquisitionUnknown,
                            field_loc.key("acquisition"),
                            format!(
                                "Acquisition {} is not declared by the plate",
                                acquisition
                            ),
                        )
                        .with("found", acquisition),
                    );
                }
            }

            let field_node = match self.resolve(&node.path, &field.path, &field_loc, report) {
                Resolved::Found(field_node) => field_node,
                Resolved::Missing(fs_path) => {
                    report.add(
                        ValidationIssue::error(
                            IssueCode::FieldPathNotFound,
                            field_loc.key("path"),
                            format!("Field of view '{}' does not exist", field.path),
                        )
                        .with("fs_path", fs_path),
                    );
                    continue;
                }
                Resolved::Failed => continue,
            };
            if !field_node.is_group() {
                report.add(
                    ValidationIssue::error(
                        IssueCode::FieldPathNotGroup,
                        field_loc.key("path"),
                        format!("Field of view '{}' is an array, not a group", field.path),
                    )
                    .with("expected", "group")
                    .with("found", "array")
                    .with("fs_path", self.store.fs_path(&field_node.path)),
                );
                continue;
            }
            self.visit_image_child(
                trail,
                &field_node,
                IssueCode::FieldImageInvalid,
                &field_loc,
                report,
            );
        }
    }

    /// Descends into a group that must hold an Image.
    fn visit_image_child(
        &self,
        trail: &Trail<'_>,
        child: &ZarrNode,
        invalid: IssueCode,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        let Some(trail) = self.enter(trail, child, loc, report) else {
            return;
        };
        let Some(document) = self.expect_child(child, &[NodeKind::Image], invalid, loc, report)
        else {
            return;
        };
        if let OmeNode::Image(image) = &document.node {
            self.visit_image(&trail, child, image, loc, report);
        }
    }

    fn visit_collection(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        collection: &Collection,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        let ome_loc = loc.key("OME");
        let ome = match self.resolve(&node.path, "OME", &ome_loc, report) {
            Resolved::Found(ome) if ome.is_group() => Some(ome),
            Resolved::Found(ome) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::CollectionMetadataMissing,
                        ome_loc.clone(),
                        "'OME' exists but is not a group",
                    )
                    .with("expected", "group")
                    .with("found", "array")
                    .with("fs_path", self.store.fs_path(&ome.path)),
                );
                None
            }
            Resolved::Missing(fs_path) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::CollectionMetadataMissing,
                        ome_loc.clone(),
                        "Collection has no 'OME' metadata group",
                    )
                    .with("fs_path", fs_path),
                );
                None
            }
            Resolved::Failed => None,
        };

        if let Some(series) = &collection.series {
            self.check_series_list(trail, &node.path, series, &loc.key("series"), report);
            return;
        }
        if let Some(ome) = &ome {
            if let Some(series) = self.read_ome_series(ome, &ome_loc, report) {
                let series_loc = ome_loc.key("series");
                self.check_series_list(trail, &node.path, &series.series, &series_loc, report);
                return;
            }
        }
        self.probe_numbered_images(trail, node, loc, report);
    }

    /// The series list kept in a collection's `OME` group, if it has one.
    fn read_ome_series(
        &self,
        ome: &ZarrNode,
        ome_loc: &Location,
        report: &mut ValidationReport,
    ) -> Option<Series> {
        let fs_path = self.store.fs_path(&ome.path);
        match self
            .validator
            .validate_document_as(&ome.document, self.version)
        {
            Ok(validated) => match validated.value.node {
                OmeNode::Series(series) => {
                    report.merge_prefixed(ome_loc, validated.warnings);
                    Some(series)
                }
                other => {
                    report.add(
                        ValidationIssue::error(
                            IssueCode::SeriesMetadataInvalid,
                            ome_loc.clone(),
                            format!("'OME' group holds {} metadata", other.kind()),
                        )
                        .with("expected", NodeKind::Series.as_str())
                        .with("found", other.kind().as_str())
                        .with("fs_path", fs_path),
                    );
                    None
                }
            },
            // No series marker at all: the collection is plainly numbered.
            Err(errors)
                if errors.has(IssueCode::UnionTagNotFound)
                    || errors.has(IssueCode::InvalidEnvelope) =>
            {
                None
            }
            Err(errors) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::SeriesMetadataInvalid,
                        ome_loc.clone(),
                        "'OME' group has an invalid series list",
                    )
                    .with("errors", errors.summary())
                    .with("fs_path", fs_path),
                );
                None
            }
        }
    }

    fn visit_series(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        series: &Series,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        // Series paths name siblings of the OME group.
        let base = if node.path.is_empty() {
            String::new()
        } else {
            join_path(&node.path, "..").unwrap_or_default()
        };
        self.check_series_list(trail, &base, &series.series, &loc.key("series"), report);
    }

    fn check_series_list(
        &self,
        trail: &Trail<'_>,
        base: &str,
        series: &[String],
        list_loc: &Location,
        report: &mut ValidationReport,
    ) {
        let checked = self.for_each_indexed(series, |i, path| {
            let mut part = ValidationReport::new();
            self.check_series_entry(trail, base, path, &list_loc.index(i), &mut part);
            part
        });
        report.merge(checked);
    }

    fn check_series_entry(
        &self,
        trail: &Trail<'_>,
        base: &str,
        path: &str,
        entry_loc: &Location,
        report: &mut ValidationReport,
    ) {
        if !is_numeric_name(path) {
            report.add(
                ValidationIssue::error(
                    IssueCode::SeriesPathNotNumeric,
                    entry_loc.clone(),
                    format!("Series path '{}' is not a non-negative integer", path),
                )
                .with("found", path),
            );
            return;
        }
        let child = match self.resolve(base, path, entry_loc, report) {
            Resolved::Found(child) => child,
            Resolved::Missing(fs_path) => {
                report.add(
                    ValidationIssue::error(
                        IssueCode::SeriesPathNotFound,
                        entry_loc.clone(),
                        format!("Series '{}' does not exist", path),
                    )
                    .with("fs_path", fs_path),
                );
                return;
            }
            Resolved::Failed => return,
        };
        if !child.is_group() {
            report.add(
                ValidationIssue::error(
                    IssueCode::SeriesPathNotGroup,
                    entry_loc.clone(),
                    format!("Series '{}' is an array, not a group", path),
                )
                .with("expected", "group")
                .with("found", "array")
                .with("fs_path", self.store.fs_path(&child.path)),
            );
            return;
        }
        self.visit_image_child(trail, &child, IssueCode::SeriesInvalidImage, entry_loc, report);
    }

    /// Walks children `0, 1, 2, …` of a collection without a series list.
    fn probe_numbered_images(
        &self,
        trail: &Trail<'_>,
        node: &ZarrNode,
        loc: &Location,
        report: &mut ValidationReport,
    ) {
        let mut found = Vec::new();
        let mut next = 0;
        while next < MAX_NUMBERED_SERIES {
            let name = next.to_string();
            match self.resolve(&node.path, &name, &loc.key(name.as_str()), report) {
                Resolved::Found(child) => found.push((name, child)),
                Resolved::Failed => {}
                Resolved::Missing(_) => break,
            }
            next += 1;
        }

        let stranded = self.numbered_children_from(&node.path, next);
        if !stranded.is_empty() {
            report.add(
                ValidationIssue::error(
                    IssueCode::Bf2rawNumberingGap,
                    loc.clone(),
                    format!(
                        "Image {} is missing but higher-numbered images exist",
                        next
                    ),
                )
                .with("expected", next.to_string())
                .with("found", json!(stranded))
                .with("fs_path", self.store.fs_path(&node.path)),
            );
        } else if next == 0 {
            report.add(
                ValidationIssue::error(
                    IssueCode::Bf2rawNoImages,
                    loc.clone(),
                    "Collection has no image at '0'",
                )
                .with("fs_path", self.store.fs_path(&node.path)),
            );
        }

        let visited = self.for_each_indexed(&found, |_, (name, child)| {
            let mut part = ValidationReport::new();
            let child_loc = loc.key(name.as_str());
            if child.is_group() {
                self.visit_image_child(
                    trail,
                    child,
                    IssueCode::Bf2rawInvalidImage,
                    &child_loc,
                    &mut part,
                );
            } else {
                part.add(
                    ValidationIssue::error(
                        IssueCode::Bf2rawPathNotGroup,
                        child_loc,
                        format!("Image '{}' is an array, not a group", name),
                    )
                    .with("expected", "group")
                    .with("found", "array")
                    .with("fs_path", self.store.fs_path(&child.path)),
                );
            }
            part
        });
        report.merge(visited);
    }

    /// Numerically named children at or above `from`, if the store can list.
    fn numbered_children_from(&self, path: &str, from: usize) -> Vec<String> {
        let children = match self.store.list_children(path) {
            Ok(Some(children)) => children,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not list collection children");
                return Vec::new();
            }
        };
        children
            .into_iter()
            .filter(|name| {
                is_numeric_name(name) && name.parse::<usize>().is_ok_and(|n| n >= from)
            })
            .collect()
    }

    /// Resolves `relative` against `base`, reporting store faults at `loc`.
    fn resolve(
        &self,
        base: &str,
        relative: &str,
        loc: &Location,
        report: &mut ValidationReport,
    ) -> Resolved {
        let Some(path) = join_path(base, relative) else {
            return Resolved::Missing(format!("{}/{}", self.store.fs_path(base), relative));
        };
        match open_node(self.store, &path) {
            Ok(Some(node)) => Resolved::Found(node),
            Ok(None) => Resolved::Missing(self.store.fs_path(&path)),
            Err(e) => {
                warn!(path = %path, error = %e, "store fault");
                report.add(store_fault(&e, loc.clone(), self.store.fs_path(&path)));
                Resolved::Failed
            }
        }
    }

    /// Extends the trail with `node`, or reports a cycle.
    fn enter<'c>(
        &self,
        trail: &'c Trail<'c>,
        node: &'c ZarrNode,
        loc: &Location,
        report: &mut ValidationReport,
    ) -> Option<Trail<'c>> {
        let fs_path = self.store.fs_path(&node.path);
        if trail.contains(&node.path) {
            report.add(
                ValidationIssue::error(
                    IssueCode::CycleDetected,
                    loc.clone(),
                    "Reference resolves to a group already being validated",
                )
                .with("fs_path", fs_path),
            );
            return None;
        }
        if trail.depth + 1 > self.max_depth {
            report.add(
                ValidationIssue::error(
                    IssueCode::CycleDetected,
                    loc.clone(),
                    format!("Hierarchy is nested deeper than {} levels", self.max_depth),
                )
                .with("max_depth", self.max_depth)
                .with("fs_path", fs_path),
            );
            return None;
        }
        Some(trail.child(&node.path))
    }

    /// Validates a child group's metadata, requiring one of `accept`.
    ///
    /// Anything else is a single `invalid` issue carrying the child's own
    /// schema errors as context. Warnings are re-rooted under `loc`.
    fn expect_child(
        &self,
        child: &ZarrNode,
        accept: &[NodeKind],
        invalid: IssueCode,
        loc: &Location,
        report: &mut ValidationReport,
    ) -> Option<OmeDocument> {
        let fs_path = self.store.fs_path(&child.path);
        let expected = accept.first().map_or("", NodeKind::as_str);
        match self
            .validator
            .validate_document_as(&child.document, self.version)
        {
            Ok(validated) if accept.contains(&validated.value.kind()) => {
                report.merge_prefixed(loc, validated.warnings);
                Some(validated.value)
            }
            Ok(validated) => {
                let found = validated.value.kind();
                report.add(
                    ValidationIssue::error(
                        invalid,
                        loc.clone(),
                        format!("Expected {} metadata, found {}", expected, found),
                    )
                    .with("expected", expected)
                    .with("found", found.as_str())
                    .with("fs_path", fs_path),
                );
                None
            }
            Err(errors) => {
                report.add(
                    ValidationIssue::error(
                        invalid,
                        loc.clone(),
                        format!(
                            "{} metadata is invalid ({} error(s))",
                            expected,
                            errors.error_count()
                        ),
                    )
                    .with("expected", expected)
                    .with("errors", errors.summary())
                    .with("fs_path", fs_path),
                );
                None
            }
        }
    }

    /// Runs `visit` over `items`, on scoped threads when `jobs > 1`.
    ///
    /// Reports are concatenated in item order regardless of which thread
    /// finishes first.
    fn for_each_indexed<T, F>(&self, items: &[T], visit: F) -> ValidationReport
    where
        T: Sync,
        F: Fn(usize, &T) -> ValidationReport + Sync,
    {
        let mut report = ValidationReport::new();
        if self.jobs <= 1 || items.len() <= 1 {
            for (i, item) in items.iter().enumerate() {
                report.merge(visit(i, item));
            }
            return report;
        }

        let chunk = items.len().div_ceil(self.jobs);
        let visit = &visit;
        let parts: Vec<ValidationReport> = thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks(chunk)
                .enumerate()
                .map(|(c, slice)| {
                    scope.spawn(move || {
                        let mut part = ValidationReport::new();
                        for (k, item) in slice.iter().enumerate() {
                            part.merge(visit(c * chunk + k, item));
                        }
                        part
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect()
        });
        for part in parts {
            report.merge(part);
        }
        report
    }
}

/// Compares a label's pyramid with the image it annotates.
fn check_label_counts(
    parent: &Image,
    label: &Image,
    label_loc: &Location,
    report: &mut ValidationReport,
) {
    if parent.multiscales.len() != label.multiscales.len() {
        report.add(
            ValidationIssue::error(
                IssueCode::LabelMultiscaleCountMismatch,
                label_loc.clone(),
                format!(
                    "Label has {} multiscale(s) but its image has {}",
                    label.multiscales.len(),
                    parent.multiscales.len()
                ),
            )
            .with("expected", parent.multiscales.len())
            .with("found", label.multiscales.len()),
        );
    }
    for (k, (image_ms, label_ms)) in parent
        .multiscales
        .iter()
        .zip(&label.multiscales)
        .enumerate()
    {
        if label_ms.datasets.len() < image_ms.datasets.len() {
            report.add(
                ValidationIssue::error(
                    IssueCode::LabelDatasetCountMismatch,
                    label_loc.key("multiscales").index(k),
                    format!(
                        "Label has {} resolution level(s) but its image has {}",
                        label_ms.datasets.len(),
                        image_ms.datasets.len()
                    ),
                )
                .with("expected", image_ms.datasets.len())
                .with("found", label_ms.datasets.len()),
            );
        }
    }
}

fn store_fault(error: &StoreError, loc: Location, fs_path: String) -> ValidationIssue {
    let code = match error {
        StoreError::Corrupt { .. } => IssueCode::MetadataUnreadable,
        _ => IssueCode::NodeUnreachable,
    };
    ValidationIssue::error(code, loc, error.to_string())
        .with("key", error.key())
        .with("fs_path", fs_path)
}

fn is_numeric_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_tracks_ancestors() {
        let root = Trail::root("");
        let plate = root.child("A/1");
        let field = plate.child("A/1/0");
        assert!(field.contains(""));
        assert!(field.contains("A/1"));
        assert!(!field.contains("A/1/0/labels"));
        assert_eq!(field.depth, 2);
    }

    #[test]
    fn numeric_names() {
        assert!(is_numeric_name("0"));
        assert!(is_numeric_name("12"));
        assert!(!is_numeric_name(""));
        assert!(!is_numeric_name("a1"));
        assert!(!is_numeric_name("-1"));
    }
}
