//! Typed OME-NGFF metadata.
//!
//! These are the value types a metadata document resolves to. They are
//! produced by [`crate::schema`] (which guarantees every invariant holds)
//! or built explicitly with the `new`/`with_*` constructors, and they
//! serialize back to JSON emitting only the fields that were supplied.
//!
//! # Example
//!
//! ```
//! use ngffcheck::model::{Axis, Dataset, Image, Multiscale};
//!
//! let image = Image::new(vec![Multiscale::new(
//!     vec![Axis::space("y"), Axis::space("x")],
//!     vec![Dataset::new("0", vec![1.0, 1.0])],
//! )]);
//! assert_eq!(image.multiscales[0].ndim(), 2);
//! ```

mod axis;
mod collection;
mod image;
pub mod io_json;
mod label;
mod node;
mod plate;
mod transform;
mod version;
mod well;

pub use axis::{Axis, AxisType, SPACE_UNITS, TIME_UNITS};
pub use collection::{Collection, Series, BIOFORMATS2RAW_LAYOUT};
pub use image::{Dataset, Image, Multiscale};
pub use label::{ImageLabel, LabelColor, LabelImage, LabelProperty, LabelSource, LabelsGroup};
pub use node::{Envelope, NodeKind, OmeDocument, OmeNode};
pub use plate::{Acquisition, Column, Plate, PlateDef, PlateWell, Row};
pub use transform::CoordinateTransformation;
pub use version::{SpecVersion, VersionRules};
pub use well::{FieldOfView, Well, WellDef};
