//! # Parameter System
//!
//! Every model parameter is described once, in a static table of
//! [`ParameterRecord`]s carrying its link function, default natural-scale
//! bounds and the condition under which it belongs to a model. A fit turns the
//! applicable records into an ordered list of [`ParameterSpec`]s through the
//! [`ParameterSpecBuilder`].
//!
//! ## Core Components
//!
//! - [`LinkKind`] and [`LinkRegistry`]: identity, log and logit transforms
//! - [`Bounds`]: natural-scale bounds and their link-scale image
//! - [`ParameterSpec`]: link, bounds, phase, scale factor and start value of one parameter
//! - [`ModelDefinition`] and [`ParameterSpecBuilder`]: resolution of overrides against a model
//!
//! ## Example Usage
//!
//! ```rust
//! use secrfit_rs::detfn::DetFn;
//! use secrfit_rs::parameters::ModelDefinition;
//!
//! let model = ModelDefinition::new(DetFn::HazardRate, &[]);
//! assert_eq!(model.names(), vec!["D", "g0", "sigma", "z"]);
//! ```

pub mod bounds;
pub mod builder;
pub mod link;
pub mod spec;

pub use bounds::{Bounds, BoundsError};
pub use builder::{ModelDefinition, ParameterSpecBuilder};
pub use link::{LinkKind, LinkRegistry, LINK_SCALE_LIMIT};
pub use spec::{record_for, Applicability, ParameterRecord, ParameterSpec, Phase, DENSITY, PARAMETER_TABLE};
