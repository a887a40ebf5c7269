//! Testing utilities for the Skeleto container.
//!
//! ## Features
//!
//! - **MockLoader** - records instantiation order and the dependencies each
//!   declaration received, and can be told to fail
//! - **DeclarationBuilder** - declaration fixtures without hand-written doc blocks
//! - **Assertions** - ordering and registry assertions with readable failures
//!
//! ## Quick Start
//!
//! ```
//! use skeleto_testing::*;
//! use skeleto_core::Container;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let loader = MockLoader::new();
//! let registry = Container::new(Arc::new(loader.clone()))
//!     .start(vec![
//!         DeclarationBuilder::factory("Repo").param("Db").build(),
//!         DeclarationBuilder::factory("Db").build(),
//!     ])
//!     .await
//!     .unwrap();
//!
//! assert_order(&registry, &["Db", "Repo"]);
//! assert_complete(&registry);
//! assert_eq!(loader.calls()[1].dependencies, vec!["Db"]);
//! # });
//! ```

pub mod assertions;
pub mod builders;
pub mod mock;

pub use assertions::{assert_complete, assert_order, assert_precedes, assert_topological, assert_warning_count};
pub use builders::{DeclarationBuilder, contract_alias};
pub use mock::{LoaderCall, MockInstance, MockLoader};
