//! Mdxsurge is a query-construction and result-shaping library for
//! multidimensional (OLAP) analytics. It builds syntactically correct MDX
//! `SELECT` statements from declarative axis selections and reshapes
//! multidimensional cell results into simple nested structures: axes of
//! labeled positions, dense value grids, and flat rows. Connections to live
//! analytic engines are abstracted behind driver traits; the library itself
//! only produces MDX strings and consumes already-materialized results.

// Enable warnings for all clippy lints. This automatically enables new lints shipped with new rust
// versions.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo,
    clippy::restriction
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::indexing_slicing,               // Allow `vec[i]` indexing.
    clippy::module_name_repetitions,        // Allow.
    clippy::use_debug,                      // Allow.
    clippy::integer_arithmetic,             // Allow.
    clippy::implicit_return,                // Allow.
    clippy::too_many_arguments,             // Allow.
    clippy::use_self,                       // Allow.
    clippy::shadow_same,                    // Allow.
    clippy::too_many_lines,                 // Allow.
    clippy::multiple_crate_versions,        // Disabled.
    clippy::missing_docs_in_private_items,  // Disabled.
    clippy::missing_errors_doc,             // Disabled.
    clippy::missing_inline_in_public_items, // Disabled.
    clippy::unknown_clippy_lints,           // To enable naming new lints added to nightly.
    clippy::result_expect_used,             // Should use `expect` rather than `unwrap`.
    clippy::option_expect_used,             // Should use `expect` rather than `unwrap`.
    clippy::panic,                          // Allow.
    clippy::must_use_candidate,             // Allow.
    clippy::as_conversions,                 // Allow but only when absolutely necessary.
    clippy::implicit_hasher                 // Default hasher is fine for now.
)]
// Do not allow print statements. Use `log::info!()` or equivalent instead.
#![deny(clippy::print_stdout)]

pub mod cellset;
pub mod connection;
pub mod error;
pub mod query_builder;
pub mod rowset;
pub mod util;

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate derive_new;

use crate::cellset::CellSet;
use crate::connection::Connection;
use crate::error::MdxError;
use crate::query_builder::QueryBuilder;

/// Serializes `builder` to MDX and executes it on `connection`.
pub fn run_query(
    connection: &mut Connection,
    builder: &QueryBuilder,
) -> Result<CellSet, MdxError> {
    // Serialize the current builder state.
    let statement = builder.to_mdx()?;

    // Hand the statement to the backend and wrap the raw result.
    connection.execute(&statement)
}
