//! Core of cinedb: a small SQLite-backed store for a movie dataset.
//!
//! - [`import`]: CSV import with nested-field flattening and full-replace writes
//! - [`editor`]: catalog-driven insert / query / update / delete
//! - [`stats`]: summary statistics over imported tables
//! - [`catalog`]: live table and column listings
//!
//! # Example
//!
//! ```no_run
//! use cinedb_core::{ImportSpec, Store, Value};
//!
//! let store = Store::open("data/imdb_db.sqlite")?;
//! let rows = store.importer().import_table(
//!     "data/tmdb_5000_movies.csv".as_ref(),
//!     "movies",
//!     &ImportSpec::movies(),
//! )?;
//! println!("imported {rows} movies");
//!
//! store
//!     .editor()
//!     .update_rows("movies", "title", &Value::from("NewTitle"), "id", &Value::Integer(42))?;
//! # Ok::<(), cinedb_core::Error>(())
//! ```

pub mod catalog;
pub mod editor;
pub mod error;
pub mod import;
pub mod literal;
pub mod result;
pub mod stats;
pub mod store;
pub mod value;

pub use catalog::Catalog;
pub use editor::{EditorOptions, RowEditor, DEFAULT_PREVIEW_LIMIT};
pub use error::{Error, Result};
pub use import::{FlattenRule, ImportSpec, Importer, NestedFieldSpec};
pub use result::ResultSet;
pub use stats::{MovieReport, Stats};
pub use store::Store;
pub use value::Value;
