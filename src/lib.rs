//! Wikiundump: unpack a MediaWiki XML dump into a directory tree
//!
//! Every page of the dump becomes one file whose path is derived from the page
//! title alone, so a page can be found again later from its title without
//! any index:
//!
//! ```text
//! Accordion               -> /a/c/c/Accordion
//! 101 Dalmatians          -> /1/0/1/101 Dalmatians
//! a cappella              -> /a/_/c/A cappella
//! Template:AA             -> /Template/a/a/_/Template:AA
//! ```
//!
//! # Path derivation
//!
//! 1. **Namespace resolution** -- the title is matched against the dump's
//!    namespace table (`Template:`, `User:`, ...); unmatched titles belong to
//!    the default namespace
//! 2. **Sharding** -- the first three characters of the bare name become three
//!    directory levels (lowercase ASCII letters and digits, `_` for anything
//!    else), bounding the fan-out of any one directory
//! 3. **Case folding** -- the namespace's case rule is applied to the bare name
//!    (`first-letter` uppercases the first character)
//!
//! The derivation is a pure function of the namespace table and the title. The
//! table is stored next to the tree as `namespaces.json` so other tools can
//! repeat it.
//!
//! # Key Modules
//!
//! - [`namespace`] -- Namespace table, title resolution and the keep filter
//! - [`shard`] -- Directory prefix from the leading characters of a name
//! - [`casefold`] -- Case rules and folding
//! - [`path`] -- Full path derivation and redirect link targets
//! - [`persist`] -- The `namespaces.json` side file
//! - [`parser`] -- Streaming XML reader with transparent bzip2 decompression
//! - [`store`] -- Writing files and redirect symlinks under the output root
//! - [`undump`] -- Drives a dump through filter and store
//! - [`stats`] -- Counters for the end-of-run summary
//! - [`config`] -- Constants and run options
//!
//! # Example Usage
//!
//! ```bash
//! # Unpack the whole dump into ./wiki/
//! wikiundump undump enwiki-latest-pages-articles.xml.bz2
//!
//! # Only main namespace and templates, without redirect symlinks
//! wikiundump undump --keep ',Template' --no-symlinks -d out/ dump.xml
//!
//! # Where does a title live?
//! wikiundump locate -d out/ 'Template:Infobox person'
//! ```

pub mod casefold;
pub mod config;
pub mod error;
pub mod models;
pub mod namespace;
pub mod parser;
pub mod path;
pub mod persist;
pub mod shard;
pub mod stats;
pub mod store;
pub mod undump;
