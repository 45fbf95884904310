//! # Route Modules
//!
//! - [`tax_documents`]: CCH Axcess batch output file download.
//! - [`formations`]: FormationsCorp business account lookup.

pub mod formations;
pub mod tax_documents;
