//! The outward addon manifest and the per-list descriptor it is derived
//! from.

use serde::{Deserialize, Serialize};

use crate::types::{ListKey, MediaType};

/// Display metadata derived from a successfully fetched list.
///
/// A descriptor only ever exists after a fetch for its key reported a list
/// name; it is never partially populated and never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDescriptor {
    list_name: String,
    key: ListKey,
}

impl ListDescriptor {
    pub fn new(list_name: String, key: ListKey) -> Self {
        Self { list_name, key }
    }

    /// The label the addon and its catalogs carry, e.g. `Top 250 by Rating`.
    pub fn display_name(&self) -> String {
        format!("{} by {}", self.list_name, self.key.sort)
    }

    /// The derived addon id, e.g. `org.imdblist.ls047677021.rating`.
    pub fn addon_id(&self) -> String {
        format!("org.imdblist.{}.{}", self.key.id, self.key.sort.slug())
    }
}

/// One catalog announced by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCatalog {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
}

/// The addon manifest served at `/manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub types: Vec<MediaType>,
    pub catalogs: Vec<ManifestCatalog>,
}

impl Manifest {
    /// The generic manifest used until (or instead of) a descriptor exists.
    pub fn generic() -> Self {
        Manifest {
            id: "org.imdblist".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            name: "IMDB List Add-on".to_owned(),
            description: "Add-on to create a catalog from IMDB lists.".to_owned(),
            resources: vec!["catalog".to_owned()],
            types: MediaType::all().to_vec(),
            catalogs: MediaType::all()
                .into_iter()
                .map(|media_type| ManifestCatalog {
                    id: media_type.catalog_id().to_owned(),
                    name: media_type.default_catalog_name().to_owned(),
                    media_type,
                })
                .collect(),
        }
    }

    /// A manifest named after the fetched list.
    pub fn for_descriptor(descriptor: &ListDescriptor) -> Self {
        let mut manifest = Manifest::generic();
        manifest.id = descriptor.addon_id();
        manifest.name = descriptor.display_name();
        for catalog in &mut manifest.catalogs {
            catalog.name = descriptor.display_name();
        }
        manifest
    }
}
