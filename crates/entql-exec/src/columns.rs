//! Column metadata assembly
//!
//! Entities are visited top-down: the driving entity, then each linked
//! entity depth-first in chain order. Within one entity the selected
//! attributes are listed in the reverse of the provider's declaration order.
//! Consumers index columns by this order, so it must not change.

use entql_ir::metadata::{EntityMetadata, MetadataError, MetadataProvider};
use entql_ir::{ColumnSet, LinkId, StructuredQuery};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::result::ColumnMetadata;

/// Column metadata for the rows of a retrieve.
///
/// Each entity's metadata is fetched at most once per call.
pub fn query_columns(
    query: &StructuredQuery,
    provider: &dyn MetadataProvider,
) -> Result<Vec<ColumnMetadata>, MetadataError> {
    let mut collector = Collector {
        provider,
        fetched: HashMap::new(),
        columns: Vec::new(),
    };

    collector.add_entity(&query.entity_name, &query.columns, None)?;
    for id in &query.root_links {
        collector.add_link(query, *id)?;
    }
    Ok(collector.columns)
}

/// Column metadata for the single-row result of a create: just the id column.
pub fn created_columns(
    entity_name: &str,
    id_attribute: &str,
    provider: &dyn MetadataProvider,
) -> Result<Vec<ColumnMetadata>, MetadataError> {
    let metadata = provider.get_entity_metadata(entity_name)?;
    let mut columns: Vec<ColumnMetadata> = metadata
        .attributes
        .iter()
        .filter(|a| a.logical_name == id_attribute)
        .map(|a| ColumnMetadata::new(entity_name, a, None))
        .collect();
    columns.reverse();
    Ok(columns)
}

struct Collector<'a> {
    provider: &'a dyn MetadataProvider,
    fetched: HashMap<String, EntityMetadata>,
    columns: Vec<ColumnMetadata>,
}

impl Collector<'_> {
    fn add_link(&mut self, query: &StructuredQuery, id: LinkId) -> Result<(), MetadataError> {
        let link = query.link(id);
        self.add_entity(
            &link.link_to_entity_name,
            &link.columns,
            link.entity_alias.as_deref(),
        )?;
        for child in &link.link_entities {
            self.add_link(query, *child)?;
        }
        Ok(())
    }

    fn add_entity(
        &mut self,
        entity_name: &str,
        selection: &ColumnSet,
        alias: Option<&str>,
    ) -> Result<(), MetadataError> {
        let metadata = match self.fetched.entry(entity_name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.provider.get_entity_metadata(entity_name)?),
        };

        let start = self.columns.len();
        self.columns.extend(
            metadata
                .attributes
                .iter()
                .filter(|a| selection.contains(&a.logical_name))
                .map(|a| ColumnMetadata::new(entity_name, a, alias)),
        );
        self.columns[start..].reverse();
        Ok(())
    }
}
