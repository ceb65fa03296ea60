//! Join chain resolution
//!
//! Walks a left-deep chain of binary joins into the query's linked-entity
//! arena, keeping alias and entity-name indexes so later column and filter
//! references resolve in constant time.

use entql_ast::{
    AliasedSource, ColumnRef, ColumnSource, ComparisonOp, Filter, Join, JoinKind, Operand, Source,
    TableSource,
};
use std::collections::HashMap;
use tracing::debug;

use super::error::TranslateError;
use super::translator::TranslateOptions;
use super::values::{attribute_name, entity_name, source_name};
use crate::{ColumnSet, FilterTree, JoinOperator, LinkId, LinkedEntity, StructuredQuery};

/// Where a column or condition belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Root,
    Link(LinkId),
}

/// A query under construction plus its lookup indexes.
pub(crate) struct QueryScope {
    query: StructuredQuery,
    by_alias: HashMap<String, LinkId>,
    by_entity: HashMap<String, LinkId>,
}

impl QueryScope {
    /// Establish the driving entity and the link chain from the FROM clause.
    pub(crate) fn from_source(
        source: &TableSource,
        options: &TranslateOptions,
    ) -> Result<Self, TranslateError> {
        match source {
            TableSource::Aliased(aliased) => Ok(Self::new(StructuredQuery::new(table_name(aliased)?))),
            TableSource::Join(join) => {
                let mut scope = Self::new(StructuredQuery::new(String::new()));
                scope.add_join(join, options, 1)?;
                Ok(scope)
            }
        }
    }

    pub(crate) fn new(query: StructuredQuery) -> Self {
        Self {
            query,
            by_alias: HashMap::new(),
            by_entity: HashMap::new(),
        }
    }

    pub(crate) fn into_query(self) -> StructuredQuery {
        self.query
    }

    fn add_join(
        &mut self,
        join: &Join,
        options: &TranslateOptions,
        depth: usize,
    ) -> Result<(), TranslateError> {
        if depth > options.max_nesting_depth {
            return Err(TranslateError::NestingTooDeep {
                limit: options.max_nesting_depth,
            });
        }

        // Left-most join starts the chain and names the driving entity.
        let is_first_from = match &join.left {
            TableSource::Join(left) => {
                self.add_join(left, options, depth + 1)?;
                false
            }
            TableSource::Aliased(aliased) => {
                table_name(aliased)?;
                true
            }
        };

        let join_operator = match join.kind {
            JoinKind::Inner => JoinOperator::Inner,
            JoinKind::LeftOuter => JoinOperator::LeftOuter,
            other => return Err(TranslateError::UnsupportedJoinKind(other)),
        };
        table_name(&join.right)?;

        let (left, left_source, right, right_source) = on_equality(&join.on)?;
        let from_entity = entity_name(&left_source.table);
        if is_first_from {
            self.query.entity_name = from_entity.clone();
        }

        let link = LinkedEntity {
            link_from_entity_name: from_entity.clone(),
            link_to_entity_name: entity_name(&right_source.table),
            link_from_attribute_name: attribute_name(left),
            link_to_attribute_name: attribute_name(right),
            join_operator,
            entity_alias: join.right.alias.clone(),
            columns: ColumnSet::default(),
            link_criteria: FilterTree::default(),
            link_entities: Vec::new(),
        };

        let parent = if is_first_from || self.query.link_entities.is_empty() {
            if self.query.entity_name != from_entity {
                return Err(TranslateError::UnknownJoinSource(from_entity));
            }
            None
        } else {
            match self.resolve(Some(left_source)) {
                Some(Target::Link(id)) => Some(id),
                Some(Target::Root) => None,
                None => return Err(TranslateError::UnknownJoinSource(source_name(left_source))),
            }
        };

        debug!(
            from = %link.link_from_entity_name,
            to = %link.link_to_entity_name,
            alias = ?link.entity_alias,
            parent = ?parent,
            "Attaching linked entity"
        );
        let id = self.query.attach(parent, link);
        self.register(id);
        Ok(())
    }

    fn register(&mut self, id: LinkId) {
        let link = self.query.link(id);
        if let Some(alias) = &link.entity_alias {
            self.by_alias.entry(alias.clone()).or_insert(id);
        }
        self.by_entity
            .entry(link.link_to_entity_name.clone())
            .or_insert(id);
    }

    /// Resolve a column source to the driving entity or a linked entity.
    ///
    /// Lookup is by alias when the source carries one, else by entity name.
    /// An unaliased reference to the driving entity's name is the driving
    /// entity, even when a self-join links the same entity under an alias.
    /// An alias miss falls back to the driving entity only when the source
    /// table is the driving entity itself.
    pub(crate) fn resolve(&self, source: Option<&ColumnSource>) -> Option<Target> {
        let Some(source) = source else {
            return Some(Target::Root);
        };
        let table = entity_name(&source.table);
        let found = match &source.alias {
            Some(alias) => self.by_alias.get(alias),
            None if table == self.query.entity_name => None,
            None => self.by_entity.get(&table),
        };
        match found {
            Some(id) => Some(Target::Link(*id)),
            None if table == self.query.entity_name => Some(Target::Root),
            None => None,
        }
    }

    /// Entity name or alias used to qualify a condition.
    pub(crate) fn target_name(&self, target: Target, source: Option<&ColumnSource>) -> String {
        match (target, source) {
            (Target::Link(_), Some(source)) => source_name(source),
            (Target::Link(id), None) => self.query.link(id).link_to_entity_name.clone(),
            (Target::Root, _) => self.query.entity_name.clone(),
        }
    }

    pub(crate) fn columns_mut(&mut self, target: Target) -> &mut ColumnSet {
        match target {
            Target::Root => &mut self.query.columns,
            Target::Link(id) => &mut self.query.link_mut(id).columns,
        }
    }

    pub(crate) fn criteria_mut(&mut self, target: Target) -> &mut FilterTree {
        match target {
            Target::Root => &mut self.query.criteria,
            Target::Link(id) => &mut self.query.link_mut(id).link_criteria,
        }
    }
}

/// Logical entity name of a plain table source.
pub(crate) fn table_name(source: &AliasedSource) -> Result<String, TranslateError> {
    match &source.source {
        Source::Table { name } => Ok(entity_name(name)),
        Source::Subquery(_) => Err(TranslateError::SubquerySourceUnsupported),
    }
}

/// The single `left.column = right.column` condition of a join.
fn on_equality(
    on: &[Filter],
) -> Result<(&ColumnRef, &ColumnSource, &ColumnRef, &ColumnSource), TranslateError> {
    let condition = match on {
        [] => {
            return Err(TranslateError::UnsupportedJoinCondition(
                "a join requires an ON condition, for example: INNER JOIN x ON y.id = x.id".to_string(),
            ))
        }
        [condition] => condition,
        _ => {
            return Err(TranslateError::UnsupportedJoinCondition(format!(
                "only one ON condition is supported, found {}",
                on.len()
            )))
        }
    };

    match condition {
        Filter::Comparison {
            op: ComparisonOp::Eq,
            left: Operand::Column(left),
            right: Operand::Column(right),
        } => Ok((left, on_column_source(left)?, right, on_column_source(right)?)),
        _ => Err(TranslateError::UnsupportedJoinCondition(
            "only an equality between two columns is supported in ON".to_string(),
        )),
    }
}

fn on_column_source(column: &ColumnRef) -> Result<&ColumnSource, TranslateError> {
    column.source.as_ref().ok_or_else(|| {
        TranslateError::UnsupportedJoinCondition(format!(
            "no source found for column '{}', prefix it with the table name",
            column.name
        ))
    })
}
