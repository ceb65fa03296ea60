use entql_ast::{InsertStatement, InsertValues, ProjectionExpr, ProjectionItem, SelectStatement, Source, Statement};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::coerce::coerce_to_attribute;
use super::error::TranslateError;
use super::filters::FilterNormalizer;
use super::joins::{QueryScope, Target};
use super::values::{attribute_name, describe_column, entity_name, operand_value, source_name};
use crate::command::{Command, CommandKind, Parameters};
use crate::metadata::MetadataProvider;
use crate::{ColumnSet, Entity, Request, StructuredQuery};

/// Translation limits and pattern settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateOptions {
    /// Deepest allowed nesting of filter groups and join chains.
    pub max_nesting_depth: usize,
    /// Wildcard character of LIKE patterns.
    pub wildcard: char,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 32,
            wildcard: '%',
        }
    }
}

/// Translates commands into requests for the remote entity service
pub struct RequestTranslator<'a> {
    metadata: Option<&'a dyn MetadataProvider>,
    options: TranslateOptions,
}

impl<'a> RequestTranslator<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self {
            metadata: Some(metadata),
            options: TranslateOptions::default(),
        }
    }

    /// A translator that sets insert values as translated, with no type
    /// coercion.
    pub fn without_metadata() -> Self {
        Self {
            metadata: None,
            options: TranslateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TranslateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    pub fn translate(&self, command: &Command) -> Result<Request, TranslateError> {
        match &command.kind {
            CommandKind::Text(statement) => self.translate_statement(statement, &command.parameters),
            CommandKind::TableDirect(name) => self
                .translate_table_direct(name)
                .map(|query| Request::RetrieveMany { query }),
            CommandKind::StoredProcedure(name) => Err(TranslateError::NotImplemented(format!(
                "stored procedure '{}'",
                name
            ))),
        }
    }

    pub fn translate_statement(
        &self,
        statement: &Statement,
        parameters: &Parameters,
    ) -> Result<Request, TranslateError> {
        match statement {
            Statement::Select(select) => self
                .translate_select(select, parameters)
                .map(|query| Request::RetrieveMany { query }),
            Statement::Insert(insert) => self
                .translate_insert(insert, parameters)
                .map(|target| Request::Create { target }),
            Statement::Update(_) => Err(TranslateError::NotImplemented("UPDATE".to_string())),
            Statement::Delete(_) => Err(TranslateError::NotImplemented("DELETE".to_string())),
            Statement::Other(kind) => Err(TranslateError::UnsupportedCommand(kind.clone())),
        }
    }

    pub fn translate_select(
        &self,
        select: &SelectStatement,
        parameters: &Parameters,
    ) -> Result<StructuredQuery, TranslateError> {
        let source = match select.from.as_slice() {
            [] => return Err(TranslateError::MissingSource),
            [source] => source,
            sources => return Err(TranslateError::MultipleSourcesUnsupported(sources.len())),
        };
        if select.projection.is_empty() {
            return Err(TranslateError::EmptyProjection);
        }

        let mut scope = QueryScope::from_source(source, &self.options)?;
        add_columns(&mut scope, &select.projection)?;

        let filters = FilterNormalizer::new(parameters, &self.options);
        match &select.where_group {
            Some(group) => filters.apply_group(&mut scope, group)?,
            None => filters.apply_filters(&mut scope, &select.where_filters)?,
        }

        let query = scope.into_query();
        debug!(
            entity = %query.entity_name,
            links = query.link_entities.len(),
            all_columns = query.columns.is_all(),
            "Translated select"
        );
        Ok(query)
    }

    /// Build the record a create request carries.
    pub fn translate_insert(
        &self,
        insert: &InsertStatement,
        parameters: &Parameters,
    ) -> Result<Entity, TranslateError> {
        let entity = match &insert.target {
            Source::Table { name } => entity_name(name),
            Source::Subquery(_) => {
                return Err(TranslateError::InvalidInsertTarget(
                    "insert target must be an entity, not a sub-query".to_string(),
                ))
            }
        };
        let values = match &insert.values {
            InsertValues::List(values) => values,
            InsertValues::Select(_) => return Err(TranslateError::UnsupportedInsertSource),
        };
        if insert.columns.len() != values.len() {
            return Err(TranslateError::ColumnValueCountMismatch {
                columns: insert.columns.len(),
                values: values.len(),
            });
        }

        let metadata = self
            .metadata
            .map(|provider| provider.get_entity_metadata(&entity))
            .transpose()?;

        let mut record = Entity::new(entity.as_str());
        for (column, operand) in insert.columns.iter().zip(values) {
            let name = attribute_name(column);
            let value = operand_value(operand, parameters)?
                .ok_or_else(|| TranslateError::UnsupportedInsertValue(describe_column(column)))?;

            let value = match &metadata {
                Some(metadata) => {
                    let attribute = metadata.attribute(&name).ok_or_else(|| {
                        TranslateError::UnknownAttribute {
                            entity: entity.clone(),
                            attribute: name.clone(),
                        }
                    })?;
                    coerce_to_attribute(attribute, value)?
                }
                None => value,
            };
            record.set(name, value);
        }

        debug!(
            entity = %record.logical_name,
            attributes = record.attributes.len(),
            "Translated insert"
        );
        Ok(record)
    }

    /// Every column of the named entity, no filter.
    pub fn translate_table_direct(&self, name: &str) -> Result<StructuredQuery, TranslateError> {
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(TranslateError::InvalidTableDirectName(name.to_string()));
        }
        Ok(StructuredQuery::all_columns(entity_name(name)))
    }
}

fn add_columns(scope: &mut QueryScope, projection: &[ProjectionItem]) -> Result<(), TranslateError> {
    if let [ProjectionItem {
        expr: ProjectionExpr::AllColumns,
        ..
    }] = projection
    {
        *scope.columns_mut(Target::Root) = ColumnSet::All;
        return Ok(());
    }

    for item in projection {
        let column = match &item.expr {
            ProjectionExpr::Column(column) => column,
            ProjectionExpr::AllColumns => {
                return Err(TranslateError::UnsupportedProjection(
                    "* combined with other columns".to_string(),
                ))
            }
            ProjectionExpr::Literal(_) => {
                return Err(TranslateError::UnsupportedProjection("literal".to_string()))
            }
            ProjectionExpr::Function(call) => {
                return Err(TranslateError::UnsupportedProjection(format!(
                    "function '{}'",
                    call.name
                )))
            }
            ProjectionExpr::Arithmetic { .. } => {
                return Err(TranslateError::UnsupportedProjection(
                    "arithmetic expression".to_string(),
                ))
            }
        };
        if let Some(alias) = &item.alias {
            return Err(TranslateError::UnsupportedColumnAlias {
                column: describe_column(column),
                alias: alias.clone(),
            });
        }

        let source = column.source.as_ref();
        let target = scope.resolve(source).ok_or_else(|| {
            TranslateError::UnknownColumnSource(source.map(source_name).unwrap_or_default())
        })?;
        scope.columns_mut(target).add_column(attribute_name(column));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_direct_selects_everything() {
        let translator = RequestTranslator::without_metadata();
        let query = translator.translate_table_direct(" Contact ").unwrap();

        assert_eq!(query, StructuredQuery::all_columns("contact"));
    }

    #[test]
    fn test_table_direct_rejects_statement_text() {
        let translator = RequestTranslator::without_metadata();
        assert_eq!(
            translator.translate_table_direct("select * from contact"),
            Err(TranslateError::InvalidTableDirectName(
                "select * from contact".to_string()
            ))
        );
    }

    #[test]
    fn test_options_default_when_fields_missing() {
        let options: TranslateOptions = serde_json::from_str(r#"{"wildcard": "*"}"#).unwrap();
        assert_eq!(options.max_nesting_depth, 32);
        assert_eq!(options.wildcard, '*');
    }
}
