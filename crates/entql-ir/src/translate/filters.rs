//! Filter normalization
//!
//! Turns the command's boolean filter expression into condition trees. The
//! target representation has no generic NOT, so negation is pushed down to
//! the leaves: group conjunctions flip (De Morgan) and condition operators
//! are replaced by their complements.

use entql_ast::{ColumnRef, ComparisonOp, Conjunction, Filter, FilterGroup, FunctionCall, InValues, Literal, Operand};
use tracing::trace;

use super::error::TranslateError;
use super::joins::{QueryScope, Target};
use super::translator::TranslateOptions;
use super::values::{attribute_name, coerce_literal, describe_column, operand_value, parameter_value, source_name};
use crate::command::Parameters;
use crate::{AttributeValue, Condition, ConditionOperator, FilterTree, LogicalOperator};

pub(crate) struct FilterNormalizer<'a> {
    parameters: &'a Parameters,
    options: &'a TranslateOptions,
}

impl<'a> FilterNormalizer<'a> {
    pub(crate) fn new(parameters: &'a Parameters, options: &'a TranslateOptions) -> Self {
        Self { parameters, options }
    }

    /// Add a pre-grouped WHERE clause under the root criteria.
    pub(crate) fn apply_group(
        &self,
        scope: &mut QueryScope,
        group: &FilterGroup,
    ) -> Result<(), TranslateError> {
        if let Some(tree) = self.normalize_group(scope, group, false, 1)? {
            scope.criteria_mut(Target::Root).filters.push(tree);
        }
        Ok(())
    }

    /// Add a flat WHERE list, routing each condition to the criteria of the
    /// entity it references.
    pub(crate) fn apply_filters(
        &self,
        scope: &mut QueryScope,
        filters: &[Filter],
    ) -> Result<(), TranslateError> {
        for filter in filters {
            self.apply_flat(scope, filter, false, 1)?;
        }
        Ok(())
    }

    fn apply_flat(
        &self,
        scope: &mut QueryScope,
        filter: &Filter,
        negate: bool,
        depth: usize,
    ) -> Result<(), TranslateError> {
        self.guard(depth)?;
        match filter {
            Filter::Group(group) => {
                if let Some(tree) = self.normalize_group(scope, group, negate, depth + 1)? {
                    scope.criteria_mut(Target::Root).filters.push(tree);
                }
            }
            Filter::Not(inner) => self.apply_flat(scope, inner, !negate, depth + 1)?,
            leaf => {
                let (target, condition) = self.condition(scope, leaf, negate)?;
                scope.criteria_mut(target).conditions.push(condition);
            }
        }
        Ok(())
    }

    fn normalize_group(
        &self,
        scope: &QueryScope,
        group: &FilterGroup,
        negate: bool,
        depth: usize,
    ) -> Result<Option<FilterTree>, TranslateError> {
        self.guard(depth)?;
        if group.filters.is_empty() {
            return Ok(None);
        }

        let operator = match (group.conjunction, negate) {
            (Conjunction::And, false) | (Conjunction::Or, true) => LogicalOperator::And,
            (Conjunction::Or, false) | (Conjunction::And, true) => LogicalOperator::Or,
        };
        let mut tree = FilterTree::new(operator);
        for filter in &group.filters {
            self.normalize_into(scope, &mut tree, filter, negate, depth)?;
        }

        Ok(if tree.is_empty() { None } else { Some(tree) })
    }

    fn normalize_into(
        &self,
        scope: &QueryScope,
        tree: &mut FilterTree,
        filter: &Filter,
        negate: bool,
        depth: usize,
    ) -> Result<(), TranslateError> {
        match filter {
            Filter::Group(group) => {
                if let Some(child) = self.normalize_group(scope, group, negate, depth + 1)? {
                    tree.filters.push(child);
                }
            }
            Filter::Not(inner) => {
                self.guard(depth + 1)?;
                self.normalize_into(scope, tree, inner, !negate, depth + 1)?;
            }
            leaf => {
                let (_, condition) = self.condition(scope, leaf, negate)?;
                tree.conditions.push(condition);
            }
        }
        Ok(())
    }

    fn guard(&self, depth: usize) -> Result<(), TranslateError> {
        if depth > self.options.max_nesting_depth {
            return Err(TranslateError::NestingTooDeep {
                limit: self.options.max_nesting_depth,
            });
        }
        Ok(())
    }

    /// Translate a leaf filter and resolve the entity it belongs to.
    fn condition(
        &self,
        scope: &QueryScope,
        filter: &Filter,
        negate: bool,
    ) -> Result<(Target, Condition), TranslateError> {
        let (column, operator, values) = match filter {
            Filter::Comparison { op, left, right } => self.comparison(*op, left, right)?,
            Filter::Like {
                operand,
                pattern,
                negated,
            } => {
                let column = filter_column(operand)?;
                let (operator, value) =
                    classify_pattern(&self.pattern_text(pattern)?, self.options.wildcard)?;
                let operator = if *negated { operator.negate() } else { operator };
                (column, operator, vec![AttributeValue::String(value)])
            }
            Filter::Null { operand, negated } => {
                let operator = if *negated {
                    ConditionOperator::NotNull
                } else {
                    ConditionOperator::Null
                };
                (filter_column(operand)?, operator, Vec::new())
            }
            Filter::In {
                operand,
                values,
                negated,
            } => {
                let operator = if *negated {
                    ConditionOperator::NotIn
                } else {
                    ConditionOperator::In
                };
                (filter_column(operand)?, operator, in_values(values)?)
            }
            Filter::Function(call) => self.function(call)?,
            Filter::Between { .. } => {
                return Err(TranslateError::UnsupportedFilter("BETWEEN".to_string()))
            }
            Filter::Exists(_) => {
                return Err(TranslateError::UnsupportedFilter("EXISTS".to_string()))
            }
            Filter::Group(_) | Filter::Not(_) => {
                return Err(TranslateError::UnsupportedFilter(
                    "nested filter in condition position".to_string(),
                ))
            }
        };

        let operator = if negate { operator.negate() } else { operator };
        if !operator.accepts_value_count(values.len()) {
            return Err(TranslateError::UnsupportedFilter(format!(
                "{:?} condition on '{}' with {} values",
                operator,
                describe_column(column),
                values.len()
            )));
        }

        let source = column.source.as_ref();
        let target = scope.resolve(source).ok_or_else(|| {
            TranslateError::UnknownFilterSource(source.map(source_name).unwrap_or_default())
        })?;

        let condition = Condition {
            entity_name: Some(scope.target_name(target, source)),
            attribute_name: attribute_name(column),
            operator,
            values,
        };
        trace!(
            attribute = %condition.attribute_name,
            operator = ?condition.operator,
            target = ?target,
            "Normalized condition"
        );
        Ok((target, condition))
    }

    fn comparison<'f>(
        &self,
        op: ComparisonOp,
        left: &'f Operand,
        right: &'f Operand,
    ) -> Result<(&'f ColumnRef, ConditionOperator, Vec<AttributeValue>), TranslateError> {
        let (column, op, value) = match (left, right) {
            (Operand::Column(a), Operand::Column(b)) => {
                return Err(TranslateError::UnsupportedFilter(format!(
                    "comparison between columns '{}' and '{}'",
                    describe_column(a),
                    describe_column(b)
                )))
            }
            (Operand::Column(column), value) => (column, op, value),
            // `5 < x` reads as `x > 5`
            (value, Operand::Column(column)) => (column, mirror(op), value),
            _ => {
                return Err(TranslateError::UnsupportedFilter(
                    "a comparison must reference a column".to_string(),
                ))
            }
        };

        let value = operand_value(value, self.parameters)?.ok_or_else(|| {
            TranslateError::UnsupportedFilter(format!(
                "comparison on '{}' must be against a literal or parameter",
                describe_column(column)
            ))
        })?;
        Ok((column, comparison_operator(op), vec![value]))
    }

    /// LIKE patterns are taken raw, never coerced to identifiers.
    fn pattern_text(&self, pattern: &Operand) -> Result<String, TranslateError> {
        match pattern {
            Operand::Literal(Literal::String(text)) => Ok(text.clone()),
            Operand::Placeholder(name) => match parameter_value(self.parameters, name)? {
                AttributeValue::String(text) => Ok(text),
                other => Err(TranslateError::UnsupportedFilter(format!(
                    "LIKE pattern parameter '{}' must be a string, got {}",
                    name,
                    other.kind()
                ))),
            },
            _ => Err(TranslateError::UnsupportedFilter(
                "LIKE pattern must be a string literal or parameter".to_string(),
            )),
        }
    }

    /// `contains(column, value)`
    fn function<'f>(
        &self,
        call: &'f FunctionCall,
    ) -> Result<(&'f ColumnRef, ConditionOperator, Vec<AttributeValue>), TranslateError> {
        if !call.name.eq_ignore_ascii_case("contains") {
            return Err(TranslateError::UnsupportedFilter(format!(
                "function '{}'",
                call.name
            )));
        }
        let (column, value) = match call.args.as_slice() {
            [Operand::Column(column), Operand::Literal(Literal::String(text))] => {
                (column, AttributeValue::String(text.clone()))
            }
            [Operand::Column(column), Operand::Placeholder(name)] => {
                (column, parameter_value(self.parameters, name)?)
            }
            _ => {
                return Err(TranslateError::UnsupportedFilter(
                    "contains() takes a column and a string value".to_string(),
                ))
            }
        };
        Ok((column, ConditionOperator::Contains, vec![value]))
    }
}

/// Classify a LIKE pattern by where its wildcards sit.
///
/// Returns the operator and the pattern with the consumed wildcards removed.
/// Wildcards are stripped greedily from each classified end.
pub fn classify_pattern(
    pattern: &str,
    wildcard: char,
) -> Result<(ConditionOperator, String), TranslateError> {
    if pattern.is_empty() {
        return Err(TranslateError::UnsupportedFilter(
            "LIKE pattern is empty".to_string(),
        ));
    }

    let leading = pattern.starts_with(wildcard);
    let trailing = pattern.ends_with(wildcard);
    Ok(match (leading, trailing) {
        (true, true) => (
            ConditionOperator::Contains,
            pattern.trim_matches(wildcard).to_string(),
        ),
        (false, true) => (
            ConditionOperator::BeginsWith,
            pattern.trim_end_matches(wildcard).to_string(),
        ),
        (true, false) => (
            ConditionOperator::EndsWith,
            pattern.trim_start_matches(wildcard).to_string(),
        ),
        (false, false) => (ConditionOperator::Like, pattern.to_string()),
    })
}

fn filter_column(operand: &Operand) -> Result<&ColumnRef, TranslateError> {
    match operand {
        Operand::Column(column) => Ok(column),
        _ => Err(TranslateError::UnsupportedFilter(
            "the filtered operand must be a column".to_string(),
        )),
    }
}

fn in_values(values: &InValues) -> Result<Vec<AttributeValue>, TranslateError> {
    let items = match values {
        InValues::List(items) => items,
        InValues::Subquery(_) => {
            return Err(TranslateError::UnsupportedFilter(
                "IN over a sub-query".to_string(),
            ))
        }
    };
    if items.is_empty() {
        return Err(TranslateError::UnsupportedFilter(
            "IN requires at least one value".to_string(),
        ));
    }

    items
        .iter()
        .map(|item| match item {
            Operand::Literal(literal) => coerce_literal(literal),
            _ => Err(TranslateError::UnsupportedFilter(
                "IN values must all be literals".to_string(),
            )),
        })
        .collect()
}

fn mirror(op: ComparisonOp) -> ComparisonOp {
    match op {
        ComparisonOp::Gt => ComparisonOp::Lt,
        ComparisonOp::GtEq => ComparisonOp::LtEq,
        ComparisonOp::Lt => ComparisonOp::Gt,
        ComparisonOp::LtEq => ComparisonOp::GtEq,
        ComparisonOp::Eq | ComparisonOp::NotEq => op,
    }
}

fn comparison_operator(op: ComparisonOp) -> ConditionOperator {
    match op {
        ComparisonOp::Eq => ConditionOperator::Equal,
        ComparisonOp::NotEq => ConditionOperator::NotEqual,
        ComparisonOp::Gt => ConditionOperator::GreaterThan,
        ComparisonOp::GtEq => ConditionOperator::GreaterEqual,
        ComparisonOp::Lt => ConditionOperator::LessThan,
        ComparisonOp::LtEq => ConditionOperator::LessEqual,
    }
}
