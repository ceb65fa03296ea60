//! Constructors for building statements in code.

use crate::ast::*;

impl ColumnRef {
    /// Unqualified column; resolves to the driving entity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            source: None,
            name: name.into(),
        }
    }

    /// Column qualified by its table name.
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source: Some(ColumnSource {
                table: table.into(),
                alias: None,
            }),
            name: name.into(),
        }
    }

    /// Column qualified by an aliased table.
    pub fn aliased(
        table: impl Into<String>,
        alias: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(ColumnSource {
                table: table.into(),
                alias: Some(alias.into()),
            }),
            name: name.into(),
        }
    }
}

impl AliasedSource {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            source: Source::Table { name: name.into() },
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl TableSource {
    pub fn table(name: impl Into<String>) -> Self {
        TableSource::Aliased(AliasedSource::table(name))
    }

    /// Extend the chain with another join, keeping it left-deep.
    pub fn join(self, kind: JoinKind, right: AliasedSource, on: Filter) -> Self {
        TableSource::Join(Box::new(Join {
            kind,
            left: self,
            right,
            on: vec![on],
        }))
    }
}

impl ProjectionItem {
    pub fn all() -> Self {
        Self {
            expr: ProjectionExpr::AllColumns,
            alias: None,
        }
    }

    pub fn column(column: ColumnRef) -> Self {
        Self {
            expr: ProjectionExpr::Column(column),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl Operand {
    pub fn column(name: impl Into<String>) -> Self {
        Operand::Column(ColumnRef::new(name))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Operand::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Operand::Literal(Literal::Numeric(value))
    }

    pub fn null() -> Self {
        Operand::Literal(Literal::Null)
    }

    pub fn placeholder(name: impl Into<String>) -> Self {
        Operand::Placeholder(name.into())
    }
}

impl Filter {
    pub fn compare(op: ComparisonOp, left: Operand, right: Operand) -> Self {
        Filter::Comparison { op, left, right }
    }

    pub fn eq(left: Operand, right: Operand) -> Self {
        Filter::compare(ComparisonOp::Eq, left, right)
    }

    pub fn like(operand: Operand, pattern: impl Into<String>) -> Self {
        Filter::Like {
            operand,
            pattern: Operand::string(pattern),
            negated: false,
        }
    }

    pub fn is_null(operand: Operand) -> Self {
        Filter::Null {
            operand,
            negated: false,
        }
    }

    pub fn in_list(operand: Operand, values: Vec<Operand>) -> Self {
        Filter::In {
            operand,
            values: InValues::List(values),
            negated: false,
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::Group(FilterGroup {
            conjunction: Conjunction::And,
            filters,
        })
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Group(FilterGroup {
            conjunction: Conjunction::Or,
            filters,
        })
    }
}

impl SelectStatement {
    pub fn from_source(source: AliasedSource) -> Self {
        Self {
            from: vec![TableSource::Aliased(source)],
            ..Default::default()
        }
    }

    pub fn from_join(source: TableSource) -> Self {
        Self {
            from: vec![source],
            ..Default::default()
        }
    }

    pub fn project(mut self, item: ProjectionItem) -> Self {
        self.projection.push(item);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.where_filters.push(filter);
        self
    }

    pub fn grouped(mut self, group: FilterGroup) -> Self {
        self.where_group = Some(group);
        self
    }
}

impl InsertStatement {
    pub fn into_table(
        table: impl Into<String>,
        columns: Vec<ColumnRef>,
        values: Vec<Operand>,
    ) -> Self {
        Self {
            target: Source::Table { name: table.into() },
            columns,
            values: InsertValues::List(values),
        }
    }
}
