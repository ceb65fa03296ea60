//! entql AST - command AST types
//!
//! The shape an external SQL parser hands to the translator. One statement
//! per command; every grammar is a closed enum so unsupported shapes are
//! matched explicitly rather than falling through.

pub mod ast;
mod helpers;

pub use ast::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_json_shape() {
        let select = SelectStatement::from_source(AliasedSource::table("Contact").with_alias("c"))
            .project(ProjectionItem::column(ColumnRef::aliased("contact", "c", "FirstName")))
            .filter(Filter::eq(
                Operand::Column(ColumnRef::aliased("contact", "c", "LastName")),
                Operand::string("Smith"),
            ));
        let statement = Statement::Select(select);

        let json = serde_json::to_string(&statement).unwrap();
        let parsed: Statement = serde_json::from_str(&json).unwrap();

        assert_eq!(statement, parsed);
        assert!(json.contains("\"Select\""));
    }
}
