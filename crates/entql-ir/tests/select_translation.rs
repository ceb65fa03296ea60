//! SELECT translation: join chains, filter normalization and projection routing

use entql_ast::*;
use entql_ir::translate::{RequestTranslator, TranslateError, TranslateOptions};
use entql_ir::{
    AttributeValue, ColumnSet, Command, Condition, ConditionOperator, FilterTree, JoinOperator,
    LinkId, LogicalOperator, Parameters, Request, StructuredQuery,
};

/// contact -> account (a) -> systemuser (u)
fn contact_account_owner() -> TableSource {
    TableSource::table("contact")
        .join(
            JoinKind::Inner,
            AliasedSource::table("account").with_alias("a"),
            Filter::eq(
                Operand::Column(ColumnRef::qualified("contact", "parentcustomerid")),
                Operand::Column(ColumnRef::aliased("account", "a", "accountid")),
            ),
        )
        .join(
            JoinKind::LeftOuter,
            AliasedSource::table("systemuser").with_alias("u"),
            Filter::eq(
                Operand::Column(ColumnRef::aliased("account", "a", "owninguser")),
                Operand::Column(ColumnRef::aliased("systemuser", "u", "systemuserid")),
            ),
        )
}

fn select_from_contact() -> SelectStatement {
    SelectStatement::from_source(AliasedSource::table("contact"))
        .project(ProjectionItem::column(ColumnRef::new("firstname")))
}

fn translate(select: &SelectStatement) -> Result<StructuredQuery, TranslateError> {
    RequestTranslator::without_metadata().translate_select(select, &Parameters::new())
}

fn condition(attribute: &str, operator: ConditionOperator, values: Vec<AttributeValue>) -> Condition {
    Condition {
        entity_name: Some("contact".to_string()),
        attribute_name: attribute.to_string(),
        operator,
        values,
    }
}

#[test]
fn test_join_chain_builds_links_in_order() {
    let select = SelectStatement::from_join(contact_account_owner())
        .project(ProjectionItem::column(ColumnRef::qualified("contact", "FirstName")))
        .project(ProjectionItem::column(ColumnRef::aliased("account", "a", "Name")))
        .project(ProjectionItem::column(ColumnRef::aliased("systemuser", "u", "fullname")));

    let query = translate(&select).expect("Translation should succeed");

    assert_eq!(query.entity_name, "contact");
    assert_eq!(query.columns, ColumnSet::Columns(vec!["firstname".to_string()]));
    assert_eq!(query.link_entities.len(), 2);
    assert_eq!(query.root_links, vec![LinkId(0)]);

    let account = query.link(LinkId(0));
    assert_eq!(account.link_from_entity_name, "contact");
    assert_eq!(account.link_to_entity_name, "account");
    assert_eq!(account.link_from_attribute_name, "parentcustomerid");
    assert_eq!(account.link_to_attribute_name, "accountid");
    assert_eq!(account.join_operator, JoinOperator::Inner);
    assert_eq!(account.entity_alias.as_deref(), Some("a"));
    assert_eq!(account.columns, ColumnSet::Columns(vec!["name".to_string()]));
    assert_eq!(account.link_entities, vec![LinkId(1)]);

    let owner = query.link(LinkId(1));
    assert_eq!(owner.link_from_entity_name, "account");
    assert_eq!(owner.link_to_entity_name, "systemuser");
    assert_eq!(owner.join_operator, JoinOperator::LeftOuter);
    assert_eq!(owner.columns, ColumnSet::Columns(vec!["fullname".to_string()]));
}

#[test]
fn test_join_on_alias_not_yet_introduced() {
    let source = contact_account_owner().join(
        JoinKind::Inner,
        AliasedSource::table("lead").with_alias("l"),
        Filter::eq(
            Operand::Column(ColumnRef::aliased("campaign", "x", "campaignid")),
            Operand::Column(ColumnRef::aliased("lead", "l", "campaignid")),
        ),
    );
    let select = SelectStatement::from_join(source).project(ProjectionItem::all());

    assert_eq!(
        translate(&select),
        Err(TranslateError::UnknownJoinSource("x".to_string()))
    );
}

#[test]
fn test_later_join_from_driving_entity_attaches_to_root() {
    let source = TableSource::table("contact")
        .join(
            JoinKind::Inner,
            AliasedSource::table("account"),
            Filter::eq(
                Operand::Column(ColumnRef::qualified("contact", "parentcustomerid")),
                Operand::Column(ColumnRef::qualified("account", "accountid")),
            ),
        )
        .join(
            JoinKind::Inner,
            AliasedSource::table("systemuser"),
            Filter::eq(
                Operand::Column(ColumnRef::qualified("contact", "ownerid")),
                Operand::Column(ColumnRef::qualified("systemuser", "systemuserid")),
            ),
        );
    let select = SelectStatement::from_join(source).project(ProjectionItem::all());

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(query.root_links, vec![LinkId(0), LinkId(1)]);
    assert!(query.link(LinkId(0)).link_entities.is_empty());
}

#[test]
fn test_multiple_on_conditions_rejected() {
    let source = TableSource::Join(Box::new(Join {
        kind: JoinKind::Inner,
        left: TableSource::table("contact"),
        right: AliasedSource::table("account"),
        on: vec![
            Filter::eq(
                Operand::Column(ColumnRef::qualified("contact", "parentcustomerid")),
                Operand::Column(ColumnRef::qualified("account", "accountid")),
            ),
            Filter::eq(
                Operand::Column(ColumnRef::qualified("contact", "ownerid")),
                Operand::Column(ColumnRef::qualified("account", "ownerid")),
            ),
        ],
    }));
    let select = SelectStatement::from_join(source).project(ProjectionItem::all());

    assert!(matches!(
        translate(&select),
        Err(TranslateError::UnsupportedJoinCondition(_))
    ));
}

#[test]
fn test_not_equal_and_negated_equal_match() {
    let negated = select_from_contact()
        .filter(Filter::eq(Operand::column("age"), Operand::number(5.0)).negate());
    let not_equal = select_from_contact().filter(Filter::compare(
        ComparisonOp::NotEq,
        Operand::column("age"),
        Operand::number(5.0),
    ));

    let negated = translate(&negated).expect("Translation should succeed");
    let not_equal = translate(&not_equal).expect("Translation should succeed");

    assert_eq!(negated, not_equal);
    assert_eq!(
        negated.criteria.conditions,
        vec![condition("age", ConditionOperator::NotEqual, vec![AttributeValue::Int32(5)])]
    );
}

#[test]
fn test_negated_like_becomes_does_not_begin_with() {
    let select = select_from_contact()
        .filter(Filter::like(Operand::column("firstname"), "a%").negate());

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(
        query.criteria.conditions,
        vec![condition(
            "firstname",
            ConditionOperator::DoesNotBeginWith,
            vec![AttributeValue::String("a".to_string())]
        )]
    );
}

#[test]
fn test_like_shapes() {
    let cases = [
        ("abc%", ConditionOperator::BeginsWith),
        ("%abc", ConditionOperator::EndsWith),
        ("%abc%", ConditionOperator::Contains),
        ("abc", ConditionOperator::Like),
    ];
    for (pattern, operator) in cases {
        let select = select_from_contact().filter(Filter::like(Operand::column("lastname"), pattern));
        let query = translate(&select).expect("Translation should succeed");

        assert_eq!(query.criteria.conditions[0].operator, operator, "pattern {}", pattern);
        assert_eq!(
            query.criteria.conditions[0].values,
            vec![AttributeValue::String("abc".to_string())]
        );
    }
}

#[test]
fn test_like_pattern_is_not_coerced() {
    // a pattern that happens to look like an identifier stays a string
    let pattern = "9c2f8a52-1e5b-4c3e-8f61-3a9d0c7b4e21";
    let select = select_from_contact().filter(Filter::like(Operand::column("code"), pattern));

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(
        query.criteria.conditions[0].values,
        vec![AttributeValue::String(pattern.to_string())]
    );
}

#[test]
fn test_not_over_group_applies_de_morgan() {
    let select = select_from_contact().filter(
        Filter::or(vec![
            Filter::eq(Operand::column("a"), Operand::number(1.0)),
            Filter::is_null(Operand::column("b")),
        ])
        .negate(),
    );

    let query = translate(&select).expect("Translation should succeed");

    let expected = FilterTree {
        filter_operator: LogicalOperator::And,
        conditions: vec![
            condition("a", ConditionOperator::NotEqual, vec![AttributeValue::Int32(1)]),
            condition("b", ConditionOperator::NotNull, vec![]),
        ],
        filters: vec![],
    };
    assert_eq!(query.criteria.filters, vec![expected]);
    assert!(query.criteria.conditions.is_empty());
}

#[test]
fn test_double_negation_cancels() {
    let select = select_from_contact()
        .filter(Filter::is_null(Operand::column("email")).negate().negate());

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(query.criteria.conditions[0].operator, ConditionOperator::Null);
}

#[test]
fn test_ordering_negation_uses_complement() {
    let select = select_from_contact().filter(
        Filter::compare(ComparisonOp::Gt, Operand::column("age"), Operand::number(30.0)).negate(),
    );

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(query.criteria.conditions[0].operator, ConditionOperator::LessEqual);
}

#[test]
fn test_column_on_right_is_mirrored() {
    let select = select_from_contact().filter(Filter::compare(
        ComparisonOp::Lt,
        Operand::number(5.0),
        Operand::column("age"),
    ));

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(
        query.criteria.conditions,
        vec![condition("age", ConditionOperator::GreaterThan, vec![AttributeValue::Int32(5)])]
    );
}

#[test]
fn test_column_to_column_filter_rejected() {
    let select = select_from_contact().filter(Filter::eq(
        Operand::column("firstname"),
        Operand::column("lastname"),
    ));

    assert!(matches!(
        translate(&select),
        Err(TranslateError::UnsupportedFilter(_))
    ));
}

#[test]
fn test_in_list_flattens_literals() {
    let select = select_from_contact().filter(Filter::in_list(
        Operand::column("x"),
        vec![Operand::number(1.0), Operand::number(2.0), Operand::number(3.0)],
    ));

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(query.criteria.conditions.len(), 1);
    assert_eq!(
        query.criteria.conditions[0],
        condition(
            "x",
            ConditionOperator::In,
            vec![
                AttributeValue::Int32(1),
                AttributeValue::Int32(2),
                AttributeValue::Int32(3)
            ]
        )
    );
}

#[test]
fn test_in_list_with_column_rejected() {
    let select = select_from_contact().filter(Filter::in_list(
        Operand::column("x"),
        vec![Operand::column("y")],
    ));

    assert!(matches!(
        translate(&select),
        Err(TranslateError::UnsupportedFilter(_))
    ));
}

#[test]
fn test_contains_predicate() {
    let select = select_from_contact().filter(Filter::Function(FunctionCall {
        name: "CONTAINS".to_string(),
        args: vec![Operand::column("description"), Operand::string("urgent")],
    }));

    let query = translate(&select).expect("Translation should succeed");
    assert_eq!(
        query.criteria.conditions,
        vec![condition(
            "description",
            ConditionOperator::Contains,
            vec![AttributeValue::String("urgent".to_string())]
        )]
    );
}

#[test]
fn test_between_rejected() {
    let select = select_from_contact().filter(Filter::Between {
        operand: Operand::column("age"),
        low: Operand::number(1.0),
        high: Operand::number(9.0),
        negated: false,
    });

    assert_eq!(
        translate(&select),
        Err(TranslateError::UnsupportedFilter("BETWEEN".to_string()))
    );
}

#[test]
fn test_flat_filters_route_to_link_criteria() {
    let select = SelectStatement::from_join(contact_account_owner())
        .project(ProjectionItem::column(ColumnRef::new("firstname")))
        .filter(Filter::eq(
            Operand::Column(ColumnRef::aliased("account", "a", "name")),
            Operand::string("Acme"),
        ))
        .filter(Filter::eq(Operand::column("lastname"), Operand::string("Smith")));

    let query = translate(&select).expect("Translation should succeed");

    let account = query.link(LinkId(0));
    assert_eq!(
        account.link_criteria.conditions,
        vec![Condition {
            entity_name: Some("a".to_string()),
            attribute_name: "name".to_string(),
            operator: ConditionOperator::Equal,
            values: vec![AttributeValue::String("Acme".to_string())],
        }]
    );
    assert_eq!(
        query.criteria.conditions,
        vec![condition(
            "lastname",
            ConditionOperator::Equal,
            vec![AttributeValue::String("Smith".to_string())]
        )]
    );
}

#[test]
fn test_self_join_keeps_driving_entity_references_on_root() {
    let source = TableSource::table("contact").join(
        JoinKind::LeftOuter,
        AliasedSource::table("contact").with_alias("m"),
        Filter::eq(
            Operand::Column(ColumnRef::qualified("contact", "parentcontactid")),
            Operand::Column(ColumnRef::aliased("contact", "m", "contactid")),
        ),
    );
    let select = SelectStatement::from_join(source)
        .project(ProjectionItem::column(ColumnRef::qualified("contact", "firstname")))
        .project(ProjectionItem::column(ColumnRef::aliased("contact", "m", "lastname")))
        .filter(Filter::eq(
            Operand::Column(ColumnRef::qualified("contact", "lastname")),
            Operand::string("Smith"),
        ));

    let query = translate(&select).expect("Translation should succeed");

    let manager = query.link(LinkId(0));
    assert_eq!(manager.entity_alias.as_deref(), Some("m"));
    assert_eq!(query.columns, ColumnSet::Columns(vec!["firstname".to_string()]));
    assert_eq!(manager.columns, ColumnSet::Columns(vec!["lastname".to_string()]));
    assert_eq!(
        query.criteria.conditions,
        vec![condition(
            "lastname",
            ConditionOperator::Equal,
            vec![AttributeValue::String("Smith".to_string())]
        )]
    );
    assert!(manager.link_criteria.is_empty());
}

#[test]
fn test_grouped_conditions_stay_in_group() {
    let select = SelectStatement::from_join(contact_account_owner())
        .project(ProjectionItem::all())
        .grouped(FilterGroup {
            conjunction: Conjunction::Or,
            filters: vec![
                Filter::eq(
                    Operand::Column(ColumnRef::aliased("systemuser", "u", "fullname")),
                    Operand::string("Ann"),
                ),
                Filter::eq(Operand::column("lastname"), Operand::string("Smith")),
            ],
        })
        // ignored: the grouped clause wins
        .filter(Filter::is_null(Operand::column("email")));

    let query = translate(&select).expect("Translation should succeed");

    assert!(query.criteria.conditions.is_empty());
    assert_eq!(query.criteria.filters.len(), 1);
    let group = &query.criteria.filters[0];
    assert_eq!(group.filter_operator, LogicalOperator::Or);
    assert_eq!(group.conditions[0].entity_name.as_deref(), Some("u"));
    assert_eq!(group.conditions[1].entity_name.as_deref(), Some("contact"));
    assert!(query.link(LinkId(1)).link_criteria.is_empty());
}

#[test]
fn test_empty_group_is_omitted() {
    let select = select_from_contact().grouped(FilterGroup {
        conjunction: Conjunction::And,
        filters: vec![],
    });

    let query = translate(&select).expect("Translation should succeed");
    assert!(query.criteria.is_empty());
}

#[test]
fn test_unknown_filter_source() {
    let select = select_from_contact().filter(Filter::eq(
        Operand::Column(ColumnRef::aliased("lead", "z", "subject")),
        Operand::string("x"),
    ));

    assert_eq!(
        translate(&select),
        Err(TranslateError::UnknownFilterSource("z".to_string()))
    );
}

#[test]
fn test_projection_errors() {
    let aliased = SelectStatement::from_source(AliasedSource::table("contact"))
        .project(ProjectionItem::column(ColumnRef::new("firstname")).with_alias("name"));
    assert_eq!(
        translate(&aliased),
        Err(TranslateError::UnsupportedColumnAlias {
            column: "firstname".to_string(),
            alias: "name".to_string(),
        })
    );

    let function = SelectStatement::from_source(AliasedSource::table("contact")).project(ProjectionItem {
        expr: ProjectionExpr::Function(FunctionCall {
            name: "count".to_string(),
            args: vec![],
        }),
        alias: None,
    });
    assert!(matches!(
        translate(&function),
        Err(TranslateError::UnsupportedProjection(_))
    ));

    let unknown = SelectStatement::from_source(AliasedSource::table("contact"))
        .project(ProjectionItem::column(ColumnRef::qualified("lead", "subject")));
    assert_eq!(
        translate(&unknown),
        Err(TranslateError::UnknownColumnSource("lead".to_string()))
    );
}

#[test]
fn test_all_columns_and_duplicates() {
    let all = SelectStatement::from_source(AliasedSource::table("Contact")).project(ProjectionItem::all());
    assert_eq!(translate(&all).unwrap(), StructuredQuery::all_columns("contact"));

    let duplicated = select_from_contact().project(ProjectionItem::column(ColumnRef::new("FIRSTNAME")));
    assert_eq!(
        translate(&duplicated).unwrap().columns,
        ColumnSet::Columns(vec!["firstname".to_string()])
    );
}

#[test]
fn test_source_preconditions() {
    let no_source = SelectStatement::default().project(ProjectionItem::all());
    assert_eq!(translate(&no_source), Err(TranslateError::MissingSource));

    let mut two_sources = select_from_contact();
    two_sources.from.push(TableSource::table("account"));
    assert_eq!(
        translate(&two_sources),
        Err(TranslateError::MultipleSourcesUnsupported(2))
    );

    let no_columns = SelectStatement::from_source(AliasedSource::table("contact"));
    assert_eq!(translate(&no_columns), Err(TranslateError::EmptyProjection));

    let subquery = SelectStatement::from_source(AliasedSource {
        source: Source::Subquery(Box::new(select_from_contact())),
        alias: Some("s".to_string()),
    })
    .project(ProjectionItem::all());
    assert_eq!(
        translate(&subquery),
        Err(TranslateError::SubquerySourceUnsupported)
    );
}

#[test]
fn test_placeholder_values() {
    let select = select_from_contact().filter(Filter::eq(
        Operand::column("emailaddress1"),
        Operand::placeholder("@email"),
    ));
    let command = Command::text(Statement::Select(select.clone()))
        .with_parameter("@email", "ann@example.com");

    let request = RequestTranslator::without_metadata()
        .translate(&command)
        .expect("Translation should succeed");
    let Request::RetrieveMany { query } = request else {
        panic!("expected a retrieve request");
    };
    assert_eq!(
        query.criteria.conditions[0].values,
        vec![AttributeValue::String("ann@example.com".to_string())]
    );

    assert_eq!(
        translate(&select),
        Err(TranslateError::MissingParameterValue("@email".to_string()))
    );
}

#[test]
fn test_nesting_depth_is_bounded() {
    let mut filter = Filter::eq(Operand::column("a"), Operand::number(1.0));
    for _ in 0..40 {
        filter = Filter::and(vec![filter]);
    }
    let select = select_from_contact().filter(filter);

    assert_eq!(
        translate(&select),
        Err(TranslateError::NestingTooDeep { limit: 32 })
    );

    let relaxed = RequestTranslator::without_metadata().with_options(TranslateOptions {
        max_nesting_depth: 64,
        ..TranslateOptions::default()
    });
    assert!(relaxed.translate_select(&select, &Parameters::new()).is_ok());
}

#[test]
fn test_translation_is_deterministic() {
    let select = SelectStatement::from_join(contact_account_owner())
        .project(ProjectionItem::column(ColumnRef::new("firstname")))
        .filter(Filter::like(Operand::column("lastname"), "%son"));
    let command = Command::text(Statement::Select(select));
    let translator = RequestTranslator::without_metadata();

    let first = translator.translate(&command).unwrap();
    let second = translator.translate(&command).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
}
