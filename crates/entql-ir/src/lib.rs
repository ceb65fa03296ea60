//! entql Intermediate Representation (IR)
//!
//! The structured request model of the remote entity service: a retrieve
//! request (driving entity, column projection, filter tree and linked
//! entities) or a create request (a typed attribute set). All types are
//! deterministically serializable so translations can be compared and logged.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod command;
pub mod metadata;
pub mod translate;
mod types;

pub use command::{Command, CommandKind, Parameters};
pub use types::*;

/// A translated request, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request")]
pub enum Request {
    RetrieveMany { query: StructuredQuery },
    Create { target: Entity },
}

impl Request {
    /// Calculate fingerprint (SHA-256) of the serialized request
    pub fn fingerprint(&self) -> String {
        fingerprint(self)
    }
}

fn fingerprint<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).expect("IR should always serialize");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Index of a [`LinkedEntity`] in its query's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub usize);

/// A retrieve-many request.
///
/// Linked entities live in a flat arena (`link_entities`, chain order); the
/// tree shape is expressed through `root_links` and each link's own
/// `link_entities` index list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub entity_name: String,
    pub columns: ColumnSet,
    #[serde(default, skip_serializing_if = "FilterTree::is_empty")]
    pub criteria: FilterTree,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_entities: Vec<LinkedEntity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_links: Vec<LinkId>,
}

impl StructuredQuery {
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            columns: ColumnSet::default(),
            criteria: FilterTree::default(),
            link_entities: Vec::new(),
            root_links: Vec::new(),
        }
    }

    /// Query for every column of an entity with no filter.
    pub fn all_columns(entity_name: impl Into<String>) -> Self {
        let mut query = Self::new(entity_name);
        query.columns = ColumnSet::All;
        query
    }

    pub fn link(&self, id: LinkId) -> &LinkedEntity {
        &self.link_entities[id.0]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut LinkedEntity {
        &mut self.link_entities[id.0]
    }

    /// Add a link to the arena, under `parent` or under the driving entity.
    pub fn attach(&mut self, parent: Option<LinkId>, link: LinkedEntity) -> LinkId {
        let id = LinkId(self.link_entities.len());
        self.link_entities.push(link);
        match parent {
            Some(parent) => self.link_mut(parent).link_entities.push(id),
            None => self.root_links.push(id),
        }
        id
    }

    /// Find the first link (chain order) with the given alias or target entity.
    pub fn find_link_entity(&self, name: &str, is_alias: bool) -> Option<LinkId> {
        self.link_entities
            .iter()
            .position(|link| {
                if is_alias {
                    link.entity_alias.as_deref() == Some(name)
                } else {
                    link.link_to_entity_name == name
                }
            })
            .map(LinkId)
    }

    /// Calculate fingerprint (SHA-256) for deterministic comparison
    pub fn fingerprint(&self) -> String {
        fingerprint(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOperator {
    Inner,
    LeftOuter,
}

/// A joined entity in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub link_from_entity_name: String,
    pub link_to_entity_name: String,
    pub link_from_attribute_name: String,
    pub link_to_attribute_name: String,
    pub join_operator: JoinOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_alias: Option<String>,
    pub columns: ColumnSet,
    #[serde(default, skip_serializing_if = "FilterTree::is_empty")]
    pub link_criteria: FilterTree,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_entities: Vec<LinkId>,
}

/// Column projection of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSet {
    All,
    Columns(Vec<String>),
}

impl Default for ColumnSet {
    fn default() -> Self {
        ColumnSet::Columns(Vec::new())
    }
}

impl ColumnSet {
    pub fn is_all(&self) -> bool {
        matches!(self, ColumnSet::All)
    }

    /// Add a column once; no-op when every column is already selected.
    pub fn add_column(&mut self, name: impl Into<String>) {
        if let ColumnSet::Columns(columns) = self {
            let name = name.into();
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            ColumnSet::All => true,
            ColumnSet::Columns(columns) => columns.iter().any(|c| c == name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Boolean combination of conditions. The operator applies to every direct
/// child, conditions and nested trees alike.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterTree {
    pub filter_operator: LogicalOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterTree>,
}

impl FilterTree {
    pub fn new(filter_operator: LogicalOperator) -> Self {
        Self {
            filter_operator,
            conditions: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.filters.is_empty()
    }
}

/// One comparison against an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Entity name or alias the attribute belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub attribute_name: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AttributeValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,
    Like,
    NotLike,
    In,
    NotIn,
    Null,
    NotNull,
    Contains,
    DoesNotContain,
    BeginsWith,
    DoesNotBeginWith,
    EndsWith,
    DoesNotEndWith,
}

impl ConditionOperator {
    /// The operator matching exactly the rows this one rejects.
    ///
    /// The remote service has no generic NOT, so negation is always folded
    /// into the operator.
    pub fn negate(self) -> Self {
        use ConditionOperator::*;
        match self {
            Equal => NotEqual,
            NotEqual => Equal,
            GreaterThan => LessEqual,
            LessEqual => GreaterThan,
            GreaterEqual => LessThan,
            LessThan => GreaterEqual,
            Like => NotLike,
            NotLike => Like,
            In => NotIn,
            NotIn => In,
            Null => NotNull,
            NotNull => Null,
            Contains => DoesNotContain,
            DoesNotContain => Contains,
            BeginsWith => DoesNotBeginWith,
            DoesNotBeginWith => BeginsWith,
            EndsWith => DoesNotEndWith,
            DoesNotEndWith => EndsWith,
        }
    }

    /// Whether a condition with this operator may carry `count` values.
    pub fn accepts_value_count(self, count: usize) -> bool {
        use ConditionOperator::*;
        match self {
            Null | NotNull => count == 0,
            In | NotIn => count >= 1,
            _ => count == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(from: &str, to: &str, alias: Option<&str>) -> LinkedEntity {
        LinkedEntity {
            link_from_entity_name: from.to_string(),
            link_to_entity_name: to.to_string(),
            link_from_attribute_name: format!("{}id", to),
            link_to_attribute_name: format!("{}id", to),
            join_operator: JoinOperator::Inner,
            entity_alias: alias.map(str::to_string),
            columns: ColumnSet::default(),
            link_criteria: FilterTree::default(),
            link_entities: Vec::new(),
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let mut query = StructuredQuery::new("contact");
        query.columns.add_column("firstname");
        let request = Request::RetrieveMany { query };

        assert_eq!(request.fingerprint(), request.clone().fingerprint());
    }

    #[test]
    fn test_attach_builds_tree_in_arena() {
        let mut query = StructuredQuery::new("contact");
        let account = query.attach(None, link("contact", "account", Some("a")));
        let owner = query.attach(Some(account), link("account", "systemuser", None));

        assert_eq!(query.root_links, vec![account]);
        assert_eq!(query.link(account).link_entities, vec![owner]);
        assert_eq!(query.find_link_entity("a", true), Some(account));
        assert_eq!(query.find_link_entity("systemuser", false), Some(owner));
        assert_eq!(query.find_link_entity("account", true), None);
    }

    #[test]
    fn test_negate_is_an_involution() {
        use ConditionOperator::*;
        for op in [
            Equal, NotEqual, GreaterThan, GreaterEqual, LessThan, LessEqual, Like, NotLike, In,
            NotIn, Null, NotNull, Contains, DoesNotContain, BeginsWith, DoesNotBeginWith,
            EndsWith, DoesNotEndWith,
        ] {
            assert_ne!(op.negate(), op);
            assert_eq!(op.negate().negate(), op);
        }
        assert_eq!(GreaterThan.negate(), LessEqual);
        assert_eq!(LessThan.negate(), GreaterEqual);
    }

    #[test]
    fn test_value_arity() {
        assert!(ConditionOperator::Null.accepts_value_count(0));
        assert!(!ConditionOperator::NotNull.accepts_value_count(1));
        assert!(!ConditionOperator::In.accepts_value_count(0));
        assert!(ConditionOperator::NotIn.accepts_value_count(3));
        assert!(!ConditionOperator::Equal.accepts_value_count(2));
    }

    #[test]
    fn test_empty_criteria_omitted_from_json() {
        let query = StructuredQuery::all_columns("account");
        let json = serde_json::to_value(&query).unwrap();

        assert!(json.get("criteria").is_none());
        assert!(json.get("link_entities").is_none());
    }
}
