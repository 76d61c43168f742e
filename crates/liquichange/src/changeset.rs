//! Changesets and rollbacks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::change::ChangeType;
use crate::error::{require, ChangelogError, Result};
use crate::precondition::Preconditions;
use crate::xml::Element;

/// When a changeset runs relative to the others (`runOrder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrder {
    /// Before every other changeset.
    First,
    /// After every other changeset.
    Last,
}

impl RunOrder {
    /// Returns the attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Last => "last",
        }
    }
}

/// How object names are quoted in generated SQL (`objectQuotingStrategy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectQuotingStrategy {
    /// Quote only when required.
    Legacy,
    /// Quote every object name.
    QuoteAllObjects,
    /// Quote only reserved words.
    QuoteOnlyReservedWords,
}

impl ObjectQuotingStrategy {
    /// Returns the Liquibase keyword.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "LEGACY",
            Self::QuoteAllObjects => "QUOTE_ALL_OBJECTS",
            Self::QuoteOnlyReservedWords => "QUOTE_ONLY_RESERVED_WORDS",
        }
    }
}

/// How to undo a changeset (`<rollback>`).
///
/// A rollback holds a raw statement, change types, a reference to another
/// changeset, or nothing at all. An empty rollback tells Liquibase that the
/// changeset needs no undo.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rollback {
    #[serde(default)]
    change_set_id: Option<String>,
    #[serde(default)]
    change_set_author: Option<String>,
    #[serde(default)]
    statement: Option<String>,
    #[serde(default)]
    changes: Vec<ChangeType>,
}

impl Rollback {
    /// A rollback with no body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rolls back with a raw statement.
    pub fn statement(statement: impl Into<String>) -> Result<Self> {
        let statement = statement.into();
        require("rollback", "statement", &statement)?;
        Ok(Self {
            statement: Some(statement),
            ..Self::default()
        })
    }

    /// Rolls back with a change type.
    #[must_use]
    pub fn change(change: impl Into<ChangeType>) -> Self {
        Self::empty().with_change(change)
    }

    /// Rolls back by running the rollback of another changeset.
    pub fn referencing(id: impl Into<String>, author: impl Into<String>) -> Result<Self> {
        let rollback = Self {
            change_set_id: Some(id.into()),
            change_set_author: Some(author.into()),
            ..Self::default()
        };
        rollback.validate()?;
        Ok(rollback)
    }

    /// Appends a change type.
    #[must_use]
    pub fn with_change(mut self, change: impl Into<ChangeType>) -> Self {
        self.changes.push(change.into());
        self
    }

    /// Returns the change types, in order.
    #[must_use]
    pub fn changes(&self) -> &[ChangeType] {
        &self.changes
    }

    fn validate(&self) -> Result<()> {
        match (&self.change_set_id, &self.change_set_author) {
            (Some(id), Some(author)) => {
                require("rollback", "changeSetId", id)?;
                require("rollback", "changeSetAuthor", author)?;
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ChangelogError::validation(
                    "rollback",
                    "'changeSetId' and 'changeSetAuthor' must be given together",
                ));
            }
            (None, None) => {}
        }
        if let Some(statement) = &self.statement {
            require("rollback", "statement", statement)?;
        }
        self.changes.iter().try_for_each(ChangeType::validate)
    }

    /// Renders the rollback. The statement, if any, comes before the change types.
    pub fn to_fragment(&self) -> Result<Element> {
        self.validate().map_err(ChangelogError::into_serialization)?;
        let mut element = Element::new("rollback")
            .opt_attr("changeSetId", self.change_set_id.as_deref())
            .opt_attr("changeSetAuthor", self.change_set_author.as_deref())
            .children(self.changes.iter().map(ChangeType::to_fragment));
        if let Some(statement) = &self.statement {
            element = element.text(statement);
        }
        Ok(element)
    }
}

/// One unit of change, identified by `id` and `author` (`<changeSet>`).
///
/// # Example
///
/// ```
/// use liquichange::change::CypherChange;
/// use liquichange::changeset::Changeset;
///
/// let mut changeset = Changeset::new("42", "Nelson").unwrap().run_on_change(true);
/// changeset.add_change(CypherChange::new("CREATE (:Movie {title: 'Heat'})").unwrap());
///
/// let xml = changeset.to_fragment().unwrap().to_string();
/// assert!(xml.starts_with(r#"<changeSet id="42" author="Nelson" runOnChange="true">"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    id: String,
    author: String,
    #[serde(default)]
    dbms: Option<String>,
    #[serde(default)]
    context_filter: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    labels: Option<String>,
    #[serde(default)]
    logical_file_path: Option<String>,
    #[serde(default)]
    run_order: Option<RunOrder>,
    #[serde(default)]
    fail_on_error: Option<bool>,
    #[serde(default)]
    ignore: Option<bool>,
    #[serde(default)]
    object_quoting_strategy: Option<ObjectQuotingStrategy>,
    #[serde(default)]
    run_always: Option<bool>,
    #[serde(default)]
    run_in_transaction: Option<bool>,
    #[serde(default)]
    run_on_change: Option<bool>,
    #[serde(default)]
    preconditions: Option<Preconditions>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    changes: Vec<ChangeType>,
    #[serde(default)]
    rollbacks: Vec<Rollback>,
}

impl Changeset {
    /// Creates an empty changeset. Both `id` and `author` are required.
    pub fn new(id: impl Into<String>, author: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let author = author.into();
        require("changeSet", "id", &id)?;
        require("changeSet", "author", &author)?;

        Ok(Self {
            id,
            author,
            dbms: None,
            context_filter: None,
            created: None,
            labels: None,
            logical_file_path: None,
            run_order: None,
            fail_on_error: None,
            ignore: None,
            object_quoting_strategy: None,
            run_always: None,
            run_in_transaction: None,
            run_on_change: None,
            preconditions: None,
            comment: None,
            changes: Vec::new(),
            rollbacks: Vec::new(),
        })
    }

    /// Restricts the changeset to the given database type(s).
    #[must_use]
    pub fn dbms(mut self, dbms: impl Into<String>) -> Self {
        self.dbms = Some(dbms.into());
        self
    }

    /// Sets the context expression.
    #[must_use]
    pub fn context_filter(mut self, filter: impl Into<String>) -> Self {
        self.context_filter = Some(filter.into());
        self
    }

    /// Sets the free-form creation marker.
    #[must_use]
    pub fn created(mut self, created: impl Into<String>) -> Self {
        self.created = Some(created.into());
        self
    }

    /// Sets the label expression.
    #[must_use]
    pub fn labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    /// Overrides the file path used to identify the changeset.
    #[must_use]
    pub fn logical_file_path(mut self, path: impl Into<String>) -> Self {
        self.logical_file_path = Some(path.into());
        self
    }

    /// Runs the changeset before or after all others.
    #[must_use]
    pub fn run_order(mut self, order: RunOrder) -> Self {
        self.run_order = Some(order);
        self
    }

    /// Whether the update stops when this changeset fails.
    #[must_use]
    pub fn fail_on_error(mut self, fail: bool) -> Self {
        self.fail_on_error = Some(fail);
        self
    }

    /// Whether the changeset is skipped.
    #[must_use]
    pub fn ignore(mut self, ignore: bool) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Sets how object names are quoted in this changeset's SQL.
    #[must_use]
    pub fn object_quoting_strategy(mut self, strategy: ObjectQuotingStrategy) -> Self {
        self.object_quoting_strategy = Some(strategy);
        self
    }

    /// Whether the changeset runs on every update.
    #[must_use]
    pub fn run_always(mut self, always: bool) -> Self {
        self.run_always = Some(always);
        self
    }

    /// Whether the changeset runs in a single transaction.
    #[must_use]
    pub fn run_in_transaction(mut self, in_transaction: bool) -> Self {
        self.run_in_transaction = Some(in_transaction);
        self
    }

    /// Whether the changeset runs again when its content changes.
    #[must_use]
    pub fn run_on_change(mut self, on_change: bool) -> Self {
        self.run_on_change = Some(on_change);
        self
    }

    /// Appends a change. Insertion order is execution order.
    pub fn add_change(&mut self, change: impl Into<ChangeType>) {
        self.changes.push(change.into());
    }

    /// Attaches preconditions.
    ///
    /// The first group becomes the changeset's preconditions. Later groups are
    /// nested inside it, so they are joined by the first group's logic. A
    /// nested group renders as its logic element only; its `onFail`,
    /// `onError` and message settings are not written.
    pub fn add_preconditions(&mut self, preconditions: Preconditions) {
        match &mut self.preconditions {
            Some(existing) => existing.push(preconditions),
            None => self.preconditions = Some(preconditions),
        }
    }

    /// Sets the comment. An empty comment removes it.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        self.comment = if comment.is_empty() { None } else { Some(comment) };
    }

    /// Appends a rollback.
    pub fn add_rollback(&mut self, rollback: Rollback) {
        self.rollbacks.push(rollback);
    }

    /// Returns the id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the author.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the changes, in order.
    #[must_use]
    pub fn changes(&self) -> &[ChangeType] {
        &self.changes
    }

    /// Returns the preconditions, if any.
    #[must_use]
    pub fn preconditions(&self) -> Option<&Preconditions> {
        self.preconditions.as_ref()
    }

    /// Checks the changeset and everything it contains.
    pub fn validate(&self) -> Result<()> {
        require("changeSet", "id", &self.id)?;
        require("changeSet", "author", &self.author)?;
        if let Some(preconditions) = &self.preconditions {
            preconditions.validate()?;
        }
        self.changes.iter().try_for_each(ChangeType::validate)?;
        self.rollbacks.iter().try_for_each(Rollback::validate)
    }

    /// Renders the changeset.
    ///
    /// Children follow the schema order: preconditions, comment, changes,
    /// rollbacks. Fails with [`ChangelogError::Serialization`] if the
    /// changeset or anything inside it is invalid.
    pub fn to_fragment(&self) -> Result<Element> {
        self.validate().map_err(ChangelogError::into_serialization)?;
        debug!(
            id = %self.id,
            author = %self.author,
            changes = self.changes.len(),
            "Rendering changeset"
        );

        let mut element = Element::new("changeSet")
            .attr("id", &self.id)
            .attr("author", &self.author)
            .opt_attr("dbms", self.dbms.as_deref())
            .opt_attr("contextFilter", self.context_filter.as_deref())
            .opt_attr("created", self.created.as_deref())
            .opt_attr("labels", self.labels.as_deref())
            .opt_attr("logicalFilePath", self.logical_file_path.as_deref())
            .opt_attr("runOrder", self.run_order.as_ref().map(RunOrder::as_str))
            .flag("failOnError", self.fail_on_error)
            .flag("ignore", self.ignore)
            .opt_attr(
                "objectQuotingStrategy",
                self.object_quoting_strategy
                    .as_ref()
                    .map(ObjectQuotingStrategy::as_str),
            )
            .flag("runAlways", self.run_always)
            .flag("runInTransaction", self.run_in_transaction)
            .flag("runOnChange", self.run_on_change);

        if let Some(preconditions) = &self.preconditions {
            element.push_child(preconditions.to_fragment());
        }
        if let Some(comment) = &self.comment {
            element.push_child(Element::new("comment").text(comment));
        }
        let element = element.children(self.changes.iter().map(ChangeType::to_fragment));

        self.rollbacks
            .iter()
            .try_fold(element, |element, rollback| Ok(element.child(rollback.to_fragment()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{CypherChange, DropTableChange, SqlChange};
    use crate::precondition::{Action, Condition, Edition, Logic};

    fn cypher(text: &str) -> CypherChange {
        CypherChange::new(text).unwrap()
    }

    #[test]
    fn test_requires_id_and_author() {
        assert!(Changeset::new("", "Nelson").unwrap_err().is_validation());
        assert!(Changeset::new("42", "  ").unwrap_err().is_validation());
    }

    #[test]
    fn test_empty_changeset() {
        let changeset = Changeset::new("1", "alice").unwrap();
        assert_eq!(
            changeset.to_fragment().unwrap().to_string(),
            r#"<changeSet id="1" author="alice" />"#
        );
    }

    #[test]
    fn test_attribute_order() {
        // Set in reverse to show rendering order does not depend on call order.
        let changeset = Changeset::new("1", "alice")
            .unwrap()
            .run_on_change(true)
            .run_in_transaction(false)
            .run_always(true)
            .object_quoting_strategy(ObjectQuotingStrategy::QuoteAllObjects)
            .ignore(false)
            .fail_on_error(true)
            .run_order(RunOrder::Last)
            .logical_file_path("db/main.xml")
            .labels("v1")
            .created("2024-01-01")
            .context_filter("prod")
            .dbms("neo4j");

        let fragment = changeset.to_fragment().unwrap();
        let names: Vec<&str> = fragment.attributes().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            [
                "id",
                "author",
                "dbms",
                "contextFilter",
                "created",
                "labels",
                "logicalFilePath",
                "runOrder",
                "failOnError",
                "ignore",
                "objectQuotingStrategy",
                "runAlways",
                "runInTransaction",
                "runOnChange",
            ]
        );
        assert_eq!(fragment.attribute("runOrder"), Some("last"));
        assert_eq!(fragment.attribute("objectQuotingStrategy"), Some("QUOTE_ALL_OBJECTS"));
    }

    #[test]
    fn test_children_follow_schema_order() {
        let mut changeset = Changeset::new("1", "alice").unwrap();
        changeset.add_rollback(Rollback::statement("MATCH (b:Book) DELETE b").unwrap());
        changeset.add_change(cypher("CREATE (:Book)"));
        changeset.set_comment("books");
        changeset.add_preconditions(
            Preconditions::new().condition(Condition::edition(Edition::Community)),
        );
        changeset.add_change(cypher("CREATE (:Author)"));

        let fragment = changeset.to_fragment().unwrap();
        let tags: Vec<&str> = fragment.child_elements().iter().map(Element::tag).collect();
        assert_eq!(
            tags,
            ["preConditions", "comment", "neo4j:cypher", "neo4j:cypher", "rollback"]
        );
        assert_eq!(
            fragment.child_elements()[3].text_content(),
            Some("CREATE (:Author)")
        );
    }

    #[test]
    fn test_later_preconditions_nest() {
        let mut changeset = Changeset::new("1", "alice").unwrap();
        changeset.add_preconditions(
            Preconditions::new()
                .on_fail(Action::MarkRan)
                .condition(Condition::edition(Edition::Enterprise)),
        );
        changeset.add_preconditions(
            Preconditions::new()
                .logic(Logic::Or)
                .condition(Condition::version("5.0.0").unwrap())
                .condition(Condition::version("5.1.0").unwrap()),
        );

        let preconditions = changeset.preconditions().unwrap();
        assert_eq!(preconditions.conditions().len(), 2);
        assert_eq!(
            preconditions.to_fragment().to_string(),
            concat!(
                r#"<preConditions onFail="MARK_RAN"><and>"#,
                r#"<neo4j:edition enterprise="true" />"#,
                r#"<or><neo4j:version matches="5.0.0" /><neo4j:version matches="5.1.0" /></or>"#,
                "</and></preConditions>"
            )
        );
    }

    #[test]
    fn test_rollback_shapes() {
        assert_eq!(
            Rollback::empty().to_fragment().unwrap().to_string(),
            "<rollback />"
        );
        assert_eq!(
            Rollback::referencing("41", "bob")
                .unwrap()
                .to_fragment()
                .unwrap()
                .to_string(),
            r#"<rollback changeSetId="41" changeSetAuthor="bob" />"#
        );
        assert_eq!(
            Rollback::change(DropTableChange::new("books").unwrap())
                .to_fragment()
                .unwrap()
                .to_string(),
            r#"<rollback><dropTable tableName="books" /></rollback>"#
        );
        assert!(Rollback::statement(" ").unwrap_err().is_validation());
        assert!(Rollback::referencing("41", "").is_err());
    }

    #[test]
    fn test_comment_and_changes() {
        let mut changeset = Changeset::new("7", "carol").unwrap();
        changeset.set_comment("Seed data");
        changeset.add_change(SqlChange::new("INSERT INTO t VALUES (1)").unwrap());
        assert_eq!(changeset.changes().len(), 1);
        assert_eq!(
            changeset.to_fragment().unwrap().to_string(),
            concat!(
                r#"<changeSet id="7" author="carol">"#,
                "<comment>Seed data</comment>",
                "<sql>INSERT INTO t VALUES (1)</sql>",
                "</changeSet>"
            )
        );
    }

    #[test]
    fn test_deserialized_empty_author_fails_to_render() {
        let changeset: Changeset =
            serde_json::from_str(r#"{"id": "1", "author": ""}"#).unwrap();
        let err = changeset.to_fragment().unwrap_err();
        assert!(err.is_serialization());
        assert_eq!(
            err.to_string(),
            "Cannot serialize changeSet: 'author' is required and must not be empty"
        );
    }

    #[test]
    fn test_invalid_nested_change_fails_to_render() {
        let changeset: Changeset = serde_json::from_str(
            r#"{"id": "1", "author": "a", "changes": [{"type": "sql", "sql": ""}]}"#,
        )
        .unwrap();
        assert!(changeset.to_fragment().unwrap_err().is_serialization());
    }

    #[test]
    fn test_blank_rollback_statement_fails_to_render() {
        for statement in ["   ", ""] {
            let changeset: Changeset = serde_json::from_str(&format!(
                r#"{{"id": "1", "author": "a", "rollbacks": [{{"statement": "{}"}}]}}"#,
                statement
            ))
            .unwrap();
            let err = changeset.to_fragment().unwrap_err();
            assert!(err.is_serialization());
            assert_eq!(
                err.to_string(),
                "Cannot serialize rollback: 'statement' is required and must not be empty"
            );
        }
    }
}
