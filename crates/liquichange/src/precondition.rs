//! Preconditions.
//!
//! Preconditions control whether a changelog or changeset runs, based on the
//! state of the database. A [`Preconditions`] group holds conditions joined by
//! a [`Logic`] operator. Groups nest, so `(A or B) and C` is a group with
//! `or`-logic inside an `and` group.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{require, ChangelogError, Result};
use crate::xml::Element;

/// What happens when a precondition fails or errors (`onFail`, `onError`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Skip the changeset; try again on the next update.
    Continue,
    /// Stop the whole update.
    Halt,
    /// Skip the changeset and mark it as run.
    MarkRan,
    /// Log a warning and carry on.
    Warn,
}

impl Action {
    /// Returns the Liquibase keyword.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continue => "CONTINUE",
            Self::Halt => "HALT",
            Self::MarkRan => "MARK_RAN",
            Self::Warn => "WARN",
        }
    }
}

/// How preconditions are evaluated in update-sql mode (`onSqlOutput`, `onUpdateSql`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlAction {
    /// Fail the update-sql run.
    Fail,
    /// Ignore the precondition.
    Ignore,
    /// Run the precondition.
    Test,
}

impl SqlAction {
    /// Returns the Liquibase keyword.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "FAIL",
            Self::Ignore => "IGNORE",
            Self::Test => "TEST",
        }
    }
}

/// Conditional logic joining the conditions of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logic {
    /// All conditions must pass.
    #[default]
    And,
    /// At least one condition must pass.
    Or,
    /// The conditions must not pass.
    Not,
}

impl Logic {
    /// Returns the element name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

/// Database types recognised by the `dbms` precondition and property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dbms {
    /// Neo4j.
    Neo4j,
    /// PostgreSQL.
    Postgresql,
    /// MySQL.
    Mysql,
    /// MariaDB.
    Mariadb,
    /// Oracle.
    Oracle,
    /// Microsoft SQL Server.
    Mssql,
    /// SQLite.
    Sqlite,
    /// H2.
    H2,
}

impl Dbms {
    /// Returns the Liquibase database short name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neo4j => "neo4j",
            Self::Postgresql => "postgresql",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
            Self::Oracle => "oracle",
            Self::Mssql => "mssql",
            Self::Sqlite => "sqlite",
            Self::H2 => "h2",
        }
    }
}

/// Neo4j edition asserted by `neo4j:edition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    /// Enterprise edition.
    Enterprise,
    /// Community edition.
    Community,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid version pattern"))
}

fn expected_result_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.?\d*$").expect("valid expected result pattern"))
}

/// A single condition inside a [`Preconditions`] group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum Condition {
    /// The database type matches (`dbms`).
    Dbms {
        /// Expected database type.
        dbms: Dbms,
    },
    /// The Neo4j version matches `major.minor.patch` (`neo4j:version`).
    Version {
        /// Expected version.
        matches: String,
    },
    /// The Neo4j edition matches (`neo4j:edition`).
    Edition {
        /// Expected edition.
        edition: Edition,
    },
    /// A Cypher query returns the expected single value (`neo4j:cypherCheck`).
    CypherCheck {
        /// Expected value, an integer or decimal.
        expected_result: String,
        /// Query returning one row with one column.
        cypher: String,
    },
    /// A SQL query returns the expected single value (`sqlCheck`).
    SqlCheck {
        /// Expected value, an integer or decimal.
        expected_result: String,
        /// Query returning one row with one column.
        sql: String,
    },
    /// A table exists (`tableExists`).
    TableExists {
        /// Schema of the table.
        #[serde(default)]
        schema_name: Option<String>,
        /// Table name.
        table_name: String,
    },
    /// A nested group, rendered as its logic element.
    ///
    /// Only the group's logic and conditions are written; its `onFail`,
    /// `onError` and message settings apply to top-level groups only.
    Nested(Preconditions),
}

impl Condition {
    /// Asserts the database type.
    #[must_use]
    pub fn dbms(dbms: Dbms) -> Self {
        Self::Dbms { dbms }
    }

    /// Asserts the Neo4j version, given as `major.minor.patch`.
    pub fn version(matches: impl Into<String>) -> Result<Self> {
        let condition = Self::Version {
            matches: matches.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Asserts the Neo4j edition.
    #[must_use]
    pub fn edition(edition: Edition) -> Self {
        Self::Edition { edition }
    }

    /// Runs a Cypher query and compares its single value with `expected_result`.
    pub fn cypher_check(expected_result: impl ToString, cypher: impl Into<String>) -> Result<Self> {
        let condition = Self::CypherCheck {
            expected_result: expected_result.to_string(),
            cypher: cypher.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Runs a SQL query and compares its single value with `expected_result`.
    pub fn sql_check(expected_result: impl ToString, sql: impl Into<String>) -> Result<Self> {
        let condition = Self::SqlCheck {
            expected_result: expected_result.to_string(),
            sql: sql.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Asserts that a table exists.
    pub fn table_exists(table_name: impl Into<String>) -> Result<Self> {
        let condition = Self::TableExists {
            schema_name: None,
            table_name: table_name.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Asserts that a table exists in the given schema.
    pub fn table_exists_in(
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Result<Self> {
        let condition = Self::TableExists {
            schema_name: Some(schema_name.into()),
            table_name: table_name.into(),
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Returns the XML tag of this condition.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Dbms { .. } => "dbms",
            Self::Version { .. } => "neo4j:version",
            Self::Edition { .. } => "neo4j:edition",
            Self::CypherCheck { .. } => "neo4j:cypherCheck",
            Self::SqlCheck { .. } => "sqlCheck",
            Self::TableExists { .. } => "tableExists",
            Self::Nested(group) => group.logic.as_str(),
        }
    }

    /// Checks the condition's fields.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Dbms { .. } | Self::Edition { .. } => Ok(()),
            Self::Version { matches } => {
                if version_pattern().is_match(matches) {
                    Ok(())
                } else {
                    Err(ChangelogError::validation(
                        "neo4j:version",
                        format!("version '{}' must be in the format 'major.minor.patch'", matches),
                    ))
                }
            }
            Self::CypherCheck {
                expected_result,
                cypher,
            } => {
                check_expected_result("neo4j:cypherCheck", expected_result)?;
                require("neo4j:cypherCheck", "cypher", cypher)
            }
            Self::SqlCheck {
                expected_result,
                sql,
            } => {
                check_expected_result("sqlCheck", expected_result)?;
                require("sqlCheck", "sql", sql)
            }
            Self::TableExists {
                schema_name,
                table_name,
            } => {
                if let Some(schema_name) = schema_name {
                    require("tableExists", "schemaName", schema_name)?;
                }
                require("tableExists", "tableName", table_name)
            }
            Self::Nested(group) => group.validate(),
        }
    }

    /// Renders the condition.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        let element = Element::new(self.tag());
        match self {
            Self::Dbms { dbms } => element.attr("type", dbms.as_str()),
            Self::Version { matches } => element.attr("matches", matches),
            Self::Edition { edition } => match edition {
                Edition::Enterprise => element.attr("enterprise", "true"),
                Edition::Community => element.attr("community", "true"),
            },
            Self::CypherCheck {
                expected_result,
                cypher,
            } => element.attr("expectedResult", expected_result).text(cypher),
            Self::SqlCheck {
                expected_result,
                sql,
            } => element.attr("expectedResult", expected_result).text(sql),
            Self::TableExists {
                schema_name,
                table_name,
            } => element
                .opt_attr("schemaName", schema_name.as_deref())
                .attr("tableName", table_name),
            Self::Nested(group) => group.logic_fragment(),
        }
    }
}

fn check_expected_result(element: &'static str, expected_result: &str) -> Result<()> {
    if expected_result_pattern().is_match(expected_result) {
        Ok(())
    } else {
        Err(ChangelogError::validation(
            element,
            format!(
                "expected result '{}' must be a valid integer or decimal",
                expected_result
            ),
        ))
    }
}

impl From<Preconditions> for Condition {
    fn from(group: Preconditions) -> Self {
        Self::Nested(group)
    }
}

/// A group of conditions (`<preConditions>`).
///
/// # Example
///
/// ```
/// use liquichange::precondition::{Action, Condition, Edition, Preconditions};
///
/// let preconditions = Preconditions::new()
///     .on_fail(Action::Warn)
///     .condition(Condition::edition(Edition::Community))
///     .condition(Condition::version("5.12.0").unwrap());
/// assert_eq!(
///     preconditions.to_fragment().to_string(),
///     concat!(
///         r#"<preConditions onFail="WARN"><and>"#,
///         r#"<neo4j:edition community="true" /><neo4j:version matches="5.12.0" />"#,
///         "</and></preConditions>"
///     )
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preconditions {
    #[serde(default)]
    logic: Logic,
    #[serde(default)]
    on_error: Option<Action>,
    #[serde(default)]
    on_error_message: Option<String>,
    #[serde(default)]
    on_fail: Option<Action>,
    #[serde(default)]
    on_fail_message: Option<String>,
    #[serde(default)]
    on_sql_output: Option<SqlAction>,
    #[serde(default)]
    on_update_sql: Option<SqlAction>,
    #[serde(default)]
    conditions: Vec<Condition>,
}

impl Preconditions {
    /// Creates an empty `and` group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logic joining this group's conditions.
    #[must_use]
    pub fn logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    /// Sets the action taken when checking the preconditions errors.
    #[must_use]
    pub fn on_error(mut self, action: Action) -> Self {
        self.on_error = Some(action);
        self
    }

    /// Sets the message logged when checking the preconditions errors.
    #[must_use]
    pub fn on_error_message(mut self, message: impl Into<String>) -> Self {
        self.on_error_message = Some(message.into());
        self
    }

    /// Sets the action taken when the preconditions fail.
    #[must_use]
    pub fn on_fail(mut self, action: Action) -> Self {
        self.on_fail = Some(action);
        self
    }

    /// Sets the message logged when the preconditions fail.
    #[must_use]
    pub fn on_fail_message(mut self, message: impl Into<String>) -> Self {
        self.on_fail_message = Some(message.into());
        self
    }

    /// Sets evaluation in update-sql mode for XML changelogs.
    #[must_use]
    pub fn on_sql_output(mut self, action: SqlAction) -> Self {
        self.on_sql_output = Some(action);
        self
    }

    /// Sets evaluation in update-sql mode for formatted SQL changelogs.
    #[must_use]
    pub fn on_update_sql(mut self, action: SqlAction) -> Self {
        self.on_update_sql = Some(action);
        self
    }

    /// Appends a condition or nested group.
    #[must_use]
    pub fn condition(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Appends a condition or nested group in place.
    pub fn push(&mut self, condition: impl Into<Condition>) {
        self.conditions.push(condition.into());
    }

    /// Returns the conditions, in order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the logic joining this group's conditions.
    #[must_use]
    pub fn get_logic(&self) -> Logic {
        self.logic
    }

    /// Checks every condition, recursively.
    pub fn validate(&self) -> Result<()> {
        self.conditions.iter().try_for_each(Condition::validate)
    }

    /// Renders the group as `<preConditions>` wrapping its logic element.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new("preConditions")
            .opt_attr("onError", self.on_error.as_ref().map(Action::as_str))
            .opt_attr("onErrorMessage", self.on_error_message.as_deref())
            .opt_attr("onFail", self.on_fail.as_ref().map(Action::as_str))
            .opt_attr("onFailMessage", self.on_fail_message.as_deref())
            .opt_attr("onSqlOutput", self.on_sql_output.as_ref().map(SqlAction::as_str))
            .opt_attr("onUpdateSql", self.on_update_sql.as_ref().map(SqlAction::as_str))
            .child(self.logic_fragment())
    }

    fn logic_fragment(&self) -> Element {
        Element::new(self.logic.as_str())
            .children(self.conditions.iter().map(Condition::to_fragment))
    }
}
