//! Change types.
//!
//! A change type is one concrete database operation inside a changeset. Each
//! variant renders as exactly one XML element with a fixed tag; the set of
//! variants is closed, so adding a change type means adding a case to
//! [`ChangeType`].

use serde::{Deserialize, Serialize};

use crate::column::{ColumnConfig, ForeignKeyAction};
use crate::error::{require, require_all, ChangelogError, Result};
use crate::xml::Element;

/// A single change inside a changeset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeType {
    /// Run a Cypher statement (`neo4j:cypher`).
    Cypher(CypherChange),
    /// Run raw SQL (`sql`).
    Sql(SqlChange),
    /// Add columns to a table (`addColumn`).
    AddColumn(AddColumnChange),
    /// Drop a column (`dropColumn`).
    DropColumn(DropColumnChange),
    /// Rename a column (`renameColumn`).
    RenameColumn(RenameColumnChange),
    /// Add a NOT NULL constraint (`addNotNullConstraint`).
    AddNotNullConstraint(AddNotNullConstraintChange),
    /// Add a unique constraint (`addUniqueConstraint`).
    AddUniqueConstraint(AddUniqueConstraintChange),
    /// Add a foreign key constraint (`addForeignKeyConstraint`).
    AddForeignKeyConstraint(AddForeignKeyConstraintChange),
    /// Drop a table (`dropTable`).
    DropTable(DropTableChange),
    /// Create an index (`createIndex`).
    CreateIndex(CreateIndexChange),
}

impl ChangeType {
    /// Returns the XML tag this change renders as.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cypher(_) => CypherChange::TAG,
            Self::Sql(_) => SqlChange::TAG,
            Self::AddColumn(_) => AddColumnChange::TAG,
            Self::DropColumn(_) => DropColumnChange::TAG,
            Self::RenameColumn(_) => RenameColumnChange::TAG,
            Self::AddNotNullConstraint(_) => AddNotNullConstraintChange::TAG,
            Self::AddUniqueConstraint(_) => AddUniqueConstraintChange::TAG,
            Self::AddForeignKeyConstraint(_) => AddForeignKeyConstraintChange::TAG,
            Self::DropTable(_) => DropTableChange::TAG,
            Self::CreateIndex(_) => CreateIndexChange::TAG,
        }
    }

    /// Renders this change as an XML element.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        match self {
            Self::Cypher(c) => c.to_fragment(),
            Self::Sql(c) => c.to_fragment(),
            Self::AddColumn(c) => c.to_fragment(),
            Self::DropColumn(c) => c.to_fragment(),
            Self::RenameColumn(c) => c.to_fragment(),
            Self::AddNotNullConstraint(c) => c.to_fragment(),
            Self::AddUniqueConstraint(c) => c.to_fragment(),
            Self::AddForeignKeyConstraint(c) => c.to_fragment(),
            Self::DropTable(c) => c.to_fragment(),
            Self::CreateIndex(c) => c.to_fragment(),
        }
    }

    /// Re-checks required fields.
    ///
    /// Constructors already validate; this catches instances built through
    /// deserialization.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Cypher(c) => c.validate(),
            Self::Sql(c) => c.validate(),
            Self::AddColumn(c) => c.validate(),
            Self::DropColumn(c) => c.validate(),
            Self::RenameColumn(c) => c.validate(),
            Self::AddNotNullConstraint(c) => c.validate(),
            Self::AddUniqueConstraint(c) => c.validate(),
            Self::AddForeignKeyConstraint(c) => c.validate(),
            Self::DropTable(c) => c.validate(),
            Self::CreateIndex(c) => c.validate(),
        }
    }

    /// Returns a human-readable description of this change.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Cypher(_) => "Run Cypher statement".to_string(),
            Self::Sql(_) => "Run custom SQL".to_string(),
            Self::AddColumn(c) => {
                let names: Vec<&str> = c.columns.iter().map(ColumnConfig::name).collect();
                format!("Add column(s) '{}' to table '{}'", names.join(", "), c.table_name)
            }
            Self::DropColumn(c) => {
                format!("Drop column '{}' from table '{}'", c.column_name, c.table_name)
            }
            Self::RenameColumn(c) => format!(
                "Rename column '{}' to '{}' in table '{}'",
                c.old_column_name, c.new_column_name, c.table_name
            ),
            Self::AddNotNullConstraint(c) => format!(
                "Add NOT NULL constraint to '{}' in table '{}'",
                c.column_name, c.table_name
            ),
            Self::AddUniqueConstraint(c) => format!(
                "Add unique constraint on ({}) to table '{}'",
                c.column_names.join(", "),
                c.table_name
            ),
            Self::AddForeignKeyConstraint(c) => format!(
                "Add foreign key '{}' from '{}' to '{}'",
                c.constraint_name, c.base_table_name, c.referenced_table_name
            ),
            Self::DropTable(c) => format!("Drop table '{}'", c.table_name),
            Self::CreateIndex(c) => {
                format!("Create index '{}' on table '{}'", c.index_name, c.table_name)
            }
        }
    }
}

macro_rules! impl_from_change {
    ($($variant:ident => $change:ty),* $(,)?) => {
        $(
            impl From<$change> for ChangeType {
                fn from(change: $change) -> Self {
                    Self::$variant(change)
                }
            }
        )*
    };
}

impl_from_change! {
    Cypher => CypherChange,
    Sql => SqlChange,
    AddColumn => AddColumnChange,
    DropColumn => DropColumnChange,
    RenameColumn => RenameColumnChange,
    AddNotNullConstraint => AddNotNullConstraintChange,
    AddUniqueConstraint => AddUniqueConstraintChange,
    AddForeignKeyConstraint => AddForeignKeyConstraintChange,
    DropTable => DropTableChange,
    CreateIndex => CreateIndexChange,
}

// ============================================================================
// Statement changes
// ============================================================================

/// A Cypher statement, run by the Neo4j extension.
///
/// # Example
///
/// ```
/// use liquichange::change::CypherChange;
///
/// let change = CypherChange::new("MERGE (:Book {title: 'Neuromancer'})").unwrap();
/// assert_eq!(
///     change.to_fragment().to_string(),
///     "<neo4j:cypher>MERGE (:Book {title: 'Neuromancer'})</neo4j:cypher>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CypherChange {
    text: String,
}

impl CypherChange {
    /// The XML tag.
    pub const TAG: &'static str = "neo4j:cypher";

    /// Creates a Cypher change. The statement must not be empty.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let change = Self { text: text.into() };
        change.validate()?;
        Ok(change)
    }

    /// Returns the statement.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "text", &self.text)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG).text(&self.text)
    }
}

/// A raw SQL statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlChange {
    sql: String,
    #[serde(default)]
    dbms: Option<String>,
    #[serde(default)]
    end_delimiter: Option<String>,
    #[serde(default)]
    split_statements: Option<bool>,
    #[serde(default)]
    strip_comments: Option<bool>,
}

impl SqlChange {
    /// The XML tag.
    pub const TAG: &'static str = "sql";

    /// Creates a SQL change. The statement must not be empty.
    pub fn new(sql: impl Into<String>) -> Result<Self> {
        let change = Self {
            sql: sql.into(),
            dbms: None,
            end_delimiter: None,
            split_statements: None,
            strip_comments: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Restricts the statement to the given database type(s).
    #[must_use]
    pub fn dbms(mut self, dbms: impl Into<String>) -> Self {
        self.dbms = Some(dbms.into());
        self
    }

    /// Sets the statement delimiter.
    #[must_use]
    pub fn end_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.end_delimiter = Some(delimiter.into());
        self
    }

    /// Sets whether the body is split on the delimiter.
    #[must_use]
    pub fn split_statements(mut self, split: bool) -> Self {
        self.split_statements = Some(split);
        self
    }

    /// Sets whether SQL comments are stripped before execution.
    #[must_use]
    pub fn strip_comments(mut self, strip: bool) -> Self {
        self.strip_comments = Some(strip);
        self
    }

    /// Returns the statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "sql", &self.sql)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("dbms", self.dbms.as_deref())
            .opt_attr("endDelimiter", self.end_delimiter.as_deref())
            .flag("splitStatements", self.split_statements)
            .flag("stripComments", self.strip_comments)
            .text(&self.sql)
    }
}

// ============================================================================
// Column changes
// ============================================================================

/// Adds one or more columns to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumnChange {
    #[serde(default)]
    catalog_name: Option<String>,
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    columns: Vec<ColumnConfig>,
}

impl AddColumnChange {
    /// The XML tag.
    pub const TAG: &'static str = "addColumn";

    /// Creates an addColumn change. At least one column is required.
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnConfig>) -> Result<Self> {
        let change = Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            columns,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the catalog.
    #[must_use]
    pub fn catalog_name(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_name = Some(catalog.into());
        self
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Returns the columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnConfig] {
        &self.columns
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)?;
        if self.columns.is_empty() {
            return Err(ChangelogError::validation(
                Self::TAG,
                "at least one column is required",
            ));
        }
        self.columns.iter().try_for_each(ColumnConfig::validate)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("catalogName", self.catalog_name.as_deref())
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .children(self.columns.iter().map(ColumnConfig::to_fragment))
    }
}

/// Drops a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropColumnChange {
    #[serde(default)]
    catalog_name: Option<String>,
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    column_name: String,
}

impl DropColumnChange {
    /// The XML tag.
    pub const TAG: &'static str = "dropColumn";

    /// Creates a dropColumn change.
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Result<Self> {
        let change = Self {
            catalog_name: None,
            schema_name: None,
            table_name: table_name.into(),
            column_name: column_name.into(),
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the catalog.
    #[must_use]
    pub fn catalog_name(mut self, catalog: impl Into<String>) -> Self {
        self.catalog_name = Some(catalog.into());
        self
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)?;
        require(Self::TAG, "columnName", &self.column_name)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("catalogName", self.catalog_name.as_deref())
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .attr("columnName", &self.column_name)
    }
}

/// Renames a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumnChange {
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    old_column_name: String,
    new_column_name: String,
    #[serde(default)]
    column_data_type: Option<String>,
    #[serde(default)]
    remarks: Option<String>,
}

impl RenameColumnChange {
    /// The XML tag.
    pub const TAG: &'static str = "renameColumn";

    /// Creates a renameColumn change.
    pub fn new(
        table_name: impl Into<String>,
        old_column_name: impl Into<String>,
        new_column_name: impl Into<String>,
    ) -> Result<Self> {
        let change = Self {
            schema_name: None,
            table_name: table_name.into(),
            old_column_name: old_column_name.into(),
            new_column_name: new_column_name.into(),
            column_data_type: None,
            remarks: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Sets the column type (required by some databases, e.g. MySQL).
    #[must_use]
    pub fn column_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.column_data_type = Some(data_type.into());
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)?;
        require(Self::TAG, "oldColumnName", &self.old_column_name)?;
        require(Self::TAG, "newColumnName", &self.new_column_name)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .attr("oldColumnName", &self.old_column_name)
            .attr("newColumnName", &self.new_column_name)
            .opt_attr("columnDataType", self.column_data_type.as_deref())
            .opt_attr("remarks", self.remarks.as_deref())
    }
}

// ============================================================================
// Constraint changes
// ============================================================================

/// Adds a NOT NULL constraint to an existing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNotNullConstraintChange {
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    column_name: String,
    #[serde(default)]
    column_data_type: Option<String>,
    #[serde(default)]
    default_null_value: Option<String>,
    #[serde(default)]
    constraint_name: Option<String>,
}

impl AddNotNullConstraintChange {
    /// The XML tag.
    pub const TAG: &'static str = "addNotNullConstraint";

    /// Creates an addNotNullConstraint change.
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Result<Self> {
        let change = Self {
            schema_name: None,
            table_name: table_name.into(),
            column_name: column_name.into(),
            column_data_type: None,
            default_null_value: None,
            constraint_name: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Sets the column type.
    #[must_use]
    pub fn column_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.column_data_type = Some(data_type.into());
        self
    }

    /// Sets the value written into existing NULL rows before the constraint applies.
    #[must_use]
    pub fn default_null_value(mut self, value: impl Into<String>) -> Self {
        self.default_null_value = Some(value.into());
        self
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)?;
        require(Self::TAG, "columnName", &self.column_name)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .attr("columnName", &self.column_name)
            .opt_attr("columnDataType", self.column_data_type.as_deref())
            .opt_attr("defaultNullValue", self.default_null_value.as_deref())
            .opt_attr("constraintName", self.constraint_name.as_deref())
    }
}

/// Adds a unique constraint over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddUniqueConstraintChange {
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    column_names: Vec<String>,
    #[serde(default)]
    constraint_name: Option<String>,
    #[serde(default)]
    deferrable: Option<bool>,
    #[serde(default)]
    initially_deferred: Option<bool>,
}

impl AddUniqueConstraintChange {
    /// The XML tag.
    pub const TAG: &'static str = "addUniqueConstraint";

    /// Creates an addUniqueConstraint change.
    pub fn new(table_name: impl Into<String>, column_names: Vec<String>) -> Result<Self> {
        let change = Self {
            schema_name: None,
            table_name: table_name.into(),
            column_names,
            constraint_name: None,
            deferrable: None,
            initially_deferred: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Sets the constraint name.
    #[must_use]
    pub fn constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    /// Makes the constraint deferrable.
    #[must_use]
    pub fn deferrable(mut self, initially_deferred: bool) -> Self {
        self.deferrable = Some(true);
        self.initially_deferred = Some(initially_deferred);
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)?;
        require_all(Self::TAG, "columnNames", &self.column_names)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .attr("columnNames", self.column_names.join(", "))
            .opt_attr("constraintName", self.constraint_name.as_deref())
            .flag("deferrable", self.deferrable)
            .flag("initiallyDeferred", self.initially_deferred)
    }
}

/// Adds a foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddForeignKeyConstraintChange {
    #[serde(default)]
    base_table_schema_name: Option<String>,
    base_table_name: String,
    base_column_names: Vec<String>,
    constraint_name: String,
    #[serde(default)]
    referenced_table_schema_name: Option<String>,
    referenced_table_name: String,
    referenced_column_names: Vec<String>,
    #[serde(default)]
    on_delete: Option<ForeignKeyAction>,
    #[serde(default)]
    on_update: Option<ForeignKeyAction>,
}

impl AddForeignKeyConstraintChange {
    /// The XML tag.
    pub const TAG: &'static str = "addForeignKeyConstraint";

    /// Creates an addForeignKeyConstraint change.
    ///
    /// Base and referenced column lists must be non-empty and of equal length.
    pub fn new(
        constraint_name: impl Into<String>,
        base_table_name: impl Into<String>,
        base_column_names: Vec<String>,
        referenced_table_name: impl Into<String>,
        referenced_column_names: Vec<String>,
    ) -> Result<Self> {
        let change = Self {
            base_table_schema_name: None,
            base_table_name: base_table_name.into(),
            base_column_names,
            constraint_name: constraint_name.into(),
            referenced_table_schema_name: None,
            referenced_table_name: referenced_table_name.into(),
            referenced_column_names,
            on_delete: None,
            on_update: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema of the base table.
    #[must_use]
    pub fn base_table_schema_name(mut self, schema: impl Into<String>) -> Self {
        self.base_table_schema_name = Some(schema.into());
        self
    }

    /// Sets the schema of the referenced table.
    #[must_use]
    pub fn referenced_table_schema_name(mut self, schema: impl Into<String>) -> Self {
        self.referenced_table_schema_name = Some(schema.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "constraintName", &self.constraint_name)?;
        require(Self::TAG, "baseTableName", &self.base_table_name)?;
        require_all(Self::TAG, "baseColumnNames", &self.base_column_names)?;
        require(Self::TAG, "referencedTableName", &self.referenced_table_name)?;
        require_all(Self::TAG, "referencedColumnNames", &self.referenced_column_names)?;
        if self.base_column_names.len() != self.referenced_column_names.len() {
            return Err(ChangelogError::validation(
                Self::TAG,
                format!(
                    "{} base column(s) but {} referenced column(s)",
                    self.base_column_names.len(),
                    self.referenced_column_names.len()
                ),
            ));
        }
        Ok(())
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("baseTableSchemaName", self.base_table_schema_name.as_deref())
            .attr("baseTableName", &self.base_table_name)
            .attr("baseColumnNames", self.base_column_names.join(", "))
            .attr("constraintName", &self.constraint_name)
            .opt_attr(
                "referencedTableSchemaName",
                self.referenced_table_schema_name.as_deref(),
            )
            .attr("referencedTableName", &self.referenced_table_name)
            .attr("referencedColumnNames", self.referenced_column_names.join(", "))
            .opt_attr("onDelete", self.on_delete.as_ref().map(ForeignKeyAction::as_str))
            .opt_attr("onUpdate", self.on_update.as_ref().map(ForeignKeyAction::as_str))
    }
}

// ============================================================================
// Table and index changes
// ============================================================================

/// Drops a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTableChange {
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    #[serde(default)]
    cascade_constraints: Option<bool>,
}

impl DropTableChange {
    /// The XML tag.
    pub const TAG: &'static str = "dropTable";

    /// Creates a dropTable change.
    pub fn new(table_name: impl Into<String>) -> Result<Self> {
        let change = Self {
            schema_name: None,
            table_name: table_name.into(),
            cascade_constraints: None,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Sets whether dependent constraints are dropped too.
    #[must_use]
    pub fn cascade_constraints(mut self, cascade: bool) -> Self {
        self.cascade_constraints = Some(cascade);
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "tableName", &self.table_name)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .flag("cascadeConstraints", self.cascade_constraints)
    }
}

/// Creates an index over one or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexChange {
    index_name: String,
    #[serde(default)]
    schema_name: Option<String>,
    table_name: String,
    #[serde(default)]
    unique: Option<bool>,
    columns: Vec<String>,
}

impl CreateIndexChange {
    /// The XML tag.
    pub const TAG: &'static str = "createIndex";

    /// Creates a createIndex change.
    pub fn new(
        index_name: impl Into<String>,
        table_name: impl Into<String>,
        columns: Vec<String>,
    ) -> Result<Self> {
        let change = Self {
            index_name: index_name.into(),
            schema_name: None,
            table_name: table_name.into(),
            unique: None,
            columns,
        };
        change.validate()?;
        Ok(change)
    }

    /// Sets the schema.
    #[must_use]
    pub fn schema_name(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    /// Makes this a unique index.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = Some(true);
        self
    }

    fn validate(&self) -> Result<()> {
        require(Self::TAG, "indexName", &self.index_name)?;
        require(Self::TAG, "tableName", &self.table_name)?;
        require_all(Self::TAG, "columns", &self.columns)
    }

    /// Renders the change.
    #[must_use]
    pub fn to_fragment(&self) -> Element {
        Element::new(Self::TAG)
            .attr("indexName", &self.index_name)
            .opt_attr("schemaName", self.schema_name.as_deref())
            .attr("tableName", &self.table_name)
            .flag("unique", self.unique)
            .children(
                self.columns
                    .iter()
                    .map(|name| Element::new("column").attr("name", name)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_cypher_requires_text() {
        let err = CypherChange::new("  ").unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::Validation { element: "neo4j:cypher", .. }
        ));
    }

    #[test]
    fn test_cypher_fragment_is_idempotent() {
        let change: ChangeType = CypherChange::new("MATCH (n) RETURN count(n)").unwrap().into();
        assert_eq!(change.to_fragment(), change.to_fragment());
        assert_eq!(change.tag(), "neo4j:cypher");
    }

    #[test]
    fn test_sql_fragment() {
        let change = SqlChange::new("UPDATE users SET active = 1")
            .unwrap()
            .dbms("postgresql")
            .split_statements(false);
        assert_eq!(
            change.to_fragment().to_string(),
            r#"<sql dbms="postgresql" splitStatements="false">UPDATE users SET active = 1</sql>"#
        );
    }

    #[test]
    fn test_add_column_fragment() {
        let change = AddColumnChange::new(
            "users",
            vec![
                ColumnConfig::new("email", "VARCHAR(255)").unwrap().not_null(),
                ColumnConfig::new("nickname", "TEXT").unwrap(),
            ],
        )
        .unwrap()
        .schema_name("public");
        assert_eq!(
            change.to_fragment().to_string(),
            concat!(
                r#"<addColumn schemaName="public" tableName="users">"#,
                r#"<column name="email" type="VARCHAR(255)"><constraints nullable="false" /></column>"#,
                r#"<column name="nickname" type="TEXT" />"#,
                "</addColumn>"
            )
        );
    }

    #[test]
    fn test_add_column_requires_columns() {
        assert!(AddColumnChange::new("users", vec![]).unwrap_err().is_validation());
    }

    #[test]
    fn test_drop_and_rename_column() {
        let drop = DropColumnChange::new("users", "legacy").unwrap();
        assert_eq!(
            drop.to_fragment().to_string(),
            r#"<dropColumn tableName="users" columnName="legacy" />"#
        );

        let rename = RenameColumnChange::new("users", "mail", "email")
            .unwrap()
            .column_data_type("VARCHAR(255)");
        assert_eq!(
            rename.to_fragment().to_string(),
            r#"<renameColumn tableName="users" oldColumnName="mail" newColumnName="email" columnDataType="VARCHAR(255)" />"#
        );
        assert!(RenameColumnChange::new("users", "", "email").is_err());
    }

    #[test]
    fn test_not_null_constraint() {
        let change = AddNotNullConstraintChange::new("users", "email")
            .unwrap()
            .default_null_value("unknown@example.com");
        assert_eq!(
            change.to_fragment().to_string(),
            r#"<addNotNullConstraint tableName="users" columnName="email" defaultNullValue="unknown@example.com" />"#
        );
    }

    #[test]
    fn test_unique_constraint() {
        let change = AddUniqueConstraintChange::new("users", strings(&["tenant_id", "email"]))
            .unwrap()
            .constraint_name("uq_users_email");
        assert_eq!(
            change.to_fragment().to_string(),
            r#"<addUniqueConstraint tableName="users" columnNames="tenant_id, email" constraintName="uq_users_email" />"#
        );
        assert!(AddUniqueConstraintChange::new("users", vec![]).is_err());
    }

    #[test]
    fn test_foreign_key_constraint() {
        let change = AddForeignKeyConstraintChange::new(
            "fk_user_org",
            "users",
            strings(&["organization_id"]),
            "organizations",
            strings(&["id"]),
        )
        .unwrap()
        .on_delete(ForeignKeyAction::Cascade);
        assert_eq!(
            change.to_fragment().to_string(),
            concat!(
                r#"<addForeignKeyConstraint baseTableName="users" baseColumnNames="organization_id" "#,
                r#"constraintName="fk_user_org" referencedTableName="organizations" "#,
                r#"referencedColumnNames="id" onDelete="CASCADE" />"#
            )
        );
    }

    #[test]
    fn test_foreign_key_column_count_mismatch() {
        let err = AddForeignKeyConstraintChange::new(
            "fk",
            "a",
            strings(&["x", "y"]),
            "b",
            strings(&["id"]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("2 base column(s) but 1 referenced column(s)"));
    }

    #[test]
    fn test_create_index_and_drop_table() {
        let index = CreateIndexChange::new("idx_users_email", "users", strings(&["email"]))
            .unwrap()
            .unique();
        assert_eq!(
            index.to_fragment().to_string(),
            r#"<createIndex indexName="idx_users_email" tableName="users" unique="true"><column name="email" /></createIndex>"#
        );

        let drop = DropTableChange::new("sessions").unwrap().cascade_constraints(true);
        assert_eq!(
            drop.to_fragment().to_string(),
            r#"<dropTable tableName="sessions" cascadeConstraints="true" />"#
        );
    }

    #[test]
    fn test_every_variant_has_its_own_tag() {
        let changes: Vec<ChangeType> = vec![
            CypherChange::new("RETURN 1").unwrap().into(),
            SqlChange::new("SELECT 1").unwrap().into(),
            AddColumnChange::new("t", vec![ColumnConfig::new("c", "INT").unwrap()])
                .unwrap()
                .into(),
            DropColumnChange::new("t", "c").unwrap().into(),
            RenameColumnChange::new("t", "a", "b").unwrap().into(),
            AddNotNullConstraintChange::new("t", "c").unwrap().into(),
            AddUniqueConstraintChange::new("t", strings(&["c"])).unwrap().into(),
            AddForeignKeyConstraintChange::new("fk", "t", strings(&["c"]), "u", strings(&["id"]))
                .unwrap()
                .into(),
            DropTableChange::new("t").unwrap().into(),
            CreateIndexChange::new("i", "t", strings(&["c"])).unwrap().into(),
        ];
        for change in &changes {
            assert_eq!(change.to_fragment().tag(), change.tag());
            assert!(change.validate().is_ok());
        }
        let mut tags: Vec<&str> = changes.iter().map(ChangeType::tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), changes.len());
    }

    #[test]
    fn test_description() {
        let change: ChangeType = DropTableChange::new("sessions").unwrap().into();
        assert_eq!(change.description(), "Drop table 'sessions'");
    }

    #[test]
    fn test_deserialized_change_is_revalidated() {
        let change: ChangeType = serde_json::from_str(r#"{"type": "cypher", "text": ""}"#).unwrap();
        assert!(change.validate().unwrap_err().is_validation());
    }
}
