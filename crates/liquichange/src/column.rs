//! Column definitions used by column-level change types.
//!
//! These mirror Liquibase's `<column>` and `<constraints>` elements and are
//! rendered as children of `addColumn`.

use serde::{Deserialize, Serialize};

use crate::error::{require, Result};
use crate::xml::Element;

/// Default value for a column.
///
/// Each kind maps to a different Liquibase attribute, so the consuming tool
/// knows whether to quote the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum DefaultValue {
    /// A string literal (`defaultValue`).
    String(String),
    /// A numeric literal (`defaultValueNumeric`).
    Numeric(String),
    /// A boolean literal (`defaultValueBoolean`).
    Boolean(bool),
    /// A database expression, e.g. `CURRENT_TIMESTAMP` (`defaultValueComputed`).
    Computed(String),
}

impl DefaultValue {
    /// Returns the attribute name and rendered value.
    #[must_use]
    pub fn to_attribute(&self) -> (&'static str, String) {
        match self {
            Self::String(s) => ("defaultValue", s.clone()),
            Self::Numeric(n) => ("defaultValueNumeric", n.clone()),
            Self::Boolean(b) => ("defaultValueBoolean", b.to_string()),
            Self::Computed(expr) => ("defaultValueComputed", expr.clone()),
        }
    }
}

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action (error if referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the Liquibase keyword for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Inline constraints of a column (`<constraints>`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnConstraints {
    /// Whether the column allows NULL values.
    pub nullable: Option<bool>,
    /// Whether the column is the primary key.
    pub primary_key: Option<bool>,
    /// Name of the primary key constraint.
    pub primary_key_name: Option<String>,
    /// Whether the column has a UNIQUE constraint.
    pub unique: Option<bool>,
    /// Name of the unique constraint.
    pub unique_constraint_name: Option<String>,
    /// Name of the foreign key constraint.
    pub foreign_key_name: Option<String>,
    /// Referenced column, as `table(column)`.
    pub references: Option<String>,
}

impl ColumnConstraints {
    /// Returns true if no constraint is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn to_fragment(&self) -> Element {
        Element::new("constraints")
            .flag("nullable", self.nullable)
            .flag("primaryKey", self.primary_key)
            .opt_attr("primaryKeyName", self.primary_key_name.as_deref())
            .flag("unique", self.unique)
            .opt_attr("uniqueConstraintName", self.unique_constraint_name.as_deref())
            .opt_attr("foreignKeyName", self.foreign_key_name.as_deref())
            .opt_attr("references", self.references.as_deref())
    }
}

/// A column definition (`<column>`).
///
/// # Example
///
/// ```
/// use liquichange::column::{ColumnConfig, DefaultValue};
///
/// let column = ColumnConfig::new("created_at", "TIMESTAMP")
///     .unwrap()
///     .not_null()
///     .default(DefaultValue::Computed("CURRENT_TIMESTAMP".into()));
/// assert_eq!(column.name(), "created_at");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
    #[serde(default)]
    default: Option<DefaultValue>,
    #[serde(default)]
    remarks: Option<String>,
    #[serde(default)]
    auto_increment: Option<bool>,
    #[serde(default)]
    constraints: ColumnConstraints,
}

impl ColumnConfig {
    /// Creates a column definition. Both name and type are required.
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Result<Self> {
        let column = Self {
            name: name.into(),
            column_type: column_type.into(),
            default: None,
            remarks: None,
            auto_increment: None,
            constraints: ColumnConstraints::default(),
        };
        column.validate()?;
        Ok(column)
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.constraints.nullable = Some(false);
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.constraints.primary_key = Some(true);
        self.constraints.nullable = Some(false);
        self
    }

    /// Adds a UNIQUE constraint.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.constraints.unique = Some(true);
        self
    }

    /// Adds an inline foreign key to `references` (`table(column)`).
    #[must_use]
    pub fn references(mut self, name: impl Into<String>, references: impl Into<String>) -> Self {
        self.constraints.foreign_key_name = Some(name.into());
        self.constraints.references = Some(references.into());
        self
    }

    /// Replaces all inline constraints.
    #[must_use]
    pub fn constraints(mut self, constraints: ColumnConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    /// Makes the column auto-increment.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = Some(true);
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column type.
    #[must_use]
    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require("column", "name", &self.name)?;
        require("column", "type", &self.column_type)
    }

    pub(crate) fn to_fragment(&self) -> Element {
        let mut element = Element::new("column")
            .attr("name", &self.name)
            .attr("type", &self.column_type);
        if let Some(default) = &self.default {
            let (name, value) = default.to_attribute();
            element.set_attr(name, value);
        }
        let element = element
            .opt_attr("remarks", self.remarks.as_deref())
            .flag("autoIncrement", self.auto_increment);

        if self.constraints.is_empty() {
            element
        } else {
            element.child(self.constraints.to_fragment())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_requires_name_and_type() {
        assert!(ColumnConfig::new("", "INT").unwrap_err().is_validation());
        assert!(ColumnConfig::new("id", " ").unwrap_err().is_validation());
    }

    #[test]
    fn test_plain_column() {
        let column = ColumnConfig::new("email", "VARCHAR(255)").unwrap();
        assert_eq!(
            column.to_fragment().to_string(),
            r#"<column name="email" type="VARCHAR(255)" />"#
        );
    }

    #[test]
    fn test_column_with_constraints() {
        let column = ColumnConfig::new("id", "BIGINT")
            .unwrap()
            .primary_key()
            .auto_increment();
        assert_eq!(
            column.to_fragment().to_string(),
            r#"<column name="id" type="BIGINT" autoIncrement="true"><constraints nullable="false" primaryKey="true" /></column>"#
        );
    }

    #[test]
    fn test_default_value_attributes() {
        let cases = [
            (DefaultValue::String("n/a".into()), "defaultValue=\"n/a\""),
            (DefaultValue::Numeric("0".into()), "defaultValueNumeric=\"0\""),
            (DefaultValue::Boolean(true), "defaultValueBoolean=\"true\""),
            (
                DefaultValue::Computed("CURRENT_TIMESTAMP".into()),
                "defaultValueComputed=\"CURRENT_TIMESTAMP\"",
            ),
        ];
        for (default, expected) in cases {
            let column = ColumnConfig::new("c", "TEXT").unwrap().default(default);
            assert!(column.to_fragment().to_string().contains(expected));
        }
    }

    #[test]
    fn test_foreign_key_reference() {
        let column = ColumnConfig::new("org_id", "BIGINT")
            .unwrap()
            .references("fk_user_org", "organizations(id)");
        let fragment = column.to_fragment();
        let constraints = fragment.find("constraints").unwrap();
        assert_eq!(constraints.attribute("foreignKeyName"), Some("fk_user_org"));
        assert_eq!(constraints.attribute("references"), Some("organizations(id)"));
    }

    #[test]
    fn test_foreign_key_action_keywords() {
        assert_eq!(ForeignKeyAction::default().as_str(), "NO ACTION");
        assert_eq!(ForeignKeyAction::SetNull.as_str(), "SET NULL");
        assert_eq!(ForeignKeyAction::Cascade.as_str(), "CASCADE");
    }
}
