//! Liquibase changelogs, built in Rust.
//!
//! `liquichange` is an object model for Liquibase-style database changelogs.
//! Changelogs are assembled in code and serialized to schema-compliant XML,
//! instead of being written by hand.
//!
//! # Architecture
//!
//! - **Change types** - One closed enum, [`change::ChangeType`], with a
//!   variant per supported change (`neo4j:cypher`, `sql`, `addColumn`, ...)
//! - **Changesets** - Ordered changes plus id, author and run metadata
//! - **Preconditions** - Nested `and` / `or` / `not` groups of checks
//! - **Changelog** - The root document, with properties and includes
//! - **XML** - Elements, escaping, encodings and the document writer
//!
//! Every level renders itself as an [`xml::Element`]; the changelog wraps the
//! fragments in `databaseChangeLog` and writes the document.
//!
//! # Example
//!
//! ```rust
//! use liquichange::prelude::*;
//!
//! let mut changeset = Changeset::new("42", "Nelson").unwrap();
//! changeset.add_change(
//!     CypherChange::new("MERGE (:property {handle: 'fastq_name', model: 'GDC'})").unwrap(),
//! );
//! changeset.add_change(
//!     AddColumnChange::new(
//!         "users",
//!         vec![ColumnConfig::new("email", "VARCHAR(255)").unwrap().not_null()],
//!     )
//!     .unwrap(),
//! );
//!
//! let mut changelog = Changelog::new();
//! changelog.add_changeset(changeset);
//!
//! let xml = changelog.to_xml_string(Encoding::Utf8).unwrap();
//! assert!(xml.contains(r#"<changeSet id="42" author="Nelson">"#));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Render a JSON changelog definition to XML
//! liquichange render changelog.json -o changelog.xml
//!
//! # Latin-1 output, compact
//! liquichange render changelog.json --encoding ISO-8859-1 --compact
//!
//! # Validate a definition and report duplicate changeset ids
//! liquichange check changelog.json
//! ```

pub mod change;
pub mod changelog;
pub mod changeset;
pub mod column;
pub mod error;
pub mod precondition;
pub mod xml;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::change::{
        AddColumnChange, AddForeignKeyConstraintChange, AddNotNullConstraintChange,
        AddUniqueConstraintChange, ChangeType, CreateIndexChange, CypherChange, DropColumnChange,
        DropTableChange, RenameColumnChange, SqlChange,
    };
    pub use crate::changelog::{Changelog, ChangelogEntry, Include, IncludeAll, Property};
    pub use crate::changeset::{Changeset, ObjectQuotingStrategy, Rollback, RunOrder};
    pub use crate::column::{ColumnConfig, ColumnConstraints, DefaultValue, ForeignKeyAction};
    pub use crate::error::{ChangelogError, Result};
    pub use crate::precondition::{
        Action, Condition, Dbms, Edition, Logic, Preconditions, SqlAction,
    };
    pub use crate::xml::{Element, Encoding, RenderOptions};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_prelude_builds_a_document() {
        let mut changeset = Changeset::new("1", "dev").unwrap();
        changeset.add_change(DropTableChange::new("legacy").unwrap());
        changeset.add_rollback(Rollback::empty());

        let mut changelog = Changelog::new();
        changelog.add_changeset(changeset);

        let xml = changelog.render(&RenderOptions::new().compact()).unwrap();
        assert!(xml.contains(
            r#"<changeSet id="1" author="dev"><dropTable tableName="legacy" /><rollback /></changeSet>"#
        ));
    }

    #[test]
    fn test_model_types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Changelog>();
        assert_send_sync::<Changeset>();
        assert_send_sync::<ChangeType>();
        assert_send_sync::<ChangelogError>();
    }
}
