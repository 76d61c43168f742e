//! Example: Graph and Relational Changelog
//!
//! This example builds a changelog for a library catalogue: Neo4j changesets
//! guarded by preconditions, a relational schema change with a rollback, and
//! a property shared by the whole document. It prints the XML and saves a
//! Latin-1 copy in the system temp directory.
//!
//! Run with: cargo run --example graph_changelog -p liquichange

use liquichange::prelude::*;

// =============================================================================
// Changeset Definitions
// =============================================================================

/// Seed nodes, only on Neo4j 5 community or enterprise.
fn seed_authors() -> Result<Changeset> {
    let mut changeset = Changeset::new("0001-seed-authors", "librarian")?.run_on_change(true);
    changeset.set_comment("Seed the catalogue with its first authors");
    changeset.add_preconditions(
        Preconditions::new()
            .on_fail(Action::MarkRan)
            .on_fail_message("Catalogue already seeded")
            .condition(Condition::dbms(Dbms::Neo4j))
            .condition(Condition::cypher_check(0, "MATCH (a:Author) RETURN COUNT(a)")?),
    );
    changeset.add_change(CypherChange::new("MERGE (:Author {name: 'Ursula K. Le Guin'})")?);
    changeset.add_change(CypherChange::new("MERGE (:Author {name: 'Stanisław Lem'})")?);
    changeset.add_rollback(Rollback::statement("MATCH (a:Author) DETACH DELETE a")?);
    Ok(changeset)
}

/// Index author names.
fn index_authors() -> Result<Changeset> {
    let mut changeset = Changeset::new("0002-index-authors", "librarian")?;
    changeset.add_preconditions(
        Preconditions::new()
            .logic(Logic::Or)
            .condition(Condition::edition(Edition::Enterprise))
            .condition(Condition::version("5.12.0")?),
    );
    changeset.add_change(CypherChange::new(
        "CREATE INDEX author_name IF NOT EXISTS FOR (a:Author) ON (a.name)",
    )?);
    changeset.add_rollback(Rollback::empty());
    Ok(changeset)
}

/// Relational side: loans table gets a borrower reference.
fn loans_borrower() -> Result<Changeset> {
    let mut changeset = Changeset::new("0003-loans-borrower", "librarian")?
        .dbms("postgresql")
        .run_in_transaction(true);
    changeset.add_change(AddColumnChange::new(
        "loans",
        vec![
            ColumnConfig::new("borrower_id", "BIGINT")?.not_null(),
            ColumnConfig::new("due_on", "DATE")?
                .default(DefaultValue::Computed("CURRENT_DATE + 14".into()))
                .remarks("Two weeks from checkout"),
        ],
    )?);
    changeset.add_change(
        AddForeignKeyConstraintChange::new(
            "fk_loans_borrower",
            "loans",
            vec!["borrower_id".into()],
            "borrowers",
            vec!["id".into()],
        )?
        .on_delete(ForeignKeyAction::Restrict),
    );
    changeset.add_change(CreateIndexChange::new(
        "idx_loans_due_on",
        "loans",
        vec!["due_on".into()],
    )?);
    changeset.add_rollback(Rollback::change(DropColumnChange::new("loans", "due_on")?));
    changeset.add_rollback(Rollback::change(DropColumnChange::new("loans", "borrower_id")?));
    Ok(changeset)
}

// =============================================================================
// Main
// =============================================================================

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("{}", "=".repeat(70));
    println!(" LIQUICHANGE: Library Catalogue Example");
    println!("{}", "=".repeat(70));
    println!();

    let mut changelog = Changelog::new().logical_file_path("catalogue/changelog.xml");
    changelog.add_property(Property::new("catalogue.schema", "public")?.global(true));
    changelog.add_changeset(seed_authors()?);
    changelog.add_changeset(index_authors()?);
    changelog.add_changeset(loans_borrower()?);

    println!("[1] {} changesets:", changelog.count_changesets());
    for changeset in changelog.changesets() {
        println!("    - {}/{}", changeset.id(), changeset.author());
        for change in changeset.changes() {
            println!("        {}", change.description());
        }
    }
    println!();

    println!("[2] Rendered document:");
    println!("{}", "-".repeat(70));
    print!("{}", changelog.to_xml_string(Encoding::Utf8)?);
    println!("{}", "-".repeat(70));
    println!();

    let path = std::env::temp_dir().join("liquichange-catalogue.xml");
    changelog.save_to_file(&path, Encoding::Iso8859_1)?;
    println!("[3] Saved ISO-8859-1 copy to {}", path.display());

    Ok(())
}
