#![allow(dead_code)]

use liquichange::prelude::*;

pub const NELSON_CYPHER: &str = "MERGE (:property {handle: 'fastq_name', model: 'GDC'})";

pub fn cypher_changeset(id: &str, author: &str, cypher: &str) -> Changeset {
    let mut changeset =
        Changeset::new(id, author).unwrap_or_else(|e| panic!("Invalid changeset {id}: {e}"));
    changeset.add_change(
        CypherChange::new(cypher).unwrap_or_else(|e| panic!("Invalid cypher {cypher}: {e}")),
    );
    changeset
}

pub fn nelson_changelog() -> Changelog {
    let mut changelog = Changelog::new();
    changelog.add_changeset(cypher_changeset("42", "Nelson", NELSON_CYPHER));
    changelog
}

pub fn render_compact(changelog: &Changelog) -> String {
    changelog
        .render(&RenderOptions::new().compact())
        .unwrap_or_else(|e| panic!("Failed to render: {e}"))
}

/// Ids of the rendered changesets, in document order.
pub fn changeset_ids(changelog: &Changelog) -> Vec<String> {
    let root = changelog
        .to_xml()
        .unwrap_or_else(|e| panic!("Failed to build root: {e}"));
    root.find_all("changeSet")
        .filter_map(|c| c.attribute("id"))
        .map(str::to_string)
        .collect()
}
