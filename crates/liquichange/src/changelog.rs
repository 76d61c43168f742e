//! The changelog document.
//!
//! A [`Changelog`] is the root of the object model. It holds changesets and
//! the other top-level entries in document order, and renders, encodes and
//! saves the complete XML document.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::changeset::{Changeset, ObjectQuotingStrategy};
use crate::error::{require, ChangelogError, Result};
use crate::precondition::Preconditions;
use crate::xml::{render_document, Element, Encoding, RenderOptions};

/// Default namespace of a changelog.
pub const XMLNS: &str = "http://www.liquibase.org/xml/ns/dbchangelog";
/// XML Schema instance namespace.
pub const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
/// Namespace of the Neo4j extension (`neo4j:` elements).
pub const XMLNS_NEO4J: &str = "http://www.liquibase.org/xml/ns/dbchangelog-ext";
/// Schema location pairing the default namespace with its XSD.
pub const SCHEMA_LOCATION: &str = "http://www.liquibase.org/xml/ns/dbchangelog \
     http://www.liquibase.org/xml/ns/dbchangelog/dbchangelog-latest.xsd";

/// A changelog parameter (`<property>`).
///
/// Either `file` is set, or both `name` and `value` are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    relative_to_changelog_file: Option<bool>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    dbms: Option<String>,
    #[serde(default)]
    global: Option<bool>,
}

impl Property {
    /// Defines a property inline.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let property = Self {
            name: Some(name.into()),
            value: Some(value.into()),
            ..Self::empty()
        };
        property.validate()?;
        Ok(property)
    }

    /// Loads properties from a file.
    pub fn from_file(file: impl Into<String>) -> Result<Self> {
        let property = Self {
            file: Some(file.into()),
            ..Self::empty()
        };
        property.validate()?;
        Ok(property)
    }

    fn empty() -> Self {
        Self {
            name: None,
            value: None,
            file: None,
            relative_to_changelog_file: None,
            context: None,
            dbms: None,
            global: None,
        }
    }

    /// Resolves `file` relative to the changelog.
    #[must_use]
    pub fn relative_to_changelog_file(mut self, relative: bool) -> Self {
        self.relative_to_changelog_file = Some(relative);
        self
    }

    /// Restricts the property to a context expression.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Restricts the property to the given database type(s).
    #[must_use]
    pub fn dbms(mut self, dbms: impl Into<String>) -> Self {
        self.dbms = Some(dbms.into());
        self
    }

    /// Whether the property is visible to included changelogs.
    #[must_use]
    pub fn global(mut self, global: bool) -> Self {
        self.global = Some(global);
        self
    }

    fn validate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            return require("property", "file", file);
        }
        match (&self.name, &self.value) {
            (Some(name), Some(value)) => {
                require("property", "name", name)?;
                require("property", "value", value)
            }
            _ => Err(ChangelogError::validation(
                "property",
                "either 'file' or both 'name' and 'value' are required",
            )),
        }
    }

    /// Renders the property.
    pub fn to_fragment(&self) -> Result<Element> {
        self.validate().map_err(ChangelogError::into_serialization)?;
        Ok(Element::new("property")
            .opt_attr("name", self.name.as_deref())
            .opt_attr("value", self.value.as_deref())
            .opt_attr("file", self.file.as_deref())
            .flag("relativeToChangelogFile", self.relative_to_changelog_file)
            .opt_attr("context", self.context.as_deref())
            .opt_attr("dbms", self.dbms.as_deref())
            .flag("global", self.global))
    }
}

/// Includes another changelog file (`<include>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    file: String,
    #[serde(default)]
    relative_to_changelog_file: Option<bool>,
    #[serde(default)]
    context_filter: Option<String>,
    #[serde(default)]
    labels: Option<String>,
}

impl Include {
    /// Includes `file`, which must not be empty.
    pub fn new(file: impl Into<String>) -> Result<Self> {
        let file = file.into();
        require("include", "file", &file)?;
        Ok(Self {
            file,
            relative_to_changelog_file: None,
            context_filter: None,
            labels: None,
        })
    }

    /// Resolves the path relative to the including changelog.
    #[must_use]
    pub fn relative_to_changelog_file(mut self, relative: bool) -> Self {
        self.relative_to_changelog_file = Some(relative);
        self
    }

    /// Restricts the included changesets to a context expression.
    #[must_use]
    pub fn context_filter(mut self, filter: impl Into<String>) -> Self {
        self.context_filter = Some(filter.into());
        self
    }

    /// Restricts the included changesets to a label expression.
    #[must_use]
    pub fn labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    /// Renders the include.
    pub fn to_fragment(&self) -> Result<Element> {
        require("include", "file", &self.file).map_err(ChangelogError::into_serialization)?;
        Ok(Element::new("include")
            .attr("file", &self.file)
            .flag("relativeToChangelogFile", self.relative_to_changelog_file)
            .opt_attr("contextFilter", self.context_filter.as_deref())
            .opt_attr("labels", self.labels.as_deref()))
    }
}

/// Includes every changelog file in a directory (`<includeAll>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeAll {
    path: String,
    #[serde(default)]
    error_if_missing_or_empty: Option<bool>,
    #[serde(default)]
    relative_to_changelog_file: Option<bool>,
    #[serde(default)]
    resource_comparator: Option<String>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    context_filter: Option<String>,
}

impl IncludeAll {
    /// Includes every changelog under `path`, which must not be empty.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        require("includeAll", "path", &path)?;
        Ok(Self {
            path,
            error_if_missing_or_empty: None,
            relative_to_changelog_file: None,
            resource_comparator: None,
            filter: None,
            context_filter: None,
        })
    }

    /// Whether a missing or empty directory is an error.
    #[must_use]
    pub fn error_if_missing_or_empty(mut self, error: bool) -> Self {
        self.error_if_missing_or_empty = Some(error);
        self
    }

    /// Resolves the path relative to the including changelog.
    #[must_use]
    pub fn relative_to_changelog_file(mut self, relative: bool) -> Self {
        self.relative_to_changelog_file = Some(relative);
        self
    }

    /// Sets the class name used to order the included files.
    #[must_use]
    pub fn resource_comparator(mut self, comparator: impl Into<String>) -> Self {
        self.resource_comparator = Some(comparator.into());
        self
    }

    /// Sets the class name used to filter the included files.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Restricts the included changesets to a context expression.
    #[must_use]
    pub fn context_filter(mut self, filter: impl Into<String>) -> Self {
        self.context_filter = Some(filter.into());
        self
    }

    /// Renders the includeAll.
    pub fn to_fragment(&self) -> Result<Element> {
        require("includeAll", "path", &self.path).map_err(ChangelogError::into_serialization)?;
        Ok(Element::new("includeAll")
            .attr("path", &self.path)
            .flag("errorIfMissingOrEmpty", self.error_if_missing_or_empty)
            .flag("relativeToChangelogFile", self.relative_to_changelog_file)
            .opt_attr("resourceComparator", self.resource_comparator.as_deref())
            .opt_attr("filter", self.filter.as_deref())
            .opt_attr("contextFilter", self.context_filter.as_deref()))
    }
}

/// A top-level entry of a changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangelogEntry {
    /// A changeset.
    ChangeSet(Changeset),
    /// A property.
    Property(Property),
    /// An included changelog.
    Include(Include),
    /// An included directory of changelogs.
    IncludeAll(IncludeAll),
}

impl ChangelogEntry {
    fn to_fragment(&self) -> Result<Element> {
        match self {
            Self::ChangeSet(changeset) => changeset.to_fragment(),
            Self::Property(property) => property.to_fragment(),
            Self::Include(include) => include.to_fragment(),
            Self::IncludeAll(include_all) => include_all.to_fragment(),
        }
    }
}

/// The root of a changelog document (`<databaseChangeLog>`).
///
/// # Example
///
/// ```
/// use liquichange::prelude::*;
///
/// let mut changeset = Changeset::new("42", "Nelson").unwrap();
/// changeset.add_change(CypherChange::new("CREATE (:Person {name: 'Ada'})").unwrap());
///
/// let mut changelog = Changelog::new();
/// changelog.add_changeset(changeset);
///
/// let xml = changelog.to_xml_string(Encoding::Utf8).unwrap();
/// assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<databaseChangeLog"));
/// assert!(xml.contains("<neo4j:cypher>CREATE (:Person {name: 'Ada'})</neo4j:cypher>"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    logical_file_path: Option<String>,
    #[serde(default)]
    object_quoting_strategy: Option<ObjectQuotingStrategy>,
    #[serde(default)]
    preconditions: Option<Preconditions>,
    #[serde(default)]
    entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// Creates an empty changelog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a changelog definition from its JSON form.
    ///
    /// Fields are checked when the changelog is rendered, not here.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overrides the file path used to identify the changelog's changesets.
    #[must_use]
    pub fn logical_file_path(mut self, path: impl Into<String>) -> Self {
        self.logical_file_path = Some(path.into());
        self
    }

    /// Sets how object names are quoted for every changeset.
    #[must_use]
    pub fn object_quoting_strategy(mut self, strategy: ObjectQuotingStrategy) -> Self {
        self.object_quoting_strategy = Some(strategy);
        self
    }

    /// Appends a changeset.
    ///
    /// Ids are not required to be unique. A repeated id and author pair is
    /// logged and kept; see [`Changelog::duplicate_changeset_ids`].
    pub fn add_changeset(&mut self, changeset: Changeset) {
        if self
            .changesets()
            .any(|c| c.id() == changeset.id() && c.author() == changeset.author())
        {
            warn!(
                id = %changeset.id(),
                author = %changeset.author(),
                "Duplicate changeset id for author"
            );
        }
        self.entries.push(ChangelogEntry::ChangeSet(changeset));
    }

    /// Appends a property.
    pub fn add_property(&mut self, property: Property) {
        self.entries.push(ChangelogEntry::Property(property));
    }

    /// Appends an include.
    pub fn add_include(&mut self, include: Include) {
        self.entries.push(ChangelogEntry::Include(include));
    }

    /// Appends an includeAll.
    pub fn add_include_all(&mut self, include_all: IncludeAll) {
        self.entries.push(ChangelogEntry::IncludeAll(include_all));
    }

    /// Sets the changelog-level preconditions, replacing any previous ones.
    pub fn set_preconditions(&mut self, preconditions: Preconditions) {
        self.preconditions = Some(preconditions);
    }

    /// Returns the entries, in document order.
    #[must_use]
    pub fn entries(&self) -> &[ChangelogEntry] {
        &self.entries
    }

    /// Iterates over the changesets, in document order.
    pub fn changesets(&self) -> impl Iterator<Item = &Changeset> {
        self.entries.iter().filter_map(|entry| match entry {
            ChangelogEntry::ChangeSet(changeset) => Some(changeset),
            _ => None,
        })
    }

    /// Returns the number of changesets.
    #[must_use]
    pub fn count_changesets(&self) -> usize {
        self.changesets().count()
    }

    /// Returns each `(id, author)` pair used by more than one changeset, in
    /// order of first repetition.
    #[must_use]
    pub fn duplicate_changeset_ids(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<(&str, &str)> = Vec::new();
        for changeset in self.changesets() {
            let key = (changeset.id(), changeset.author());
            if !seen.insert(key) && !duplicates.contains(&key) {
                duplicates.push(key);
            }
        }
        duplicates
            .into_iter()
            .map(|(id, author)| (id.to_string(), author.to_string()))
            .collect()
    }

    /// Builds the root element.
    ///
    /// The namespace declarations always come first, in a fixed order.
    pub fn to_xml(&self) -> Result<Element> {
        let mut root = Element::new("databaseChangeLog")
            .attr("xmlns", XMLNS)
            .attr("xmlns:xsi", XMLNS_XSI)
            .attr("xmlns:neo4j", XMLNS_NEO4J)
            .attr("xsi:schemaLocation", SCHEMA_LOCATION)
            .opt_attr("logicalFilePath", self.logical_file_path.as_deref())
            .opt_attr(
                "objectQuotingStrategy",
                self.object_quoting_strategy
                    .as_ref()
                    .map(ObjectQuotingStrategy::as_str),
            );

        if let Some(preconditions) = &self.preconditions {
            preconditions
                .validate()
                .map_err(ChangelogError::into_serialization)?;
            root.push_child(preconditions.to_fragment());
        }
        for entry in &self.entries {
            root.push_child(entry.to_fragment()?);
        }
        Ok(root)
    }

    /// Renders the complete document as text.
    ///
    /// Characters the encoding cannot represent appear as character references.
    pub fn render(&self, options: &RenderOptions) -> Result<String> {
        render_document(&self.to_xml()?, options)
    }

    /// Renders the complete document as bytes in the configured encoding.
    pub fn render_bytes(&self, options: &RenderOptions) -> Result<Vec<u8>> {
        let text = self.render(options)?;
        Ok(options.get_encoding().encode(&text))
    }

    /// Renders the document with two-space indentation.
    pub fn to_xml_string(&self, encoding: Encoding) -> Result<String> {
        self.render(&RenderOptions::new().encoding(encoding))
    }

    /// Renders the document with two-space indentation, as bytes.
    pub fn to_xml_bytes(&self, encoding: Encoding) -> Result<Vec<u8>> {
        self.render_bytes(&RenderOptions::new().encoding(encoding))
    }

    /// Writes the document to `sink`.
    ///
    /// The document is rendered before anything is written, so a render
    /// failure leaves the sink untouched.
    pub fn write_to<W: Write>(&self, mut sink: W, options: &RenderOptions) -> Result<()> {
        let bytes = self.render_bytes(options)?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Saves the document to `path` with two-space indentation.
    pub fn save_to_file(&self, path: impl AsRef<Path>, encoding: Encoding) -> Result<()> {
        self.save_with_options(path, &RenderOptions::new().encoding(encoding))
    }

    /// Saves the document to `path`.
    ///
    /// The document is written to a temporary file next to `path` and then
    /// renamed over it, so `path` either holds the complete document or is
    /// left as it was.
    ///
    /// A symlink is followed and its target replaced. An existing file keeps
    /// its permissions, and a read-only one is refused with a
    /// [`ChangelogError::Io`] of kind `PermissionDenied`. A new file gets the
    /// default mode for files the process creates.
    pub fn save_with_options(&self, path: impl AsRef<Path>, options: &RenderOptions) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.render_bytes(options)?;

        let target = resolve_destination(path)?;
        let existing = match fs::metadata(&target) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(ChangelogError::io(path, e)),
        };
        if existing.as_ref().is_some_and(fs::Permissions::readonly) {
            return Err(ChangelogError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "destination is read-only"),
            ));
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut builder = tempfile::Builder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Narrowed by the umask, like any newly created file.
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut file = builder
            .tempfile_in(dir)
            .map_err(|e| ChangelogError::io(path, e))?;
        if let Some(permissions) = existing {
            file.as_file()
                .set_permissions(permissions)
                .map_err(|e| ChangelogError::io(path, e))?;
        }
        file.write_all(&bytes)
            .and_then(|()| file.flush())
            .map_err(|e| ChangelogError::io(path, e))?;
        file.persist(&target)
            .map_err(|e| ChangelogError::io(path, e.error))?;

        info!(
            path = %path.display(),
            changesets = self.count_changesets(),
            encoding = %options.get_encoding(),
            "Saved changelog"
        );
        Ok(())
    }
}

/// Follows `path` to the file it names when it is a symlink.
fn resolve_destination(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            let target = fs::canonicalize(path).map_err(|e| ChangelogError::io(path, e))?;
            debug!(link = %path.display(), target = %target.display(), "Following symlink");
            Ok(target)
        }
        _ => Ok(path.to_path_buf()),
    }
}
