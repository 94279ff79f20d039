//! Flatten a parsed descriptor into the project namespace.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::descriptor::reader::ProjectDescriptor;
use crate::models::{ProjectNamespace, TIMESTAMP_FORMAT, TIMESTAMP_KEY};

/// Namespace keys read straight from fixed descriptor paths.
const FIXED_PATHS: &[(&str, &[&str])] = &[
    ("project.name", &["project", "name"]),
    ("project.version", &["project", "version"]),
    ("project.url", &["project", "url"]),
    ("project.groupId", &["project", "groupId"]),
    ("project.artifactId", &["project", "artifactId"]),
    ("project.inceptionYear", &["project", "inceptionYear"]),
    ("project.developers[0].id", &["project", "developers", "developer", "id"]),
    ("project.developers[0].name", &["project", "developers", "developer", "name"]),
    ("project.developers[0].url", &["project", "developers", "developer", "url"]),
    ("project.licenses[0].name", &["project", "licenses", "license", "name"]),
    ("project.licenses[0].url", &["project", "licenses", "license", "url"]),
    (
        "project.licenses[0].distribution",
        &["project", "licenses", "license", "distribution"],
    ),
    ("package.licenseFile", &["project", "properties", "package.licenseFile"]),
    ("package.mainClass", &["project", "properties", "package.mainClass"]),
];

const AUTHOR_NAME_KEY: &str = "author.name";
const PACKAGE_NAME_KEY: &str = "package.name";

/// Extract the namespace, stamping the current UTC time.
pub fn extract(descriptor: &ProjectDescriptor) -> ProjectNamespace {
    extract_at(descriptor, Utc::now())
}

/// Extract the namespace with an explicit build timestamp.
pub fn extract_at(descriptor: &ProjectDescriptor, now: DateTime<Utc>) -> ProjectNamespace {
    let mut namespace = ProjectNamespace::new();

    for (key, path) in FIXED_PATHS {
        let value = descriptor.get_path(path).map(|e| e.text.clone());
        debug!(key = *key, value = ?value, "descriptor value");
        namespace.insert(key.to_string(), value);
    }

    if let Some(properties) = descriptor.get("project.properties") {
        for property in &properties.children {
            if property.tag.starts_with("project") {
                continue;
            }
            debug!(key = %property.tag, value = %property.text, "descriptor property");
            namespace.insert(property.tag.clone(), Some(property.text.clone()));
        }
    }

    apply_derived_ids(descriptor, &mut namespace);
    stamp(&mut namespace, now);
    namespace
}

/// Set the build timestamp key.
pub fn stamp(namespace: &mut ProjectNamespace, now: DateTime<Utc>) {
    namespace.insert(
        TIMESTAMP_KEY.to_string(),
        Some(now.format(TIMESTAMP_FORMAT).to_string()),
    );
}

/// Pick the project's own `groupId`/`artifactId` out of every declaration in
/// the tree, matching against the author and package names. Best effort:
/// with several matches, the last one in document order is kept.
fn apply_derived_ids(descriptor: &ProjectDescriptor, namespace: &mut ProjectNamespace) {
    let author = namespace
        .get(AUTHOR_NAME_KEY)
        .cloned()
        .flatten()
        .map(|s| s.to_lowercase());
    if let Some(author) = author {
        for element in descriptor.find_all("groupId") {
            let value = element.text.trim();
            if group_matches_author(value, &author) {
                info!(group_id = value, "derived project.groupId");
                namespace.insert("project.groupId".to_string(), Some(value.to_string()));
            }
        }
    }

    let package = namespace
        .get(PACKAGE_NAME_KEY)
        .cloned()
        .flatten()
        .map(|s| s.to_lowercase());
    if let Some(package) = package {
        for element in descriptor.find_all("artifactId") {
            let value = element.text.trim();
            if artifact_matches_package(value, &package) {
                info!(artifact_id = value, "derived project.artifactId");
                namespace.insert("project.artifactId".to_string(), Some(value.to_string()));
            }
        }
    }
}

fn group_matches_author(group_id: &str, author_lower: &str) -> bool {
    match group_id.rsplit('.').next() {
        Some(last) if !last.is_empty() => author_lower.contains(last),
        _ => false,
    }
}

fn artifact_matches_package(artifact_id: &str, package_lower: &str) -> bool {
    match artifact_id.split('-').next() {
        Some(first) if !first.is_empty() => first == package_lower,
        _ => false,
    }
}
