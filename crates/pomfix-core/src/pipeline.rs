//! The fix-all pass: load the namespace once, then bring every configured
//! target up to date.
//!
//! Targets run in a fixed order (XML configuration, build file, manifest).
//! When the build file's version line has to be rewritten the pass stops
//! right there with [`FixOutcome::RestartRequired`]: the build that invoked
//! us has already read the stale version and must be started again.

use std::path::Path;

use tracing::{debug, info};

use crate::cache::MetadataCache;
use crate::config::BuildConfig;
use crate::errors::{PomfixError, PomfixResult};
use crate::models::{FixOutcome, ProjectNamespace, RewriteStatus, TargetKind, TargetReport};
use crate::rewrite::{
    fix_build_file, render_xml_target, write_if_changed, KeyValueDocument, KeyValueStyle,
    ReleaseInfo,
};

pub struct Pipeline {
    config: BuildConfig,
}

impl Pipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Load (or rebuild) the cached namespace for the configured descriptor.
    pub fn namespace(&self) -> PomfixResult<ProjectNamespace> {
        MetadataCache::new(&self.config.cache_dir).load_or_build(&self.config.descriptor)
    }

    pub fn run(&self) -> PomfixResult<FixOutcome> {
        let namespace = self.namespace()?;
        self.run_with(&namespace)
    }

    /// Run every enabled target against an already loaded namespace.
    pub fn run_with(&self, namespace: &ProjectNamespace) -> PomfixResult<FixOutcome> {
        let config = &self.config;
        let mut reports = Vec::new();

        if let Some(template) = &config.xml_template {
            let status = fix_xml(template, &config.xml_output, namespace)?;
            reports.push(report(TargetKind::Xml, &config.xml_output, status));
        } else {
            debug!(target_kind = %TargetKind::Xml, "skipped");
        }

        if let Some(build_file) = &config.build_file {
            let status = fix_build_file(build_file, namespace, &config.build_file_keyword)?;
            reports.push(report(TargetKind::BuildFile, build_file, status));
            if status.changed() {
                info!(
                    file = %build_file.display(),
                    "build file version changed, restart required"
                );
                return Ok(FixOutcome::RestartRequired {
                    path: build_file.clone(),
                    reports,
                });
            }
        } else {
            debug!(target_kind = %TargetKind::BuildFile, "skipped");
        }

        if let Some(manifest) = &config.manifest {
            let output = config.manifest_output.as_deref().unwrap_or(manifest);
            let status = fix_manifest_with_version(
                manifest,
                output,
                namespace,
                Some(config.manifest_version_key.as_str()),
            )?;
            reports.push(report(TargetKind::Manifest, output, status));
        } else {
            debug!(target_kind = %TargetKind::Manifest, "skipped");
        }

        Ok(FixOutcome::Done { reports })
    }
}

fn report(kind: TargetKind, path: &Path, status: RewriteStatus) -> TargetReport {
    TargetReport {
        kind,
        path: path.to_path_buf(),
        status,
    }
}

fn read_target(path: &Path) -> PomfixResult<String> {
    std::fs::read_to_string(path).map_err(|e| PomfixError::from_io(path, e))
}

/// Render an XML template into `output`.
pub fn fix_xml(
    template: &Path,
    output: &Path,
    namespace: &ProjectNamespace,
) -> PomfixResult<RewriteStatus> {
    let text = read_target(template)?;
    let rendered = render_xml_target(&text, namespace, template)?;
    write_if_changed(output, &rendered)
}

/// Fill a manifest's placeholders. `output` defaults to `input`.
pub fn fix_manifest(
    input: &Path,
    output: Option<&Path>,
    namespace: &ProjectNamespace,
) -> PomfixResult<TargetReport> {
    let output = output.unwrap_or(input);
    let status = fix_manifest_with_version(input, output, namespace, None)?;
    Ok(report(TargetKind::Manifest, output, status))
}

/// Fill a manifest and, with a `version_key`, point that entry at the
/// resolved release version. The entry must exist.
pub fn fix_manifest_with_version(
    input: &Path,
    output: &Path,
    namespace: &ProjectNamespace,
    version_key: Option<&str>,
) -> PomfixResult<RewriteStatus> {
    let text = read_target(input)?;
    let mut doc = KeyValueDocument::parse(&text, KeyValueStyle::Manifest, input)?;
    let label = input.display().to_string();
    doc.fill(namespace, &label)?;

    if let Some(key) = version_key {
        if doc.get(key).is_none() {
            return Err(PomfixError::VersionDeclarationNotFound {
                keyword: key.to_string(),
                path: input.to_path_buf(),
            });
        }
        doc.set(key, ReleaseInfo::from_namespace(namespace)?.resolved_version());
    }
    write_if_changed(output, &doc.render())
}

/// Fill a `.properties` file. `output` defaults to `input`. Any unknown key
/// fails the whole file and nothing is written.
pub fn fix_properties(
    input: &Path,
    output: Option<&Path>,
    namespace: &ProjectNamespace,
) -> PomfixResult<TargetReport> {
    let text = read_target(input)?;
    let mut doc = KeyValueDocument::parse(&text, KeyValueStyle::Properties, input)?;
    doc.fill(namespace, &input.display().to_string())?;
    let output = output.unwrap_or(input);
    let status = write_if_changed(output, &doc.render())?;
    Ok(report(TargetKind::Properties, output, status))
}
