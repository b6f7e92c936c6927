//! Code location definitions and validation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const WHAT: &str = "CodeLocation";

/// A named reference to deployable code, loaded by a remote agent.
///
/// Field names follow the platform's location document format, so the same
/// struct reads the remote workspace document and desired-state files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    #[serde(rename = "location_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub code_source: CodeSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_queue: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_file: Option<String>,
}

/// Version-control reference for a location built from source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(default)]
    pub commit_hash: String,
    #[serde(default)]
    pub url: String,
}

impl GitRef {
    fn is_empty(&self) -> bool {
        self.commit_hash.is_empty() && self.url.is_empty()
    }
}

impl CodeLocation {
    /// Location deployed from a container image, loading `module_name`.
    pub fn from_image(
        name: impl Into<String>,
        image: impl Into<String>,
        module_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: Some(image.into()),
            code_source: CodeSource {
                module_name: Some(module_name.into()),
                ..CodeSource::default()
            },
            ..Self::default()
        }
    }

    /// Check the structural invariants the platform expects.
    ///
    /// Exactly one of image/git, git fully specified when present, and
    /// exactly one code source.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid(WHAT, "Name is required"));
        }

        let has_image = present(&self.image);
        let has_git = self.git.as_ref().is_some_and(|git| !git.is_empty());

        if !has_git && !has_image {
            return Err(Error::invalid(WHAT, "Git or Image is required"));
        }
        if has_git && has_image {
            return Err(Error::invalid(
                WHAT,
                "You can only specify one of Git or Image",
            ));
        }
        if let Some(git) = self.git.as_ref().filter(|_| has_git)
            && (git.commit_hash.is_empty() || git.url.is_empty())
        {
            return Err(Error::invalid(
                WHAT,
                "Must specify fields Git.CommitHash and Git.URL",
            ));
        }

        let sources = [
            &self.code_source.module_name,
            &self.code_source.package_name,
            &self.code_source.python_file,
        ]
        .into_iter()
        .filter(|value| present(value))
        .count();

        match sources {
            0 => Err(Error::invalid(
                WHAT,
                "CodeSource.ModuleName or CodeSource.PackageName or CodeSource.PythonFile is required",
            )),
            1 => Ok(()),
            _ => Err(Error::invalid(
                WHAT,
                "CodeSource.ModuleName/CodeSource.PackageName/CodeSource.PythonFile should be mutually exclusive",
            )),
        }
    }

    /// Canonical form for comparison: empty strings and an empty git ref
    /// read as absent, matching how the platform echoes documents back.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.is_empty())
        }

        Self {
            name: self.name.clone(),
            image: clean(&self.image),
            code_source: CodeSource {
                module_name: clean(&self.code_source.module_name),
                package_name: clean(&self.code_source.package_name),
                python_file: clean(&self.code_source.python_file),
            },
            working_directory: clean(&self.working_directory),
            executable_path: clean(&self.executable_path),
            attribute: clean(&self.attribute),
            git: self.git.clone().filter(|git| !git.is_empty()),
            agent_queue: clean(&self.agent_queue),
        }
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}
