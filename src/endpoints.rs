//! Endpoint path templates
//!
//! Deployments of the extraction service differ in path casing and in which
//! result lookups they expose. Rather than hard-coding one shape, every call
//! kind is described by a path template such as
//! `/wallet/{walletId}?walletVersionId={walletVersionId}`. Placeholder values
//! are percent-encoded when rendered.

use serde::{Deserialize, Serialize};

/// Placeholder for the job identifier
pub const JOB_ID: &str = "jobId";
/// Placeholder for the stable wallet identifier
pub const WALLET_ID: &str = "walletId";
/// Placeholder for the wallet version identifier
pub const WALLET_VERSION_ID: &str = "walletVersionId";

const KNOWN_PLACEHOLDERS: [&str; 3] = [JOB_ID, WALLET_ID, WALLET_VERSION_ID];

/// Values available for substitution into a template
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateVars<'a> {
    /// Job identifier
    pub job_id: Option<&'a str>,
    /// Wallet identifier
    pub wallet_id: Option<&'a str>,
    /// Wallet version identifier
    pub wallet_version_id: Option<&'a str>,
}

impl TemplateVars<'_> {
    fn get(&self, name: &str) -> Option<&str> {
        match name {
            JOB_ID => self.job_id,
            WALLET_ID => self.wallet_id,
            WALLET_VERSION_ID => self.wallet_version_id,
            _ => None,
        }
    }
}

/// Why a template could not be rendered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The template names a placeholder that has no value
    Missing(String),
    /// A `{` without a matching `}`
    Unterminated,
}

/// A request path with `{placeholder}` segments
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    /// Create a template from its raw text
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Raw template text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names of all placeholders, in order of appearance
    pub fn placeholders(&self) -> Result<Vec<&str>, RenderError> {
        let mut names = Vec::new();
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or(RenderError::Unterminated)?;
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        Ok(names)
    }

    /// Placeholders that are not one of `jobId`, `walletId`, `walletVersionId`
    pub fn unknown_placeholders(&self) -> Result<Vec<&str>, RenderError> {
        Ok(self
            .placeholders()?
            .into_iter()
            .filter(|name| !KNOWN_PLACEHOLDERS.contains(name))
            .collect())
    }

    /// Substitute placeholder values, percent-encoding each one
    pub fn render(&self, vars: &TemplateVars<'_>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or(RenderError::Unterminated)?;
            let name = &after[..end];
            let value = vars
                .get(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RenderError::Missing(name.to_string()))?;
            out.push_str(&urlencoding::encode(value));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl From<&str> for EndpointTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl std::fmt::Display for EndpointTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
