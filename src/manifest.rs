//! Loading custom resource manifests with `$KEY` replacement values.

use std::{collections::BTreeMap, path::Path};

use kube::api::DynamicObject;
use tracing::debug;

use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    values: BTreeMap<String, String>,
}

impl Replacements {
    /// Values every manifest can rely on, with `DOMAIN_NAME` bound to `domain_name`.
    pub fn for_domain(domain_name: &str) -> Self {
        let mut replacements = Replacements::default();
        replacements.insert("DOMAIN_NAME", domain_name);
        replacements
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Adds a `KEY=VALUE` pair, as given on the command line.
    pub fn parse_pair(&mut self, pair: &str) -> Result<(), Error> {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                self.insert(key, value);
                Ok(())
            }
            _ => Err(Error::InvalidReplacement(pair.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Replaces each `$KEY` in `template` with its value.
///
/// Longer keys are substituted first, so `$DOMAIN_NAME_SUFFIX` survives a
/// `DOMAIN_NAME` replacement.
pub fn substitute(template: &str, replacements: &Replacements) -> String {
    let mut keys: Vec<_> = replacements.values.iter().collect();
    keys.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    keys.into_iter()
        .fold(template.to_string(), |rendered, (key, value)| {
            rendered.replace(&format!("${key}"), value)
        })
}

pub fn parse(template: &str, replacements: &Replacements) -> Result<DynamicObject, Error> {
    Ok(serde_yaml::from_str(&substitute(template, replacements))?)
}

pub fn load(path: &Path, replacements: &Replacements) -> Result<DynamicObject, Error> {
    debug!("loading manifest {}", path.display());

    let template = std::fs::read_to_string(path).map_err(|source| Error::ReadManifest {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&template, replacements)
}
