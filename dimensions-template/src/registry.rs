use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use dimensions_benchmark::PreviewMetrics;

use crate::definition::TemplateDefinition;
use crate::template::StructureTemplate;

/// Stable identity of a template definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Declared `name` field.
    Named(String),
    /// FNV-1a over the definition's canonical JSON.
    Hashed(u64),
}

impl TemplateKey {
    pub fn for_definition(definition: &TemplateDefinition) -> Result<Self> {
        match &definition.name {
            Some(name) => Ok(TemplateKey::Named(name.clone())),
            None => Ok(TemplateKey::Hashed(content_hash(definition)?)),
        }
    }
}

// Field order is fixed and blockNumbers is a BTreeMap, so the JSON is canonical
fn content_hash(definition: &TemplateDefinition) -> Result<u64> {
    Ok(fnv1a_hash(&definition.to_json()?))
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKey::Named(name) => f.write_str(name),
            TemplateKey::Hashed(hash) => write!(f, "#{:016x}", hash),
        }
    }
}

// FNV-1a 64-bit hash
fn fnv1a_hash(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Builds each distinct definition once and hands out shared handles.
///
/// A declared name may only ever stand for one definition; asking for a name
/// with different contents is an error.
pub struct TemplateRegistry {
    // Value: content hash of the definition the template was built from
    templates: HashMap<TemplateKey, (u64, Arc<StructureTemplate>)>,
    metrics: Arc<PreviewMetrics>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(PreviewMetrics::default()))
    }

    pub fn with_metrics(metrics: Arc<PreviewMetrics>) -> Self {
        Self { templates: HashMap::new(), metrics }
    }

    pub fn get_or_build(&mut self, definition: &TemplateDefinition) -> Result<Arc<StructureTemplate>> {
        let key = TemplateKey::for_definition(definition)?;
        let hash = content_hash(definition)?;
        if let Some((built_from, template)) = self.templates.get(&key) {
            if *built_from != hash {
                bail!("Template {} is already registered with different contents", key);
            }
            self.metrics.record_template_hit();
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(StructureTemplate::build(definition)?);
        self.metrics.record_template_miss();
        log::debug!("Built structure template {} ({} offsets)", key, template.len());
        self.templates.insert(key, (hash, Arc::clone(&template)));
        Ok(template)
    }

    pub fn get(&self, key: &TemplateKey) -> Option<Arc<StructureTemplate>> {
        self.templates.get(key).map(|(_, template)| Arc::clone(template))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
