//! Explicit registry of extension functions.
//!
//! A catalog maps `source -> name -> function` for each of the three
//! contracts. It is built once, before the run, and only read afterwards.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::aggregator::{Count, Max, Mean, Median, Min, Sum};
use super::classifier::{BBases, OverlapBases, OverlapCount, StartParity};
use super::extractor::{BedColumn, BedScore, VcfInfo};
use super::{
    Aggregator, ArgSlot, Classifier, ExtensionError, ExtensionKind, ExtensionSpec, Extractor,
    ScalarType,
};

/// Source name of the functions shipped with the crate.
pub const BUILTIN_SOURCE: &str = "builtin";

#[derive(Default)]
struct Source {
    classifiers: FxHashMap<String, Arc<dyn Classifier>>,
    extractors: FxHashMap<String, Arc<dyn Extractor>>,
    aggregators: FxHashMap<String, Arc<dyn Aggregator>>,
}

/// Extension functions, grouped by source.
#[derive(Default)]
pub struct ExtensionCatalog {
    sources: FxHashMap<String, Source>,
}

/// A callable extension ready for invocation.
#[derive(Debug, Clone)]
pub enum ExtensionFn {
    Classifier(Arc<dyn Classifier>),
    Extractor(Arc<dyn Extractor>),
    Map {
        extractor: Arc<dyn Extractor>,
        aggregator: Arc<dyn Aggregator>,
    },
}

/// A spec bound to its implementation.
#[derive(Debug, Clone)]
pub struct ResolvedExtension {
    pub spec: ExtensionSpec,
    pub function: ExtensionFn,
}

impl ExtensionCatalog {
    /// An empty catalog. Builtins must be added explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the `builtin` source.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        catalog.register_classifier(BUILTIN_SOURCE, "start_parity", Arc::new(StartParity));
        catalog.register_classifier(BUILTIN_SOURCE, "n_overlapping", Arc::new(OverlapCount));
        catalog.register_classifier(BUILTIN_SOURCE, "overlap_bases", Arc::new(OverlapBases));
        catalog.register_classifier(BUILTIN_SOURCE, "b_bases", Arc::new(BBases));

        catalog.register_extractor(BUILTIN_SOURCE, "bed_score", Arc::new(BedScore));

        catalog.register_aggregator(BUILTIN_SOURCE, "count", Arc::new(Count));
        catalog.register_aggregator(BUILTIN_SOURCE, "sum", Arc::new(Sum));
        catalog.register_aggregator(BUILTIN_SOURCE, "mean", Arc::new(Mean));
        catalog.register_aggregator(BUILTIN_SOURCE, "min", Arc::new(Min));
        catalog.register_aggregator(BUILTIN_SOURCE, "max", Arc::new(Max));
        catalog.register_aggregator(BUILTIN_SOURCE, "median", Arc::new(Median));
        catalog
    }

    pub fn register_classifier(&mut self, source: &str, name: &str, f: Arc<dyn Classifier>) {
        self.source_mut(source).classifiers.insert(name.to_string(), f);
    }

    pub fn register_extractor(&mut self, source: &str, name: &str, f: Arc<dyn Extractor>) {
        self.source_mut(source).extractors.insert(name.to_string(), f);
    }

    pub fn register_aggregator(&mut self, source: &str, name: &str, f: Arc<dyn Aggregator>) {
        self.source_mut(source).aggregators.insert(name.to_string(), f);
    }

    fn source_mut(&mut self, source: &str) -> &mut Source {
        self.sources.entry(source.to_string()).or_default()
    }

    fn source(&self, name: &str) -> Result<&Source, ExtensionError> {
        self.sources
            .get(name)
            .ok_or_else(|| ExtensionError::UnknownSource(name.to_string()))
    }

    /// Bind a spec to its implementation.
    pub fn resolve(&self, spec: &ExtensionSpec) -> Result<ResolvedExtension, ExtensionError> {
        let source = self.source(&spec.source)?;
        let function = match spec.kind {
            ExtensionKind::Classifier => {
                let classifier = source.classifiers.get(&spec.function).ok_or_else(|| {
                    unknown("classifier", &spec.function, &spec.source)
                })?;
                ExtensionFn::Classifier(Arc::clone(classifier))
            }
            ExtensionKind::Extractor => {
                if !matches!(spec.result_type, ScalarType::Integer | ScalarType::Float) {
                    return Err(ExtensionError::InvalidArgument {
                        field: spec.field.clone(),
                        reason: format!(
                            "extractor columns are numeric, not {}",
                            spec.result_type
                        ),
                    });
                }
                ExtensionFn::Extractor(self.named_extractor(spec, source, &spec.function)?)
            }
            ExtensionKind::Map => {
                let aggregator = source.aggregators.get(&spec.function).ok_or_else(|| {
                    unknown("aggregator", &spec.function, &spec.source)
                })?;
                ExtensionFn::Map {
                    extractor: self.map_extractor(spec, source)?,
                    aggregator: Arc::clone(aggregator),
                }
            }
        };
        Ok(ResolvedExtension {
            spec: spec.clone(),
            function,
        })
    }

    /// Resolve every spec, failing on the first that cannot be bound.
    pub fn resolve_all(&self, specs: &[ExtensionSpec]) -> Result<Vec<ResolvedExtension>, ExtensionError> {
        specs.iter().map(|spec| self.resolve(spec)).collect()
    }

    /// Extractor chosen by a map spec's argument: a column number, an
    /// `info.KEY`, or the name of an extractor in the same source.
    fn map_extractor(&self, spec: &ExtensionSpec, source: &Source) -> Result<Arc<dyn Extractor>, ExtensionError> {
        match &spec.arg {
            ArgSlot::Index(column) => BedColumn::new(*column)
                .map(|c| Arc::new(c) as Arc<dyn Extractor>)
                .ok_or_else(|| ExtensionError::InvalidArgument {
                    field: spec.field.clone(),
                    reason: format!("column {} is not a payload column (use 4 or higher)", column),
                }),
            ArgSlot::Named(name) => self.named_extractor(spec, source, name),
            ArgSlot::Absent => Ok(Arc::new(BedScore)),
        }
    }

    fn named_extractor(
        &self,
        spec: &ExtensionSpec,
        source: &Source,
        name: &str,
    ) -> Result<Arc<dyn Extractor>, ExtensionError> {
        if let Some(key) = name.strip_prefix("info.") {
            if key.is_empty() {
                return Err(ExtensionError::InvalidArgument {
                    field: spec.field.clone(),
                    reason: "empty INFO key".to_string(),
                });
            }
            return Ok(Arc::new(VcfInfo::new(key)));
        }
        if name == "bed_column" {
            return match spec.arg {
                ArgSlot::Index(column) => BedColumn::new(column)
                    .map(|c| Arc::new(c) as Arc<dyn Extractor>)
                    .ok_or_else(|| ExtensionError::InvalidArgument {
                        field: spec.field.clone(),
                        reason: format!("column {} is not a payload column (use 4 or higher)", column),
                    }),
                _ => Err(ExtensionError::InvalidArgument {
                    field: spec.field.clone(),
                    reason: "bed_column needs a column number argument".to_string(),
                }),
            };
        }
        if name == "vcf_info" {
            return match &spec.arg {
                ArgSlot::Named(key) => Ok(Arc::new(VcfInfo::new(key.as_str()))),
                _ => Err(ExtensionError::InvalidArgument {
                    field: spec.field.clone(),
                    reason: "vcf_info needs an INFO key argument".to_string(),
                }),
            };
        }
        source
            .extractors
            .get(name)
            .cloned()
            .ok_or_else(|| unknown("extractor", name, &spec.source))
    }
}

fn unknown(kind: &'static str, name: &str, source: &str) -> ExtensionError {
    ExtensionError::UnknownFunction {
        kind,
        name: name.to_string(),
        source_name: source.to_string(),
    }
}
