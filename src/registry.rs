use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::common::{MetricType, RegistryError};
use crate::formatting::{write_help_line, write_metric_line, write_type_line};
use crate::label::{IntoLabels, LabelSet};

/// A metric definition: the name, help text, and type tag rendered into the
/// metric's two header lines.
///
/// Identity for registration purposes is the name. Registering two
/// structurally different definitions under the same name keeps the first.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MetricDefinition {
    name: String,
    help: String,
    metric_type: MetricType,
}

impl MetricDefinition {
    /// Creates a [`MetricDefinition`].
    pub fn new<N, H>(name: N, help: H, metric_type: MetricType) -> Self
    where
        N: Into<String>,
        H: Into<String>,
    {
        MetricDefinition { name: name.into(), help: help.into(), metric_type }
    }

    /// Name of this metric.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text rendered into the `# HELP` line.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Type tag rendered into the `# TYPE` line.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }
}

/// A shared, mutable handle to one metric instance's value.
///
/// Handles are cheap to clone, and every clone for the same label set
/// observes every other clone's writes. The value is carried as `f64` bits in
/// an atomic, so producers and the renderer never contend on a lock.
#[derive(Clone, Debug)]
pub struct InstanceHandle {
    value: Arc<AtomicU64>,
}

impl InstanceHandle {
    fn zeroed() -> Self {
        InstanceHandle { value: Arc::new(AtomicU64::new(0.0f64.to_bits())) }
    }

    /// Sets the value.
    pub fn set(&self, value: f64) {
        let _ = self.value.swap(value.to_bits(), Ordering::AcqRel);
    }

    /// Adds `amount` to the value.
    pub fn increment(&self, amount: f64) {
        loop {
            let result = self.value.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
                let input = f64::from_bits(curr);
                let output = input + amount;
                Some(output.to_bits())
            });

            if result.is_ok() {
                break;
            }
        }
    }

    /// Reads the current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }
}

struct Instance {
    labels: LabelSet,
    handle: InstanceHandle,
}

struct DefEntry {
    def: MetricDefinition,
    instances: Vec<Instance>,
}

/// Capacity limits applied by a [`Registry`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub max_definitions: usize,
    pub max_instances: usize,
    pub max_labels: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_definitions: 256, max_instances: 256, max_labels: 50 }
    }
}

struct Inner {
    limits: Limits,
    defs: RwLock<IndexMap<String, DefEntry>>,
}

/// The set of registered metric definitions and their per-label-set
/// instances.
///
/// Clones share state: producers hold clones and mutate instance values while
/// the responder renders, with a single lock guarding the definition map.
/// Definitions render in registration order; instances are append-only with
/// no eviction, and every capacity limit is enforced with an explicit error.
///
/// Dropping the last clone (along with any outstanding [`InstanceHandle`]s)
/// releases everything.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Creates a registry with the default capacity limits (256 definitions,
    /// 256 instances per metric, 50 labels per instance).
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub(crate) fn with_limits(limits: Limits) -> Self {
        Registry { inner: Arc::new(Inner { limits, defs: RwLock::new(IndexMap::new()) }) }
    }

    /// Registers a metric definition.
    ///
    /// Idempotent by name: re-registering an already-present name is a no-op
    /// that keeps the existing entry, including its instances.
    pub fn register(&self, def: MetricDefinition) -> Result<(), RegistryError> {
        let mut defs = self.inner.defs.write();
        if defs.contains_key(def.name()) {
            return Ok(());
        }
        if defs.len() >= self.inner.limits.max_definitions {
            return Err(RegistryError::TooManyDefinitions(self.inner.limits.max_definitions));
        }
        let name = def.name().to_string();
        defs.insert(name, DefEntry { def, instances: Vec::new() });
        Ok(())
    }

    /// Returns the instance of `name` identified by `labels`, creating it
    /// with a zero value on first use.
    ///
    /// Label matching is order-independent: the same key/value pairs in any
    /// order address the same instance. The returned handle is shared, so
    /// writes through any copy are visible through all others. The compare
    /// and insert happen under one lock, making concurrent calls safe.
    pub fn get_or_create<L>(&self, name: &str, labels: L) -> Result<InstanceHandle, RegistryError>
    where
        L: IntoLabels,
    {
        let labels = labels.into_labels();
        if labels.len() > self.inner.limits.max_labels {
            return Err(RegistryError::TooManyLabels(self.inner.limits.max_labels));
        }

        let mut defs = self.inner.defs.write();
        let entry = defs
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownMetric(name.to_string()))?;

        if let Some(instance) = entry.instances.iter().find(|i| i.labels.matches(&labels)) {
            return Ok(instance.handle.clone());
        }

        if entry.instances.len() >= self.inner.limits.max_instances {
            return Err(RegistryError::TooManyInstances {
                name: name.to_string(),
                limit: self.inner.limits.max_instances,
            });
        }

        let handle = InstanceHandle::zeroed();
        entry
            .instances
            .push(Instance { labels: LabelSet::new(labels), handle: handle.clone() });
        Ok(handle)
    }

    /// Renders every registered metric, in registration order, into the
    /// exposition text format.
    ///
    /// Rendering never mutates registry state; the read lock is held for the
    /// duration, so the output is one internally consistent snapshot.
    pub fn render(&self) -> String {
        let defs = self.inner.defs.read();
        let mut output = String::new();
        for entry in defs.values() {
            render_entry(&mut output, entry);
        }
        output
    }

    /// Renders a single metric's block, or `None` if the name was never
    /// registered.
    ///
    /// A metric with no instances yet still yields its two header lines.
    pub fn render_metric(&self, name: &str) -> Option<String> {
        let defs = self.inner.defs.read();
        let entry = defs.get(name)?;
        let mut output = String::new();
        render_entry(&mut output, entry);
        Some(output)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

fn render_entry(buffer: &mut String, entry: &DefEntry) {
    write_type_line(buffer, entry.def.name(), entry.def.metric_type().as_str());
    write_help_line(buffer, entry.def.name(), entry.def.help());
    for instance in &entry.instances {
        write_metric_line(buffer, entry.def.name(), &instance.labels, instance.handle.get());
    }
}
