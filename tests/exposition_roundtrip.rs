//! Round-trips rendered exposition text through a small parser, and checks
//! snapshot consistency under concurrent flush activity.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use promlite::{Label, MetricDefinition, MetricType, Registry, SnapshotStore};

/// One metric family recovered from exposition text.
#[derive(Debug, Default, PartialEq)]
struct Family {
    metric_type: String,
    help: String,
    /// Sorted label pairs -> value, so comparison ignores label order.
    samples: Vec<(Vec<(String, String)>, f64)>,
}

/// Parses exposition text back into families. Only handles the subset this
/// library emits, with unescaped label values.
fn parse(text: &str) -> BTreeMap<String, Family> {
    let mut families: BTreeMap<String, Family> = BTreeMap::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("# TYPE ") {
            let (name, metric_type) = rest.split_once(' ').expect("malformed TYPE line");
            families.entry(name.to_string()).or_default().metric_type = metric_type.to_string();
        } else if let Some(rest) = line.strip_prefix("# HELP ") {
            let (name, help) = rest.split_once(' ').expect("malformed HELP line");
            families.entry(name.to_string()).or_default().help = help.to_string();
        } else if !line.is_empty() {
            let (series, value) = line.rsplit_once(' ').expect("malformed sample line");
            let value: f64 = value.parse().expect("unparseable sample value");

            let (name, labels) = match series.split_once('{') {
                Some((name, rest)) => {
                    let rest = rest.strip_suffix('}').expect("unterminated label block");
                    let mut labels = Vec::new();
                    for pair in rest.split(',') {
                        let (key, quoted) = pair.split_once("=\"").expect("malformed label");
                        let value = quoted.strip_suffix('"').expect("unterminated label value");
                        labels.push((key.to_string(), value.to_string()));
                    }
                    labels.sort();
                    (name, labels)
                }
                None => (series, Vec::new()),
            };

            families
                .entry(name.to_string())
                .or_default()
                .samples
                .push((labels, value));
        }
    }

    families
}

fn sorted_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut pairs: Vec<_> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    pairs.sort();
    pairs
}

#[test]
fn rendered_text_parses_back_to_the_same_tuples() {
    let registry = Registry::new();

    registry
        .register(MetricDefinition::new(
            "requests_total",
            "Requests handled",
            MetricType::Counter,
        ))
        .unwrap();
    registry
        .register(MetricDefinition::new("temperature", "Sensor reading", MetricType::Gauge))
        .unwrap();
    registry
        .register(MetricDefinition::new("latency", "Request latency", MetricType::Summary))
        .unwrap();

    registry
        .get_or_create("requests_total", &[("method", "get"), ("code", "200")])
        .unwrap()
        .set(120.0);
    registry
        .get_or_create("requests_total", &[("method", "post"), ("code", "200")])
        .unwrap()
        .set(30.5);
    registry.get_or_create("temperature", vec![]).unwrap().set(-12.25);

    let families = parse(&registry.render());
    assert_eq!(families.len(), 3);

    let requests = &families["requests_total"];
    assert_eq!(requests.metric_type, "counter");
    assert_eq!(requests.help, "Requests handled");
    assert_eq!(
        requests.samples,
        vec![
            (sorted_pairs(&[("method", "get"), ("code", "200")]), 120.0),
            (sorted_pairs(&[("method", "post"), ("code", "200")]), 30.5),
        ]
    );

    let temperature = &families["temperature"];
    assert_eq!(temperature.metric_type, "gauge");
    assert_eq!(temperature.samples, vec![(Vec::new(), -12.25)]);

    // Headers only: the summary has no instances yet.
    let latency = &families["latency"];
    assert_eq!(latency.metric_type, "summary");
    assert_eq!(latency.help, "Request latency");
    assert!(latency.samples.is_empty());
}

#[test]
fn snapshot_and_live_render_agree() {
    let registry = Registry::new();
    registry
        .register(MetricDefinition::new("up", "Whether we are up", MetricType::Gauge))
        .unwrap();
    registry
        .get_or_create("up", vec![Label::new("instance", "a")])
        .unwrap()
        .set(1.0);

    let path = std::env::temp_dir()
        .join(format!("promlite_roundtrip_agree_{}", std::process::id()));
    let store = SnapshotStore::new(&path);
    store.flush(&registry).unwrap();

    assert_eq!(parse(&store.read().unwrap()), parse(&registry.render()));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn readers_never_observe_a_partial_snapshot() {
    let registry = Registry::new();
    registry
        .register(MetricDefinition::new("steady", "A value that never changes", MetricType::Gauge))
        .unwrap();
    for i in 0..50 {
        registry
            .get_or_create("steady", vec![Label::new("shard", i.to_string())])
            .unwrap()
            .set(1.0);
    }
    let expected = registry.render();

    let path = std::env::temp_dir()
        .join(format!("promlite_roundtrip_partial_{}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let store = SnapshotStore::new(&path);
    store.flush(&registry).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let flushers: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            let registry = registry.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    store.flush(&registry).unwrap();
                }
            })
        })
        .collect();

    // Every read strictly after a completed flush must return a complete
    // body, regardless of concurrent flush activity.
    for _ in 0..500 {
        assert_eq!(store.read().unwrap(), expected);
    }

    done.store(true, Ordering::Relaxed);
    for flusher in flushers {
        flusher.join().unwrap();
    }

    let _ = std::fs::remove_file(&path);
}
