// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Follow-graph mutations, labelled by transition (`follow`, `approve`, `remove`)
/// and outcome (`ok`, `rejected`, `failed`)
pub static FOLLOW_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("reelbook_follow_transitions_total", "Follow edge transitions"),
        &["transition", "outcome"],
    )
    .expect("metric options are valid");
    let _ = REGISTRY.register(Box::new(counter.clone()));
    counter
});

pub static TIMELINE_ENTRIES_NORMALIZED: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "reelbook_timeline_entries_normalized_total",
        "Timeline entries passed through the normalizer",
    )
    .expect("metric options are valid");
    let _ = REGISTRY.register(Box::new(counter.clone()));
    counter
});

pub fn record_transition(transition: &str, outcome: &str) {
    FOLLOW_TRANSITIONS.with_label_values(&[transition, outcome]).inc();
}

/// Render every registered metric in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    // Touch the lazies so an idle process still reports zeroed series
    Lazy::force(&FOLLOW_TRANSITIONS);
    Lazy::force(&TIMELINE_ENTRIES_NORMALIZED);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
