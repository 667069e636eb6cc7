//! Fuzz query compilation
//!
//! Each input line is `name = query`. The whole configuration is compiled
//! and a record is pushed through it; errors are fine, panics are not.

#![no_main]

use daiquiri::{DataStore, QueryConfig, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let config: QueryConfig = input
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(name, query)| (name.trim(), query.trim()))
        .collect();

    let Ok(mut store) = DataStore::<u8>::compile(&config) else {
        return;
    };

    store.add_entity(&0, ["A", "B"]);
    store.add_entity_component(&0, "C");
    store.set_entity_component_data(&0, "C", "x", &Value::Number(1.0), None);
    store.remove_entity_component(&0, "C");
    for name in config.iter().map(|(name, _)| name) {
        let _ = store.bucket_has(name, &0);
    }
});
