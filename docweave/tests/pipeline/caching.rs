use crate::common::pipeline;
use docweave::{Pipeline, PipelineOptions, PluginRegistry};
use std::sync::Arc;

#[test]
fn repeated_input_is_served_from_cache() {
    let pipeline = pipeline();
    let input = "Some **text** with :smile:";

    let (first, first_hit) = pipeline.convert_with_status(input).unwrap();
    assert!(!first_hit);
    assert_eq!(pipeline.cache_hits(input), Some(0));

    let (second, second_hit) = pipeline.convert_with_status(input).unwrap();
    assert!(second_hit);
    assert_eq!(pipeline.cache_hits(input), Some(1));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        first.document.to_json().unwrap(),
        second.document.to_json().unwrap()
    );
}

#[test]
fn cached_and_uncached_agree() {
    let pipeline = pipeline();
    let input = ":::panel type=\"note\"\n- a\n- b\n:::";
    let cached = pipeline.convert(input).unwrap();
    let fresh = pipeline.convert_uncached(input).unwrap();
    assert_eq!(cached.document, fresh.document);
    assert_eq!(cached.warnings, fresh.warnings);
}

#[test]
fn stats_track_hits_and_misses() {
    let pipeline = pipeline();
    pipeline.convert("a").unwrap();
    pipeline.convert("a").unwrap();
    pipeline.convert("b").unwrap();
    let stats = pipeline.cache_stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);

    pipeline.clear_cache();
    assert_eq!(pipeline.cache_stats().entries, 0);
    assert_eq!(pipeline.cache_hits("a"), None);
}

#[test]
fn disabled_cache_never_hits() {
    let pipeline = Pipeline::new(
        PluginRegistry::with_defaults(),
        PipelineOptions {
            cache_capacity: 0,
            ..PipelineOptions::default()
        },
    );
    pipeline.convert("a").unwrap();
    let (_, hit) = pipeline.convert_with_status("a").unwrap();
    assert!(!hit);
}

#[test]
fn changing_plugins_clears_cache() {
    let mut pipeline = pipeline();
    pipeline.convert("@alice").unwrap();
    assert_eq!(pipeline.cache_stats().entries, 1);

    pipeline.registry_mut().unregister("mention");
    assert_eq!(pipeline.cache_stats().entries, 0);
    let conversion = pipeline.convert("@alice").unwrap();
    assert_eq!(
        conversion.document.content[0].content[0].text.as_deref(),
        Some("@alice")
    );
}

#[test]
fn concurrent_conversions_share_cache() {
    let pipeline = Arc::new(pipeline());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                let input = format!("doc {}", i % 2);
                pipeline.convert(&input).unwrap().document.clone()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let stats = pipeline.cache_stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits + stats.misses, 8);
}
