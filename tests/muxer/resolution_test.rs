/*!
 * Event Resolution Tests
 * Properties of turning requests into concrete kernel events
 */

use crate::support::{table, EVENTS};
use proptest::prelude::*;
use tracemux::muxer::{resolve_events, TraceRequest};
use tracemux::tables::VendorEventMap;

const CATEGORIES: &[&str] = &["sched", "irq", "freq", "idle", "memory", "camera"];

fn entries() -> impl Strategy<Value = Vec<String>> {
    let mut pool: Vec<String> = EVENTS
        .iter()
        .flat_map(|(_, group, name)| {
            [
                format!("{}/{}", group, name),
                format!("{}/*", group),
                name.to_string(),
            ]
        })
        .collect();
    pool.extend(["foo/bar".to_string(), "missing".to_string()]);
    prop::collection::vec(prop::sample::select(pool), 0..8)
}

fn categories() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(CATEGORIES).prop_map(str::to_string),
        0..3,
    )
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(events in entries(), cats in categories()) {
        let table = table();
        let vendor = VendorEventMap::new();
        let request = TraceRequest {
            atrace_categories: cats,
            ..TraceRequest::with_events(events)
        };

        let first = resolve_events(&request, &table, &vendor);
        let second = resolve_events(&request, &table, &vendor);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_resolution_ignores_entry_order(events in entries()) {
        let table = table();
        let vendor = VendorEventMap::new();

        let mut reversed = events.clone();
        reversed.reverse();

        prop_assert_eq!(
            resolve_events(&TraceRequest::with_events(events), &table, &vendor),
            resolve_events(&TraceRequest::with_events(reversed), &table, &vendor)
        );
    }

    #[test]
    fn prop_more_entries_never_resolve_fewer(a in entries(), b in entries()) {
        let table = table();
        let vendor = VendorEventMap::new();

        let alone = resolve_events(&TraceRequest::with_events(a.clone()), &table, &vendor);
        let combined = resolve_events(
            &TraceRequest::with_events(a.into_iter().chain(b)),
            &table,
            &vendor,
        );
        prop_assert!(alone.is_subset(&combined));
    }

    #[test]
    fn prop_known_bare_names_resolve_to_table_events(index in 0..EVENTS.len()) {
        let table = table();
        let (_, group, name) = EVENTS[index];
        let resolved = resolve_events(&TraceRequest::with_events([name]), &table, &VendorEventMap::new());

        prop_assert_eq!(resolved.len(), 1);
        let event = resolved.iter().next().unwrap();
        prop_assert_eq!(event.group.as_str(), group);
        prop_assert_eq!(event.name.as_str(), name);
    }
}
