use plcgw_telemetry::new_request_ids;

#[test]
fn request_ids_are_uuid_shaped() {
    let ids = new_request_ids();
    assert_eq!(ids.request_id.len(), 36);
    assert_eq!(ids.trace_id.len(), 36);
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn request_ids_differ_between_calls() {
    let first = new_request_ids();
    let second = new_request_ids();
    assert_ne!(first.request_id, second.request_id);
    assert_ne!(first.trace_id, second.trace_id);
}
