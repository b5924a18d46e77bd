use fg_hal::fence::SharedTimelineFence;
use fg_hal::resource::RawHandle;

#[test]
fn next_value_is_monotonically_increasing() {
    let fence = SharedTimelineFence::new(RawHandle::NULL, RawHandle::NULL);
    assert_eq!(fence.next_value(), 1);
    assert_eq!(fence.next_value(), 2);
    assert_eq!(fence.next_value(), 3);
    assert_eq!(fence.current_value(), 3);
}

#[test]
fn current_value_starts_at_zero() {
    let fence = SharedTimelineFence::new(RawHandle::NULL, RawHandle::NULL);
    assert_eq!(fence.current_value(), 0);
}
