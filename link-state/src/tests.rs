use super::*;
use consts::CONN_HANDLE_INVALID;

#[derive(Default)]
struct FakeUart {
    frames_sent: usize,
}

#[test]
fn fresh_slot_is_unbound() {
    let slot = ConnectionSlot::new();

    assert!(slot.is_invalid());
    assert_eq!(slot.name(), "");
    assert_eq!(slot.handle(), CONN_HANDLE_INVALID);
}

#[test]
fn set_handle_marks_the_slot_bound() {
    let mut slot = ConnectionSlot::new();

    slot.set_handle(7);
    assert!(!slot.is_invalid());
    assert_eq!(slot.handle(), 7);
}

#[test]
fn name_round_trips() {
    let mut slot = ConnectionSlot::new();

    slot.set_name("Sensor-A");
    assert_eq!(slot.name(), "Sensor-A");

    // Multi-byte characters survive as-is.
    slot.set_name("Pulsmätare");
    assert_eq!(slot.name(), "Pulsmätare");

    // The empty string is a legal name at this layer.
    slot.set_name("");
    assert_eq!(slot.name(), "");
}

#[test]
fn handle_round_trips_including_the_sentinel() {
    let mut slot = ConnectionSlot::new();

    for handle in [0u16, 1, 42, 0xFFFE] {
        slot.set_handle(handle);
        assert_eq!(slot.handle(), handle);
        assert!(!slot.is_invalid());
    }

    slot.set_handle(CONN_HANDLE_INVALID);
    assert_eq!(slot.handle(), CONN_HANDLE_INVALID);
    assert!(slot.is_invalid());
}

#[test]
fn storing_the_sentinel_keeps_the_name() {
    let mut slot = ConnectionSlot::new();
    slot.bind(7, "Sensor-A");

    // Only invalidate() clears both fields; a bare handle store does not.
    slot.set_handle(CONN_HANDLE_INVALID);
    assert!(slot.is_invalid());
    assert_eq!(slot.name(), "Sensor-A");
}

#[test]
fn name_and_handle_do_not_disturb_each_other() {
    let mut slot = ConnectionSlot::new();

    slot.set_handle(12);
    slot.set_name("Sensor-A");
    assert_eq!(slot.handle(), 12);

    slot.set_handle(13);
    assert_eq!(slot.name(), "Sensor-A");
}

#[test]
fn bind_stores_handle_and_name_together() {
    let mut slot = ConnectionSlot::new();

    slot.bind(3, "Sensor-B");
    assert!(!slot.is_invalid());
    assert_eq!(slot.handle(), 3);
    assert_eq!(slot.name(), "Sensor-B");
}

#[test]
fn invalidate_clears_both_fields() {
    let mut slot = ConnectionSlot::new();
    slot.bind(7, "Sensor-A");

    slot.invalidate();
    assert!(slot.is_invalid());
    assert_eq!(slot.name(), "");
    assert_eq!(slot.handle(), CONN_HANDLE_INVALID);

    // Idempotent: a second invalidate observes the same state.
    slot.invalidate();
    assert!(slot.is_invalid());
    assert_eq!(slot.name(), "");
    assert_eq!(slot.handle(), CONN_HANDLE_INVALID);
}

#[test]
fn overlong_names_are_truncated() {
    let mut slot = ConnectionSlot::new();

    let long = "0123456789012345678901234567890123456789";
    slot.set_name(long);
    assert_eq!(slot.name(), &long[..consts::MAX_PEER_NAME_LEN]);

    // Truncation lands on a character boundary even when a multi-byte
    // character straddles the capacity limit.
    let mut awkward = heapless::String::<64>::new();
    for _ in 0..consts::MAX_PEER_NAME_LEN - 1 {
        awkward.push('x').unwrap();
    }
    awkward.push('ä').unwrap();
    slot.set_name(awkward.as_str());
    assert_eq!(slot.name().len(), consts::MAX_PEER_NAME_LEN - 1);
    assert!(slot.name().chars().all(|c| c == 'x'));
}

#[test]
fn uart_slot_follows_the_link_lifecycle() {
    let mut slot = PeripheralSlot::new(FakeUart::default());
    assert!(slot.is_invalid());

    slot.set_handle(7);
    slot.set_name("Sensor-A");
    assert!(!slot.is_invalid());
    assert_eq!(slot.handle(), 7);
    assert_eq!(slot.name(), "Sensor-A");

    slot.uart_mut().frames_sent += 1;

    slot.invalidate();
    assert!(slot.is_invalid());
    assert_eq!(slot.name(), "");
    assert_eq!(slot.handle(), CONN_HANDLE_INVALID);
}

#[test]
fn uart_client_survives_invalidate() {
    let mut slot = PeripheralSlot::new(FakeUart::default());
    slot.bind(3, "Keyboard");
    slot.uart_mut().frames_sent += 2;

    // The client is owned by the slot value, not by handle validity.
    slot.invalidate();
    assert_eq!(slot.uart().frames_sent, 2);
}
