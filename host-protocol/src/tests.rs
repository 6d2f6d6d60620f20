use super::*;

use postcard::accumulator::{CobsAccumulator, FeedResult};
use postcard::to_slice_cobs;

#[test]
fn frames_survive_split_uart_reads() {
    let payload = [0xAA; 40];
    let msg = HostProtocolMessage::Bluetooth(Bluetooth::SendData {
        link: 2,
        data: &payload,
    });

    let mut buf = [0u8; COBS_MAX_MSG_SIZE];
    let frame = to_slice_cobs(&msg, &mut buf).unwrap();

    // Feed the frame in 7-byte slices, the way a slow UART delivers it.
    let mut acc: CobsAccumulator<COBS_MAX_MSG_SIZE> = CobsAccumulator::new();
    let mut window = &frame[..];
    let mut decoded = false;
    while !window.is_empty() {
        let (chunk, rest) = window.split_at(window.len().min(7));
        match acc.feed_ref::<HostProtocolMessage>(chunk) {
            FeedResult::Consumed => {}
            FeedResult::Success { data, remaining } => {
                assert!(remaining.is_empty());
                assert_eq!(data, msg);
                decoded = true;
            }
            _ => panic!("frame did not reassemble cleanly"),
        }
        window = rest;
    }
    assert!(decoded);
}

#[test]
fn back_to_back_frames_decode_separately() {
    let first = HostProtocolMessage::Bluetooth(Bluetooth::GetLinkStatus { link: 0 });
    let second = HostProtocolMessage::GetState;

    // Two frames arriving in a single read window.
    let mut buf = [0u8; COBS_MAX_MSG_SIZE];
    let first_len = to_slice_cobs(&first, &mut buf).unwrap().len();
    let second_len = {
        let frame = to_slice_cobs(&second, &mut buf[first_len..]).unwrap();
        frame.len()
    };
    let window = &buf[..first_len + second_len];

    let mut acc: CobsAccumulator<COBS_MAX_MSG_SIZE> = CobsAccumulator::new();
    let remaining = match acc.feed_ref::<HostProtocolMessage>(window) {
        FeedResult::Success { data, remaining } => {
            assert_eq!(data, first);
            remaining
        }
        _ => panic!("first frame did not decode"),
    };
    match acc.feed_ref::<HostProtocolMessage>(remaining) {
        FeedResult::Success { data, remaining } => {
            assert_eq!(data, second);
            assert!(remaining.is_empty());
        }
        _ => panic!("second frame did not decode"),
    }
}

#[test]
fn oversized_frames_are_reported_not_crashed() {
    let payload = [0x55; 64];
    let msg = HostProtocolMessage::Bluetooth(Bluetooth::ReceivedData {
        link: 1,
        data: &payload,
    });

    let mut buf = [0u8; COBS_MAX_MSG_SIZE];
    let frame = to_slice_cobs(&msg, &mut buf).unwrap();

    // An accumulator smaller than the frame must flag OverFull instead of
    // wedging, since the comms loop keeps feeding whatever the host sends.
    let mut acc: CobsAccumulator<32> = CobsAccumulator::new();
    let mut window = &frame[..];
    let mut overfull = false;
    while !window.is_empty() {
        window = match acc.feed_ref::<HostProtocolMessage>(window) {
            FeedResult::Consumed => break,
            FeedResult::OverFull(rest) => {
                overfull = true;
                rest
            }
            FeedResult::DeserError(rest) => rest,
            FeedResult::Success { .. } => panic!("frame cannot fit this accumulator"),
        };
    }
    assert!(overfull);
}
