use crate::{BT_DATA_RX, BT_DATA_TX, BT_STATE, IRQ_OUT_PIN, REGISTRY, RSSI_VALUES};
use consts::{MAX_PEER_NAME_LEN, MTU};
use core::sync::atomic::Ordering;
use defmt::{info, unwrap};
use embassy_nrf::buffered_uarte::{BufferedUarte, BufferedUarteTx};
use embassy_nrf::peripherals::{TIMER1, UARTE0};
use embedded_io_async::Write;
use heapless::{String, Vec};
use host_protocol::{
    Bluetooth, HostProtocolMessage, PostcardError, SendDataResponse, State, COBS_MAX_MSG_SIZE,
};
use postcard::accumulator::{CobsAccumulator, FeedResult};
use postcard::to_slice_cobs;

/// Helper function to signal the MPU via GPIO
/// Sends a falling edge pulse on the IRQ line
async fn assert_out_irq() {
    let irq_out = IRQ_OUT_PIN.lock().await;

    {
        let mut pin = irq_out.borrow_mut();
        // Ensure pin starts HIGH
        pin.as_mut().unwrap().set_high();

        // Generate falling edge pulse
        pin.as_mut().unwrap().set_low();
        pin.as_mut().unwrap().set_high();
    }
}

/// Main communication task that handles incoming UART messages from the MPU
/// Decodes COBS-encoded messages and routes them to appropriate handlers
#[embassy_executor::task]
pub async fn comms_task(uart: BufferedUarte<'static, UARTE0, TIMER1>) {
    let mut send_buf = [0u8; COBS_MAX_MSG_SIZE];

    // Split UART into RX and TX
    let (mut rx, mut tx) = uart.split();

    // Buffer for raw incoming UART data
    let mut raw_buf = [0u8; 64];

    // COBS accumulator for decoding incoming messages
    let mut cobs_buf: CobsAccumulator<COBS_MAX_MSG_SIZE> = CobsAccumulator::new();
    loop {
        // Read data from UART; exit if the transport dies
        let Ok(n) = rx.read(&mut raw_buf).await else {
            break;
        };

        let buf = &raw_buf[..n];
        let mut window = buf;

        // Process all complete COBS messages in the buffer
        'cobs: while !window.is_empty() {
            window = match cobs_buf.feed_ref::<HostProtocolMessage>(window) {
                FeedResult::Consumed => {
                    break 'cobs;
                }
                FeedResult::OverFull(new_wind) => {
                    info!("overfull");
                    let msg = HostProtocolMessage::PostcardError(PostcardError::OverFull);
                    send_cobs(&mut tx, msg).await;
                    new_wind
                }
                FeedResult::DeserError(new_wind) => {
                    info!("DeserError");
                    let msg = HostProtocolMessage::PostcardError(PostcardError::Deser);
                    send_cobs(&mut tx, msg).await;
                    new_wind
                }
                FeedResult::Success { data, remaining } => {
                    // Route message to appropriate handler based on type
                    match data {
                        HostProtocolMessage::Bluetooth(bluetooth_msg) => {
                            bluetooth_handler(&mut send_buf, &mut tx, bluetooth_msg).await;
                        }
                        HostProtocolMessage::Reset => {
                            cortex_m::peripheral::SCB::sys_reset();
                        }
                        HostProtocolMessage::GetState => {
                            let msg = HostProtocolMessage::AckState(get_state());
                            send_cobs(&mut tx, msg).await;
                        }
                        _ => (),
                    };
                    remaining
                }
            };
        }
    }
}

/// Handles Bluetooth-specific messages received from the MPU
async fn bluetooth_handler(
    cobs_buf: &mut [u8; COBS_MAX_MSG_SIZE],
    tx: &mut BufferedUarteTx<'static, UARTE0>,
    msg: Bluetooth<'_>,
) {
    cobs_buf.fill(0);

    // Name copy for status replies; outlives the registry lock below.
    let mut status_name: String<MAX_PEER_NAME_LEN> = String::new();

    let msg = match msg {
        Bluetooth::Enable => {
            info!("Bluetooth enabled");
            BT_STATE.store(true, Ordering::Relaxed);
            HostProtocolMessage::Bluetooth(Bluetooth::AckEnable)
        }
        Bluetooth::Disable => {
            info!("Bluetooth disabled");
            BT_STATE.store(false, Ordering::Relaxed);
            HostProtocolMessage::Bluetooth(Bluetooth::AckDisable)
        }
        Bluetooth::GetSignalStrength { link } => {
            let rssi = RSSI_VALUES
                .get(link as usize)
                .map(|value| value.load(Ordering::Relaxed))
                .unwrap_or(0);
            HostProtocolMessage::Bluetooth(Bluetooth::SignalStrength { link, rssi })
        }
        Bluetooth::GetFirmwareVersion => {
            let version = env!("CARGO_PKG_VERSION");
            HostProtocolMessage::Bluetooth(Bluetooth::AckFirmwareVersion { version })
        }
        Bluetooth::GetReceivedData => {
            if let Ok((link, data)) = BT_DATA_RX.try_receive() {
                let len = data.len();
                cobs_buf[..len].copy_from_slice(data.as_slice());
                HostProtocolMessage::Bluetooth(Bluetooth::ReceivedData {
                    link,
                    data: &cobs_buf[..len],
                })
            } else {
                HostProtocolMessage::Bluetooth(Bluetooth::NoReceivedData)
            }
        }
        Bluetooth::SendData { link, data } => {
            // Only accept payloads a single ATT write can carry
            let response = if data.len() > MTU {
                SendDataResponse::DataTooLarge
            } else {
                match REGISTRY.lock().await.slot(link) {
                    Some(slot) if !slot.is_invalid() => {
                        let frame = unwrap!(Vec::from_slice(data));
                        if BT_DATA_TX[link as usize].try_send(frame).is_err() {
                            SendDataResponse::BufferFull
                        } else {
                            SendDataResponse::Sent
                        }
                    }
                    _ => SendDataResponse::NotConnected,
                }
            };
            HostProtocolMessage::Bluetooth(Bluetooth::SendDataResponse(response))
        }
        Bluetooth::GetLinkStatus { link } => {
            let mut connected = false;
            {
                let registry = REGISTRY.lock().await;
                if let Some(slot) = registry.slot(link) {
                    if !slot.is_invalid() {
                        connected = true;
                        let _ = status_name.push_str(slot.name());
                    }
                }
            }
            HostProtocolMessage::Bluetooth(Bluetooth::AckLinkStatus {
                link,
                connected,
                name: status_name.as_str(),
            })
        }

        Bluetooth::AckEnable
        | Bluetooth::AckDisable
        | Bluetooth::SignalStrength { .. }
        | Bluetooth::SendDataResponse(_)
        | Bluetooth::ReceivedData { .. }
        | Bluetooth::NoReceivedData
        | Bluetooth::AckLinkStatus { .. }
        | Bluetooth::AckFirmwareVersion { .. } => HostProtocolMessage::InappropriateMessage(get_state()),
    };

    send_cobs(tx, msg).await
}

fn get_state() -> State {
    match BT_STATE.load(Ordering::Relaxed) {
        true => State::Enabled,
        false => State::Disabled,
    }
}

async fn send_cobs(tx: &mut BufferedUarteTx<'_, UARTE0>, msg: HostProtocolMessage<'_>) {
    let mut send_buf = [0u8; COBS_MAX_MSG_SIZE];

    if let Ok(cobs_tx) = to_slice_cobs(&msg, &mut send_buf) {
        let _ = tx.write_all(cobs_tx).await;
        let _ = tx.flush().await;
        assert_out_irq().await;
    }
}
