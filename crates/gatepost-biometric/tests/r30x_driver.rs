//! Integration tests for the R30x driver against a scripted module.
//!
//! The module side of a `tokio::io::duplex` pipe reads each command packet
//! and answers with the next scripted acknowledgement.

use gatepost_biometric::packet::{DEFAULT_ADDRESS, HEAD_LEN};
use gatepost_biometric::{Confirmation, Instruction, Packet, R30x, R30xConfig};
use gatepost_core::TemplateId;
use gatepost_hardware::{BiometricSensor, Capture, FeatureSlot, HardwareError, SlotStatus};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio::task::JoinHandle;

/// One scripted exchange: the instruction the module expects and its reply.
type Step = (Instruction, Vec<u8>);

fn reply(code: Confirmation, data: &[u8]) -> Vec<u8> {
    Packet::ack(DEFAULT_ADDRESS, code, data).encode()
}

/// Read one command packet on the module side.
async fn read_command(stream: &mut DuplexStream) -> Packet {
    let mut head = [0u8; HEAD_LEN];
    stream.read_exact(&mut head).await.unwrap();
    let (address, kind, remaining) = Packet::decode_head(&head).unwrap();
    let mut body = vec![0u8; remaining];
    stream.read_exact(&mut body).await.unwrap();
    Packet::decode_body(address, kind, &body).unwrap()
}

/// Run a fake module; returns the commands it received.
fn fake_module(mut stream: DuplexStream, script: Vec<Step>) -> JoinHandle<Vec<Packet>> {
    tokio::spawn(async move {
        let mut received = Vec::new();
        for (expected, answer) in script {
            let command = read_command(&mut stream).await;

            assert_eq!(command.payload[0], expected.as_u8(), "unexpected instruction");
            received.push(command);
            stream.write_all(&answer).await.unwrap();
        }
        received
    })
}

fn driver(script: Vec<Step>) -> (R30x<DuplexStream>, JoinHandle<Vec<Packet>>) {
    let (host, module) = duplex(512);
    (R30x::new(host, R30xConfig::default()), fake_module(module, script))
}

#[tokio::test]
async fn test_handshake_sends_password() {
    let config = R30xConfig {
        password: 0x0102_0304,
        ..R30xConfig::default()
    };
    let (host, module) = duplex(512);
    let module = fake_module(module, vec![(Instruction::VfyPwd, reply(Confirmation::OK, &[]))]);

    let mut sensor = R30x::new(host, config);
    sensor.handshake().await.unwrap();

    let commands = module.await.unwrap();
    assert_eq!(commands[0].payload, vec![0x13, 0x01, 0x02, 0x03, 0x04]);
}

#[tokio::test]
async fn test_handshake_wrong_password() {
    let (mut sensor, _module) = driver(vec![(
        Instruction::VfyPwd,
        reply(Confirmation::WRONG_PASSWORD, &[]),
    )]);

    assert!(matches!(
        sensor.handshake().await,
        Err(HardwareError::CommunicationError { .. })
    ));
}

#[tokio::test]
async fn test_identification_flow() {
    let (mut sensor, module) = driver(vec![
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (
            Instruction::Search,
            reply(Confirmation::OK, &[0x00, 0x0C, 0x00, 0x8F]),
        ),
    ]);

    let Capture::Image(image) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let template = sensor
        .extract_features(image, FeatureSlot::One)
        .await
        .unwrap();
    let found = sensor.search(&template).await.unwrap().unwrap();

    assert_eq!(found.template_id, TemplateId::new(12).unwrap());
    assert_eq!(found.confidence, 0x8F);

    let commands = module.await.unwrap();
    assert_eq!(commands[1].payload, vec![0x02, 0x01]);
    // Search buffer 1, pages 1..=127
    assert_eq!(commands[2].payload, vec![0x04, 0x01, 0x00, 0x01, 0x00, 0x7F]);
}

#[tokio::test]
async fn test_no_finger_is_not_an_error() {
    let (mut sensor, _module) = driver(vec![(
        Instruction::GenImg,
        reply(Confirmation::NO_FINGER, &[]),
    )]);

    assert_eq!(sensor.capture().await.unwrap(), Capture::NoFinger);
}

#[tokio::test]
async fn test_capture_failure() {
    let (mut sensor, _module) = driver(vec![(
        Instruction::GenImg,
        reply(Confirmation::IMAGE_FAILED, &[]),
    )]);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::Capture { .. })
    ));
}

#[tokio::test]
async fn test_search_not_found() {
    let (mut sensor, _module) = driver(vec![
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (Instruction::Search, reply(Confirmation::NOT_FOUND, &[0, 0, 0, 0])),
    ]);

    let Capture::Image(image) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let template = sensor
        .extract_features(image, FeatureSlot::One)
        .await
        .unwrap();
    assert_eq!(sensor.search(&template).await.unwrap(), None);
}

#[tokio::test]
async fn test_conversion_failure() {
    let (mut sensor, _module) = driver(vec![
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::IMAGE_MESSY, &[])),
    ]);

    let Capture::Image(image) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    assert!(matches!(
        sensor.extract_features(image, FeatureSlot::Two).await,
        Err(HardwareError::Conversion { .. })
    ));
}

#[tokio::test]
async fn test_enrollment_commands() {
    let (mut sensor, module) = driver(vec![
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (Instruction::RegModel, reply(Confirmation::OK, &[])),
        (Instruction::Store, reply(Confirmation::OK, &[])),
    ]);

    let Capture::Image(first) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let first = sensor.extract_features(first, FeatureSlot::One).await.unwrap();
    let Capture::Image(second) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let second = sensor.extract_features(second, FeatureSlot::Two).await.unwrap();

    let model = sensor.build_model(&first, &second).await.unwrap();
    sensor
        .store(model, TemplateId::new(100).unwrap())
        .await
        .unwrap();

    let commands = module.await.unwrap();
    assert_eq!(commands[3].payload, vec![0x02, 0x02]);
    assert_eq!(commands[5].payload, vec![0x06, 0x01, 0x00, 0x64]);
}

#[tokio::test]
async fn test_build_model_mismatch() {
    let (mut sensor, _module) = driver(vec![
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (Instruction::GenImg, reply(Confirmation::OK, &[])),
        (Instruction::Img2Tz, reply(Confirmation::OK, &[])),
        (Instruction::RegModel, reply(Confirmation::ENROLL_MISMATCH, &[])),
    ]);

    let Capture::Image(first) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let first = sensor.extract_features(first, FeatureSlot::One).await.unwrap();
    let Capture::Image(second) = sensor.capture().await.unwrap() else {
        panic!("expected an image");
    };
    let second = sensor.extract_features(second, FeatureSlot::Two).await.unwrap();

    assert!(matches!(
        sensor.build_model(&first, &second).await,
        Err(HardwareError::BuildModel { .. })
    ));
}

#[tokio::test]
async fn test_probe_reads_slot_status() {
    let (mut sensor, module) = driver(vec![
        (Instruction::LoadChar, reply(Confirmation::OK, &[])),
        (
            Instruction::LoadChar,
            reply(Confirmation::READ_TEMPLATE_FAILED, &[]),
        ),
        (Instruction::LoadChar, reply(Confirmation::BAD_LOCATION, &[])),
    ]);

    let id = TemplateId::new(1).unwrap();
    assert_eq!(sensor.probe(id).await.unwrap(), SlotStatus::Occupied);
    assert_eq!(sensor.probe(id).await.unwrap(), SlotStatus::Free);
    assert!(matches!(
        sensor.probe(id).await,
        Err(HardwareError::Store { .. })
    ));

    let commands = module.await.unwrap();
    assert_eq!(commands[0].payload, vec![0x07, 0x01, 0x00, 0x01]);
}

#[tokio::test]
async fn test_template_count() {
    let (mut sensor, _module) = driver(vec![(
        Instruction::TemplateNum,
        reply(Confirmation::OK, &[0x00, 0x2A]),
    )]);

    assert_eq!(sensor.template_count().await.unwrap(), 42);
}

#[tokio::test]
async fn test_reply_from_other_address_is_rejected() {
    let foreign = Packet::ack(0x1234_5678, Confirmation::OK, &[]).encode();
    let (mut sensor, _module) = driver(vec![(Instruction::GenImg, foreign)]);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::InvalidData { .. })
    ));
}

#[tokio::test]
async fn test_corrupted_reply_is_rejected() {
    let mut corrupted = reply(Confirmation::OK, &[]);
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0x55;
    let (mut sensor, _module) = driver(vec![(Instruction::GenImg, corrupted)]);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::InvalidData { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_silent_module_times_out() {
    let (host, _module) = duplex(512);
    let config = R30xConfig {
        reply_timeout: Duration::from_millis(300),
        ..R30xConfig::default()
    };
    let mut sensor = R30x::new(host, config);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::Timeout { duration_ms: 300 })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_late_reply_is_not_taken_for_the_next_one() {
    let (host, mut module) = duplex(512);
    let config = R30xConfig {
        reply_timeout: Duration::from_millis(100),
        ..R30xConfig::default()
    };
    let module = tokio::spawn(async move {
        read_command(&mut module).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        module
            .write_all(&reply(Confirmation::OK, &[]))
            .await
            .unwrap();

        let second = read_command(&mut module).await;
        module
            .write_all(&reply(Confirmation::NO_FINGER, &[]))
            .await
            .unwrap();
        second
    });
    let mut sensor = R30x::new(host, config);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::Timeout { duration_ms: 100 })
    ));
    assert_eq!(sensor.capture().await.unwrap(), Capture::NoFinger);

    let second = module.await.unwrap();
    assert_eq!(second.payload, vec![Instruction::GenImg.as_u8()]);
}

#[tokio::test(start_paused = true)]
async fn test_half_read_reply_is_discarded() {
    let foreign = Packet::ack(0x1234_5678, Confirmation::OK, &[]).encode();
    let (mut sensor, _module) = driver(vec![
        (Instruction::GenImg, foreign),
        (Instruction::GenImg, reply(Confirmation::NO_FINGER, &[])),
    ]);

    assert!(matches!(
        sensor.capture().await,
        Err(HardwareError::InvalidData { .. })
    ));
    assert_eq!(sensor.capture().await.unwrap(), Capture::NoFinger);
}
