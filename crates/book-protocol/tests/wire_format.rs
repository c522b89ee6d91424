// crates/book-protocol/tests/wire_format.rs
use book_core::{ClientId, NewOrder, Order, OrderId};
use book_protocol::{
    decode_frame, encode_frame, frame_len, DiscoveryRequest, NewOrderReply, ProtocolError, Reply,
    ReplyFrame, Request, RequestFrame, Service, MAX_FRAME_LEN,
};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[test]
fn new_order_payload_carries_plain_numbers() {
    let rid = Uuid::now_v7();
    let request = Request::NewOrder(NewOrder::new(dec!(100.5), dec!(-2)));

    let frame = request.to_frame(rid).expect("encode request");

    assert_eq!(frame.key, "new-order");
    assert_eq!(frame.payload, json!({ "price": 100.5, "amount": -2.0 }));
    assert_eq!(Request::from_frame(&frame).expect("decode request"), request);
}

#[test]
fn lock_payload_is_the_bare_client_id() {
    let request = Request::Lock(ClientId::new("127.0.0.1:1234"));

    let frame = request.to_frame(Uuid::now_v7()).expect("encode request");

    assert_eq!(frame.key, "lock");
    assert_eq!(frame.payload, json!("127.0.0.1:1234"));
}

#[test]
fn unknown_key_is_distinguished_from_bad_payload() {
    let mut frame = Request::Sync.to_frame(Uuid::now_v7()).expect("encode request");
    frame.key = "cancel-order".to_string();
    assert!(matches!(
        Request::from_frame(&frame),
        Err(ProtocolError::UnknownService(key)) if key == "cancel-order"
    ));

    frame.key = "new-order".to_string();
    frame.payload = json!({ "price": "lots" });
    assert!(matches!(Request::from_frame(&frame), Err(ProtocolError::Json(_))));
}

#[test]
fn foreign_protocol_version_is_rejected() {
    let mut frame = Request::Sync.to_frame(Uuid::now_v7()).expect("encode request");
    frame.version = 99;

    assert!(matches!(
        Request::from_frame(&frame),
        Err(ProtocolError::VersionMismatch(99))
    ));
}

#[test]
fn new_order_reply_uses_camel_case_keys() {
    let reply = Reply::Placed(NewOrderReply {
        success: true,
        is_fulfilled: false,
        nb_orders: 3,
    });

    let value = serde_json::to_value(&reply).expect("serialize reply");

    assert_eq!(
        value,
        json!({ "kind": "placed", "success": true, "isFulfilled": false, "nbOrders": 3 })
    );
}

#[test]
fn sync_reply_decodes_into_orders() {
    let id = Uuid::now_v7();
    let raw = json!({
        "kind": "book",
        "book": [{ "id": id.to_string(), "price": 99.0, "amount": 1.5 }]
    });

    let reply: Reply = serde_json::from_value(raw).expect("deserialize reply");

    let book = reply.into_book().expect("book reply");
    assert_eq!(book, vec![Order::new(OrderId(id), dec!(99), dec!(1.5))]);
}

#[test]
fn mismatched_reply_kind_is_an_error() {
    let err = Reply::ack().into_book().unwrap_err();

    assert!(matches!(
        err,
        ProtocolError::UnexpectedReply { expected: "book", got: "ack" }
    ));
}

#[test]
fn reply_must_answer_the_request_it_is_read_for() {
    let rid = Uuid::now_v7();
    let other = Uuid::now_v7();

    assert!(ReplyFrame::new(rid, Reply::ack()).answering(rid).is_ok());
    assert!(matches!(
        ReplyFrame::new(other, Reply::ack()).answering(rid),
        Err(ProtocolError::CorrelationMismatch { .. })
    ));
}

#[test]
fn frames_decode_back_to_back_from_one_buffer() {
    let first = Request::Sync.to_frame(Uuid::now_v7()).expect("encode request");
    let second = DiscoveryRequest::Lookup {
        service: Service::NewOrder.to_string(),
    };

    let mut buf = Vec::new();
    encode_frame(&first, &mut buf).expect("encode first");
    encode_frame(&second, &mut buf).expect("encode second");

    let (decoded_first, used): (RequestFrame, usize) = decode_frame(&buf).expect("first frame");
    let (decoded_second, rest): (DiscoveryRequest, usize) =
        decode_frame(&buf[used..]).expect("second frame");

    assert_eq!(decoded_first, first);
    assert_eq!(decoded_second, second);
    assert_eq!(used + rest, buf.len());
}

#[test]
fn partial_frames_report_truncation() {
    let mut buf = Vec::new();
    encode_frame(&Reply::ack(), &mut buf).expect("encode");

    let short = &buf[..buf.len() - 1];
    assert!(matches!(
        decode_frame::<Reply>(short),
        Err(ProtocolError::Truncated)
    ));
}

#[test]
fn length_prefix_is_bounded() {
    assert!(matches!(frame_len([0, 0, 0, 0]), Err(ProtocolError::EmptyFrame)));
    assert!(matches!(
        frame_len(((MAX_FRAME_LEN + 1) as u32).to_be_bytes()),
        Err(ProtocolError::FrameTooLarge(_))
    ));
    assert_eq!(frame_len(42u32.to_be_bytes()).expect("valid prefix"), 42);
}

#[test]
fn service_keys_round_trip_through_strings() {
    for service in Service::ALL {
        assert_eq!(service.as_str().parse::<Service>(), Ok(service));
    }
    assert!("mutex".parse::<Service>().is_err());
}
