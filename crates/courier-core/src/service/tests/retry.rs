use super::*;

#[test]
fn transient_failures_exhaust_the_retry_limit_into_the_dlq() {
    let (mut service, factory) = test_service();
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    service
        .register_handler(move |_msg: &Message, _body: Greet| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Option<Greet>, _>(HandlerError::transient("downstream busy"))
        })
        .unwrap();
    service.start().unwrap();

    let mut producer = factory.create_message_producer().unwrap();
    producer
        .publish(&Greet {
            name: "doomed".to_string(),
        })
        .unwrap();

    let mut client = factory.create_message_queue_client().unwrap();
    let dead = recv(&mut client, "mq:Greet.dlq", Duration::from_secs(3))
        .expect("message in the dead-letter queue");

    // Retry limit 3 means exactly 3 processing attempts
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(dead.retry_attempts, 3);
    let error = dead.error.expect("error recorded on the envelope");
    assert_eq!(error.code, "Transient");
    assert!(error.message.contains("downstream busy"));

    service.stop();
    // No further attempts after dead-lettering
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn per_type_retry_limit_overrides_the_service_default() {
    let (mut service, factory) = test_service();
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    service
        .register_handler_with(1, Some(5), move |_msg: &Message, _body: Greet| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Option<Greet>, _>(HandlerError::transient("still busy"))
        })
        .unwrap();
    service.start().unwrap();

    let mut producer = factory.create_message_producer().unwrap();
    producer
        .publish(&Greet {
            name: "stubborn".to_string(),
        })
        .unwrap();

    let mut client = factory.create_message_queue_client().unwrap();
    let dead = recv(&mut client, "mq:Greet.dlq", Duration::from_secs(3))
        .expect("message in the dead-letter queue");
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert_eq!(dead.retry_attempts, 5);

    service.stop();
}

#[test]
fn transient_failure_then_success_replies_normally() {
    let (mut service, factory) = test_service();
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempts);
    service
        .register_handler(move |_msg: &Message, body: Greet| {
            // Fail the first two attempts, then succeed
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                return Err(HandlerError::transient("warming up"));
            }
            Ok(Some(GreetResponse {
                result: format!("Hello, {}", body.name),
            }))
        })
        .unwrap();
    service.start().unwrap();

    let mut producer = factory.create_message_producer().unwrap();
    producer
        .publish(&Greet {
            name: "Eventually".to_string(),
        })
        .unwrap();

    let mut client = factory.create_message_queue_client().unwrap();
    let reply =
        recv(&mut client, "mq:Greet.out", Duration::from_secs(3)).expect("eventual reply");
    let body: GreetResponse = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(body.result, "Hello, Eventually");

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(client.depth("mq:Greet.dlq").unwrap(), 0);

    let stats = service.stats();
    assert_eq!(stats.retried, 2);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.dead_lettered, 0);

    service.stop();
}

#[test]
fn retried_envelope_carries_the_incremented_attempt_count() {
    let (mut service, factory) = test_service();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let attempts_log = Arc::clone(&seen);
    service
        .register_handler(move |msg: &Message, _body: Greet| {
            attempts_log
                .lock()
                .unwrap()
                .push(msg.retry_attempts);
            Err::<Option<Greet>, _>(HandlerError::transient("log attempts"))
        })
        .unwrap();
    service.start().unwrap();

    let mut producer = factory.create_message_producer().unwrap();
    producer
        .publish(&Greet {
            name: "counted".to_string(),
        })
        .unwrap();

    let mut client = factory.create_message_queue_client().unwrap();
    recv(&mut client, "mq:Greet.dlq", Duration::from_secs(3)).expect("dead-lettered");

    // Attempts are inspected before increment: 0 on first delivery, then 1, 2
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);

    service.stop();
}
