mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{fault_body, params_body, Arrival, FnTransport, GatedTransport};
use xmlrpc_client::{Client, ClientError};
use xmlrpc_codec::CodecError;
use xmlrpc_transport::{HttpResponse, TransportError};

async fn collect(
    arrivals: &mut tokio::sync::mpsc::UnboundedReceiver<Arrival>,
    count: usize,
) -> HashMap<String, Arrival> {
    let mut parked = HashMap::new();
    while parked.len() < count {
        let arrival = arrivals.recv().await.unwrap();
        parked.insert(arrival.method.clone(), arrival);
    }
    parked
}

fn answer(parked: &mut HashMap<String, Arrival>, method: &str, value: &str) {
    let arrival = parked.remove(method).unwrap();
    arrival
        .release
        .send(Ok(HttpResponse::ok(params_body(value))))
        .unwrap();
}

#[tokio::test]
async fn out_of_order_completions_reach_their_callers() {
    let (transport, mut arrivals) = GatedTransport::new();
    let client = Client::new(transport).unwrap();

    let first = client.issue("svc.first", (1i32,)).unwrap();
    let second = client.issue("svc.second", (2i32,)).unwrap();
    let third = client.issue("svc.third", (3i32,)).unwrap();
    assert_eq!(
        (first.sequence(), second.sequence(), third.sequence()),
        (1, 2, 3)
    );
    assert_eq!(client.in_flight(), 3);

    let mut parked = collect(&mut arrivals, 3).await;

    answer(&mut parked, "svc.third", "<value><string>three</string></value>");
    assert_eq!(third.wait::<String>().await.unwrap(), "three");

    answer(&mut parked, "svc.first", "<value><string>one</string></value>");
    assert_eq!(first.wait::<String>().await.unwrap(), "one");

    answer(&mut parked, "svc.second", "<value><string>two</string></value>");
    assert_eq!(second.wait::<String>().await.unwrap(), "two");

    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn concurrent_calls_from_many_tasks() {
    let transport = FnTransport::new(|request| {
        let method = common::method_of(request);
        let n: i64 = method.trim_start_matches("echo.").parse().unwrap();
        Ok(HttpResponse::ok(params_body(&format!(
            "<value><int>{n}</int></value>"
        ))))
    });
    let client = Client::new(transport).unwrap();

    let mut tasks = Vec::new();
    for n in 0..32i64 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            let got: i64 = client.call(&format!("echo.{n}"), ()).await.unwrap();
            assert_eq!(got, n);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn request_envelope_reaches_transport() {
    let transport = FnTransport::new(|request| {
        assert_eq!(request.content_type, "text/xml");
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><methodCall>"));
        assert!(body.contains("<methodName>Bug.get</methodName>"));
        assert!(body.contains("<param><value><int>5</int></value></param>"));
        Ok(HttpResponse::ok(params_body("<value><boolean>1</boolean></value>")))
    });
    let client = Client::new(transport).unwrap();
    assert!(client.call::<bool>("Bug.get", (5i32,)).await.unwrap());
}

#[tokio::test]
async fn fault_is_surfaced_with_code_and_message() {
    let transport = FnTransport::new(|_| {
        Ok(HttpResponse::ok(fault_body(
            410,
            "You must log in before using this part of Bugzilla.",
        )))
    });
    let client = Client::new(transport).unwrap();
    let err = client.call::<String>("Bug.get", ()).await.unwrap_err();
    let fault = err.fault().unwrap();
    assert_eq!(fault.code, 410);
    assert_eq!(
        err.to_string(),
        "Fault(410): You must log in before using this part of Bugzilla."
    );
}

#[tokio::test]
async fn bad_status_is_transport_error() {
    let transport = FnTransport::new(|_| Ok(HttpResponse::new(502, "bad gateway")));
    let client = Client::new(transport).unwrap();
    let err = client.call::<String>("x", ()).await.unwrap_err();
    assert!(err.is_transport());
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Status { status: 502 })
    ));
    assert_eq!(err.to_string(), "request error: bad status code - 502");
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn transport_failure_still_completes_the_call() {
    let transport = FnTransport::new(|_| Err(TransportError::Exchange("refused".into())));
    let client = Client::new(transport).unwrap();
    let err = client.call::<()>("x", ()).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn panicking_transport_completes_the_call() {
    let transport = FnTransport::new(|_| panic!("transport bug"));
    let client = Client::new(transport).unwrap();
    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        client.call::<()>("x", ()),
    )
    .await
    .expect("a panicking exchange must still complete its call");

    let Err(ClientError::Transport(TransportError::Exchange(message))) = &outcome else {
        panic!("expected exchange error, got {outcome:?}");
    };
    assert!(message.contains("transport bug"), "{message}");
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn wrong_destination_type_is_type_mismatch() {
    let body = params_body("<value><string>x</string></value>");
    let transport = FnTransport::new(move |_| Ok(HttpResponse::ok(body.clone())));
    let client = Client::new(transport).unwrap();
    let err = client.call::<i32>("x", ()).await.unwrap_err();
    assert!(err.is_type_mismatch());
}

#[tokio::test]
async fn empty_params_decode_into_unit() {
    let transport = FnTransport::new(|_| {
        Ok(HttpResponse::ok(
            "<methodResponse><params></params></methodResponse>",
        ))
    });
    let client = Client::new(transport).unwrap();
    client.call::<()>("system.ping", ()).await.unwrap();
    assert_eq!(client.call::<Option<i32>>("system.ping", ()).await.unwrap(), None);
    assert!(matches!(
        client.call::<i32>("system.ping", ()).await,
        Err(ClientError::Codec(CodecError::StructuralMismatch(_)))
    ));
}

#[tokio::test]
async fn close_releases_every_waiter() {
    let (transport, mut arrivals) = GatedTransport::new();
    let transport = Arc::new(transport);
    let client = Client::new(Arc::clone(&transport)).unwrap();

    let a = client.issue("svc.a", ()).unwrap();
    let b = client.issue("svc.b", ()).unwrap();
    let _parked = collect(&mut arrivals, 2).await;

    client.close();
    assert!(client.is_closed());
    assert!(transport.is_closed());
    assert!(matches!(a.wait::<()>().await, Err(ClientError::Closed)));
    assert!(matches!(b.wait::<()>().await, Err(ClientError::Closed)));
    assert_eq!(client.in_flight(), 0);

    assert!(matches!(
        client.call::<()>("svc.c", ()).await,
        Err(ClientError::Closed)
    ));
    client.close();
}

#[test]
fn async_client_requires_a_runtime() {
    let transport = FnTransport::new(|_| Ok(HttpResponse::ok("")));
    assert!(matches!(
        Client::new(transport),
        Err(ClientError::Runtime(_))
    ));
}
