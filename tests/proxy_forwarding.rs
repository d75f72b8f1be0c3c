//! Passthrough forwarding tests.

use std::sync::Arc;

use proxy_filter::config::ProxyConfig;

mod common;

use common::{RecordingSink, BACKEND_BODY};

#[tokio::test]
async fn test_get_forwarded_with_query_and_headers() {
    let backend = common::start_backend().await;
    let sink = Arc::new(RecordingSink::default());
    let proxy = common::start_proxy(common::proxy_config(&backend.url(), "some.metric"), sink.clone()).await;

    let res = common::client()
        .get(proxy.url("/api/v1/validate?api_key=abc&b=2"))
        .header("dd-api-key", "secret")
        .header("x-multi", "a")
        .header("x-multi", "b")
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), 418);
    assert_eq!(res.headers().get("content-type").unwrap(), "application/test");
    let backend_headers: Vec<_> = res.headers().get_all("x-backend").iter().collect();
    assert_eq!(backend_headers, vec!["first", "second"]);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), BACKEND_BODY);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let seen = &requests[0];
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/api/v1/validate");
    assert_eq!(seen.query.as_deref(), Some("api_key=abc&b=2"));
    assert_eq!(seen.headers.get("dd-api-key").unwrap(), "secret");
    let multi: Vec<_> = seen.headers.get_all("x-multi").iter().collect();
    assert_eq!(multi, vec!["a", "b"]);
    assert!(seen.headers.contains_key("x-request-id"));
    assert_eq!(seen.headers.get("host").unwrap(), &backend.addr.to_string());

    assert!(sink.calls().is_empty());
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_post_body_passes_through_unchanged() {
    let backend = common::start_backend().await;
    let proxy = common::start_proxy(
        common::proxy_config(&backend.url(), "some.metric"),
        Arc::new(RecordingSink::default()),
    )
    .await;

    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let res = common::client()
        .post(proxy.url("/api/v1/check_run"))
        .header("content-encoding", "gzip")
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 418);

    let seen = &backend.requests()[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.body.as_ref(), payload.as_slice());
    assert_eq!(seen.headers.get("content-encoding").unwrap(), "gzip");
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_root_and_trailing_slash_paths_pass_through() {
    let backend = common::start_backend().await;
    let sink = Arc::new(RecordingSink::default());
    let proxy = common::start_proxy(common::proxy_config(&backend.url(), "some.metric"), sink.clone()).await;
    let client = common::client();

    let res = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 418);

    // not the exact series path, so never decoded
    let res = client
        .post(proxy.url("/api/v1/series/"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 418);

    let paths: Vec<_> = backend.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/", "/api/v1/series/"]);
    assert!(sink.calls().is_empty());
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_base_url_path_is_prepended() {
    let backend = common::start_backend().await;
    let base = format!("{}/intake/", backend.url());
    let proxy = common::start_proxy(
        common::proxy_config(&base, ""),
        Arc::new(RecordingSink::default()),
    )
    .await;

    let res = common::client().get(proxy.url("/api/v1/series")).send().await.unwrap();
    assert_eq!(res.status(), 418);
    assert_eq!(backend.requests()[0].path, "/intake/api/v1/series");
    proxy.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_returns_bad_gateway() {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backend.base_url = common::closed_port_url();
    let proxy = common::start_proxy(config, Arc::new(RecordingSink::default())).await;

    let res = common::client().get(proxy.url("/anything")).send().await.unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");
    proxy.shutdown.trigger();
}
