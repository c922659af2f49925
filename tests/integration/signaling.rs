use crate::*;

use reqwest::StatusCode;

/// sign_in returns the role-aware view with the new id in Pragma.
#[tokio::test]
async fn test_sign_in_returns_view_and_id() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;

    let resp = server.get("/sign_in?peer_name=server1").await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.pragma.as_deref(), Some("1"));
    // Nothing to see yet: the peer gets its own line back.
    assert_eq!(resp.body, "server1,1,0\n");

    let resp = server.get("/sign_in?client1").await?;
    assert_eq!(resp.pragma.as_deref(), Some("2"));
    assert_eq!(resp.body, "server1,1,0\n");
    Ok(())
}

#[tokio::test]
async fn test_sign_in_rejects_unrenderable_names() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let resp = server.get("/sign_in?peer_name=a%2Cb").await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let resp = server.get("/sign_in").await?;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_role_filtered_views() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let mut clients = Vec::new();
    let mut servers = Vec::new();
    for i in 1..=3 {
        clients.push(server.sign_in(&format!("client{i}")).await?);
    }
    for i in 1..=3 {
        servers.push(server.sign_in(&format!("server{i}")).await?);
    }
    let unknown = server.sign_in("unknown1").await?;

    let client_view = server.view(clients[0]).await?;
    assert_eq!(client_view.lines().len(), 4);
    assert!(!client_view.body.contains("client"));
    for &id in &clients[1..] {
        assert_eq!(server.view(id).await?.body, client_view.body);
    }

    let server_view = server.view(servers[0]).await?;
    assert_eq!(server_view.lines().len(), 4);
    assert!(!server_view.body.contains("server"));
    for &id in &servers[1..] {
        assert_eq!(server.view(id).await?.body, server_view.body);
    }

    let everyone = server.view(unknown).await?;
    assert_eq!(everyone.lines().len(), 8);
    assert!(everyone.body.contains("server"));
    assert!(everyone.body.contains("client"));
    Ok(())
}

#[tokio::test]
async fn test_view_for_unknown_peer_is_404() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    assert_eq!(server.view(42).await?.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_sign_out_removes_peer() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let srv = server.sign_in("server1").await?;
    assert_eq!(server.view(srv).await?.body, "client1,1,0\n");

    let resp = server.get(&format!("/sign_out?peer_id={client}")).await?;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(server.view(srv).await?.body, "server1,2,0\n");

    let again = server.get(&format!("/sign_out?peer_id={client}")).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    Ok(())
}

/// Messages for a peer that isn't waiting are buffered and handed out by /wait.
#[tokio::test]
async fn test_buffered_message_delivered_on_wait() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let srv = server.sign_in("server1").await?;

    let sent = server
        .post(&format!("/message?peer_id={client}&to={srv}"), "offer-sdp")
        .await?;
    assert_eq!(sent.status, StatusCode::ACCEPTED);

    let got = server.get(&format!("/wait?peer_id={srv}")).await?;
    assert_eq!(got.status, StatusCode::OK);
    assert_eq!(got.pragma, Some(client.to_string()));
    assert_eq!(got.body, "offer-sdp");
    Ok(())
}

/// Payloads are relayed byte for byte, even when they are not UTF-8.
#[tokio::test]
async fn test_wait_returns_payload_bytes_unchanged() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let srv = server.sign_in("server1").await?;
    let payload: Vec<u8> = vec![0xff, 0x00, 0xfe, b'\n', 0xc3];

    let sent = server
        .client
        .post(format!("{}/message?peer_id={client}&to={srv}", server.base))
        .body(payload.clone())
        .send()
        .await?;
    assert_eq!(sent.status(), StatusCode::ACCEPTED);

    let got = server
        .client
        .get(format!("{}/wait?peer_id={srv}", server.base))
        .send()
        .await?;
    assert_eq!(got.status(), StatusCode::OK);
    assert_eq!(
        got.headers().get("pragma").and_then(|v| v.to_str().ok()),
        Some(client.to_string().as_str())
    );
    assert_eq!(got.bytes().await?.as_ref(), payload.as_slice());
    Ok(())
}

/// A parked /wait shows the peer as live and receives the message directly.
#[tokio::test]
async fn test_waiting_peer_receives_directly() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let srv = server.sign_in("server1").await?;

    let waiter = {
        let http = server.client.clone();
        let url = format!("{}/wait?peer_id={srv}", server.base);
        tokio::spawn(async move { http.get(url).send().await })
    };

    // The client sees the server go live while its wait is parked.
    let mut live = false;
    for _ in 0..40 {
        if server.view(client).await?.body == format!("server1,{srv},1\n") {
            live = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(live, "server never showed as live");

    let sent = server
        .post(&format!("/message?peer_id={client}&to={srv}"), "candidate")
        .await?;
    assert_eq!(sent.status, StatusCode::OK);

    let resp = waiter.await??;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await?, "candidate");
    Ok(())
}

#[tokio::test]
async fn test_wait_times_out() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let resp = server.get(&format!("/wait?peer_id={client}")).await?;
    assert_eq!(resp.status, StatusCode::GATEWAY_TIMEOUT);
    Ok(())
}

#[tokio::test]
async fn test_message_to_unknown_peer_is_404() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_OFF).await?;
    let client = server.sign_in("client1").await?;
    let resp = server
        .post(&format!("/message?peer_id={client}&to=99"), "hello")
        .await?;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_status_reports_counts() -> anyhow::Result<()> {
    let server = spawn_server(PAIRING_ONE).await?;
    let client = server.sign_in("client1").await?;
    server.sign_in("client2").await?;
    let srv = server.sign_in("server1").await?;
    server
        .post(&format!("/message?peer_id={client}&to={srv}"), "offer-sdp")
        .await?;

    let status = server.status_json().await?;
    assert_eq!(status["peers"], 3);
    assert_eq!(status["buffered"], 1);
    // server1's sign-in view claimed client1.
    assert_eq!(status["claimed"], 1);
    assert_eq!(status["pairing"]["enabled"], true);
    assert_eq!(status["pairing"]["respect_capacity"], false);
    Ok(())
}
