//! End-to-end tests over real TCP: the fake server is exposed through a
//! MessagePack-RPC listener and the client connects with its stock transport.

mod common;

use bytes::{Buf, BytesMut};
use common::FakeXflrServer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use xflr_core::rpc::protocol::{decode_request, RpcResponse};
use xflr_core::{RemoteCollection, RpcTransport, SequenceType, Sweep, XflrClient, XflrError};

async fn serve(server: Arc<FakeXflrServer>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let server = server.clone();
            tokio::spawn(async move {
                let mut buf = BytesMut::new();
                loop {
                    while let Some(((_, id, method, params), used)) =
                        decode_request(&buf).unwrap()
                    {
                        buf.advance(used);
                        let response = match server.call(&method, params).await {
                            Ok(result) => RpcResponse::success(id, result),
                            Err(XflrError::Remote { message, .. }) => {
                                RpcResponse::error(id, json!(message))
                            }
                            Err(e) => RpcResponse::error(id, json!(e.to_string())),
                        };
                        stream.write_all(&response.encode().unwrap()).await.unwrap();
                    }
                    match stream.read_buf(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
            });
        }
    });

    addr.to_string()
}

#[tokio::test]
async fn test_object_model_over_tcp() {
    let server = FakeXflrServer::new();
    let address = serve(server.clone()).await;

    let client = XflrClient::connect(&address, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(client.is_connected().await);
    assert_eq!(client.session().address().as_deref(), Some(address.as_str()));

    let foil = client.foils().create_naca("2412", None).await.unwrap();
    assert!((foil.data().unwrap().thickness - 0.12).abs() < 1e-4);
    assert_eq!(foil.coordinates().await.unwrap().len(), 41);

    let analysis = foil
        .analyses()
        .unwrap()
        .create("T1", Default::default())
        .await
        .unwrap();
    let result = analysis
        .run_analysis(SequenceType::Alpha, Sweep::new(-2.0, 2.0, 0.5), &[])
        .await
        .unwrap();
    assert_eq!(result.len(), 9);
    assert_eq!(result.cl.len(), 9);
    assert_eq!(analysis.point_count().await.unwrap(), 9);

    client.close().await.unwrap();
    assert!(!client.is_connected().await);
}

#[tokio::test]
async fn test_remote_error_over_tcp() {
    let server = FakeXflrServer::new();
    let address = serve(server.clone()).await;
    let client = XflrClient::builder()
        .host("127.0.0.1")
        .port(address.rsplit(':').next().unwrap().parse().unwrap())
        .timeout(Duration::from_secs(5))
        .connect()
        .await
        .unwrap();

    let err = client.foils().get_by_key("missing").await.unwrap_err();
    assert!(matches!(err, XflrError::NotFound { .. }));

    server.fail_on("foilList");
    let err = client.foils().len().await.unwrap_err();
    match err {
        XflrError::Remote { method, message } => {
            assert_eq!(method, "foilList");
            assert_eq!(message, "foilList failed");
        }
        other => panic!("expected a remote error, got {:?}", other),
    }
}
