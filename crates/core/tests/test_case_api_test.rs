use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use paramstore::{DatabaseConfig, DbEngine, Server, ServerOptions, TableSpec};

async fn setup() -> (TestServer, Server) {
  let _ = env_logger::try_init_from_env(env_logger::Env::new().default_filter_or("info"));

  let options = ServerOptions {
    database: DatabaseConfig::in_memory(),
    ..Default::default()
  };
  let server = Server::init(options).await.unwrap();

  let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_value(json!([
    {"id": 1, "name": "t1", "params": {"timeout": 2}},
  ]))
  .unwrap();
  server
    .state
    .db()
    .insert_rows(
      &TableSpec::parameters(server.state.table_name(), DbEngine::Sqlite),
      &rows,
    )
    .await
    .unwrap();

  let test_server = TestServer::try_new(server.main_router.1.clone()).unwrap();
  return (test_server, server);
}

#[tokio::test]
async fn test_home_and_healthcheck() {
  let (client, _server) = setup().await;

  let response = client.get("/").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.json::<serde_json::Value>(), json!({"message": "Base url"}));

  let response = client.get("/api/healthcheck").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.text(), "Ok");
}

#[tokio::test]
async fn test_get_seeded_test_case() {
  let (client, _server) = setup().await;

  let response = client.get("/test_case").add_query_param("id", 1).await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"params": {"timeout": 2}})
  );

  let response = client.get("/test_case").add_query_param("name", "t1").await;
  assert_eq!(response.status_code(), StatusCode::OK);

  let response = client.get("/test_case").add_query_param("id", 999).await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Unable find the desired test case"})
  );
}

#[tokio::test]
async fn test_validation_never_reaches_database() {
  let (client, server) = setup().await;
  let executed = server.state.db().executed_statements();

  let cases: [(&[(&str, &str)], &str); 4] = [
    (&[], "Missing id or testcase name"),
    (
      &[("id", "1"), ("name", "t1")],
      "You just can choose id or name, not both",
    ),
    (&[("id", "abc")], "ID should be an integer"),
    (&[("name", "2")], "Name should be a string"),
  ];

  for (params, message) in cases {
    for method in ["GET", "DELETE", "PUT"] {
      let mut request = match method {
        "GET" => client.get("/test_case"),
        "DELETE" => client.delete("/test_case"),
        _ => client.put("/test_case").form(&[("name", "x")]),
      };
      for (key, value) in params {
        request = request.add_query_param(key, value);
      }

      let response = request.await;
      assert_eq!(
        response.status_code(),
        StatusCode::BAD_REQUEST,
        "{method} {params:?}"
      );
      assert_eq!(
        response.json::<serde_json::Value>(),
        json!({"message": message})
      );
    }
  }

  assert_eq!(server.state.db().executed_statements(), executed);
}

#[tokio::test]
async fn test_create_then_get_round_trips() {
  let (client, _server) = setup().await;

  let response = client
    .post("/test_case")
    .form(&[("name", "t2"), ("params", r#"{"timeout":5}"#)])
    .await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "New test case added successfully"})
  );

  let response = client.get("/test_case").add_query_param("name", "t2").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"params": {"timeout": 5}})
  );

  let response = client.post("/test_case").form(&[("name", "t3")]).await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Missing arguments"})
  );

  // No form body at all.
  let response = client.post("/test_case").await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_then_get() {
  let (client, _server) = setup().await;

  let response = client.delete("/test_case").add_query_param("id", 1).await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Test case deleted successfully"})
  );

  let response = client.get("/test_case").add_query_param("id", 1).await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

  let response = client.delete("/test_case").add_query_param("id", 1).await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Unable deleted the desired test case"})
  );
}

#[tokio::test]
async fn test_update() {
  let (client, _server) = setup().await;

  let response = client
    .put("/test_case")
    .add_query_param("id", 1)
    .form(&[("params", r#"{"timeout":10}"#)])
    .await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Test case updated successfully"})
  );

  let response = client.get("/test_case").add_query_param("name", "t1").await;
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"params": {"timeout": 10}})
  );

  let response = client.put("/test_case").add_query_param("id", 1).await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Missing arguments"})
  );

  let response = client
    .put("/test_case")
    .add_query_param("id", 999)
    .form(&[("name", "x")])
    .await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Unable updated the desired test case"})
  );
}

#[tokio::test]
async fn test_invalid_table_name_is_rejected() {
  let options = ServerOptions {
    database: DatabaseConfig::in_memory(),
    table_name: "parameters; DROP TABLE x".to_string(),
    ..Default::default()
  };

  assert!(matches!(
    Server::init(options).await,
    Err(paramstore::InitError::Config(
      paramstore::ConfigError::InvalidIdentifier(_)
    ))
  ));
}

#[tokio::test]
async fn test_malformed_query_string_is_json_bad_request() {
  let (client, server) = setup().await;
  let executed = server.state.db().executed_statements();

  for method in ["GET", "DELETE", "PUT"] {
    let request = match method {
      "GET" => client.get("/test_case"),
      "DELETE" => client.delete("/test_case"),
      _ => client.put("/test_case").form(&[("name", "x")]),
    };

    let response = request.add_raw_query_param("id=1&id=2").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{method}");
    assert_eq!(
      response.json::<serde_json::Value>(),
      json!({"message": "Invalid query string"})
    );
  }

  assert_eq!(server.state.db().executed_statements(), executed);
}

#[tokio::test]
async fn test_integer_like_lookups() {
  let (client, server) = setup().await;

  // Whitespace around an integer is still an integer.
  let response = client.get("/test_case").add_query_param("id", " 1").await;
  assert_eq!(response.status_code(), StatusCode::OK);

  for name in [" 2", "99999999999999999999"] {
    let response = client.get("/test_case").add_query_param("name", name).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{name:?}");
    assert_eq!(
      response.json::<serde_json::Value>(),
      json!({"message": "Name should be a string"})
    );
  }

  let executed = server.state.db().executed_statements();
  let response = client
    .get("/test_case")
    .add_query_param("id", "99999999999999999999")
    .await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Unable find the desired test case"})
  );

  let response = client
    .delete("/test_case")
    .add_query_param("id", "99999999999999999999")
    .await;
  assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"message": "Unable deleted the desired test case"})
  );
  assert_eq!(server.state.db().executed_statements(), executed);
}
