//! Purpose: End-to-end tests for the flashcard-set HTTP/JSON server.
//! Exports: None (integration test module).
//! Role: Drive the real binary over TCP against the in-process `memory://` store.
//! Invariants: Uses loopback-only servers, one fresh store per test.
//! Invariants: Bounded waits avoid test flakiness.
//! Invariants: Server processes are cleaned up on drop.

use serde_json::{Value, json};
use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::{Duration, Instant};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

static SERVER_LOCK: Mutex<()> = Mutex::new(());

struct TestServer {
    child: Child,
    base_url: String,
    _server_guard: MutexGuard<'static, ()>,
}

impl TestServer {
    fn start() -> TestResult<Self> {
        Self::start_with_args(&[])
    }

    fn start_with_args(extra: &[&str]) -> TestResult<Self> {
        let guard = SERVER_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_flashdeck"));
            command
                .arg("serve")
                .arg("--store-uri")
                .arg("memory://")
                .arg("--bind")
                .arg("127.0.0.1")
                .arg("--port")
                .arg(port.to_string())
                .args(extra)
                .env_remove("MONGO_URI")
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, bind.parse()?) {
                Ok(()) => {
                    return Ok(Self {
                        child,
                        base_url,
                        _server_guard: guard,
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "server failed to start".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn sets(&self) -> String {
        self.url("/api/flashcard-sets")
    }

    fn set(&self, id: &str) -> String {
        format!("{}/{id}", self.sets())
    }

    fn create(&self, body: Value) -> TestResult<String> {
        let (status, value) = send(ureq::post(&self.sets()), Some(body))?;
        assert_eq!(status, 201, "create body: {value}");
        Ok(value["id"].as_str().ok_or("missing id")?.to_string())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn send(request: ureq::Request, body: Option<Value>) -> TestResult<(u16, Value)> {
    let result = match body {
        Some(body) => request.send_json(body),
        None => request.call(),
    };
    read_response(result)
}

fn send_raw(request: ureq::Request, body: &str) -> TestResult<(u16, Value)> {
    read_response(
        request
            .set("Content-Type", "application/json")
            .send_string(body),
    )
}

fn read_response(result: Result<ureq::Response, ureq::Error>) -> TestResult<(u16, Value)> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(_, response)) => response,
        Err(err) => return Err(err.into()),
    };
    let status = response.status();
    let text = response.into_string()?;
    let value = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    Ok((status, value))
}

fn capitals() -> Value {
    json!({
        "title": "Capitals",
        "description": "Europe",
        "cards": [
            {"term": "France", "definition": "Paris"},
            {"term": "Spain", "definition": "Madrid"}
        ]
    })
}

#[test]
fn create_then_get_returns_cleaned_cards_in_order() -> TestResult<()> {
    let server = TestServer::start()?;
    let id = server.create(json!({
        "title": "  Capitals ",
        "cards": [
            {"term": " France ", "definition": "Paris"},
            {"term": "", "definition": ""},
            {"term": "Spain", "definition": "Madrid"}
        ]
    }))?;
    assert_eq!(id.len(), 24);

    let (status, body) = send(ureq::get(&server.set(&id)), None)?;
    assert_eq!(status, 200);
    assert_eq!(body["title"], "Capitals");
    assert_eq!(body["description"], "");
    assert_eq!(
        body["cards"],
        json!([
            {"term": "France", "definition": "Paris", "order": 0},
            {"term": "Spain", "definition": "Madrid", "order": 1}
        ])
    );
    assert!(body.get("id").is_none());
    Ok(())
}

#[test]
fn create_rejects_missing_or_blank_input() -> TestResult<()> {
    let server = TestServer::start()?;
    let cases = [
        (json!({"cards": [{"term": "a", "definition": "b"}]}), "title and cards[] are required"),
        (json!({"title": "   ", "cards": [{"term": "a"}]}), "title and cards[] are required"),
        (json!({"title": "t", "cards": "nope"}), "title and cards[] are required"),
        (
            json!({"title": "t", "cards": [{"term": " ", "definition": ""}]}),
            "cards must include at least one term/definition",
        ),
        (
            json!({"title": "t", "cards": []}),
            "cards must include at least one term/definition",
        ),
    ];
    for (body, message) in cases {
        let (status, value) = send(ureq::post(&server.sets()), Some(body.clone()))?;
        assert_eq!(status, 400, "body: {body}");
        assert_eq!(value, json!({ "error": message }), "body: {body}");
    }

    let (_, page) = send(ureq::get(&server.sets()), None)?;
    assert_eq!(page["total"], 0);
    Ok(())
}

#[test]
fn malformed_json_body_is_a_bad_request() -> TestResult<()> {
    let server = TestServer::start()?;
    let (status, value) = send_raw(ureq::post(&server.sets()), "{not json")?;
    assert_eq!(status, 400);
    assert!(value["error"].is_string());
    Ok(())
}

#[test]
fn list_is_newest_first_with_total_and_no_cards() -> TestResult<()> {
    let server = TestServer::start()?;
    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        ids.push(server.create(json!({
            "title": title,
            "cards": [{"term": "t", "definition": "d"}]
        }))?);
    }

    let (status, page) = send(ureq::get(&server.sets()), None)?;
    assert_eq!(status, 200);
    assert_eq!(page["total"], 3);
    let items = page["items"].as_array().ok_or("items")?;
    let titles: Vec<&str> = items.iter().filter_map(|item| item["title"].as_str()).collect();
    assert_eq!(titles, ["three", "two", "one"]);
    assert_eq!(items[0]["id"], ids[2].as_str());
    for item in items {
        assert!(item.get("cards").is_none());
        assert!(item.get("updatedAt").is_none());
        assert!(item["createdAt"].as_str().is_some_and(|ts| ts.ends_with('Z')));
        assert_eq!(item["createdAt"].as_str().map(str::len), Some(24));
    }
    Ok(())
}

#[test]
fn list_paginates_and_clamps_limit() -> TestResult<()> {
    let server = TestServer::start()?;
    for n in 0..5 {
        server.create(json!({
            "title": format!("set {n}"),
            "cards": [{"term": "t", "definition": "d"}]
        }))?;
    }

    let (_, page) = send(ureq::get(&server.sets()).query("limit", "2").query("skip", "1"), None)?;
    assert_eq!(page["total"], 5);
    let titles: Vec<&str> = page["items"]
        .as_array()
        .ok_or("items")?
        .iter()
        .filter_map(|item| item["title"].as_str())
        .collect();
    assert_eq!(titles, ["set 3", "set 2"]);

    for limit in ["500", "abc", "0", "-3"] {
        let (status, page) = send(ureq::get(&server.sets()).query("limit", limit), None)?;
        assert_eq!(status, 200, "limit: {limit}");
        assert_eq!(page["items"].as_array().map(Vec::len), Some(5), "limit: {limit}");
    }

    let (_, page) = send(ureq::get(&server.sets()).query("skip", "10"), None)?;
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total"], 5);
    Ok(())
}

#[test]
fn search_matches_card_text_case_insensitively() -> TestResult<()> {
    let server = TestServer::start()?;
    let capitals = server.create(capitals())?;
    server.create(json!({
        "title": "Verbs",
        "cards": [{"term": "hablar", "definition": "to speak"}]
    }))?;

    let (_, page) = send(ureq::get(&server.sets()).query("q", "madrid"), None)?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], capitals.as_str());

    let (_, page) = send(ureq::get(&server.sets()).query("q", "a.c"), None)?;
    assert_eq!(page["total"], 0);

    let (_, page) = send(ureq::get(&server.sets()).query("q", "   "), None)?;
    assert_eq!(page["total"], 2);
    Ok(())
}

#[test]
fn repeated_query_keys_keep_the_search_filter() -> TestResult<()> {
    let server = TestServer::start()?;
    let capitals = server.create(capitals())?;
    server.create(json!({
        "title": "Verbs",
        "cards": [{"term": "hablar", "definition": "to speak"}]
    }))?;

    let request = ureq::get(&server.sets())
        .query("q", "madrid")
        .query("limit", "5")
        .query("limit", "5");
    let (status, page) = send(request, None)?;
    assert_eq!(status, 200);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], capitals.as_str());
    Ok(())
}

#[test]
fn huge_skip_returns_an_empty_page() -> TestResult<()> {
    let server = TestServer::start()?;
    server.create(capitals())?;
    let (status, page) = send(ureq::get(&server.sets()).query("skip", "1e19"), None)?;
    assert_eq!(status, 200);
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total"], 1);
    Ok(())
}

#[test]
fn form_posts_create_and_update_sets() -> TestResult<()> {
    let server = TestServer::start()?;
    let response = ureq::post(&server.sets()).send_form(&[
        ("title", "Capitals"),
        ("description", "Europe"),
        ("cards[0][term]", "France"),
        ("cards[0][definition]", "Paris"),
        ("cards[1][term]", ""),
        ("cards[1][definition]", ""),
    ]);
    let (status, body) = read_response(response)?;
    assert_eq!(status, 201, "create body: {body}");
    let id = body["id"].as_str().ok_or("missing id")?.to_string();

    let (_, set) = send(ureq::get(&server.set(&id)), None)?;
    assert_eq!(set["title"], "Capitals");
    assert_eq!(
        set["cards"],
        json!([{"term": "France", "definition": "Paris", "order": 0}])
    );

    let response = ureq::patch(&server.set(&id)).send_form(&[("title", "Capitals")]);
    let (status, body) = read_response(response)?;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "title and cards[] are required"}));
    Ok(())
}

#[test]
fn malformed_and_missing_ids_are_distinguished() -> TestResult<()> {
    let server = TestServer::start()?;
    let missing = "0123456789abcdef01234567";

    let (status, body) = send(ureq::get(&server.set("not-an-id")), None)?;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "invalid id"}));

    let (status, body) = send(ureq::get(&server.set(missing)), None)?;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "Set not found"}));

    let (status, _) = send(ureq::patch(&server.set("xyz")), Some(capitals()))?;
    assert_eq!(status, 400);
    let (status, _) = send(ureq::patch(&server.set(missing)), Some(capitals()))?;
    assert_eq!(status, 404);

    let (status, _) = send(ureq::delete(&server.set("xyz")), None)?;
    assert_eq!(status, 400);
    let (status, _) = send(ureq::delete(&server.set(missing)), None)?;
    assert_eq!(status, 404);
    Ok(())
}

#[test]
fn update_replaces_content_and_stamps_updated_at() -> TestResult<()> {
    let server = TestServer::start()?;
    let id = server.create(capitals())?;
    let (_, before) = send(ureq::get(&server.sets()), None)?;
    let created_at = before["items"][0]["createdAt"].clone();

    let (status, body) = send(
        ureq::patch(&server.set(&id)),
        Some(json!({
            "title": "Capitals v2",
            "cards": [{"term": "Italy", "definition": "Rome"}]
        })),
    )?;
    assert_eq!(status, 200);
    assert_eq!(body, json!({ "id": id }));

    let (_, set) = send(ureq::get(&server.set(&id)), None)?;
    assert_eq!(set["title"], "Capitals v2");
    assert_eq!(set["description"], "");
    assert_eq!(
        set["cards"],
        json!([{"term": "Italy", "definition": "Rome", "order": 0}])
    );

    let (_, after) = send(ureq::get(&server.sets()), None)?;
    assert_eq!(after["items"][0]["createdAt"], created_at);
    assert!(after["items"][0]["updatedAt"].is_string());
    Ok(())
}

#[test]
fn invalid_update_leaves_set_untouched() -> TestResult<()> {
    let server = TestServer::start()?;
    let id = server.create(capitals())?;

    let (status, _) = send(
        ureq::patch(&server.set(&id)),
        Some(json!({"title": "x", "cards": [{"term": "", "definition": " "}]})),
    )?;
    assert_eq!(status, 400);

    let (_, set) = send(ureq::get(&server.set(&id)), None)?;
    assert_eq!(set["title"], "Capitals");
    assert_eq!(set["cards"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn delete_removes_the_set() -> TestResult<()> {
    let server = TestServer::start()?;
    let id = server.create(capitals())?;

    let (status, body) = send(ureq::delete(&server.set(&id)), None)?;
    assert_eq!(status, 204);
    assert_eq!(body, Value::Null);

    let (status, _) = send(ureq::get(&server.set(&id)), None)?;
    assert_eq!(status, 404);
    let (status, _) = send(ureq::delete(&server.set(&id)), None)?;
    assert_eq!(status, 404);
    Ok(())
}

#[test]
fn oversized_body_is_rejected() -> TestResult<()> {
    let server = TestServer::start_with_args(&["--max-body-bytes", "64"])?;
    let big = "x".repeat(256);
    let (status, body) = send(
        ureq::post(&server.sets()),
        Some(json!({"title": big, "cards": [{"term": "a", "definition": "b"}]})),
    )?;
    assert_eq!(status, 413);
    assert!(body["error"].is_string());
    Ok(())
}

#[test]
fn entry_page_and_health_are_served() -> TestResult<()> {
    let server = TestServer::start()?;
    let response = ureq::get(&server.url("/")).call()?;
    assert_eq!(response.status(), 200);
    assert!(response.content_type().starts_with("text/html"));
    let html = response.into_string()?;
    assert!(html.contains("/api/flashcard-sets"));
    assert!(html.contains("add-flashcard"));

    let (status, body) = send(ureq::get(&server.url("/healthz")), None)?;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"ok": true}));
    Ok(())
}

fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

fn wait_for_server(child: &mut Child, addr: SocketAddr) -> TestResult<()> {
    let url = format!("http://{addr}/healthz");
    let start = Instant::now();
    loop {
        if let Ok(resp) = ureq::get(&url).call() {
            if resp.status() == 200 {
                return Ok(());
            }
        }
        if let Some(status) = child.try_wait()? {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = stderr.trim();
            return Err(format!(
                "server exited before ready (status: {status}, stderr: {})",
                if detail.is_empty() { "<empty>" } else { detail }
            )
            .into());
        }
        if start.elapsed() > Duration::from_secs(8) {
            return Err("server did not start in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}
